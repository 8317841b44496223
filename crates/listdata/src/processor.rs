//! The list processing pipeline.
//!
//! [`ListDataProcessor::process`] runs the stages in a fixed order:
//!
//! ```text
//! filter -> search -> sort -> paginate
//! ```
//!
//! Search always runs, in pass-through mode when there is no query, so the
//! result shape is the same either way. Sorting applies to search hits,
//! which makes the relevance score available as the `_score` sort field.
//! Pagination comes last so totals describe the fully processed set.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ListDataConfig;
use crate::error::Result;
use crate::filter::{FilterRequest, FilterSet};
use crate::pagination::{PaginationRequest, PaginationResponse, Paginator};
use crate::record::{resolve, Record};
use crate::search::{SearchEngine, SearchHit, SearchMetrics, SearchRequest};
use crate::sort::{SortField, SortRequest};

/// Sort field name that orders by search relevance.
pub const SCORE_FIELD: &str = "_score";

/// Everything a caller can ask of one processing run.
///
/// # Example
///
/// ```
/// use listdata::{FilterRequest, ListRequest, NumberOp, SearchRequest, SortField};
///
/// let request = ListRequest::new()
///     .filters(FilterRequest::new().number("capacity", NumberOp::GreaterThan, 4))
///     .search(SearchRequest::new("downtown"))
///     .sort_by(SortField::desc("_score"))
///     .sort_by(SortField::asc("name"))
///     .page(1, 20);
///
/// assert!(request.pagination.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    pub filters: Option<FilterRequest>,
    pub sort: Option<SortRequest>,
    pub search: Option<SearchRequest>,
    pub pagination: Option<PaginationRequest>,
}

impl ListRequest {
    /// Creates an empty request, which returns the input unchanged.
    pub fn new() -> Self {
        ListRequest::default()
    }

    pub fn filters(mut self, filters: FilterRequest) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Appends a sort key.
    pub fn sort_by(mut self, field: SortField) -> Self {
        self.sort.get_or_insert_with(SortRequest::default).fields.push(field);
        self
    }

    pub fn search(mut self, search: SearchRequest) -> Self {
        self.search = Some(search);
        self
    }

    /// Requests offset pagination.
    pub fn page(mut self, page: i64, page_size: i64) -> Self {
        self.pagination = Some(PaginationRequest::offset(page, page_size));
        self
    }

    /// Requests cursor pagination.
    pub fn cursor(mut self, cursor: Option<String>, limit: i64) -> Self {
        self.pagination = Some(PaginationRequest::cursor(cursor, limit));
        self
    }
}

/// Output of one processing run.
pub struct ProcessedResult<'a, T> {
    /// Surviving records, in final order, for the requested page.
    pub items: Vec<&'a T>,
    /// Pagination metadata.
    pub pagination: PaginationResponse,
    /// Search hit for each item, parallel to `items`.
    ///
    /// `position` refers to the record's index in the processed input.
    pub search_results: Vec<SearchHit<'a, T>>,
    /// Aggregate search statistics.
    pub metrics: SearchMetrics,
}

impl<'a, T> ProcessedResult<'a, T> {
    /// Items matching before pagination.
    pub fn total(&self) -> usize {
        self.pagination.total_items
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.items.iter().copied()
    }
}

impl<T: fmt::Debug> fmt::Debug for ProcessedResult<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedResult")
            .field("items", &self.items)
            .field("pagination", &self.pagination)
            .field("search_results", &self.search_results)
            .field("metrics", &self.metrics)
            .finish()
    }
}

/// Stateless pipeline over a configured search engine and paginator.
///
/// A processor only holds immutable configuration and can be shared across
/// threads; each call allocates its own working storage.
#[derive(Debug, Clone, Default)]
pub struct ListDataProcessor {
    search: SearchEngine,
    paginator: Paginator,
}

impl ListDataProcessor {
    pub fn new(config: ListDataConfig) -> Self {
        ListDataProcessor {
            search: SearchEngine::new(config.search),
            paginator: Paginator::new(config.pagination),
        }
    }

    pub fn search_engine(&self) -> &SearchEngine {
        &self.search
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// Runs filter, search, sort and pagination over `records`.
    ///
    /// Fails only for malformed requests (bad filter, empty sort path,
    /// undecodable cursor); nothing is returned partially.
    pub fn process<'a, T: Record>(
        &self,
        records: &'a [T],
        request: &ListRequest,
    ) -> Result<ProcessedResult<'a, T>> {
        let filters = match &request.filters {
            Some(filters) => FilterSet::compile(filters)?,
            None => FilterSet::default(),
        };
        let sort_fields: &[SortField] = match &request.sort {
            Some(sort) => {
                sort.validate()?;
                &sort.fields
            }
            None => &[],
        };

        let (positions, filtered): (Vec<usize>, Vec<&'a T>) = records
            .iter()
            .enumerate()
            .filter(|(_, record)| filters.keep(*record))
            .unzip();
        debug!(
            input = records.len(),
            kept = filtered.len(),
            filters = filters.len(),
            "filter stage"
        );

        let (mut hits, metrics) = self.search.search(&filtered, request.search.as_ref());
        for hit in &mut hits {
            hit.position = positions[hit.position];
        }
        debug!(hits = hits.len(), "search stage");

        if !sort_fields.is_empty() {
            hits.sort_by(|a, b| compare_hits(a, b, sort_fields));
            debug!(keys = sort_fields.len(), "sort stage");
        }

        let (page, pagination) = self.paginator.paginate(hits, request.pagination.as_ref())?;
        debug!(
            page = page.len(),
            total = pagination.total_items,
            "paginate stage"
        );

        Ok(ProcessedResult {
            items: page.iter().map(|hit| hit.record).collect(),
            pagination,
            search_results: page,
            metrics,
        })
    }

    /// Like [`process`](Self::process), returning cloned records only.
    pub fn process_cloned<T: Record + Clone>(
        &self,
        records: &[T],
        request: &ListRequest,
    ) -> Result<Vec<T>> {
        let result = self.process(records, request)?;
        Ok(result.items.into_iter().cloned().collect())
    }
}

fn compare_hits<T: Record>(
    a: &SearchHit<'_, T>,
    b: &SearchHit<'_, T>,
    fields: &[SortField],
) -> Ordering {
    for field in fields {
        let ordering = if field.field.trim() == SCORE_FIELD {
            field.direction.apply(a.score.total_cmp(&b.score))
        } else {
            field.compare(&resolve(a.record, &field.field), &resolve(b.record, &field.field))
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
