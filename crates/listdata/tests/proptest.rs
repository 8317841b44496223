//! Property-based tests for listdata using proptest.

use std::cmp::Ordering;

use listdata::{
    FilterRequest, ListDataProcessor, ListRequest, Number, NumberOp, PaginationRequest, Paginator,
    Record, SearchRequest, SortField, StringOp, Value,
};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct TestItem {
    id: usize,
    value: i64,
    name: String,
    score: Option<i64>,
}

impl Record for TestItem {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::from(self.id)),
            "value" => Value::Number(Number::I64(self.value)),
            "name" => Value::String(&self.name),
            "score" => match self.score {
                Some(s) => Value::Number(Number::I64(s)),
                None => Value::Absent,
            },
            _ => Value::Absent,
        }
    }
}

// Strategy to generate items with unique, ordered ids
fn items_strategy(max: usize) -> impl Strategy<Value = Vec<TestItem>> {
    prop::collection::vec(
        (-50i64..50, "[a-c]{1,4}", prop::option::of(-5i64..5)),
        0..max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(id, (value, name, score))| TestItem {
                id,
                value,
                name,
                score,
            })
            .collect()
    })
}

// Numbers clustered around 2^53, where f64 stops representing every integer
fn number_strategy() -> impl Strategy<Value = Number> {
    let near = (1i64 << 53) - 4..(1i64 << 53) + 4;
    prop_oneof![
        near.clone().prop_map(Number::I64),
        near.clone().prop_map(|n| Number::U64(n as u64)),
        near.prop_map(|n| Number::F64(n as f64)),
        (-5.0f64..5.0).prop_map(Number::F64),
        any::<i64>().prop_map(Number::I64),
        any::<u64>().prop_map(Number::U64),
    ]
}

fn ids(items: &[&TestItem]) -> Vec<usize> {
    items.iter().map(|item| item.id).collect()
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// An empty request returns the input unchanged.
    #[test]
    fn empty_request_is_identity(items in items_strategy(60)) {
        let result = ListDataProcessor::default().process(&items, &ListRequest::new()).unwrap();
        prop_assert_eq!(result.items, items.iter().collect::<Vec<_>>());
    }

    /// Number ordering is antisymmetric and transitive across variants.
    #[test]
    fn number_order_is_total(
        a in number_strategy(),
        b in number_strategy(),
        c in number_strategy(),
    ) {
        prop_assert_eq!(a.total_cmp(b), b.total_cmp(a).reverse());
        if a.total_cmp(b) != Ordering::Greater && b.total_cmp(c) != Ordering::Greater {
            prop_assert_ne!(a.total_cmp(c), Ordering::Greater);
        }
    }

    /// Filtering never grows the collection and keeps input order.
    #[test]
    fn filter_is_an_ordered_subset(
        items in items_strategy(60),
        threshold in -60i64..60,
    ) {
        let request = ListRequest::new()
            .filters(FilterRequest::new().number("value", NumberOp::GreaterThan, threshold));
        let result = ListDataProcessor::default().process(&items, &request).unwrap();

        let kept = ids(&result.items);
        prop_assert!(kept.len() <= items.len());
        prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(result.items.iter().all(|item| item.value > threshold));
    }

    /// Multiple filters keep exactly the records every filter keeps.
    #[test]
    fn filters_are_conjunctive(
        items in items_strategy(60),
        threshold in -60i64..60,
        prefix in "[a-c]",
    ) {
        let processor = ListDataProcessor::default();
        let by_value = FilterRequest::new().number("value", NumberOp::LessThanOrEqual, threshold);
        let by_name = FilterRequest::new().string("name", StringOp::StartsWith, prefix.clone());
        let both = by_value.clone().string("name", StringOp::StartsWith, prefix);

        let left = processor.process(&items, &ListRequest::new().filters(by_value)).unwrap();
        let right = processor.process(&items, &ListRequest::new().filters(by_name)).unwrap();
        let combined = processor.process(&items, &ListRequest::new().filters(both)).unwrap();

        let right_ids = ids(&right.items);
        let expected: Vec<_> = ids(&left.items)
            .into_iter()
            .filter(|id| right_ids.contains(id))
            .collect();
        prop_assert_eq!(ids(&combined.items), expected);
    }

    /// Sorting orders by key and keeps input order among equal keys.
    #[test]
    fn sort_is_ordered_and_stable(items in items_strategy(60)) {
        let request = ListRequest::new().sort_by(SortField::asc("value"));
        let result = ListDataProcessor::default().process(&items, &request).unwrap();

        for pair in result.items.windows(2) {
            prop_assert!(pair[0].value <= pair[1].value);
            if pair[0].value == pair[1].value {
                prop_assert!(pair[0].id < pair[1].id);
            }
        }
    }

    /// Sorting an already sorted list changes nothing.
    #[test]
    fn sort_is_idempotent(items in items_strategy(60)) {
        let request = ListRequest::new()
            .sort_by(SortField::desc("score"))
            .sort_by(SortField::asc("name"));
        let processor = ListDataProcessor::default();

        let once = processor.process_cloned(&items, &request).unwrap();
        let twice = processor.process_cloned(&once, &request).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Records without a sort value end up last under the default null order.
    #[test]
    fn absent_values_sort_last(items in items_strategy(60)) {
        let request = ListRequest::new().sort_by(SortField::desc("score"));
        let result = ListDataProcessor::default().process(&items, &request).unwrap();

        let first_absent = result
            .items
            .iter()
            .position(|item| item.score.is_none())
            .unwrap_or(result.items.len());
        prop_assert!(result.items[first_absent..].iter().all(|item| item.score.is_none()));
    }

    /// Walking every page yields every item exactly once, in order.
    #[test]
    fn pages_partition_the_input(
        items in items_strategy(80),
        page_size in 1i64..20,
    ) {
        let processor = ListDataProcessor::default();
        let first = processor.process(&items, &ListRequest::new().page(1, page_size)).unwrap();
        let total_pages = first.pagination.total_pages;

        let mut seen = Vec::new();
        for page in 1..=total_pages {
            let request = ListRequest::new().page(page as i64, page_size);
            let result = processor.process(&items, &request).unwrap();
            prop_assert!(result.len() <= page_size as usize);
            prop_assert_eq!(result.pagination.has_next, page < total_pages);
            prop_assert_eq!(result.pagination.has_prev, page > 1);
            seen.extend(ids(&result.items));
        }

        prop_assert_eq!(seen, (0..items.len()).collect::<Vec<_>>());
    }

    /// Effective page size always lands in the configured bounds.
    #[test]
    fn page_size_is_clamped(requested in any::<i64>()) {
        let paginator = Paginator::default();
        let size = paginator.effective_size(requested);
        prop_assert!(size >= 1 && size <= paginator.config().max_page_size);
    }

    /// Out-of-range page numbers never panic and clamp to the first page.
    #[test]
    fn page_number_is_clamped(items in items_strategy(30), page in i64::MIN..1) {
        let (_, response) = Paginator::default()
            .paginate(items, Some(&PaginationRequest::offset(page, 10)))
            .unwrap();
        prop_assert_eq!(response.current_page, Some(1));
    }

    /// Queries of whitespace and punctuation pass everything through.
    #[test]
    fn blank_query_passes_through(
        items in items_strategy(40),
        query in "[ .,!?;:]{0,6}",
    ) {
        let request = ListRequest::new().search(SearchRequest::new(query).fields(["name"]));
        let result = ListDataProcessor::default().process(&items, &request).unwrap();
        prop_assert_eq!(result.len(), items.len());
        prop_assert!(result.search_results.iter().all(|hit| hit.score == 1.0));
    }

    /// Search results are positive and ranked by descending score.
    #[test]
    fn search_results_are_ranked(
        items in items_strategy(60),
        query in "[a-c]{1,2}( [a-c]{1,2})?",
    ) {
        let request = ListRequest::new()
            .search(SearchRequest::new(query).fields(["name"]).fuzzy(true));
        let result = ListDataProcessor::default().process(&items, &request).unwrap();

        prop_assert!(result.search_results.iter().all(|hit| hit.score > 0.0));
        for pair in result.search_results.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].position < pair[1].position);
            }
        }
        for hit in &result.search_results {
            prop_assert!(std::ptr::eq(hit.record, &items[hit.position]));
        }
    }
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn empty_collection_with_every_stage() {
    let items: Vec<TestItem> = Vec::new();
    let request = ListRequest::new()
        .filters(FilterRequest::new().number("value", NumberOp::Equals, 1))
        .search(SearchRequest::new("abc"))
        .sort_by(SortField::asc("name"))
        .page(3, 10);
    let result = ListDataProcessor::default().process(&items, &request).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.total(), 0);
}

#[test]
fn page_past_the_end_is_empty() {
    let items: Vec<_> = (0..5)
        .map(|id| TestItem {
            id,
            value: 0,
            name: "a".into(),
            score: None,
        })
        .collect();
    let result = ListDataProcessor::default()
        .process(&items, &ListRequest::new().page(9, 2))
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.pagination.total_pages, 3);
    assert!(!result.pagination.has_next);
}
