//! Listdata - generic list processing for in-memory record collections.
//!
//! Listdata takes a slice of records plus structured requests and returns a
//! filtered, searched, sorted and paginated view of it, without knowing the
//! concrete record type. It supports:
//!
//! - Typed filters: strings, numbers, booleans, set membership, ranges
//! - Free-text search with weighting, fuzzy matching and highlighting
//! - Multi-field stable sorting with null ordering and per-type options
//! - Offset and cursor pagination with clamped parameters
//!
//! # Quick Start
//!
//! ```rust
//! use listdata::{
//!     FilterRequest, ListDataProcessor, ListRequest, NumberOp, Record, SearchRequest, SortField,
//! };
//!
//! #[derive(Record)]
//! struct Workspace {
//!     #[list(String)]
//!     name: String,
//!     #[list(String)]
//!     description: Option<String>,
//!     #[list(Number)]
//!     desks: u32,
//! }
//!
//! let workspaces = vec![
//!     Workspace { name: "Loft".into(), description: Some("Open plan loft".into()), desks: 12 },
//!     Workspace { name: "Cube".into(), description: None, desks: 2 },
//!     Workspace { name: "Studio".into(), description: Some("Quiet studio".into()), desks: 6 },
//! ];
//!
//! let request = ListRequest::new()
//!     .filters(FilterRequest::new().number(Workspace::DESKS, NumberOp::GreaterThan, 4))
//!     .search(SearchRequest::new("quiet"))
//!     .sort_by(SortField::asc(Workspace::NAME))
//!     .page(1, 10);
//!
//! let result = ListDataProcessor::default().process(&workspaces, &request).unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(result.items[0].name, "Studio");
//! assert_eq!(result.pagination.total_items, 1);
//! ```
//!
//! # Pipeline
//!
//! ```text
//! records -> filter -> search -> sort -> paginate -> ProcessedResult
//! ```
//!
//! Missing fields and type mismatches never fail a request: filters treat
//! absent values by operator polarity, sorting places them by null order,
//! and search simply finds nothing. Only malformed requests are errors.
//!
//! # Field Types and Operators
//!
//! | Filter | Operators |
//! |--------|-----------|
//! | String | `Equals`, `NotEquals`, `StartsWith`, `EndsWith`, `Contains`, `Matches` |
//! | Number | `Equals`, `NotEquals`, `GreaterThan`, `LessThan`, with `OrEqual` forms |
//! | Bool | equals |
//! | List | `In`, `NotIn` |
//! | Range | optional lower/upper bounds, each inclusive or exclusive |

mod config;
mod error;
mod filter;
mod pagination;
mod processor;
mod record;
mod search;
mod sort;
mod value;

pub use config::ListDataConfig;
pub use error::{ListDataError, Result};
pub use filter::{
    BoolFilter, FieldFilter, FilterRequest, FilterSet, ListFilter, ListOp, NumberFilter,
    NumberOp, RangeFilter, StringFilter, StringOp, TypedFilter,
};
pub use pagination::{
    decode_cursor, encode_cursor, PaginationConfig, PaginationRequest, PaginationResponse,
    Paginator,
};
pub use processor::{ListDataProcessor, ListRequest, ProcessedResult, SCORE_FIELD};
pub use record::{
    normalize_segment, resolve, FieldDef, FieldKind, Record, RecordEnum, RecordTimestamp,
};
pub use search::{
    char_overlap_ratio, find_ignore_case, tokenize, SearchConfig, SearchEngine, SearchHit,
    SearchMetrics, SearchOptions, SearchRequest, PASS_THROUGH_SCORE,
};
pub use sort::{
    compare_records, compare_values, sort_records, NullOrder, SortDirection, SortField,
    SortOptions, SortRequest,
};
pub use value::{Number, Scalar, Timestamp, Value};

#[cfg(feature = "derive")]
pub use listdata_macros::Record;
