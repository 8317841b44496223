//! Proc macros for listdata.
//!
//! # Available Macros
//!
//! - [`Record`] - Generate `listdata::Record` field accessors from struct annotations
//!
//! For working examples, see `listdata/tests/record_derive.rs`.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for structs processed by listdata.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `String` | String field (`String`, `&str`, anything `AsRef<str>`) |
/// | `Number` | Numeric field (any primitive integer or float) |
/// | `Timestamp` | Timestamp field - requires `RecordTimestamp` impl |
/// | `Enum` | Enum field - requires `RecordEnum` impl |
/// | `Bool` | Boolean field |
/// | `Nested` | Field that itself implements `Record`, reachable as `field.sub` |
/// | `ty = "..."` | Field type given as a string (`ty = "enum"`) |
/// | `skip` | Exclude this field |
/// | `rename = "..."` | Use a custom name in requests |
///
/// Fields declared as `Option<T>` resolve to `Value::Absent` when `None`.
/// Fields without a `#[list(...)]` attribute are not visible to requests.
///
/// # Generated Code
///
/// The macro generates:
///
/// 1. Field name constants (e.g., `Subscription::PLAN`, `Subscription::DATE_MODIFIED`)
/// 2. `Record::field_value()` for scalar fields
/// 3. `Record::nested()` when any field is marked `Nested`
/// 4. `Record::fields()`, which search uses to pick default fields
///
/// # Example
///
/// ```ignore
/// use listdata::{ListDataProcessor, ListRequest, Record, SortField};
///
/// #[derive(Record)]
/// struct Client {
///     #[list(String)]
///     name: String,
/// }
///
/// #[derive(Record)]
/// struct Subscription {
///     #[list(String)]
///     plan: String,
///
///     #[list(Number)]
///     seats: u32,
///
///     #[list(Timestamp)]
///     date_modified: Option<i64>,
///
///     #[list(Nested)]
///     client: Option<Client>,
///
///     #[list(skip)]
///     internal_id: u64,
/// }
///
/// let request = ListRequest::new()
///     .sort_by(SortField::asc("client.name"))
///     .sort_by(SortField::desc(Subscription::SEATS));
///
/// let result = ListDataProcessor::default().process(&subscriptions, &request)?;
/// ```
///
/// # Enum Fields
///
/// For enum fields, implement `RecordEnum` on your enum type:
///
/// ```ignore
/// use listdata::RecordEnum;
///
/// enum Status { Active, Suspended }
///
/// impl RecordEnum for Status {
///     fn discriminant(&self) -> u32 {
///         match self {
///             Status::Active => 1,
///             Status::Suspended => 2,
///         }
///     }
/// }
///
/// #[derive(Record)]
/// struct Subscription {
///     #[list(Enum)]
///     status: Status,
/// }
/// ```
#[proc_macro_derive(Record, attributes(list))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
