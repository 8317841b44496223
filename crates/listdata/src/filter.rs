//! Typed filter predicates.
//!
//! A [`FilterRequest`] is plain data (it deserializes straight from a
//! transport payload). Before evaluation it is compiled into a [`FilterSet`],
//! which validates field paths and operands and prepares regexes once per
//! call.
//!
//! # Semantics
//!
//! - Filters combine with AND; an empty request keeps every record.
//! - A field that resolves to [`Value::Absent`] fails positive operators
//!   (`Equals`, `Contains`, `In`, ranges, ...) and passes negative ones
//!   (`NotEquals`, `NotIn`).
//! - A present value whose type does not match the filter fails it,
//!   whatever the operator.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ListDataError, Result};
use crate::record::{resolve, Record};
use crate::value::{Number, Scalar, Value};

/// String comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringOp {
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Contains,
    /// Regular expression match.
    Matches,
}

impl StringOp {
    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            StringOp::Equals => "equals",
            StringOp::NotEquals => "not_equals",
            StringOp::StartsWith => "starts_with",
            StringOp::EndsWith => "ends_with",
            StringOp::Contains => "contains",
            StringOp::Matches => "matches",
        }
    }

    fn is_negative(self) -> bool {
        matches!(self, StringOp::NotEquals)
    }
}

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl NumberOp {
    /// Evaluates this operator given the ordering of field value to operand.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            NumberOp::Equals => ordering == Ordering::Equal,
            NumberOp::NotEquals => ordering != Ordering::Equal,
            NumberOp::GreaterThan => ordering == Ordering::Greater,
            NumberOp::GreaterThanOrEqual => ordering != Ordering::Less,
            NumberOp::LessThan => ordering == Ordering::Less,
            NumberOp::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }

    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            NumberOp::Equals => "equals",
            NumberOp::NotEquals => "not_equals",
            NumberOp::GreaterThan => "greater_than",
            NumberOp::GreaterThanOrEqual => "greater_than_or_equal",
            NumberOp::LessThan => "less_than",
            NumberOp::LessThanOrEqual => "less_than_or_equal",
        }
    }
}

/// Set membership operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOp {
    In,
    NotIn,
}

impl ListOp {
    /// Returns the display name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            ListOp::In => "in",
            ListOp::NotIn => "not_in",
        }
    }
}

impl std::fmt::Display for StringOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for NumberOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for ListOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringFilter {
    pub op: StringOp,
    pub value: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFilter {
    pub op: NumberOp,
    pub value: Number,
}

impl NumberFilter {
    fn eval(&self, value: Number) -> bool {
        match value.compare(self.value) {
            Some(ordering) => self.op.eval_ordering(ordering),
            None => false, // NaN comparison
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolFilter {
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    pub op: ListOp,
    pub values: Vec<Scalar>,
}

/// Range with independently optional, independently inclusive bounds.
///
/// Bounds are inclusive unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    #[serde(default)]
    pub min: Option<Scalar>,
    #[serde(default)]
    pub max: Option<Scalar>,
    #[serde(default = "inclusive")]
    pub include_min: bool,
    #[serde(default = "inclusive")]
    pub include_max: bool,
}

fn inclusive() -> bool {
    true
}

impl RangeFilter {
    /// Range including both bounds.
    pub fn inclusive(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        RangeFilter {
            min: Some(min.into()),
            max: Some(max.into()),
            include_min: true,
            include_max: true,
        }
    }

    /// Range excluding both bounds.
    pub fn exclusive(min: impl Into<Scalar>, max: impl Into<Scalar>) -> Self {
        RangeFilter {
            min: Some(min.into()),
            max: Some(max.into()),
            include_min: false,
            include_max: false,
        }
    }

    /// Lower bound only.
    pub fn at_least(min: impl Into<Scalar>) -> Self {
        RangeFilter {
            min: Some(min.into()),
            max: None,
            include_min: true,
            include_max: true,
        }
    }

    /// Upper bound only.
    pub fn at_most(max: impl Into<Scalar>) -> Self {
        RangeFilter {
            min: None,
            max: Some(max.into()),
            include_min: true,
            include_max: true,
        }
    }

    fn contains(&self, value: &Value<'_>) -> bool {
        if let Some(min) = &self.min {
            match compare_to_scalar(value, min) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) if self.include_min => {}
                _ => return false,
            }
        }
        if let Some(max) = &self.max {
            match compare_to_scalar(value, max) {
                Some(Ordering::Less) => {}
                Some(Ordering::Equal) if self.include_max => {}
                _ => return false,
            }
        }
        // Without bounds the value still has to be a comparable scalar.
        self.min.is_some() || self.max.is_some() || !value.is_absent()
    }
}

/// One predicate, tagged by the type of value it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedFilter {
    String(StringFilter),
    Number(NumberFilter),
    Bool(BoolFilter),
    List(ListFilter),
    Range(RangeFilter),
}

/// A predicate bound to a field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Dot-separated field path.
    pub field: String,
    #[serde(flatten)]
    pub filter: TypedFilter,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, filter: TypedFilter) -> Self {
        FieldFilter {
            field: field.into(),
            filter,
        }
    }
}

/// A set of filters combined with AND.
///
/// # Example
///
/// ```
/// use listdata::{FilterRequest, NumberOp, RangeFilter, StringOp};
///
/// let filters = FilterRequest::new()
///     .string("name", StringOp::StartsWith, "Down")
///     .number("capacity", NumberOp::GreaterThanOrEqual, 10)
///     .range("price", RangeFilter::inclusive(3, 7));
///
/// assert_eq!(filters.filters.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub filters: Vec<FieldFilter>,
}

impl FilterRequest {
    /// Creates an empty request, which keeps every record.
    pub fn new() -> Self {
        FilterRequest::default()
    }

    /// Adds a filter.
    pub fn with(mut self, field: &str, filter: TypedFilter) -> Self {
        self.filters.push(FieldFilter::new(field, filter));
        self
    }

    /// Adds a case-sensitive string filter.
    pub fn string(self, field: &str, op: StringOp, value: impl Into<String>) -> Self {
        self.with(
            field,
            TypedFilter::String(StringFilter {
                op,
                value: value.into(),
                case_insensitive: false,
            }),
        )
    }

    /// Adds a case-insensitive string filter.
    pub fn string_ci(self, field: &str, op: StringOp, value: impl Into<String>) -> Self {
        self.with(
            field,
            TypedFilter::String(StringFilter {
                op,
                value: value.into(),
                case_insensitive: true,
            }),
        )
    }

    /// Adds a numeric filter.
    pub fn number(self, field: &str, op: NumberOp, value: impl Into<Number>) -> Self {
        self.with(
            field,
            TypedFilter::Number(NumberFilter {
                op,
                value: value.into(),
            }),
        )
    }

    /// Adds a boolean equality filter.
    pub fn bool(self, field: &str, value: bool) -> Self {
        self.with(field, TypedFilter::Bool(BoolFilter { value }))
    }

    /// Adds a set membership filter.
    pub fn list<I, S>(self, field: &str, op: ListOp, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.with(
            field,
            TypedFilter::List(ListFilter {
                op,
                values: values.into_iter().map(Into::into).collect(),
            }),
        )
    }

    /// Adds a range filter.
    pub fn range(self, field: &str, range: RangeFilter) -> Self {
        self.with(field, TypedFilter::Range(range))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Predicate {
    String {
        op: StringOp,
        value: String,
        case_insensitive: bool,
    },
    Regex(Regex),
    Number(NumberFilter),
    Bool(bool),
    List(ListFilter),
    Range(RangeFilter),
}

impl Predicate {
    fn matches(&self, value: &Value<'_>) -> bool {
        if value.is_absent() {
            return self.passes_absent();
        }

        match (self, value) {
            (
                Predicate::String {
                    op,
                    value: pattern,
                    case_insensitive,
                },
                Value::String(s),
            ) => {
                if *case_insensitive {
                    match_string(*op, &s.to_lowercase(), pattern)
                } else {
                    match_string(*op, s, pattern)
                }
            }
            (Predicate::Regex(regex), Value::String(s)) => regex.is_match(s),
            (Predicate::Number(filter), Value::Number(n)) => filter.eval(*n),
            (Predicate::Number(filter), Value::Enum(d)) => {
                filter.eval(Number::U64(u64::from(*d)))
            }
            (Predicate::Bool(expected), Value::Bool(b)) => b == expected,
            (Predicate::List(list), value) => match_list(list, value),
            (Predicate::Range(range), value) => range.contains(value),
            // Type mismatch
            _ => false,
        }
    }

    fn passes_absent(&self) -> bool {
        match self {
            Predicate::String { op, .. } => op.is_negative(),
            Predicate::Number(filter) => filter.op == NumberOp::NotEquals,
            Predicate::List(list) => list.op == ListOp::NotIn,
            Predicate::Regex(_) | Predicate::Bool(_) | Predicate::Range(_) => false,
        }
    }
}

fn match_string(op: StringOp, field: &str, pattern: &str) -> bool {
    match op {
        StringOp::Equals => field == pattern,
        StringOp::NotEquals => field != pattern,
        StringOp::StartsWith => field.starts_with(pattern),
        StringOp::EndsWith => field.ends_with(pattern),
        StringOp::Contains => field.contains(pattern),
        // Compiled into Predicate::Regex
        StringOp::Matches => false,
    }
}

fn match_list(list: &ListFilter, value: &Value<'_>) -> bool {
    let mut comparable = false;
    for candidate in &list.values {
        match compare_to_scalar(value, candidate) {
            Some(Ordering::Equal) => return list.op == ListOp::In,
            Some(_) => comparable = true,
            None => {}
        }
    }
    // NotIn only passes values of a type the set can actually hold.
    list.op == ListOp::NotIn && (comparable || list.values.is_empty())
}

/// Orders a field value against a filter operand of a compatible type.
///
/// Enum discriminants compare against integral numbers, since enum operands
/// usually arrive as plain integers.
fn compare_to_scalar(value: &Value<'_>, scalar: &Scalar) -> Option<Ordering> {
    match (value, scalar) {
        (Value::String(a), Scalar::String(b)) => Some((*a).cmp(b.as_str())),
        (Value::Number(a), Scalar::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Scalar::Enum(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Scalar::Number(b)) => Number::U64(u64::from(*a)).compare(*b),
        (Value::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct CompiledFilter {
    field: String,
    predicate: Predicate,
}

/// A validated, ready-to-evaluate set of filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<CompiledFilter>,
}

impl FilterSet {
    /// Validates and compiles a request.
    ///
    /// Fails on an empty field path, a non-finite numeric operand or an
    /// invalid regex.
    pub fn compile(request: &FilterRequest) -> Result<Self> {
        let filters = request
            .filters
            .iter()
            .map(compile_filter)
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterSet { filters })
    }

    /// Returns `true` if there are no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Number of filters in the set.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the record passes every filter.
    pub fn keep<T: Record>(&self, record: &T) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.predicate.matches(&resolve(record, &filter.field)))
    }
}

fn compile_filter(filter: &FieldFilter) -> Result<CompiledFilter> {
    let field = filter.field.trim();
    let malformed = |reason: &'static str| ListDataError::MalformedFilter {
        field: field.to_string(),
        reason,
    };

    if field.is_empty() || field.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(malformed("empty field path segment"));
    }

    let predicate = match &filter.filter {
        TypedFilter::String(f) if f.op == StringOp::Matches => {
            let regex = RegexBuilder::new(&f.value)
                .case_insensitive(f.case_insensitive)
                .build()
                .map_err(|source| ListDataError::InvalidRegex {
                    field: field.to_string(),
                    source,
                })?;
            Predicate::Regex(regex)
        }
        TypedFilter::String(f) => Predicate::String {
            op: f.op,
            value: if f.case_insensitive {
                f.value.to_lowercase()
            } else {
                f.value.clone()
            },
            case_insensitive: f.case_insensitive,
        },
        TypedFilter::Number(f) => {
            if !f.value.is_finite() {
                return Err(malformed("numeric operand must be finite"));
            }
            Predicate::Number(f.clone())
        }
        TypedFilter::Bool(f) => Predicate::Bool(f.value),
        TypedFilter::List(f) => Predicate::List(f.clone()),
        TypedFilter::Range(f) => {
            let non_finite = [&f.min, &f.max]
                .into_iter()
                .flatten()
                .any(|bound| matches!(bound, Scalar::Number(n) if !n.is_finite()));
            if non_finite {
                return Err(malformed("range bound must be finite"));
            }
            Predicate::Range(f.clone())
        }
    };

    Ok(CompiledFilter {
        field: field.to_string(),
        predicate,
    })
}
