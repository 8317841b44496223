//! Multi-field record ordering.
//!
//! A [`SortRequest`] is an ordered list of [`SortField`]s. The first field is
//! the primary key, later fields break ties, and records that compare equal
//! on every field keep their input order (the sort is stable).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{ListDataError, Result};
use crate::record::{resolve, Record};
use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl SortDirection {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where absent values go, regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullOrder {
    First,
    #[default]
    Last,
}

/// Per-field comparison options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    /// Compare strings case-sensitively (default: case-insensitive).
    pub case_sensitive: bool,
    /// Compare numbers by absolute value.
    pub absolute: bool,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Dot-separated field path.
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub nulls: NullOrder,
    #[serde(default)]
    pub options: SortOptions,
}

impl SortField {
    /// Ascending sort on `field` with default options.
    pub fn asc(field: impl Into<String>) -> Self {
        SortField::new(field, SortDirection::Asc)
    }

    /// Descending sort on `field` with default options.
    pub fn desc(field: impl Into<String>) -> Self {
        SortField::new(field, SortDirection::Desc)
    }

    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        SortField {
            field: field.into(),
            direction,
            nulls: NullOrder::default(),
            options: SortOptions::default(),
        }
    }

    /// Sets the null ordering policy.
    pub fn nulls(mut self, nulls: NullOrder) -> Self {
        self.nulls = nulls;
        self
    }

    /// Compares strings case-sensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.options.case_sensitive = true;
        self
    }

    /// Compares numbers by absolute value.
    pub fn absolute(mut self) -> Self {
        self.options.absolute = true;
        self
    }

    /// Compares two resolved values according to this field.
    ///
    /// The null policy is applied before the direction, so `NullOrder::First`
    /// puts absent values first in both directions.
    pub fn compare(&self, a: &Value<'_>, b: &Value<'_>) -> Ordering {
        match (a.is_absent(), b.is_absent()) {
            (true, true) => Ordering::Equal,
            (true, false) => match self.nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            },
            (false, true) => match self.nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            },
            (false, false) => self.direction.apply(compare_values(a, b, self.options)),
        }
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRequest {
    #[serde(default)]
    pub fields: Vec<SortField>,
}

impl SortRequest {
    pub fn new() -> Self {
        SortRequest::default()
    }

    /// Appends a sort key.
    pub fn then(mut self, field: SortField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rejects sort keys whose path is empty or has an empty segment.
    pub fn validate(&self) -> Result<()> {
        let malformed = |f: &SortField| f.field.split('.').any(|s| s.trim().is_empty());
        match self.fields.iter().position(malformed) {
            Some(position) => Err(ListDataError::MalformedSort { position }),
            None => Ok(()),
        }
    }
}

/// Compares two non-absent values.
///
/// Tries string, number, timestamp, enum and bool comparison in that order;
/// values of different kinds fall back to comparing their type names, so the
/// result is always a total order.
pub fn compare_values(a: &Value<'_>, b: &Value<'_>, options: SortOptions) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => {
            if options.case_sensitive {
                a.cmp(b)
            } else {
                compare_case_insensitive(a, b)
            }
        }
        (Value::Number(a), Value::Number(b)) => {
            if options.absolute {
                a.abs().total_cmp(b.abs())
            } else {
                a.total_cmp(*b)
            }
        }
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (Value::Enum(a), Value::Enum(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => a.type_name().cmp(&b.type_name()),
    }
}

fn compare_case_insensitive(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compares two records using a list of sort fields.
///
/// Uses the first field as the primary key, the second to break ties, etc.
/// If all fields compare equal, returns `Equal`.
pub fn compare_records<T: Record>(a: &T, b: &T, fields: &[SortField]) -> Ordering {
    for field in fields {
        let ordering = field.compare(&resolve(a, &field.field), &resolve(b, &field.field));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Stable in-place sort of record references.
pub fn sort_records<T: Record>(records: &mut [&T], fields: &[SortField]) {
    if fields.is_empty() {
        return;
    }
    records.sort_by(|a, b| compare_records(*a, *b, fields));
}
