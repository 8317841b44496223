//! Field access for records.
//!
//! The engine never knows the concrete shape of the records it processes.
//! Instead, each record type implements [`Record`], usually through
//! `#[derive(Record)]`, and the engine resolves dot-separated field paths
//! against it with [`resolve`].

use std::borrow::Cow;

use crate::value::{Timestamp, Value};

/// Kind of a record field, as reported by [`Record::fields`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Number,
    Timestamp,
    Enum,
    Bool,
    /// A nested record reachable through [`Record::nested`].
    Nested,
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Wire name of the field (snake_case).
    pub name: &'static str,
    /// Kind of value the field yields.
    pub kind: FieldKind,
    /// Whether the field is an `Option` and may be unset.
    pub optional: bool,
}

impl FieldDef {
    /// Creates a field description.
    pub const fn new(name: &'static str, kind: FieldKind, optional: bool) -> Self {
        FieldDef {
            name,
            kind,
            optional,
        }
    }
}

/// A record the engine can filter, search and sort.
///
/// This trait is typically derived using `#[derive(Record)]`, but can also be
/// implemented by hand:
///
/// ```
/// use listdata::{FieldDef, FieldKind, Number, Record, Value};
///
/// struct Client {
///     name: String,
/// }
///
/// struct Subscription {
///     plan: String,
///     seats: u32,
///     client: Option<Client>,
/// }
///
/// impl Record for Client {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "name" => Value::String(&self.name),
///             _ => Value::Absent,
///         }
///     }
/// }
///
/// impl Record for Subscription {
///     fn field_value(&self, field: &str) -> Value<'_> {
///         match field {
///             "plan" => Value::String(&self.plan),
///             "seats" => Value::Number(Number::from(self.seats)),
///             _ => Value::Absent,
///         }
///     }
///
///     fn nested(&self, field: &str) -> Option<&dyn Record> {
///         match field {
///             "client" => Some(&self.client),
///             _ => None,
///         }
///     }
///
///     fn fields() -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[
///             FieldDef::new("plan", FieldKind::String, false),
///             FieldDef::new("seats", FieldKind::Number, false),
///             FieldDef::new("client", FieldKind::Nested, true),
///         ];
///         FIELDS
///     }
/// }
///
/// let sub = Subscription {
///     plan: "gold".into(),
///     seats: 4,
///     client: Some(Client { name: "Acme".into() }),
/// };
/// assert_eq!(listdata::resolve(&sub, "client.name"), Value::String("Acme"));
/// ```
pub trait Record {
    /// Returns the value of a scalar field, or [`Value::Absent`] if the field
    /// is unknown, unset, or not a scalar.
    fn field_value(&self, field: &str) -> Value<'_>;

    /// Returns a nested record for one level of object indirection.
    ///
    /// The default implementation has no nested records.
    fn nested(&self, field: &str) -> Option<&dyn Record> {
        let _ = field;
        None
    }

    /// Describes the fields of this record type.
    ///
    /// Used by search to pick default searchable fields. The default
    /// implementation describes nothing, which leaves search with explicit
    /// field lists only.
    fn fields() -> &'static [FieldDef]
    where
        Self: Sized,
    {
        &[]
    }
}

/// An unset optional record resolves every field to [`Value::Absent`].
impl<T: Record> Record for Option<T> {
    fn field_value(&self, field: &str) -> Value<'_> {
        match self {
            Some(record) => record.field_value(field),
            None => Value::Absent,
        }
    }

    fn nested(&self, field: &str) -> Option<&dyn Record> {
        self.as_ref()?.nested(field)
    }

    fn fields() -> &'static [FieldDef] {
        T::fields()
    }
}

impl<T: Record> Record for Box<T> {
    fn field_value(&self, field: &str) -> Value<'_> {
        (**self).field_value(field)
    }

    fn nested(&self, field: &str) -> Option<&dyn Record> {
        (**self).nested(field)
    }

    fn fields() -> &'static [FieldDef] {
        T::fields()
    }
}

/// Resolves a dot-separated field path against a record.
///
/// Each segment is normalised to snake_case before lookup, so `dateModified`
/// and `date_modified` name the same field. Unknown segments and unset
/// optional records yield [`Value::Absent`]; resolution never fails.
pub fn resolve<'a>(record: &'a dyn Record, path: &str) -> Value<'a> {
    let mut current = record;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let name = normalize_segment(segment);
        if name.is_empty() {
            return Value::Absent;
        }
        if segments.peek().is_none() {
            return current.field_value(&name);
        }
        match current.nested(&name) {
            Some(next) => current = next,
            None => return Value::Absent,
        }
    }

    Value::Absent
}

/// Normalises a path segment to snake_case.
///
/// Segments that are already lowercase are borrowed unchanged.
pub fn normalize_segment(segment: &str) -> Cow<'_, str> {
    let segment = segment.trim();
    if !segment.chars().any(|c| c.is_uppercase() || c == '-') {
        return Cow::Borrowed(segment);
    }

    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev_was_lower = false;
    for c in segment.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                out.push('_');
            }
            out.extend(c.to_lowercase());
            prev_was_lower = false;
        } else if c == '-' {
            out.push('_');
            prev_was_lower = false;
        } else {
            out.push(c);
            prev_was_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    Cow::Owned(out)
}

/// Conversion of enum types to their discriminant values.
///
/// Used by `#[derive(Record)]` for fields marked `#[list(Enum)]`.
///
/// ```
/// use listdata::RecordEnum;
///
/// enum Status {
///     Active,
///     Suspended,
/// }
///
/// impl RecordEnum for Status {
///     fn discriminant(&self) -> u32 {
///         match self {
///             Status::Active => 1,
///             Status::Suspended => 2,
///         }
///     }
/// }
/// ```
pub trait RecordEnum {
    /// Stable discriminant identifying the variant.
    fn discriminant(&self) -> u32;
}

/// Conversion of datetime types to [`Timestamp`].
///
/// Used by `#[derive(Record)]` for fields marked `#[list(Timestamp)]`.
pub trait RecordTimestamp {
    /// Converts this value to a [`Timestamp`] for comparison.
    fn timestamp(&self) -> Timestamp;
}

impl RecordTimestamp for i64 {
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self)
    }
}

impl RecordTimestamp for u64 {
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_millis(*self as i64)
    }
}

impl RecordTimestamp for Timestamp {
    fn timestamp(&self) -> Timestamp {
        *self
    }
}

impl<Tz: chrono::TimeZone> RecordTimestamp for chrono::DateTime<Tz> {
    fn timestamp(&self) -> Timestamp {
        Timestamp::from_millis(self.timestamp_millis())
    }
}

impl RecordTimestamp for std::time::SystemTime {
    fn timestamp(&self) -> Timestamp {
        Timestamp::from(*self)
    }
}
