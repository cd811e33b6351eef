// SPDX-License-Identifier: Apache-2.0
//! Ordering declarations and the seek-key abstraction.
//!
//! A request's order declarations become an [`OrderSpec`]: a deduplicated
//! field list closed by a mandatory unique tiebreaker. The spec is the single
//! source of truth for how rows compare, for which field values a cursor
//! records, and for what "strictly past the seek key" means for a keyset
//! fetch.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Scan direction for one ordering field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending, smallest first.
    Asc,
    /// Descending, largest first.
    Desc,
}

impl OrderDirection {
    /// The opposite direction.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Placement of NULL values, declared for the DESC orientation.
///
/// ASC uses the inverse placement. `None` leaves nulls at the backend
/// default, which tidemark pins to "null sorts below every value" so that
/// in-memory executors and SQL backends configured the same way agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    /// No explicit placement; nulls sort below every value.
    #[default]
    None,
    /// Nulls first under DESC (therefore last under ASC).
    First,
    /// Nulls last under DESC (therefore first under ASC).
    Last,
}

/// Value type of an ordering field, fixing its cursor-string codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderValueKind {
    /// 64-bit signed integer ⇄ decimal string.
    Long,
    /// UTF-8 text ⇄ itself.
    Text,
    /// UTC instant ⇄ RFC 3339 string.
    Instant,
}

/// Error returned when a recorded cursor string no longer parses under the
/// field's declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValueParseError {
    /// The text is not a decimal 64-bit integer.
    #[error("not a decimal integer: {text:?}")]
    InvalidLong {
        /// The offending cursor string.
        text: String,
    },
    /// The text is not an RFC 3339 timestamp.
    #[error("not an RFC 3339 timestamp: {text:?}")]
    InvalidInstant {
        /// The offending cursor string.
        text: String,
    },
}

/// A concrete, comparable ordering value.
///
/// Cursor payloads store these as strings so an (encrypted) cursor stays
/// human-debuggable; the codec here is exactly reversible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValue {
    /// 64-bit signed integer.
    Long(i64),
    /// UTF-8 text, compared bytewise.
    Text(String),
    /// UTC instant.
    Instant(DateTime<Utc>),
}

impl OrderValue {
    /// The kind this value belongs to.
    #[must_use]
    pub fn kind(&self) -> OrderValueKind {
        match self {
            Self::Long(_) => OrderValueKind::Long,
            Self::Text(_) => OrderValueKind::Text,
            Self::Instant(_) => OrderValueKind::Instant,
        }
    }

    /// Renders the value as its cursor string.
    #[must_use]
    pub fn to_cursor_string(&self) -> String {
        match self {
            Self::Long(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::Instant(v) => v.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Compares two values of the same kind; mismatched kinds compare equal
    /// and fall through to the next ordering field.
    fn cmp_same_kind(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Instant(a), Self::Instant(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl OrderValueKind {
    /// Parses a cursor string back into the comparable value.
    ///
    /// # Errors
    /// Returns [`OrderValueParseError`] when the text does not round-trip
    /// under this kind, the signature of a cursor minted under a different
    /// ordering declaration.
    pub fn parse_cursor_string(self, text: &str) -> Result<OrderValue, OrderValueParseError> {
        match self {
            Self::Long => text
                .parse::<i64>()
                .map(OrderValue::Long)
                .map_err(|_| OrderValueParseError::InvalidLong {
                    text: text.to_owned(),
                }),
            Self::Text => Ok(OrderValue::Text(text.to_owned())),
            Self::Instant => DateTime::parse_from_rfc3339(text)
                .map(|dt| OrderValue::Instant(dt.with_timezone(&Utc)))
                .map_err(|_| OrderValueParseError::InvalidInstant {
                    text: text.to_owned(),
                }),
        }
    }
}

/// One ordering field: name, direction, value kind, null placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderField {
    /// Field name as it appears in cursors and seek keys.
    pub name: &'static str,
    /// Scan direction.
    pub direction: OrderDirection,
    /// Value kind, fixing the cursor-string codec.
    pub kind: OrderValueKind,
    /// Null placement declaration.
    pub nulls: NullOrdering,
}

impl OrderField {
    /// Constructs a field with default (backend) null placement.
    #[must_use]
    pub fn new(name: &'static str, direction: OrderDirection, kind: OrderValueKind) -> Self {
        Self {
            name,
            direction,
            kind,
            nulls: NullOrdering::None,
        }
    }

    /// Sets an explicit null placement.
    #[must_use]
    pub fn with_nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = nulls;
        self
    }

    fn flipped(self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self
        }
    }

    /// Whether nulls sort before non-null values under this field's
    /// direction.
    fn nulls_sort_first(self) -> bool {
        match (self.nulls, self.direction) {
            // Pinned default: null below every value.
            (NullOrdering::None, OrderDirection::Asc) => true,
            (NullOrdering::None, OrderDirection::Desc) => false,
            // Declared for DESC; ASC inverts.
            (NullOrdering::First, OrderDirection::Desc) => true,
            (NullOrdering::First, OrderDirection::Asc) => false,
            (NullOrdering::Last, OrderDirection::Desc) => false,
            (NullOrdering::Last, OrderDirection::Asc) => true,
        }
    }

    /// Compares two possibly-null values under this field's direction and
    /// null placement.
    fn compare(self, a: Option<&OrderValue>, b: Option<&OrderValue>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => {
                let natural = x.cmp_same_kind(y);
                match self.direction {
                    OrderDirection::Asc => natural,
                    OrderDirection::Desc => natural.reverse(),
                }
            }
            (None, None) => Ordering::Equal,
            (None, Some(_)) => {
                if self.nulls_sort_first() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Some(_), None) => {
                if self.nulls_sort_first() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
        }
    }
}

/// Supplies ordering values for a row. `None` is a NULL for that field.
pub trait OrderSource {
    /// Returns the row's value for `field`, or `None` when the field is null
    /// or unknown to this row type.
    fn order_value(&self, field: &str) -> Option<OrderValue>;
}

/// A deduplicated, tiebroken ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    fields: Vec<OrderField>,
}

impl OrderSpec {
    /// Builds a spec from caller declarations.
    ///
    /// The first occurrence of a field name wins; later duplicates are
    /// dropped. Unless the caller already ordered by `tiebreaker` (in either
    /// direction), a final `(tiebreaker, DESC, Long)` entry is appended so
    /// every seek key names a unique position even when all caller-chosen
    /// fields tie.
    #[must_use]
    pub fn build(
        declarations: impl IntoIterator<Item = OrderField>,
        tiebreaker: &'static str,
    ) -> Self {
        let mut fields: Vec<OrderField> = Vec::new();
        for field in declarations {
            if fields.iter().all(|f| f.name != field.name) {
                fields.push(field);
            }
        }
        if fields.iter().all(|f| f.name != tiebreaker) {
            fields.push(OrderField::new(
                tiebreaker,
                OrderDirection::Desc,
                OrderValueKind::Long,
            ));
        }
        Self { fields }
    }

    /// The ordered field list.
    #[must_use]
    pub fn fields(&self) -> &[OrderField] {
        &self.fields
    }

    /// Iterates field names in spec order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Whether `name` is one of this spec's fields.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// The direction-flipped counterpart of this spec.
    ///
    /// Backward pagination executes the query against the reversed spec
    /// ("last N" becomes "first N of the reversed order") and re-reverses the
    /// fetched rows afterwards.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            fields: self.fields.iter().map(|f| f.flipped()).collect(),
        }
    }

    /// Compares two rows under this spec. The tiebreaker guarantees a total
    /// order whenever both rows expose it.
    pub fn compare<R: OrderSource>(&self, a: &R, b: &R) -> Ordering {
        for field in &self.fields {
            let ord = field.compare(
                a.order_value(field.name).as_ref(),
                b.order_value(field.name).as_ref(),
            );
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Compares a row against a seek key. The key holds values for a prefix
    /// of this spec's fields, in spec order.
    pub fn compare_to_seek<R: OrderSource>(&self, row: &R, seek: &[OrderValue]) -> Ordering {
        for (field, bound) in self.fields.iter().zip(seek) {
            let ord = field.compare(row.order_value(field.name).as_ref(), Some(bound));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Keyset predicate: is `row` strictly past the seek key in scan order?
    pub fn is_strictly_after<R: OrderSource>(&self, row: &R, seek: &[OrderValue]) -> bool {
        self.compare_to_seek(row, seek) == Ordering::Greater
    }
}
