// SPDX-License-Identifier: Apache-2.0
//! Transient token payload types.
//!
//! Payloads exist only inside a single encode or decode call; their
//! long-lived form is always the opaque token string. Both types serialize as
//! CBOR maps with single-character field tags, so a token decoded against an
//! evolved schema fails in the deserializer instead of misreading fields
//! positionally.

use serde::{Deserialize, Serialize};

/// Names an entity across its whole type space: `(type id, per-type key)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalId {
    /// Numeric node type id, as assigned by the registry.
    #[serde(rename = "t")]
    pub type_id: u64,
    /// Entity key, unique within the type.
    #[serde(rename = "i")]
    pub entity_id: u64,
}

impl GlobalId {
    /// Constructs a global id payload.
    #[must_use]
    pub fn new(type_id: u64, entity_id: u64) -> Self {
        Self { type_id, entity_id }
    }
}

/// Names a position inside an ordered result sequence.
///
/// Field order is the order of the ordering spec that produced the cursor and
/// is significant: seek values are replayed in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CursorPayload {
    /// Numeric node type id the cursor belongs to.
    #[serde(rename = "t")]
    type_id: u64,
    /// Ordered `(field name, cursor string)` pairs.
    #[serde(rename = "f")]
    fields: Vec<(String, String)>,
}

impl CursorPayload {
    /// Constructs a cursor payload from ordered field pairs.
    #[must_use]
    pub fn new(type_id: u64, fields: Vec<(String, String)>) -> Self {
        Self { type_id, fields }
    }

    /// The node type id recorded in the cursor.
    #[must_use]
    pub fn type_id(&self) -> u64 {
        self.type_id
    }

    /// The ordered field pairs recorded in the cursor.
    #[must_use]
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Iterates the recorded field names in cursor order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the recorded value for `name`, if present.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}
