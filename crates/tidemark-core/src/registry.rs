// SPDX-License-Identifier: Apache-2.0
//! Closed-world node type registry.
//!
//! Built exactly once at process startup from externally-discovered type
//! descriptors, validated for collisions, then published immutable. Every
//! lookup after `build()` is read-only, lock-free, and safe to share across
//! threads by reference.
//!
//! A published `(type id, type name)` pair must never be reassigned to a
//! different entity kind across deployments: global-id tokens minted under
//! the old assignment would silently resolve to the wrong entities. The code
//! cannot enforce this; treat any such reassignment as a breaking change.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use blake3::Hasher;
use thiserror::Error;

use tidemark_token::{u64_be_prefix, GlobalId, TokenCodec, TokenError};

use crate::engine::FetchError;
use crate::order::OrderSource;

/// Domain-separation suffix for derived node type ids.
const TYPE_ID_SUFFIX: &[u8] = b":tidemark-node-type";

/// Derives a stable 64-bit type id from a type name.
///
/// First 8 bytes of `blake3(name || suffix)`, big-endian. Stable across
/// rebuilds as long as the name is unchanged, with no central allocation
/// table.
#[must_use]
pub fn derive_type_id(type_name: &str) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(type_name.as_bytes());
    hasher.update(TYPE_ID_SUFFIX);
    u64_be_prefix(hasher.finalize().as_bytes())
}

/// An entity exposable as a node: it has a per-type unique key and can
/// supply ordering values for pagination.
pub trait NodeEntity: OrderSource + Any + Send + Sync {
    /// Name of the unique-key field. This is the mandatory ordering
    /// tiebreaker, so [`OrderSource::order_value`] must expose it as
    /// [`crate::OrderValue::Long`].
    const ID_FIELD: &'static str = "id";

    /// The per-type unique key.
    fn entity_id(&self) -> u64;
}

/// Externally-supplied descriptor for one node type.
///
/// Discovery is the host's concern; the registry only validates and
/// publishes what it is given.
#[derive(Debug, Clone, Copy)]
pub struct NodeTypeDescriptor {
    /// API-visible type name.
    pub type_name: &'static str,
    /// Explicit numeric id; derived from the name when absent.
    pub fixed_id: Option<u64>,
}

impl NodeTypeDescriptor {
    /// Descriptor with a derived id.
    #[must_use]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fixed_id: None,
        }
    }

    /// Pins an explicit numeric id instead of deriving one.
    #[must_use]
    pub fn with_fixed_id(mut self, id: u64) -> Self {
        self.fixed_id = Some(id);
        self
    }
}

type ErasedIdExtractor = Box<dyn Fn(&dyn Any) -> Option<u64> + Send + Sync>;

/// One registered node type: numeric id, name, entity kind, key extractor.
pub struct NodeTypeInfo {
    type_id: u64,
    type_name: &'static str,
    kind: TypeId,
    extract: ErasedIdExtractor,
}

impl std::fmt::Debug for NodeTypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTypeInfo")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl NodeTypeInfo {
    /// Numeric type id.
    #[must_use]
    pub fn type_id(&self) -> u64 {
        self.type_id
    }

    /// API-visible type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Entity kind handle.
    #[must_use]
    pub fn kind(&self) -> TypeId {
        self.kind
    }

    /// Extracts the entity key from a type-erased entity. Returns `None`
    /// when `entity` is not of this type's kind.
    #[must_use]
    pub fn entity_id_of(&self, entity: &dyn Any) -> Option<u64> {
        (self.extract)(entity)
    }
}

/// Fatal registration error, raised by [`NodeRegistryBuilder::build`].
///
/// Never produced at request time: a collision means two node types would be
/// indistinguishable inside tokens, so initialization must abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two descriptors resolved to the same numeric id.
    #[error("duplicate node type id {type_id:#018x}: {second} collides with {first}")]
    DuplicateTypeId {
        /// The colliding id.
        type_id: u64,
        /// Name registered first.
        first: &'static str,
        /// Name registered second.
        second: &'static str,
    },
    /// Two descriptors declared the same type name.
    #[error("duplicate node type name: {type_name}")]
    DuplicateTypeName {
        /// The duplicated name.
        type_name: &'static str,
    },
    /// The same entity kind was registered under two names.
    #[error("entity kind registered twice: {second} repeats {first}")]
    DuplicateEntityKind {
        /// Name registered first.
        first: &'static str,
        /// Name registered second.
        second: &'static str,
    },
}

/// A type id or name that is not in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownTypeError {
    /// Numeric id absent from the registry; stale client data or tampering.
    #[error("unknown node type id: {0:#018x}")]
    Id(u64),
    /// Name absent from the registry.
    #[error("unknown node type name: {0}")]
    Name(String),
    /// Entity kind never registered.
    #[error("entity kind not registered: {0}")]
    Kind(&'static str),
}

/// Collects type registrations, then validates and publishes the registry.
#[derive(Default)]
pub struct NodeRegistryBuilder {
    types: Vec<NodeTypeInfo>,
}

impl NodeRegistryBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a node type registration for entity kind `E`.
    ///
    /// Collisions are not checked here; [`NodeRegistryBuilder::build`]
    /// validates the closed world in one pass.
    #[must_use]
    pub fn register<E: NodeEntity>(mut self, descriptor: NodeTypeDescriptor) -> Self {
        let type_id = descriptor
            .fixed_id
            .unwrap_or_else(|| derive_type_id(descriptor.type_name));
        self.types.push(NodeTypeInfo {
            type_id,
            type_name: descriptor.type_name,
            kind: TypeId::of::<E>(),
            extract: Box::new(|entity: &dyn Any| {
                entity.downcast_ref::<E>().map(NodeEntity::entity_id)
            }),
        });
        self
    }

    /// Validates uniqueness of ids, names, and kinds, then publishes.
    ///
    /// # Errors
    /// Returns the first [`RegistryError`] found. Callers must treat this as
    /// fatal at startup.
    pub fn build(self) -> Result<NodeRegistry, RegistryError> {
        let mut by_id: HashMap<u64, usize> = HashMap::with_capacity(self.types.len());
        let mut by_name: HashMap<&'static str, usize> = HashMap::with_capacity(self.types.len());
        let mut by_kind: HashMap<TypeId, usize> = HashMap::with_capacity(self.types.len());

        for (index, info) in self.types.iter().enumerate() {
            if let Some(&prior) = by_id.get(&info.type_id) {
                return Err(RegistryError::DuplicateTypeId {
                    type_id: info.type_id,
                    first: self.types[prior].type_name,
                    second: info.type_name,
                });
            }
            if by_name.contains_key(info.type_name) {
                return Err(RegistryError::DuplicateTypeName {
                    type_name: info.type_name,
                });
            }
            if let Some(&prior) = by_kind.get(&info.kind) {
                return Err(RegistryError::DuplicateEntityKind {
                    first: self.types[prior].type_name,
                    second: info.type_name,
                });
            }
            by_id.insert(info.type_id, index);
            by_name.insert(info.type_name, index);
            by_kind.insert(info.kind, index);
        }

        Ok(NodeRegistry {
            types: self.types,
            by_id,
            by_name,
            by_kind,
        })
    }
}

/// Resolves stored entities behind global-id tokens.
///
/// Any authorization decision lives entirely inside the implementation: the
/// registry treats "absent" and "forbidden" identically, so a denied lookup
/// is indistinguishable from a missing row.
pub trait NodeFetcher {
    /// Fetches the entity for `(type_id, entity_id)`, or `None` when it does
    /// not exist or must not be shown.
    ///
    /// # Errors
    /// Returns [`FetchError`] on backend failure; the registry propagates it
    /// unchanged.
    fn fetch_node(&self, type_id: u64, entity_id: u64)
        -> Result<Option<Box<dyn Any>>, FetchError>;
}

/// Error returned by global-id resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The token references a type the registry does not know.
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
    /// The token failed to decode; no detail by design.
    #[error(transparent)]
    Decryption(#[from] TokenError),
    /// The entity accessor failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The published, immutable registry.
pub struct NodeRegistry {
    types: Vec<NodeTypeInfo>,
    by_id: HashMap<u64, usize>,
    by_name: HashMap<&'static str, usize>,
    by_kind: HashMap<TypeId, usize>,
}

impl std::fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

impl NodeRegistry {
    /// Looks up a type by numeric id.
    #[must_use]
    pub fn by_type_id(&self, type_id: u64) -> Option<&NodeTypeInfo> {
        self.by_id.get(&type_id).map(|&i| &self.types[i])
    }

    /// Looks up a type by name.
    #[must_use]
    pub fn by_type_name(&self, type_name: &str) -> Option<&NodeTypeInfo> {
        self.by_name.get(type_name).map(|&i| &self.types[i])
    }

    /// Looks up the type registered for entity kind `E`.
    #[must_use]
    pub fn by_kind<E: NodeEntity>(&self) -> Option<&NodeTypeInfo> {
        self.by_kind.get(&TypeId::of::<E>()).map(|&i| &self.types[i])
    }

    /// Looks up a type by name, failing when it is not registered.
    ///
    /// # Errors
    /// Returns [`UnknownTypeError::Name`]; for hosts resolving API-supplied
    /// type names, where absence is a caller-visible failure rather than an
    /// option.
    pub fn require_type_name(&self, type_name: &str) -> Result<&NodeTypeInfo, UnknownTypeError> {
        self.by_type_name(type_name)
            .ok_or_else(|| UnknownTypeError::Name(type_name.to_owned()))
    }

    /// Iterates registered types in registration order.
    pub fn iter_types(&self) -> impl Iterator<Item = &NodeTypeInfo> {
        self.types.iter()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Builds the global-id payload for a registered entity.
    ///
    /// # Errors
    /// Returns [`UnknownTypeError::Kind`] when `E` was never registered.
    pub fn global_id_for<E: NodeEntity>(&self, entity: &E) -> Result<GlobalId, UnknownTypeError> {
        let info = self
            .by_kind::<E>()
            .ok_or(UnknownTypeError::Kind(std::any::type_name::<E>()))?;
        Ok(GlobalId::new(info.type_id, entity.entity_id()))
    }

    /// Decodes a global-id token, validates its type against the registry,
    /// and delegates the lookup to `fetcher`.
    ///
    /// # Errors
    /// Returns [`ResolveError`] on a bad token, an unknown type id, or a
    /// backend failure. A missing (or withheld) entity is `Ok(None)`.
    pub fn resolve_global_id(
        &self,
        codec: &TokenCodec,
        fetcher: &dyn NodeFetcher,
        token: &str,
    ) -> Result<Option<Box<dyn Any>>, ResolveError> {
        let id: GlobalId = codec.decode(token)?;
        let info = self
            .by_type_id(id.type_id)
            .ok_or(UnknownTypeError::Id(id.type_id))?;
        Ok(fetcher.fetch_node(info.type_id, id.entity_id)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::order::OrderValue;

    struct Widget {
        id: u64,
    }

    impl OrderSource for Widget {
        fn order_value(&self, field: &str) -> Option<OrderValue> {
            match field {
                "id" => i64::try_from(self.id).ok().map(OrderValue::Long),
                _ => None,
            }
        }
    }

    impl NodeEntity for Widget {
        fn entity_id(&self) -> u64 {
            self.id
        }
    }

    struct Gadget {
        id: u64,
    }

    impl OrderSource for Gadget {
        fn order_value(&self, _field: &str) -> Option<OrderValue> {
            None
        }
    }

    impl NodeEntity for Gadget {
        fn entity_id(&self) -> u64 {
            self.id
        }
    }

    #[test]
    fn derived_ids_are_stable_and_name_sensitive() {
        let widget = derive_type_id("Widget");
        assert_eq!(widget, derive_type_id("Widget"));
        assert_ne!(widget, derive_type_id("widget"));
        assert_ne!(widget, derive_type_id("Gadget"));
    }

    #[test]
    fn lookups_cover_id_name_and_kind() {
        let registry = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .register::<Gadget>(NodeTypeDescriptor::new("Gadget").with_fixed_id(7))
            .build()
            .unwrap();

        let widget_id = derive_type_id("Widget");
        assert_eq!(
            registry.by_type_id(widget_id).unwrap().type_name(),
            "Widget"
        );
        assert_eq!(registry.by_type_name("Gadget").unwrap().type_id(), 7);
        assert_eq!(registry.by_kind::<Widget>().unwrap().type_id(), widget_id);
        assert!(registry.by_type_id(0xDEAD).is_none());
        assert_eq!(
            registry.require_type_name("Sprocket").unwrap_err(),
            UnknownTypeError::Name("Sprocket".to_owned())
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn erased_extractor_recovers_entity_keys() {
        let registry = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .build()
            .unwrap();
        let info = registry.by_kind::<Widget>().unwrap();

        let widget = Widget { id: 42 };
        assert_eq!(info.entity_id_of(&widget), Some(42));
        let stranger = Gadget { id: 9 };
        assert_eq!(info.entity_id_of(&stranger), None);
    }

    #[test]
    fn duplicate_fixed_ids_fail_fast() {
        let err = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget").with_fixed_id(7))
            .register::<Gadget>(NodeTypeDescriptor::new("Gadget").with_fixed_id(7))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTypeId {
                type_id: 7,
                first: "Widget",
                second: "Gadget",
            }
        );
    }

    #[test]
    fn duplicate_names_fail_fast() {
        let err = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .register::<Gadget>(NodeTypeDescriptor::new("Widget").with_fixed_id(7))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTypeName { type_name: "Widget" });
    }

    #[test]
    fn duplicate_kinds_fail_fast() {
        let err = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .register::<Widget>(NodeTypeDescriptor::new("WidgetAgain"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateEntityKind {
                first: "Widget",
                second: "WidgetAgain",
            }
        );
    }

    #[test]
    fn global_id_for_requires_registration() {
        let registry = NodeRegistryBuilder::new()
            .register::<Widget>(NodeTypeDescriptor::new("Widget"))
            .build()
            .unwrap();

        let id = registry.global_id_for(&Widget { id: 42 }).unwrap();
        assert_eq!(id.entity_id, 42);
        assert_eq!(id.type_id, derive_type_id("Widget"));

        assert!(matches!(
            registry.global_id_for(&Gadget { id: 1 }),
            Err(UnknownTypeError::Kind(_))
        ));
    }
}
