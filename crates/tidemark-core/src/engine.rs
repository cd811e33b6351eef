// SPDX-License-Identifier: Apache-2.0
//! The pagination engine.
//!
//! One call drives the whole state machine: validate the request parameters,
//! resolve direction and fetch count, build the order spec, decode the seek
//! cursor, delegate the keyset fetch, and assemble the connection envelope.
//! Nothing is fetched before every validation has passed, so a rejected
//! request has no side effects.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use tidemark_token::{CursorPayload, TokenCodec, TokenError};

use crate::connection::{Connection, Edge};
use crate::order::{OrderField, OrderSpec, OrderValue, OrderValueKind};
use crate::registry::{NodeEntity, NodeRegistry, UnknownTypeError};

/// Failure inside a query executor or entity accessor, propagated unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Backend failure detail, opaque to the engine.
    #[error("backend failure: {0}")]
    Backend(String),
}

/// One fetched window of rows, ordered per the executed spec.
///
/// The two flags describe the window relative to the *query's own* direction:
/// whether rows exist before the window and after it under the spec the
/// executor was given. The engine translates them into page flags for the
/// originally requested order.
#[derive(Debug, Clone)]
pub struct FetchPage<E> {
    /// Up to `count` rows, ordered exactly per the executed spec.
    pub rows: Vec<E>,
    /// Rows exist before this window under the executed spec.
    pub has_more_before: bool,
    /// Rows exist after this window under the executed spec.
    pub has_more_after: bool,
}

/// Keyset-capable query backend.
///
/// Implementations must order rows exactly per `spec` and, when `seek` is
/// given, skip every row not strictly past the seek key in scan order
/// ([`OrderSpec::is_strictly_after`] is the reference predicate). The engine
/// imposes no timeout or retry; an error is returned to the caller as-is.
pub trait QueryExecutor<E> {
    /// Fetches up to `count` rows past `seek` under `spec`.
    ///
    /// # Errors
    /// Returns [`FetchError`] on backend failure.
    fn fetch(
        &self,
        spec: &OrderSpec,
        seek: Option<&[OrderValue]>,
        count: usize,
    ) -> Result<FetchPage<E>, FetchError>;
}

/// A stale or foreign cursor: it authenticated, but its recorded ordering no
/// longer matches the request. The client must discard it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorMismatchError {
    /// The cursor was minted for a different node type.
    #[error("cursor type {found:#018x} does not match paginated type {expected:#018x}")]
    TypeMismatch {
        /// Type id of the entity being paginated.
        expected: u64,
        /// Type id recorded in the cursor.
        found: u64,
    },
    /// The cursor records a field the current ordering does not contain;
    /// the ordering changed since the cursor was minted.
    #[error("cursor field {field:?} is not part of the current ordering")]
    UnknownField {
        /// The foreign field name.
        field: String,
    },
    /// A recorded value no longer parses under the field's declared kind.
    #[error("cursor value for {field:?} no longer parses as {kind:?}")]
    StaleValue {
        /// Field whose value failed to parse.
        field: String,
        /// Kind the current ordering declares for it.
        kind: OrderValueKind,
    },
}

/// Errors surfaced by [`Paginator::paginate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginateError {
    /// Mutually exclusive parameters were both supplied: a caller bug,
    /// recoverable by correcting the request.
    #[error("conflicting pagination parameters: {first} and {second}")]
    Validation {
        /// First conflicting parameter name.
        first: &'static str,
        /// Second conflicting parameter name.
        second: &'static str,
    },
    /// The requested page size exceeds the configured maximum. Nothing was
    /// fetched; the caller must retry with a smaller request.
    #[error("requested page size {requested} exceeds limit {limit}")]
    LimitExceeded {
        /// Page size the caller asked for.
        requested: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// The paginated entity type, or a type referenced by a cursor, is not
    /// registered.
    #[error(transparent)]
    UnknownType(#[from] UnknownTypeError),
    /// The cursor does not match the current ordering.
    #[error(transparent)]
    CursorMismatch(#[from] CursorMismatchError),
    /// The token failed to decode; deliberately without detail.
    #[error(transparent)]
    Decryption(#[from] TokenError),
    /// The query executor failed; propagated unchanged.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Relay-style pagination parameters.
///
/// `first`/`after` page forward, `last`/`before` page backward; the four
/// cross-combinations listed in [`PaginateError::Validation`] are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Forward page size.
    pub first: Option<u32>,
    /// Backward page size.
    pub last: Option<u32>,
    /// Exclusive lower bound cursor for forward pagination.
    pub after: Option<String>,
    /// Exclusive upper bound cursor for backward pagination.
    pub before: Option<String>,
}

impl PageRequest {
    /// Forward request: `first` rows after `after`.
    #[must_use]
    pub fn forward(first: u32, after: Option<String>) -> Self {
        Self {
            first: Some(first),
            after,
            ..Self::default()
        }
    }

    /// Backward request: `last` rows before `before`.
    #[must_use]
    pub fn backward(last: u32, before: Option<String>) -> Self {
        Self {
            last: Some(last),
            before,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// The pagination engine: registry, cursor codec, and page-size policy.
///
/// One instance per paginated API surface, built at startup and shared by
/// reference; every call operates on request-scoped data only.
#[derive(Debug, Clone)]
pub struct Paginator {
    registry: Arc<NodeRegistry>,
    cursor_codec: TokenCodec,
    max_page_size: usize,
}

impl Paginator {
    /// Constructs an engine. `max_page_size` caps `first`/`last` and doubles
    /// as the default count when neither is given.
    #[must_use]
    pub fn new(registry: Arc<NodeRegistry>, cursor_codec: TokenCodec, max_page_size: usize) -> Self {
        Self {
            registry,
            cursor_codec,
            max_page_size,
        }
    }

    /// The configured page-size cap.
    #[must_use]
    pub fn max_page_size(&self) -> usize {
        self.max_page_size
    }

    /// Runs one pagination request for entity type `E`.
    ///
    /// # Errors
    /// Returns [`PaginateError`]; see its variants for the taxonomy. No
    /// executor call is made unless validation, limit, and cursor checks all
    /// pass.
    pub fn paginate<E, X>(
        &self,
        request: &PageRequest,
        declarations: impl IntoIterator<Item = OrderField>,
        executor: &X,
    ) -> Result<Connection<E>, PaginateError>
    where
        E: NodeEntity,
        X: QueryExecutor<E>,
    {
        validate_exclusive(request)?;

        let direction = resolve_direction(request);
        let count = self.resolve_count(request, direction)?;

        let spec = OrderSpec::build(declarations, E::ID_FIELD);
        let effective = match direction {
            Direction::Forward => spec.clone(),
            Direction::Backward => spec.reversed(),
        };

        let type_id = self
            .registry
            .by_kind::<E>()
            .ok_or(UnknownTypeError::Kind(std::any::type_name::<E>()))?
            .type_id();

        let cursor_token = match direction {
            Direction::Forward => request.after.as_deref(),
            Direction::Backward => request.before.as_deref(),
        };
        let seek = cursor_token
            .map(|token| self.decode_seek(token, type_id, &effective))
            .transpose()?;

        debug!(?direction, count, fields = spec.fields().len(), "page window resolved");

        let page = executor.fetch(&effective, seek.as_deref(), count)?;
        trace!(
            rows = page.rows.len(),
            more_before = page.has_more_before,
            more_after = page.has_more_after,
            "rows fetched"
        );

        let mut rows = page.rows;
        if direction == Direction::Backward {
            // Return edges in the originally requested order.
            rows.reverse();
        }

        let (has_previous_page, has_next_page) = match direction {
            // A fresh forward scan from the start has no predecessor by
            // definition, whatever the executor signals.
            Direction::Forward => (
                request.after.is_some() && page.has_more_before,
                page.has_more_after,
            ),
            Direction::Backward => (page.has_more_after, page.has_more_before),
        };

        let mut edges = Vec::with_capacity(rows.len());
        for node in rows {
            let cursor = self.encode_row_cursor(type_id, &spec, &node)?;
            edges.push(Edge { cursor, node });
        }
        Ok(Connection::assemble(edges, has_previous_page, has_next_page))
    }

    /// Encodes a row's cursor from the requested (forward) spec, so the
    /// token is valid as `after` and `before` alike under the same ordering.
    fn encode_row_cursor<E: NodeEntity>(
        &self,
        type_id: u64,
        spec: &OrderSpec,
        node: &E,
    ) -> Result<String, PaginateError> {
        let fields = spec
            .fields()
            .iter()
            .map(|field| {
                let value = node
                    .order_value(field.name)
                    .map_or_else(String::new, |v| v.to_cursor_string());
                (field.name.to_owned(), value)
            })
            .collect();
        let payload = CursorPayload::new(type_id, fields);
        Ok(self.cursor_codec.encode(&payload)?)
    }

    fn resolve_count(
        &self,
        request: &PageRequest,
        direction: Direction,
    ) -> Result<usize, PaginateError> {
        let requested = match direction {
            Direction::Forward => request.first,
            Direction::Backward => request.last,
        };
        let count = requested.map_or(self.max_page_size, |n| {
            usize::try_from(n).unwrap_or(usize::MAX)
        });
        if count > self.max_page_size {
            return Err(PaginateError::LimitExceeded {
                requested: count,
                limit: self.max_page_size,
            });
        }
        Ok(count)
    }

    /// Decodes a cursor and rebuilds the seek key under `effective`, the
    /// spec the query will actually execute.
    fn decode_seek(
        &self,
        token: &str,
        type_id: u64,
        effective: &OrderSpec,
    ) -> Result<Vec<OrderValue>, PaginateError> {
        let payload: CursorPayload = self.cursor_codec.decode(token)?;

        if self.registry.by_type_id(payload.type_id()).is_none() {
            return Err(UnknownTypeError::Id(payload.type_id()).into());
        }
        if payload.type_id() != type_id {
            return Err(CursorMismatchError::TypeMismatch {
                expected: type_id,
                found: payload.type_id(),
            }
            .into());
        }
        for name in payload.field_names() {
            if !effective.contains(name) {
                return Err(CursorMismatchError::UnknownField {
                    field: name.to_owned(),
                }
                .into());
            }
        }

        // Seek values in spec order; a cursor minted under the same ordering
        // covers every field, an older one yields a shorter prefix.
        let mut seek = Vec::with_capacity(effective.fields().len());
        for field in effective.fields() {
            let Some(text) = payload.value_of(field.name) else {
                break;
            };
            let value = field.kind.parse_cursor_string(text).map_err(|_| {
                CursorMismatchError::StaleValue {
                    field: field.name.to_owned(),
                    kind: field.kind,
                }
            })?;
            seek.push(value);
        }
        Ok(seek)
    }
}

fn validate_exclusive(request: &PageRequest) -> Result<(), PaginateError> {
    let conflicts: [(&'static str, bool, &'static str, bool); 4] = [
        ("first", request.first.is_some(), "last", request.last.is_some()),
        ("after", request.after.is_some(), "before", request.before.is_some()),
        ("first", request.first.is_some(), "before", request.before.is_some()),
        ("last", request.last.is_some(), "after", request.after.is_some()),
    ];
    for (first, first_set, second, second_set) in conflicts {
        if first_set && second_set {
            return Err(PaginateError::Validation { first, second });
        }
    }
    Ok(())
}

fn resolve_direction(request: &PageRequest) -> Direction {
    if request.last.is_some() || request.before.is_some() {
        Direction::Backward
    } else {
        Direction::Forward
    }
}
