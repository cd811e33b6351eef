// SPDX-License-Identifier: Apache-2.0
//! tidemark-core: node type registry, order/seek abstraction, and the keyset
//! pagination engine.
//!
//! Tidemark exposes stored entities through two opaque tokens, a global id
//! naming `(type, key)` and a cursor naming a position in an ordered result
//! sequence, and pages result sets by seek key rather than offset. This
//! crate owns everything above the token wire layer: the closed-world type
//! registry built once at startup, the ordering spec with its mandatory
//! unique tiebreaker, and the engine that validates a page request, decodes
//! its seek cursor, delegates the bounded fetch, and assembles the
//! connection envelope.
//!
//! Storage, authorization, and the API framework stay outside: the engine
//! talks to them through the [`QueryExecutor`] and [`NodeFetcher`]
//! collaborator traits only.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::cognitive_complexity,
    clippy::option_if_let_else,
    clippy::doc_markdown,
    clippy::too_long_first_doc_paragraph,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::similar_names
)]

mod connection;
mod engine;
mod order;
mod registry;

/// Paginated result envelope types.
pub use connection::{Connection, Edge, PageInfo};
/// Pagination engine, request parameters, and collaborator contracts.
pub use engine::{
    CursorMismatchError, FetchError, FetchPage, PageRequest, PaginateError, Paginator,
    QueryExecutor,
};
/// Ordering declarations and seek-key support.
pub use order::{
    NullOrdering, OrderDirection, OrderField, OrderSource, OrderSpec, OrderValue,
    OrderValueKind, OrderValueParseError,
};
/// Node type registry and global-id resolution.
pub use registry::{
    derive_type_id, NodeEntity, NodeFetcher, NodeRegistry, NodeRegistryBuilder,
    NodeTypeDescriptor, NodeTypeInfo, RegistryError, ResolveError, UnknownTypeError,
};
/// Token layer types that appear in this crate's public API.
pub use tidemark_token::{CursorPayload, GlobalId, TokenCodec, TokenError, TokenKeyring};
