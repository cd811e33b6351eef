// SPDX-License-Identifier: Apache-2.0
//! tidemark-token: opaque token wire layer.
//!
//! Every entity Tidemark exposes travels as one of two opaque strings: a
//! **global id** naming `(type, key)` across the whole type space, and a
//! **cursor** naming a position inside an ordered result sequence. Both are
//! produced by the same deterministic pipeline: a typed CBOR payload, an IV
//! derived from the plaintext under a domain salt, an authenticated cipher,
//! and a domain-specific base64 alphabet.
//!
//! Determinism is load-bearing: identical payloads must yield byte-identical
//! tokens so clients and caches can key on them. The cost is that token
//! equality reveals payload equality; see [`TokenCodec`] for the contract.
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

mod cipher;
mod keys;
mod payload;
mod token;
mod wire;

/// Abstract authenticated-cipher capability and the default AES-GCM backend.
pub use cipher::{Cipher, CipherError, IV_LEN, KEY_LEN};
#[cfg(feature = "aes")]
pub use cipher::AesGcmCipher;
/// Key/salt configuration for the two token security domains.
pub use keys::{DomainKeys, KeyConfigError, TokenKeyring};
/// Transient token payload types.
pub use payload::{CursorPayload, GlobalId};
/// Deterministic AEAD token codec.
pub use token::{Alphabet, TokenCodec, TokenError};
/// Fixed-width integer and base64 text helpers.
pub use wire::{put_u64_be, read_u64_be, u64_be_prefix, WireError};
