// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generator errors.
//!
//! Every error aborts the whole run. Generation is offline and re-runnable, so there is
//! no partial-success mode and nothing is retried.

use std::path::PathBuf;

use arow_wire::{CodecError, KeyError};
use thiserror::Error;

/// Errors produced while loading schemas, planning, rendering or storing output.
#[derive(Debug, Error)]
pub enum GenError {
    /// The schema source is structurally invalid.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// Configured output root does not exist.
    #[error("output root path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    /// A backend name cannot be packed into a wire key.
    #[error("{record}.{field}: {source}")]
    NameEncoding {
        /// Record the field belongs to.
        record: String,
        /// Field member name.
        field: String,
        /// Underlying packing error.
        #[source]
        source: KeyError,
    },
    /// Field type matches neither the mapping table nor any structural rule.
    #[error("{record}.{field}: member type `{ty}` is not supported")]
    UnsupportedMemberType {
        /// Record the field belongs to.
        record: String,
        /// Field member name.
        field: String,
        /// Offending type expression.
        ty: String,
    },
    /// Two participating fields of one record pack to the same key.
    #[error("{record}: fields `{first}` and `{second}` share wire key {key}")]
    DuplicateWireKey {
        /// Record both fields belong to.
        record: String,
        /// Decoded key both fields map to.
        key: String,
        /// Field declared first.
        first: String,
        /// Field declared second.
        second: String,
    },
    /// A member, record or namespace name is not a usable Rust identifier.
    #[error("`{0}` is not a valid Rust identifier")]
    InvalidIdentifier(String),
    /// IR carries a version this generator does not understand.
    #[error("Unsupported ir_version `{0}`")]
    UnsupportedIrVersion(String),
    /// IR carries no version at all.
    #[error("Missing ir_version")]
    MissingIrVersion,
    /// IR is not valid JSON for the expected shape.
    #[error("schema IR: {0}")]
    Ir(#[from] serde_json::Error),
    /// Synthesized tokens did not form a valid Rust file.
    #[error("render: {0}")]
    Render(#[from] syn::Error),
    /// Reading configuration or writing an output unit failed.
    #[error("{}: {source}", .path.display())]
    Storage {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Wire encode/decode failure in the dynamic codec.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}
