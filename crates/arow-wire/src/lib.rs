// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arow wire format runtime.
//!
//! A record on the wire is a run of `(key, tag, payload)` triples ended by key `0`:
//!
//! ```text
//! record   := field* END
//! field    := key:uleb128 tag:u8 payload
//! END      := 0x00
//! payload  := scalar | Null(empty) | Row(record) | Array(elem_tag:u8 len:uleb128 elem*)
//! ```
//!
//! Keys are backend names packed by [`WireKey::encode`]. Tags are self-describing, so a
//! reader can always step over a field it does not know (see [`Reader::consume_unmatched`]).
//!
//! This crate is what code produced by `arow-gen` links against: the field primitives on
//! [`Writer`] and [`Reader`], the [`Registry`] of per-type serializers, and the
//! [`TypeSerializationCore`] contract each generated core implements.

pub mod codec;
pub mod key;
pub mod registry;
pub mod scalar;
mod skip;
pub mod tag;

pub use codec::{CodecError, Reader, ReaderLimits, Writer, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LEN};
pub use key::{KeyError, WireKey, MAX_NAME_LEN};
pub use registry::{DeserializeFn, Registry, SerializeFn, TypeSerializationCore, WireEnum};
pub use scalar::{Scalar, WireScalar};
pub use tag::DataTypeTag;

// Generated code spells DateTime and Guid types through these paths.
pub use time;
pub use uuid;
