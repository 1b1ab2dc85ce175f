// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Conformance harness for `arow-gen`.
//!
//! `build.rs` runs the generator over `schema/model.json` on every build and this crate
//! compiles the result against the hand-written types in [`model`]. If the generator
//! emits code that does not type-check against `arow-wire`, this crate fails to build.
//! The integration tests then drive the generated cores over real payloads, including
//! payloads written by one schema version and read by another.

pub mod model;

/// Serializer cores rendered by `arow-gen` at build time.
#[allow(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/arow_types.rs"));
}

/// Registry holding every generated core, both schema versions.
pub fn registry() -> arow_wire::Registry {
    arow_wire::Registry::new()
        .with::<generated::v1::BadgeArowCore>()
        .with::<generated::v1::AddressArowCore>()
        .with::<generated::v1::PersonArowCore>()
        .with::<generated::v2::AddressArowCore>()
        .with::<generated::v2::PersonArowCore>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_record_is_registered() {
        let registry = registry();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains::<model::v1::Person>());
        assert!(registry.contains::<model::v2::Address>());
    }

    #[test]
    fn key_constants_follow_backend_names() {
        assert_eq!(generated::v1::BadgeArowCore::KEY_ID.0, 0x4944);
        assert_eq!(generated::v1::BadgeArowCore::KEY_NAME.0, 0x4e4d);
        assert_eq!(generated::v1::PersonArowCore::KEY_ADDRESSES.0, 0x0041_4453);
    }
}
