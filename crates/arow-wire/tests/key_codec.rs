// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests for backend-name packing.

#![allow(clippy::unwrap_used)]

use arow_wire::{KeyError, WireKey};
use proptest::prelude::*;

fn latin1_char() -> impl Strategy<Value = char> {
    (1u8..=0xFF).prop_map(char::from)
}

proptest! {
    #[test]
    fn decode_inverts_encode(chars in prop::collection::vec(latin1_char(), 0..=8)) {
        let name: String = chars.into_iter().collect();
        let key = WireKey::encode(&name).unwrap();
        prop_assert_eq!(key.decode(), name.clone());
        prop_assert_eq!(key.is_end(), name.is_empty());
    }

    #[test]
    fn names_longer_than_eight_fail(chars in prop::collection::vec(latin1_char(), 9..32)) {
        let name: String = chars.into_iter().collect();
        let too_long = matches!(WireKey::encode(&name), Err(KeyError::TooLong { .. }));
        prop_assert!(too_long);
    }

    #[test]
    fn non_latin1_fails(prefix in "[a-z]{0,3}", wide in 0x100u32..0x2000) {
        let ch = char::from_u32(wide).unwrap_or('\u{100}');
        let name = format!("{prefix}{ch}");
        let rejected = matches!(WireKey::encode(&name), Err(KeyError::NotLatin1 { .. }));
        prop_assert!(rejected);
    }

    #[test]
    fn distinct_names_get_distinct_keys(
        a in prop::collection::vec(latin1_char(), 1..=8),
        b in prop::collection::vec(latin1_char(), 1..=8),
    ) {
        prop_assume!(a != b);
        let a: String = a.into_iter().collect();
        let b: String = b.into_iter().collect();
        prop_assert_ne!(WireKey::encode(&a).unwrap(), WireKey::encode(&b).unwrap());
    }
}

#[test]
fn decode_zero_is_empty() {
    assert_eq!(WireKey(0).decode(), "");
}
