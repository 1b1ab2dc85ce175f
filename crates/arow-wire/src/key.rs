// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packed field keys.
//!
//! A backend name of up to eight Latin-1 characters is packed into a `u64`, one byte per
//! character, big-endian over the character sequence: `"ID"` becomes `0x4944`. Shorter
//! names are left-padded with implicit zero bytes, which is what lets [`WireKey::decode`]
//! stop at the first zero byte it meets while walking up from the low end.
//!
//! Key `0` is reserved. It terminates a record on the wire and is never a field key.

use thiserror::Error;

/// Maximum backend name length, in characters.
pub const MAX_NAME_LEN: usize = 8;

/// Errors produced while packing a backend name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Name has more than [`MAX_NAME_LEN`] characters.
    #[error("backend name `{name}` is longer than {MAX_NAME_LEN} characters")]
    TooLong {
        /// The rejected name.
        name: String,
    },
    /// Name contains a character outside `0x01..=0xFF`.
    #[error("backend name `{name}` contains {ch:?}, which is not a non-NUL Latin-1 character")]
    NotLatin1 {
        /// The rejected name.
        name: String,
        /// First offending character.
        ch: char,
    },
}

/// 64-bit packed field identifier.
///
/// The inner value is public so generated code can declare keys as constants and match
/// on them; `Display` renders the decoded backend name.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct WireKey(pub u64);

impl WireKey {
    /// End-of-record marker.
    pub const END: WireKey = WireKey(0);

    /// Pack a backend name.
    ///
    /// The empty string packs to [`WireKey::END`].
    pub fn encode(name: &str) -> Result<Self, KeyError> {
        let mut packed = 0u64;
        for (i, ch) in name.chars().enumerate() {
            if i >= MAX_NAME_LEN {
                return Err(KeyError::TooLong {
                    name: name.to_owned(),
                });
            }
            let code = u32::from(ch);
            if code == 0 || code > 0xFF {
                return Err(KeyError::NotLatin1 {
                    name: name.to_owned(),
                    ch,
                });
            }
            packed = (packed << 8) | u64::from(code);
        }
        Ok(Self(packed))
    }

    /// Unpack back into the backend name.
    pub fn decode(self) -> String {
        let low_first = self.0.to_le_bytes();
        let mut chars: Vec<char> = low_first
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect();
        chars.reverse();
        chars.into_iter().collect()
    }

    /// True for the end-of-record marker.
    pub fn is_end(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WireKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_end() {
            f.write_str("<end>")
        } else {
            write!(f, "'{}'", self.decode())
        }
    }
}

impl From<WireKey> for u64 {
    fn from(key: WireKey) -> Self {
        key.0
    }
}
