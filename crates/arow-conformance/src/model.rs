// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Record types described by `schema/model.json`, in two schema versions.

macro_rules! wire_enum {
    (
        $name:ident {
            $first:ident = $first_value:literal $(, $variant:ident = $value:literal)* $(,)?
        }
    ) => {
        /// Membership level, carried as its `i32` discriminant.
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub enum $name {
            #[default]
            $first = $first_value,
            $($variant = $value,)*
        }

        impl ::arow_wire::WireEnum for $name {
            fn to_wire(&self) -> i32 {
                *self as i32
            }

            fn from_wire(value: i32) -> Option<Self> {
                match value {
                    $first_value => Some(Self::$first),
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

/// First schema version.
pub mod v1 {
    use std::time::Duration;

    use arow_wire::time::OffsetDateTime;
    use arow_wire::uuid::Uuid;

    wire_enum!(Level { Basic = 0, Silver = 1, Gold = 2 });

    /// Smallest record: one plain and one nullable field.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Badge {
        /// `ID`
        pub id: i32,
        /// `NM`
        pub name: Option<String>,
    }

    /// Postal address.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        /// `ST`
        pub street: String,
        /// `CT`
        pub city: Option<String>,
    }

    /// Person with one member of every field kind.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        /// `ID`
        pub id: i32,
        /// `NM`
        pub name: Option<String>,
        /// `AG`
        pub age: u8,
        /// `LV`
        pub level: Level,
        /// `HM`
        pub home: Option<Box<Address>>,
        /// `ADS`
        pub addresses: Option<Box<[Address]>>,
        /// `HS`
        pub history: Option<Vec<Address>>,
        /// `SC`
        pub scores: Option<Box<[i32]>>,
        /// `NN`
        pub nicknames: Option<Vec<String>>,
        /// `BN`
        pub born: Option<OffsetDateTime>,
        /// `UP`
        pub uptime: Duration,
        /// `TK`
        pub token: Option<Uuid>,
        /// `AV`
        pub avatar: Option<Vec<u8>>,
        /// `RT`
        pub rating: f64,
        /// `IN`
        pub initial: char,
        /// `AC`
        pub active: bool,
        /// Never serialized.
        pub memo: String,
    }
}

/// Second schema version: fields added, removed, reordered and retyped.
pub mod v2 {
    wire_enum!(Level { Basic = 0, Silver = 1, Gold = 2, Platinum = 3 });

    /// Address without `city`, with `zip`.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        /// `ST`
        pub street: String,
        /// `ZP`
        pub zip: Option<u32>,
    }

    /// Person as seen by newer readers.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        /// `EM`, new in this version.
        pub email: Option<String>,
        /// `NM`
        pub name: Option<String>,
        /// `ID`
        pub id: i32,
        /// `AG`, widened from `u8`; the tag changes, so old values are skipped.
        pub age: i64,
        /// `LV`, now optional.
        pub level: Option<Level>,
        /// `HM`
        pub home: Option<Box<Address>>,
        /// `ADS`, now a list.
        pub addresses: Option<Vec<Address>>,
        /// `RT`
        pub rating: f64,
    }
}
