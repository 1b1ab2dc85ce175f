// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serializer registry and the contract generated code implements.
//!
//! The registry is an explicit table owned by the application's composition root. Each
//! generated `*ArowCore` adds its serialize/deserialize pair in `register`; nested
//! records are written and read back through the same table, so a record type only needs
//! to be registered once no matter how many parents embed it.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use tracing::trace;

use crate::codec::{CodecError, Reader, Writer};
use crate::key::WireKey;
use crate::tag::DataTypeTag;

/// Serializer half of a registered pair.
pub type SerializeFn<T> = fn(&T, &mut Writer, &Registry) -> Result<(), CodecError>;

/// Deserializer half of a registered pair.
pub type DeserializeFn<T> = fn(&mut T, &mut Reader<'_>, &Registry) -> Result<(), CodecError>;

/// Contract emitted by the generator for each record type.
pub trait TypeSerializationCore {
    /// Record type this core serializes.
    type Row: Default + 'static;

    /// Add this core's pair to `registry`.
    fn register(registry: &mut Registry);

    /// Write every wire field of `row`, then the end-of-record marker.
    fn serialize(row: &Self::Row, w: &mut Writer, registry: &Registry) -> Result<(), CodecError>;

    /// Read fields into `row` until the end-of-record marker, skipping anything unknown.
    fn deserialize(
        row: &mut Self::Row,
        r: &mut Reader<'_>,
        registry: &Registry,
    ) -> Result<(), CodecError>;
}

/// Fieldless enum carried on the wire as its `i32` discriminant.
pub trait WireEnum: Sized {
    /// Discriminant to write.
    fn to_wire(&self) -> i32;

    /// Variant for a discriminant read back, `None` when unknown.
    fn from_wire(value: i32) -> Option<Self>;
}

impl Writer {
    /// Write an enum field as `Int32`.
    pub fn write_enum<E: WireEnum>(&mut self, key: WireKey, value: &E) -> Result<(), CodecError> {
        self.write_i32(key, value.to_wire())
    }
}

impl Reader<'_> {
    /// Read an enum payload written by [`Writer::write_enum`].
    ///
    /// A discriminant with no matching variant is consumed and yields `None`; the caller
    /// leaves the member as it was.
    pub fn read_enum<E: WireEnum>(&mut self) -> Result<Option<E>, CodecError> {
        let value = self.read_i32()?;
        let variant = E::from_wire(value);
        if variant.is_none() {
            trace!(enum_type = type_name::<E>(), value, "ignoring unknown enum value");
        }
        Ok(variant)
    }
}

struct Entry<T> {
    serialize: SerializeFn<T>,
    deserialize: DeserializeFn<T>,
}

/// Serialize/deserialize pairs keyed by record type.
#[derive(Default)]
pub struct Registry {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.entries.len())
            .finish()
    }
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the pair for `T`, replacing any earlier registration.
    pub fn register<T: 'static>(
        &mut self,
        serialize: SerializeFn<T>,
        deserialize: DeserializeFn<T>,
    ) {
        self.entries.insert(
            TypeId::of::<T>(),
            Box::new(Entry {
                serialize,
                deserialize,
            }),
        );
    }

    /// Register a generated core.
    pub fn with<C: TypeSerializationCore>(mut self) -> Self {
        C::register(&mut self);
        self
    }

    /// True when `T` has a registered pair.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry<T: 'static>(&self) -> Result<&Entry<T>, CodecError> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|e| e.downcast_ref::<Entry<T>>())
            .ok_or(CodecError::UnregisteredType(type_name::<T>()))
    }

    /// Write `row`'s fields and end marker (no key or tag; the caller frames it).
    pub fn serialize_into<T: 'static>(&self, row: &T, w: &mut Writer) -> Result<(), CodecError> {
        (self.entry::<T>()?.serialize)(row, w, self)
    }

    /// Read fields into `row` up to and including its end marker.
    pub fn deserialize_into<T: 'static>(
        &self,
        row: &mut T,
        r: &mut Reader<'_>,
    ) -> Result<(), CodecError> {
        let deserialize = self.entry::<T>()?.deserialize;
        r.nested(|r| deserialize(row, r, self))
    }

    /// Serialize a top-level record into a fresh buffer.
    pub fn to_vec<T: 'static>(&self, row: &T) -> Result<Vec<u8>, CodecError> {
        let mut w = Writer::default();
        self.serialize_into(row, &mut w)?;
        Ok(w.into_vec())
    }

    /// Deserialize a top-level record, rejecting trailing bytes.
    pub fn from_bytes<T: Default + 'static>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let mut r = Reader::new(bytes);
        let mut row = T::default();
        self.deserialize_into(&mut row, &mut r)?;
        r.finish()?;
        Ok(row)
    }

    /// Write a nested record field: key, `Row`, record, end marker.
    pub fn write_row<T: 'static>(
        &self,
        w: &mut Writer,
        key: WireKey,
        row: &T,
    ) -> Result<(), CodecError> {
        w.write_header(key, DataTypeTag::Row);
        self.serialize_into(row, w)
    }

    /// Write an array-of-records field: key, `Array`, `Row`, length, records.
    pub fn write_row_array<T: 'static>(
        &self,
        w: &mut Writer,
        key: WireKey,
        rows: &[T],
    ) -> Result<(), CodecError> {
        w.write_header(key, DataTypeTag::Array);
        w.write_tag(DataTypeTag::Row);
        w.write_len(rows.len())?;
        for row in rows {
            self.serialize_into(row, w)?;
        }
        Ok(())
    }

    /// Read a nested record into a freshly defaulted `T`.
    pub fn read_row<T: Default + 'static>(&self, r: &mut Reader<'_>) -> Result<T, CodecError> {
        let mut row = T::default();
        self.deserialize_into(&mut row, r)?;
        Ok(row)
    }

    /// Read an array-of-records body: length then records. The `Array` and `Row` tags have
    /// already been read and checked by the caller.
    pub fn read_row_vec<T: Default + 'static>(
        &self,
        r: &mut Reader<'_>,
    ) -> Result<Vec<T>, CodecError> {
        let len = r.read_array_len()?;
        let mut rows = Vec::with_capacity(len.min(r.remaining()));
        for _ in 0..len {
            rows.push(self.read_row(r)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        label: Option<String>,
    }

    const KEY_X: WireKey = WireKey(0x58);
    const KEY_LABEL: WireKey = WireKey(0x4c);

    fn serialize(row: &Point, w: &mut Writer, _registry: &Registry) -> Result<(), CodecError> {
        w.write_i32(KEY_X, row.x)?;
        match &row.label {
            Some(v) => w.write_str(KEY_LABEL, v)?,
            None => w.write_null(KEY_LABEL),
        }
        w.write_end();
        Ok(())
    }

    fn deserialize(
        row: &mut Point,
        r: &mut Reader<'_>,
        _registry: &Registry,
    ) -> Result<(), CodecError> {
        loop {
            let key = r.read_name()?;
            if key.is_end() {
                return Ok(());
            }
            let tag = r.read_tag()?;
            match key {
                KEY_X if tag == DataTypeTag::Int32 => row.x = r.read_i32()?,
                KEY_LABEL if tag == DataTypeTag::Null => row.label = None,
                KEY_LABEL if tag == DataTypeTag::String => row.label = Some(r.read_string()?),
                _ => r.consume_unmatched(key, tag, None)?,
            }
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register::<Point>(serialize, deserialize);
        registry
    }

    #[test]
    fn top_level_round_trip() {
        let registry = registry();
        let p = Point {
            x: 7,
            label: Some("p".into()),
        };
        let bytes = registry.to_vec(&p).unwrap();
        assert_eq!(registry.from_bytes::<Point>(&bytes).unwrap(), p);
    }

    #[test]
    fn nested_rows_go_through_registry() {
        let registry = registry();
        let rows = vec![Point::default(), Point { x: 3, label: None }];
        let mut w = Writer::default();
        registry.write_row_array(&mut w, WireKey(0x50), &rows).unwrap();
        let bytes = w.into_vec();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_name().unwrap(), WireKey(0x50));
        assert_eq!(r.read_tag().unwrap(), DataTypeTag::Array);
        assert_eq!(r.read_tag().unwrap(), DataTypeTag::Row);
        assert_eq!(registry.read_row_vec::<Point>(&mut r).unwrap(), rows);
        r.finish().unwrap();
    }

    #[test]
    fn unregistered_type_is_reported() {
        let registry = Registry::new();
        let err = registry.to_vec(&Point::default()).unwrap_err();
        assert!(matches!(err, CodecError::UnregisteredType(name) if name.ends_with("Point")));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let registry = registry();
        let mut bytes = registry.to_vec(&Point::default()).unwrap();
        bytes.push(0);
        assert_eq!(
            registry.from_bytes::<Point>(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
    }

    #[derive(Debug, PartialEq)]
    enum Mode {
        On,
        Off,
    }

    impl WireEnum for Mode {
        fn to_wire(&self) -> i32 {
            match self {
                Mode::On => 1,
                Mode::Off => 0,
            }
        }

        fn from_wire(value: i32) -> Option<Self> {
            match value {
                1 => Some(Mode::On),
                0 => Some(Mode::Off),
                _ => None,
            }
        }
    }

    #[test]
    fn enums_travel_as_i32() {
        let mut w = Writer::default();
        w.write_enum(WireKey(0x4d), &Mode::On).unwrap();
        w.write_i32(WireKey(0x4d), 9).unwrap();
        w.write_end();
        let bytes = w.into_vec();

        let mut r = Reader::new(&bytes);
        r.read_name().unwrap();
        assert_eq!(r.read_tag().unwrap(), DataTypeTag::Int32);
        assert_eq!(r.read_enum::<Mode>().unwrap(), Some(Mode::On));
        assert_eq!(Mode::Off.to_wire(), 0);
    }

    #[test]
    fn unknown_enum_value_is_consumed_not_rejected() {
        let mut w = Writer::default();
        w.write_i32(WireKey(0x4d), 9).unwrap();
        w.write_end();
        let bytes = w.into_vec();

        let mut r = Reader::new(&bytes);
        r.read_name().unwrap();
        r.read_tag().unwrap();
        assert_eq!(r.read_enum::<Mode>().unwrap(), None);
        assert!(r.read_name().unwrap().is_end());
        r.finish().unwrap();
    }
}
