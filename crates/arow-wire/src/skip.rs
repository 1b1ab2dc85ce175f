// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Unknown-field skipping.
//!
//! Every tag carries enough self-description to compute its own payload length: fixed
//! scalars have a fixed width, strings and bytes are length-prefixed, arrays carry an
//! element tag and a count, and rows end at key 0. That lets a reader built from any
//! schema version step over a value it cannot map to a field and land on the next key.

use tracing::trace;

use crate::codec::{CodecError, Reader};
use crate::key::WireKey;
use crate::tag::DataTypeTag;

impl Reader<'_> {
    /// Discard the value of a field the read loop did not accept.
    ///
    /// `tag` is the field tag already consumed. For arrays whose element tag was also
    /// consumed before the mismatch was noticed, pass it as `inner` so it is not read a
    /// second time.
    pub fn consume_unmatched(
        &mut self,
        key: WireKey,
        tag: DataTypeTag,
        inner: Option<DataTypeTag>,
    ) -> Result<(), CodecError> {
        trace!(%key, %tag, ?inner, offset = self.position(), "skipping unmatched field");
        match (tag, inner) {
            (DataTypeTag::Array, Some(element)) => self.nested(|r| r.skip_array_body(element)),
            _ => self.skip_value(tag),
        }
    }

    /// Discard one payload of type `tag`.
    ///
    /// Rows and arrays each count against the reader's nesting limit, so an array of
    /// arrays fails with [`CodecError::NestingTooDeep`] before it can exhaust the stack.
    pub fn skip_value(&mut self, tag: DataTypeTag) -> Result<(), CodecError> {
        if let Some(width) = tag.fixed_width() {
            self.take(width)?;
            return Ok(());
        }
        match tag {
            DataTypeTag::String | DataTypeTag::Bytes => {
                self.read_len_prefixed()?;
                Ok(())
            }
            DataTypeTag::Row => self.skip_row(),
            DataTypeTag::Array => self.nested(|r| {
                let element = r.read_tag()?;
                r.skip_array_body(element)
            }),
            _ => Ok(()),
        }
    }

    /// Discard a complete nested record, including its end marker.
    pub fn skip_row(&mut self) -> Result<(), CodecError> {
        self.nested(|r| loop {
            let key = r.read_name()?;
            if key.is_end() {
                return Ok(());
            }
            let tag = r.read_tag()?;
            r.skip_value(tag)?;
        })
    }

    fn skip_array_body(&mut self, element: DataTypeTag) -> Result<(), CodecError> {
        let len = self.read_array_len()?;
        if let Some(width) = element.fixed_width() {
            let total = width.checked_mul(len).ok_or(CodecError::LengthTooLarge)?;
            self.take(total)?;
            return Ok(());
        }
        for _ in 0..len {
            self.skip_value(element)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::Writer;

    fn skip_then_expect_end(bytes: &[u8]) {
        let mut r = Reader::new(bytes);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        r.consume_unmatched(key, tag, None).unwrap();
        assert!(r.read_name().unwrap().is_end());
        r.finish().unwrap();
    }

    #[test]
    fn skips_fixed_and_prefixed_scalars() {
        let mut w = Writer::default();
        w.write_i64(WireKey(0x58), 9).unwrap();
        w.write_end();
        skip_then_expect_end(w.as_bytes());

        let mut w = Writer::default();
        w.write_str(WireKey(0x58), "unknown").unwrap();
        w.write_end();
        skip_then_expect_end(w.as_bytes());

        let mut w = Writer::default();
        w.write_null(WireKey(0x58));
        w.write_end();
        skip_then_expect_end(w.as_bytes());
    }

    #[test]
    fn skips_nested_rows_and_arrays() {
        let mut w = Writer::default();
        w.write_header(WireKey(0x52), DataTypeTag::Row);
        w.write_str(WireKey(0x41), "x").unwrap();
        w.write_array(WireKey(0x42), &["a".to_owned(), "b".to_owned()])
            .unwrap();
        w.write_header(WireKey(0x43), DataTypeTag::Row);
        w.write_end();
        w.write_end();
        w.write_end();
        skip_then_expect_end(w.as_bytes());

        let mut w = Writer::default();
        w.write_header(WireKey(0x52), DataTypeTag::Array);
        w.write_tag(DataTypeTag::Row);
        w.write_len(2).unwrap();
        w.write_u8(WireKey(0x41), 1).unwrap();
        w.write_end();
        w.write_end();
        w.write_end();
        skip_then_expect_end(w.as_bytes());
    }

    #[test]
    fn honours_already_consumed_element_tag() {
        let mut w = Writer::default();
        w.write_array(WireKey(0x4c), &[1i32, 2, 3]).unwrap();
        w.write_end();
        let bytes = w.into_vec();

        let mut r = Reader::new(&bytes);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        let element = r.read_tag().unwrap();
        assert_eq!(element, DataTypeTag::Int32);
        r.consume_unmatched(key, tag, Some(element)).unwrap();
        assert!(r.read_name().unwrap().is_end());
    }

    fn nested_arrays(levels: usize) -> Vec<u8> {
        let mut w = Writer::default();
        w.write_header(WireKey(0x58), DataTypeTag::Array);
        for _ in 0..levels {
            w.write_tag(DataTypeTag::Array);
            w.write_len(1).unwrap();
        }
        w.write_tag(DataTypeTag::Null);
        w.write_len(0).unwrap();
        w.write_end();
        w.into_vec()
    }

    #[test]
    fn skips_shallow_arrays_of_arrays() {
        skip_then_expect_end(&nested_arrays(8));

        let bytes = nested_arrays(8);
        let mut r = Reader::new(&bytes);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        let element = r.read_tag().unwrap();
        r.consume_unmatched(key, tag, Some(element)).unwrap();
        assert!(r.read_name().unwrap().is_end());
    }

    #[test]
    fn deep_array_nesting_hits_the_depth_limit() {
        let bytes = nested_arrays(100_000);
        let mut r = Reader::new(&bytes);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        assert_eq!(
            r.consume_unmatched(key, tag, None),
            Err(CodecError::NestingTooDeep(64))
        );

        let mut r = Reader::new(&bytes);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        let element = r.read_tag().unwrap();
        assert_eq!(
            r.consume_unmatched(key, tag, Some(element)),
            Err(CodecError::NestingTooDeep(64))
        );
    }

    #[test]
    fn truncated_value_is_an_error() {
        let mut w = Writer::default();
        w.write_u64(WireKey(0x58), 1).unwrap();
        let bytes = w.into_vec();
        let mut r = Reader::new(&bytes[..bytes.len() - 1]);
        let key = r.read_name().unwrap();
        let tag = r.read_tag().unwrap();
        assert_eq!(
            r.consume_unmatched(key, tag, None),
            Err(CodecError::OutOfBounds)
        );
    }
}
