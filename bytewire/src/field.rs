/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! [`WireField`]: the trait every value that can occupy a record field implements.
//!
//! A derived [`crate::record::Record`] impl never matches on a field's type to decide how
//! to write or read it; it simply calls `FieldType::TAG`, `FieldType::write`, and
//! `FieldType::read` and lets monomorphization produce one specialized procedure per field
//! type, per the dispatcher strategy this crate follows throughout (see
//! [`crate::record`]). The schema-metadata associated constants (`ELEMENT_TAG`, `KEY_TAG`,
//! `nested_schema`) default to "not a container/record", and are overridden only by the
//! container and record-blanket impls that need them.

use std::sync::Arc;

use crate::error::{FormatError, WriteError};
use crate::reader::ByteReader;
use crate::schema::Schema;
use crate::tag::Tag;
use crate::writer::ByteWriter;

pub trait WireField: Sized {
    /// The tag this type carries on the wire whenever a value of this type is present.
    const TAG: Tag;
    /// For sequence- and set-like containers, the tag of their elements.
    const ELEMENT_TAG: Option<Tag> = None;
    /// For `Map`, the tag of its keys.
    const KEY_TAG: Option<Tag> = None;

    /// The nested schema of a `Record`-tagged type, or of a container whose elements (or,
    /// for `Map`, values) are records. `None` for everything else.
    fn nested_schema() -> Option<Result<Arc<Schema>, crate::error::SchemaError>> {
        None
    }

    /// For `Map`, the nested schema of a `Record`-tagged key type. `None` for everything
    /// else, including every non-`Map` container.
    fn key_nested_schema() -> Option<Result<Arc<Schema>, crate::error::SchemaError>> {
        None
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError>;
    fn read(r: &mut ByteReader) -> Result<Self, FormatError>;

    /// Encodes this value the way it appears as a list element or map key/value. For every
    /// type but `String` this is identical to [`WireField::write`]; `Str` alone has a second,
    /// distinct wire form in that position (see [`crate::writer::ByteWriter::write_str_short`]).
    fn write_element(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        self.write(w)
    }

    fn read_element(r: &mut ByteReader) -> Result<Self, FormatError> {
        Self::read(r)
    }
}

macro_rules! impl_wire_field_fixed {
    ($ty:ty, $tag:expr, $write:ident, $read:ident) => {
        impl WireField for $ty {
            const TAG: Tag = $tag;

            fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
                w.$write(*self);
                Ok(())
            }

            fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
                r.$read()
            }
        }
    };
}

impl_wire_field_fixed!(i16, Tag::I16, write_i16, read_i16);
impl_wire_field_fixed!(i32, Tag::I32, write_i32, read_i32);
impl_wire_field_fixed!(i64, Tag::I64, write_i64, read_i64);
impl_wire_field_fixed!(f32, Tag::F32, write_f32, read_f32);
impl_wire_field_fixed!(f64, Tag::F64, write_f64, read_f64);
impl_wire_field_fixed!(bool, Tag::Bool, write_bool, read_bool);

impl WireField for char {
    // Char is carried as a 2-byte big-endian code point, distinct from the 4-byte I32
    // encoding used for 32-bit integers; record fields declared `char` are restricted at
    // the type level to the Basic Multilingual Plane, enforced on write below (`char`
    // itself ranges over all of Unicode, so a non-BMP scalar value such as '😀' must be
    // rejected rather than silently truncated). The payload is the code point's raw 16-bit
    // bit pattern: written through `write_i16` (which only fixes the byte order, not the
    // signedness), then read back by reinterpreting those same bits as `u16` before
    // widening -- widening the stored `i16` directly would sign-extend any code point at or
    // above 0x8000 and produce a bogus codepoint.
    const TAG: Tag = Tag::I16;

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        let cp = *self as u32;
        if cp > 0xFFFF {
            return Err(WriteError::CharOutOfRange { value: cp });
        }
        w.write_i16(cp as u16 as i16);
        Ok(())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        let v = r.read_i16()? as u16 as u32;
        char::from_u32(v).ok_or(FormatError::UnexpectedTag {
            pos: r.position(),
            expected: "UTF-16 code unit",
            found: 0,
        })
    }
}

impl WireField for String {
    const TAG: Tag = Tag::Str;

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        w.write_str(self)
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        r.read_str().map(str::to_owned)
    }

    fn write_element(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        w.write_str_short(self)
    }

    fn read_element(r: &mut ByteReader) -> Result<Self, FormatError> {
        r.read_str_short().map(str::to_owned)
    }
}

macro_rules! impl_wire_field_narrow_int {
    ($ty:ty) => {
        impl WireField for $ty {
            // `I8` is not part of the fixed tag-byte vocabulary (it is named as a primitive
            // in the data model but absent from the closed set of assigned tag values), so a
            // record field of this width is carried as an `I16` payload, sign/zero-extended
            // on write and narrowed back on read.
            const TAG: Tag = Tag::I16;

            fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
                w.write_i16(*self as i16);
                Ok(())
            }

            fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
                let v = r.read_i16()?;
                <$ty>::try_from(v).map_err(|_| FormatError::UnexpectedTag {
                    pos: r.position(),
                    expected: stringify!($ty),
                    found: 0,
                })
            }
        }
    };
}

impl_wire_field_narrow_int!(i8);
impl_wire_field_narrow_int!(u8);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: WireField + PartialEq + std::fmt::Debug>(value: T) {
        let mut w = ByteWriter::new();
        value.write(&mut w).unwrap();
        let mut r = ByteReader::new(w.as_slice());
        assert_eq!(T::read(&mut r).unwrap(), value);
    }

    #[test]
    fn primitives_round_trip() {
        round_trip(42i32);
        round_trip(-9001i64);
        round_trip(3.5f32);
        round_trip(2.71828f64);
        round_trip(true);
        round_trip(1234i16);
        round_trip('λ');
        round_trip("hello, wire".to_string());
        round_trip(-42i8);
        round_trip(200u8);
    }

    #[test]
    fn char_round_trips_above_the_i16_sign_bit() {
        // Code points at or above 0x8000 set the high bit of the 2-byte payload; reading
        // that bit pattern back through a sign-extending cast would previously corrupt it.
        round_trip('\u{ffff}');
        round_trip('\u{8000}');
        round_trip('鐵');
    }

    #[test]
    fn char_beyond_the_basic_multilingual_plane_is_rejected_on_write() {
        let mut w = ByteWriter::new();
        let err = '😀'.write(&mut w).unwrap_err();
        assert_eq!(err, WriteError::CharOutOfRange { value: 0x1F600 });
    }

    #[test]
    fn string_element_form_differs_from_field_form() {
        let s = "hello, wire".to_string();
        let mut field_w = ByteWriter::new();
        s.write(&mut field_w).unwrap();
        let mut element_w = ByteWriter::new();
        s.write_element(&mut element_w).unwrap();
        assert_ne!(field_w.as_slice(), element_w.as_slice());

        let mut r = ByteReader::new(element_w.as_slice());
        assert_eq!(String::read_element(&mut r).unwrap(), s);
    }
}
