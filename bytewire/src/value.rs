/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! [`Value`]: a self-describing dynamic value, used as the element type of heterogeneous
//! sequences and maps (`Vec<Value>`, `IndexMap<Value, Value>`).
//!
//! A field's *static* type must always resolve to one [`crate::tag::Tag`] at compile time
//! -- a field whose type cannot name its own tag is rejected by the type system before it
//! ever reaches the schema cache, which is this crate's answer to "a field requiring
//! runtime tag derivation" (the strictest of the two behaviours the format leaves open,
//! and the one recommended). `Value` does not change that: it has no single static tag of
//! its own (see [`Value::runtime_tag`]), so it is deliberately *not* given a
//! [`crate::field::WireField`] impl and cannot be used as an ordinary field type. It exists
//! solely as the element type of collections that are allowed to mix tags at the value
//! level -- `list<any>` in the data model.

use indexmap::IndexMap;

use crate::error::{FormatError, WriteError};
use crate::reader::ByteReader;
use crate::tag::Tag;
use crate::writer::ByteWriter;

/// A dynamically tagged value. Floating-point variants compare and hash by bit pattern, so
/// that decoding is stable even across NaN payloads.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Record(Vec<u8>),
    List(Vec<Value>),
    Map(IndexMap<Value, Value>),
}

impl Value {
    pub fn runtime_tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Bool(_) => Tag::Bool,
            Value::I16(_) => Tag::I16,
            Value::I32(_) => Tag::I32,
            Value::I64(_) => Tag::I64,
            Value::F32(_) => Tag::F32,
            Value::F64(_) => Tag::F64,
            Value::Str(_) => Tag::Str,
            Value::Record(_) => Tag::Record,
            Value::List(_) => Tag::ListGeneric,
            Value::Map(_) => Tag::Map,
        }
    }

    /// Writes only this value's payload bytes; the caller is responsible for emitting the
    /// tag byte that precedes it, per the non-uniform element framing.
    pub fn write_payload(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => {
                w.write_bool(*v);
                Ok(())
            }
            Value::I16(v) => {
                w.write_i16(*v);
                Ok(())
            }
            Value::I32(v) => {
                w.write_i32(*v);
                Ok(())
            }
            Value::I64(v) => {
                w.write_i64(*v);
                Ok(())
            }
            Value::F32(v) => {
                w.write_f32(*v);
                Ok(())
            }
            Value::F64(v) => {
                w.write_f64(*v);
                Ok(())
            }
            // A `Value` only ever occupies a list element or map key/value slot, never a
            // record field directly, so its string form is always the two-byte-length one.
            Value::Str(v) => w.write_str_short(v),
            Value::Record(bytes) => {
                w.write_varint(bytes.len() as u32);
                w.write_bytes(bytes);
                Ok(())
            }
            Value::List(items) => crate::collections::write_value_list(w, items),
            Value::Map(entries) => crate::collections::write_value_map(w, entries),
        }
    }

    pub fn read_payload(r: &mut ByteReader, tag: Tag) -> Result<Value, FormatError> {
        Ok(match tag {
            Tag::Null => Value::Null,
            Tag::Bool => Value::Bool(r.read_bool()?),
            Tag::I16 => Value::I16(r.read_i16()?),
            Tag::I32 => Value::I32(r.read_i32()?),
            Tag::I64 => Value::I64(r.read_i64()?),
            Tag::F32 => Value::F32(r.read_f32()?),
            Tag::F64 => Value::F64(r.read_f64()?),
            Tag::Str => Value::Str(r.read_str_short()?.to_owned()),
            Tag::Record | Tag::RecordUnpacked => {
                let len = r.read_varint()? as usize;
                Value::Record(r.read_exact(len)?.to_vec())
            }
            Tag::ListGeneric | Tag::ListStr | Tag::Set | Tag::Array => {
                Value::List(crate::collections::read_value_list(r)?)
            }
            Tag::Map => Value::Map(crate::collections::read_value_map(r)?),
        })
    }

    fn bit_key(&self) -> (u8, u64) {
        match self {
            Value::Null => (0, 0),
            Value::Bool(v) => (1, *v as u64),
            Value::I16(v) => (2, *v as u64),
            Value::I32(v) => (3, *v as u64),
            Value::I64(v) => (4, *v as u64),
            Value::F32(v) => (5, v.to_bits() as u64),
            Value::F64(v) => (6, v.to_bits()),
            Value::Str(_) | Value::Record(_) | Value::List(_) | Value::Map(_) => (7, 0),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let (disc, bits) = self.bit_key();
        disc.hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Record(b) => b.hash(state),
            Value::List(items) => items.hash(state),
            Value::Map(_) => bits.hash(state),
            _ => bits.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_per_variant() {
        for value in [
            Value::Null,
            Value::Bool(true),
            Value::I32(42),
            Value::F64(2.5),
            Value::Str("hi".into()),
        ] {
            let mut w = ByteWriter::new();
            value.write_payload(&mut w).unwrap();
            let mut r = ByteReader::new(w.as_slice());
            let back = Value::read_payload(&mut r, value.runtime_tag()).unwrap();
            assert_eq!(value, back);
        }
    }
}
