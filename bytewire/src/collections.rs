/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Wire encoding for sequence, set, map, and homogeneous-string container fields.
//!
//! A generic sequence is written as a count, a flag recording whether every element
//! shares one tag, that tag if so, and then each element's payload -- preceded by its own
//! tag byte only when the flag says elements are *not* uniform. For a statically typed
//! `Vec<T>` every element necessarily shares `T::TAG`, so the uniform path is taken
//! unconditionally and no per-element tag bytes are ever written; only `Vec<Value>`, whose
//! elements are dynamically tagged, can take the non-uniform path. `IndexSet<T>` and
//! `[T; N]` reuse this exact framing (an open point in the format: whether `Set`/`Array`
//! share `ListGeneric`'s wire shape or have independent framing; this crate resolves it in
//! favour of sharing).
//!
//! `Map` mirrors the same idea on two axes at once, recording key-uniform and
//! value-uniform independently in a single flags byte.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{FormatError, SchemaError, WriteError};
use crate::field::WireField;
use crate::reader::ByteReader;
use crate::schema::Schema;
use crate::tag::Tag;
use crate::value::Value;
use crate::writer::ByteWriter;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MapUniformFlags: u8 {
        const KEYS_UNIFORM = 0b0000_0001;
        const VALUES_UNIFORM = 0b0000_0010;
    }
}

// ---- statically uniform sequences (Vec<T>, IndexSet<T>, [T; N]) ----------------------

fn write_uniform_sequence<T: WireField>(
    w: &mut ByteWriter,
    len: usize,
    items: impl Iterator<Item = impl std::ops::Deref<Target = T>>,
) -> Result<(), WriteError> {
    w.write_u32(len as u32);
    // An empty sequence carries no elements to be uniform over, so it writes a clear flag
    // and omits the tag-marker byte entirely, matching the dynamic list path below.
    let uniform = len > 0;
    w.write_bool(uniform);
    if uniform {
        w.write_u8(T::TAG as u8);
    }
    for item in items {
        item.write_element(w)?;
    }
    Ok(())
}

fn read_uniform_sequence<T: WireField>(r: &mut ByteReader) -> Result<Vec<T>, FormatError> {
    let count = r.read_u32()? as usize;
    let uniform = r.read_bool()?;
    let declared_tag = if uniform { Some(expect_tag_byte(r)?) } else { None };
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let tag = match declared_tag {
            Some(t) => t,
            None => expect_tag_byte(r)?,
        };
        if tag != T::TAG {
            return Err(FormatError::UnexpectedTag {
                pos: r.position(),
                expected: "element tag matching field's static element type",
                found: tag as u8,
            });
        }
        out.push(T::read_element(r)?);
    }
    Ok(out)
}

impl<T: WireField> WireField for Vec<T> {
    const TAG: Tag = Tag::ListGeneric;
    const ELEMENT_TAG: Option<Tag> = Some(T::TAG);

    fn nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        T::nested_schema()
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_uniform_sequence(w, self.len(), self.iter())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        read_uniform_sequence(r)
    }
}

impl<T: WireField + std::hash::Hash + Eq> WireField for IndexSet<T> {
    const TAG: Tag = Tag::ListGeneric;
    const ELEMENT_TAG: Option<Tag> = Some(T::TAG);

    fn nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        T::nested_schema()
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_uniform_sequence(w, self.len(), self.iter())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        Ok(read_uniform_sequence::<T>(r)?.into_iter().collect())
    }
}

impl<T: WireField, const N: usize> WireField for [T; N] {
    const TAG: Tag = Tag::ListGeneric;
    const ELEMENT_TAG: Option<Tag> = Some(T::TAG);

    fn nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        T::nested_schema()
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_uniform_sequence(w, self.len(), self.iter())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        let items = read_uniform_sequence::<T>(r)?;
        let len = items.len();
        items.try_into().map_err(|_| FormatError::FieldCountMismatch {
            type_name: "[T; N]",
            expected: N,
            found: len,
        })
    }
}

// ---- dynamic ("any") sequences, used for heterogeneous list<any> elements ------------

pub(crate) fn write_value_list(w: &mut ByteWriter, items: &[Value]) -> Result<(), WriteError> {
    let first_tag = items.first().map(Value::runtime_tag);
    let uniform = first_tag.is_some_and(|t| items.iter().all(|v| v.runtime_tag() == t));
    w.write_u32(items.len() as u32);
    w.write_bool(uniform);
    if uniform {
        w.write_u8(first_tag.unwrap() as u8);
    }
    for item in items {
        if !uniform {
            w.write_u8(item.runtime_tag() as u8);
        }
        item.write_payload(w)?;
    }
    Ok(())
}

pub(crate) fn read_value_list(r: &mut ByteReader) -> Result<Vec<Value>, FormatError> {
    let count = r.read_u32()? as usize;
    let uniform = r.read_bool()?;
    let declared_tag = if uniform {
        let b = r.read_u8()?;
        Some(Tag::from_byte(b).ok_or(FormatError::UnexpectedTag {
            pos: r.position() - 1,
            expected: "a valid tag byte",
            found: b,
        })?)
    } else {
        None
    };
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let tag = match declared_tag {
            Some(t) => t,
            None => {
                let b = r.read_u8()?;
                Tag::from_byte(b).ok_or(FormatError::UnexpectedTag {
                    pos: r.position() - 1,
                    expected: "a valid tag byte",
                    found: b,
                })?
            }
        };
        out.push(Value::read_payload(r, tag)?);
    }
    Ok(out)
}

impl WireField for Vec<Value> {
    const TAG: Tag = Tag::ListGeneric;

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_value_list(w, self)
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        read_value_list(r)
    }
}

// ---- homogeneous-string lists (opt-in ListStr framing) -------------------------------

/// Opts a field into the compact `ListStr` encoding, which skips per-element tag bytes
/// entirely in favour of a presence flag per element. Without this wrapper, a
/// `Vec<String>` field falls back to the general `ListGeneric` framing above (trivially
/// uniform, but still carrying one shared tag byte and no presence flags, since a plain
/// `String` element is never absent).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrList(pub Vec<Option<String>>);

impl WireField for StrList {
    const TAG: Tag = Tag::ListStr;

    /// Each element is a varint length: `0` means the element is absent, `L >= 1` means an
    /// `L`-byte UTF-8 string follows. This collapses a genuinely empty string and a null
    /// element onto the same wire value -- the format leaves that ambiguity open and
    /// documents null as the canonical reading of a zero length, which is what this
    /// implementation follows; `Some(String::new())` round-trips as `None`.
    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        w.write_varint(self.0.len() as u32);
        for item in &self.0 {
            match item {
                Some(s) if !s.is_empty() => w.write_str(s)?,
                _ => w.write_varint(0),
            }
        }
        Ok(())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        let count = r.read_varint()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let len = r.read_varint()? as usize;
            if len == 0 {
                out.push(None);
            } else {
                let start = r.position();
                let bytes = r.read_exact(len)?;
                let s = core::str::from_utf8(bytes)
                    .map_err(|_| FormatError::InvalidUtf8 { pos: start })?;
                out.push(Some(s.to_owned()));
            }
        }
        Ok(StrList(out))
    }
}

// ---- maps -----------------------------------------------------------------------------

impl<K: WireField + std::hash::Hash + Eq, V: WireField> WireField for IndexMap<K, V> {
    const TAG: Tag = Tag::Map;
    const ELEMENT_TAG: Option<Tag> = Some(V::TAG);
    const KEY_TAG: Option<Tag> = Some(K::TAG);

    fn nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        V::nested_schema()
    }

    fn key_nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        K::nested_schema()
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        // An empty map has no entries to be uniform over, so both flag bits stay clear and
        // the key/value tag-marker bytes are omitted, matching `write_value_map`'s shape.
        let flags = if self.is_empty() {
            MapUniformFlags::empty()
        } else {
            MapUniformFlags::KEYS_UNIFORM | MapUniformFlags::VALUES_UNIFORM
        };
        w.write_u32(self.len() as u32);
        w.write_u8(flags.bits());
        if !self.is_empty() {
            w.write_u8(K::TAG as u8);
            w.write_u8(V::TAG as u8);
        }
        for (k, v) in self {
            k.write_element(w)?;
            v.write_element(w)?;
        }
        Ok(())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        let count = r.read_u32()? as usize;
        let flags_byte = r.read_u8()?;
        let flags = MapUniformFlags::from_bits_truncate(flags_byte);
        let keys_uniform = flags.contains(MapUniformFlags::KEYS_UNIFORM);
        let values_uniform = flags.contains(MapUniformFlags::VALUES_UNIFORM);
        let declared_key_tag = if keys_uniform { Some(expect_tag_byte(r)?) } else { None };
        let declared_value_tag = if values_uniform { Some(expect_tag_byte(r)?) } else { None };
        let mut out = IndexMap::with_capacity(count);
        for _ in 0..count {
            let key_tag = match declared_key_tag {
                Some(t) => t,
                None => expect_tag_byte(r)?,
            };
            check_tag(key_tag, K::TAG, r.position())?;
            let key = K::read_element(r)?;
            let value_tag = match declared_value_tag {
                Some(t) => t,
                None => expect_tag_byte(r)?,
            };
            check_tag(value_tag, V::TAG, r.position())?;
            let value = V::read_element(r)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

fn expect_tag_byte(r: &mut ByteReader) -> Result<Tag, FormatError> {
    let b = r.read_u8()?;
    Tag::from_byte(b).ok_or(FormatError::UnexpectedTag {
        pos: r.position() - 1,
        expected: "a valid tag byte",
        found: b,
    })
}

fn check_tag(found: Tag, expected: Tag, pos: usize) -> Result<(), FormatError> {
    if found != expected {
        return Err(FormatError::UnexpectedTag {
            pos,
            expected: "map key/value tag matching field's static type",
            found: found as u8,
        });
    }
    Ok(())
}

pub(crate) fn write_value_map(
    w: &mut ByteWriter,
    entries: &IndexMap<Value, Value>,
) -> Result<(), WriteError> {
    let first = entries.iter().next();
    let keys_uniform = first.is_some_and(|(k0, _)| {
        let t = k0.runtime_tag();
        entries.keys().all(|k| k.runtime_tag() == t)
    });
    let values_uniform = first.is_some_and(|(_, v0)| {
        let t = v0.runtime_tag();
        entries.values().all(|v| v.runtime_tag() == t)
    });
    let mut flags = MapUniformFlags::empty();
    if keys_uniform {
        flags |= MapUniformFlags::KEYS_UNIFORM;
    }
    if values_uniform {
        flags |= MapUniformFlags::VALUES_UNIFORM;
    }
    w.write_u32(entries.len() as u32);
    w.write_u8(flags.bits());
    if keys_uniform {
        w.write_u8(first.unwrap().0.runtime_tag() as u8);
    }
    if values_uniform {
        w.write_u8(first.unwrap().1.runtime_tag() as u8);
    }
    for (k, v) in entries {
        if !keys_uniform {
            w.write_u8(k.runtime_tag() as u8);
        }
        k.write_payload(w)?;
        if !values_uniform {
            w.write_u8(v.runtime_tag() as u8);
        }
        v.write_payload(w)?;
    }
    Ok(())
}

pub(crate) fn read_value_map(r: &mut ByteReader) -> Result<IndexMap<Value, Value>, FormatError> {
    let count = r.read_u32()? as usize;
    let flags_byte = r.read_u8()?;
    let flags = MapUniformFlags::from_bits_truncate(flags_byte);
    let keys_uniform = flags.contains(MapUniformFlags::KEYS_UNIFORM);
    let values_uniform = flags.contains(MapUniformFlags::VALUES_UNIFORM);
    let declared_key_tag = if keys_uniform { Some(expect_tag_byte(r)?) } else { None };
    let declared_value_tag = if values_uniform { Some(expect_tag_byte(r)?) } else { None };
    let mut out = IndexMap::with_capacity(count);
    for _ in 0..count {
        let key_tag = match declared_key_tag {
            Some(t) => t,
            None => expect_tag_byte(r)?,
        };
        let key = Value::read_payload(r, key_tag)?;
        let value_tag = match declared_value_tag {
            Some(t) => t,
            None => expect_tag_byte(r)?,
        };
        let value = Value::read_payload(r, value_tag)?;
        out.insert(key, value);
    }
    Ok(out)
}

impl WireField for IndexMap<Value, Value> {
    const TAG: Tag = Tag::Map;

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_value_map(w, self)
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        read_value_map(r)
    }
}
