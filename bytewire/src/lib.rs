/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

//! `bytewire` is a compact, self-describing binary format for structured in-memory
//! records, built around three ideas:
//!
//! - a fixed, versionless tag vocabulary ([`tag::Tag`]) with a 4-bit nibble subset packed
//!   two-to-a-byte into every record's header, so common records carry almost no framing
//!   overhead;
//! - a process-wide cache ([`schema`]) of each record type's compiled shape, built once
//!   and shared across every subsequent encode and decode of that type;
//! - field dispatch resolved entirely at compile time ([`field::WireField`],
//!   [`record::Record`]) through `#[derive(Record)]`, rather than through runtime
//!   reflection or a boxed `dyn` dispatcher.
//!
//! Most users only need [`prelude`]'s derive macros plus [`serialize`] and
//! [`deserialize`].

pub mod collections;
pub mod error;
pub mod field;
pub mod pool;
pub mod reader;
pub mod record;
pub mod schema;
pub mod tag;
pub mod value;
pub mod wire;
pub mod wire_enum;
pub mod writer;

#[cfg(feature = "derive")]
pub use bytewire_derive::{Record, WireEnum};

pub mod prelude {
    pub use crate::collections::StrList;
    pub use crate::error::{DeserializeError, FormatError, SchemaError, SerializeError, WriteError};
    pub use crate::field::WireField;
    pub use crate::record::Record;
    pub use crate::tag::Tag;
    pub use crate::value::Value;
    pub use crate::wire_enum::WireEnum;
    #[cfg(feature = "derive")]
    pub use bytewire_derive::{Record as DeriveRecord, WireEnum as DeriveWireEnum};
}

use error::{DeserializeError, SerializeError};
use pool::PooledWriter;
use reader::ByteReader;
use record::Record;

/// Compiles (or retrieves from cache) the schema for `R`, surfacing schema-construction
/// failures -- such as a record declaring more than 255 fields -- without writing
/// anything. `serialize`/`deserialize` call this implicitly, so most callers never need
/// to call it directly; it is exposed for callers who want to validate a type up front.
pub fn register<R: Record>() -> Result<(), error::SchemaError> {
    R::schema().map(|_| ())
}

/// Serializes `value` into a freshly allocated buffer holding exactly its encoded bytes.
pub fn serialize<R: Record>(value: &R) -> Result<Vec<u8>, SerializeError> {
    R::schema()?;
    let mut w = PooledWriter::acquire();
    value.write_record(&mut w)?;
    Ok(w.to_vec())
}

/// Decodes a value of type `R` previously produced by [`serialize`].
pub fn deserialize<R: Record>(bytes: &[u8]) -> Result<R, DeserializeError> {
    R::schema()?;
    let mut r = ByteReader::new(bytes);
    Ok(R::read_record(&mut r)?)
}

/// Drops every compiled schema from the process-wide cache.
pub fn clear_cache() {
    schema::clear_cache();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;
    use crate::schema::Schema;
    use crate::tag::Tag;
    use crate::writer::ByteWriter;
    use std::sync::Arc;

    /// A hand-written `Record` impl standing in for what `#[derive(Record)]` would emit,
    /// used to exercise the facade without depending on the proc-macro crate from this
    /// crate's own test suite.
    struct Point {
        x: i32,
        y: i32,
    }

    impl Record for Point {
        fn schema() -> Result<Arc<Schema>, error::SchemaError> {
            schema::schema_for::<Point>(|| {
                Ok(Schema {
                    type_name: "Point",
                    fields: vec![
                        schema::FieldDescriptor {
                            name: "x",
                            tag: Tag::I32,
                            nullable: false,
                            element_tag: None,
                            key_tag: None,
                            nested_schema: None,
                            key_nested_schema: None,
                        },
                        schema::FieldDescriptor {
                            name: "y",
                            tag: Tag::I32,
                            nullable: false,
                            element_tag: None,
                            key_tag: None,
                            nested_schema: None,
                            key_nested_schema: None,
                        },
                    ],
                })
            })
        }

        fn write_record(&self, w: &mut ByteWriter) -> Result<(), error::WriteError> {
            w.write_u8(Tag::Record as u8);
            w.write_u8(2);
            wire::write_nibbles(w, &[Tag::I32, Tag::I32]);
            self.x.write(w)?;
            self.y.write(w)?;
            Ok(())
        }

        fn read_record(r: &mut ByteReader) -> Result<Self, FormatError> {
            let tag = r.read_u8()?;
            if tag != Tag::Record as u8 {
                return Err(FormatError::UnexpectedTag {
                    pos: 0,
                    expected: "Record",
                    found: tag,
                });
            }
            let count = r.read_u8()? as usize;
            if count != 2 {
                return Err(FormatError::FieldCountMismatch {
                    type_name: "Point",
                    expected: 2,
                    found: count,
                });
            }
            let tags = wire::read_nibbles(r, count)?;
            if tags != [Tag::I32, Tag::I32] {
                return Err(FormatError::UnexpectedTag {
                    pos: r.position(),
                    expected: "I32",
                    found: 0,
                });
            }
            Ok(Point {
                x: i32::read(r)?,
                y: i32::read(r)?,
            })
        }
    }

    use crate::field::WireField;

    #[test]
    fn facade_round_trips_a_record() {
        clear_cache();
        let p = Point { x: 7, y: -3 };
        let bytes = serialize(&p).unwrap();
        let back: Point = deserialize(&bytes).unwrap();
        assert_eq!((back.x, back.y), (7, -3));
    }

    #[test]
    fn facade_rejects_truncated_input() {
        clear_cache();
        let p = Point { x: 7, y: -3 };
        let mut bytes = serialize(&p).unwrap();
        bytes.truncate(bytes.len() - 1);
        let err = deserialize::<Point>(&bytes).unwrap_err();
        assert!(matches!(err, DeserializeError::Format(FormatError::Truncated { .. })));
    }
}
