/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! [`Record`]: the trait `#[derive(Record)]` implements, and the nested-record framing
//! that lets a record field embed another record without a second buffer-growing pass.
//!
//! `write_record`/`read_record` are generated in full by the derive macro -- there is no
//! shared "generic framing, per-field dispatch" helper underneath them, because the
//! packed-nibble header has to be computed from the *runtime* presence of each field
//! before any field body is written. The macro therefore emits, per record type, one
//! specialized procedure that: builds the effective tag array (substituting `Null` for
//! fields that are absent), packs and writes it, and only then writes each field's body in
//! order. This mirrors the "one specialized procedure per type" dispatch strategy used
//! throughout this crate (see [`crate::field::WireField`]).

use std::sync::Arc;

use crate::error::{FormatError, SchemaError, WriteError};
use crate::field::WireField;
use crate::pool::PooledWriter;
use crate::reader::ByteReader;
use crate::schema::Schema;
use crate::tag::Tag;
use crate::writer::ByteWriter;

pub trait Record: Sized + 'static {
    /// Builds (or retrieves from the process-wide cache) this type's compiled schema.
    fn schema() -> Result<Arc<Schema>, SchemaError>;

    /// Writes this record's full framing: the `Record` tag, field count, packed nibble
    /// descriptors, and every field's body, in declaration order.
    fn write_record(&self, w: &mut ByteWriter) -> Result<(), WriteError>;

    /// Reads a record previously written by [`Record::write_record`].
    fn read_record(r: &mut ByteReader) -> Result<Self, FormatError>;
}

/// A nested record field (or record-typed sequence element) is written into a pooled
/// scratch buffer first, so its exact length is known before the length prefix is
/// written into the parent buffer -- the two-pass layout the format uses to avoid
/// reallocating the parent buffer mid-write.
pub fn write_nested_record<R: Record>(parent: &mut ByteWriter, value: &R) -> Result<(), WriteError> {
    let mut scratch = PooledWriter::acquire();
    value.write_record(&mut scratch)?;
    parent.write_varint(scratch.position() as u32);
    parent.write_bytes(scratch.as_slice());
    Ok(())
}

/// Reads a nested record's length-prefixed, self-delimited payload, bounding the nested
/// reader to exactly that span so a malformed or truncated nested frame cannot read past
/// its own declared length into the parent's remaining bytes.
pub fn read_nested_record<R: Record>(parent: &mut ByteReader) -> Result<R, FormatError> {
    let len = parent.read_varint()? as usize;
    let bytes = parent.read_exact(len)?;
    let mut nested = ByteReader::new(bytes);
    R::read_record(&mut nested)
}

impl<R: Record> WireField for R {
    const TAG: Tag = Tag::Record;

    fn nested_schema() -> Option<Result<Arc<Schema>, SchemaError>> {
        Some(R::schema())
    }

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        write_nested_record(w, self)
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        read_nested_record(r)
    }
}
