/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Error types for schema construction, encoding, and decoding.

use thiserror::Error;

/// Raised while a [`crate::schema::Schema`] is being compiled for a record type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A record type declares more fields than the one-byte field count can hold.
    #[error("record type `{type_name}` declares {count} fields, but the wire format allows at most 255")]
    FieldCountExceeded { type_name: &'static str, count: usize },
}

/// Raised while a value is written to the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// A string field exceeded the maximum length a varint-prefixed payload can address.
    #[error("string of {len} bytes exceeds the maximum encodable length of {max}")]
    StringTooLong { len: usize, max: usize },
    /// A `char` field held a code point outside the Basic Multilingual Plane, which the
    /// 2-byte `Char` wire payload cannot address.
    #[error("char U+{value:06X} is outside the Basic Multilingual Plane (max U+FFFF) that `char` fields are restricted to")]
    CharOutOfRange { value: u32 },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Raised while a value is decoded from the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The buffer ended before the declared shape of the value was fully read.
    #[error("unexpected end of buffer at position {pos}: needed {needed} more byte(s)")]
    Truncated { pos: usize, needed: usize },
    /// A tag byte or nibble did not decode to a value this reader understands, or did not
    /// match what the schema expected at that position.
    #[error("unexpected tag at position {pos}: expected {expected}, found byte {found}")]
    UnexpectedTag {
        pos: usize,
        expected: &'static str,
        found: u8,
    },
    /// The field count carried on the wire does not match the schema compiled for the
    /// target record type.
    #[error("record carries {found} fields on the wire, schema for `{type_name}` expects {expected}")]
    FieldCountMismatch {
        type_name: &'static str,
        expected: usize,
        found: usize,
    },
    /// A string payload was not valid UTF-8.
    #[error("string payload at position {pos} is not valid UTF-8")]
    InvalidUtf8 { pos: usize },
    /// A varint continued past the 5 bytes needed to hold 32 bits of payload.
    #[error("varint at position {pos} exceeds 32 bits")]
    VarintOverflow { pos: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Raised by the top-level [`crate::serialize`] facade.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Raised by the top-level [`crate::deserialize`] facade.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
