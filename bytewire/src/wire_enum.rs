/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Enum fields: an `I32` ordinal on the wire, with `-1` standing in for absence.
//!
//! Unlike every other optional field, an enum's absence is not signalled by overriding the
//! record's nibble to `Null` -- it is folded into the `I32` payload itself as a sentinel
//! ordinal. `Option<E>` is therefore the *only* representation of an enum field;
//! there is no separate non-optional form. Deriving [`WireEnum`] on `E` is what opts an
//! `Option<E>` field into this sentinel framing instead of the ordinary nullable-field path
//! (see the `#[bytewire(wire_enum)]` field attribute in the derive macro).

use crate::error::{FormatError, WriteError};
use crate::field::WireField;
use crate::reader::ByteReader;
use crate::tag::Tag;
use crate::writer::ByteWriter;

/// Implemented by `#[derive(WireEnum)]` for unit-only enums, mapping each variant to a
/// stable ordinal equal to its declaration order.
pub trait WireEnum: Sized {
    fn to_ordinal(&self) -> i32;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
}

impl<E: WireEnum> WireField for Option<E> {
    // There is no dedicated Enum tag in the fixed vocabulary; an enum's ordinal is simply
    // an I32 value, with -1 reserved as the absence sentinel.
    const TAG: Tag = Tag::I32;

    fn write(&self, w: &mut ByteWriter) -> Result<(), WriteError> {
        let ordinal = self.as_ref().map(WireEnum::to_ordinal).unwrap_or(-1);
        w.write_i32(ordinal);
        Ok(())
    }

    fn read(r: &mut ByteReader) -> Result<Self, FormatError> {
        let ordinal = r.read_i32()?;
        if ordinal == -1 {
            Ok(None)
        } else {
            E::from_ordinal(ordinal)
                .map(Some)
                .ok_or(FormatError::UnexpectedTag {
                    pos: r.position(),
                    expected: "a known enum ordinal",
                    found: ordinal as u8,
                })
        }
    }
}
