/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The fixed byte- and nibble-valued tag vocabulary of the wire format.

/// A value's wire-format tag. Byte values are fixed across versions of this crate; they are
/// part of the on-disk contract, not an implementation detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Null = 0,
    Str = 1,
    I32 = 2,
    I64 = 3,
    Bool = 4,
    F64 = 5,
    F32 = 6,
    I16 = 7,
    /// Reserved for wire-format byte-value compatibility; never emitted by this
    /// implementation, which always writes the nibble-packed record framing.
    RecordUnpacked = 8,
    ListGeneric = 9,
    Record = 10,
    ListStr = 11,
    Map = 12,
    Set = 13,
    Array = 14,
}

impl Tag {
    pub const fn from_byte(b: u8) -> Option<Tag> {
        use Tag::*;
        Some(match b {
            0 => Null,
            1 => Str,
            2 => I32,
            3 => I64,
            4 => Bool,
            5 => F64,
            6 => F32,
            7 => I16,
            8 => RecordUnpacked,
            9 => ListGeneric,
            10 => Record,
            11 => ListStr,
            12 => Map,
            13 => Set,
            14 => Array,
            _ => return None,
        })
    }

    /// The 4-bit nibble assigned to this tag, if it belongs to the 11-value subset that
    /// record field descriptors pack two-to-a-byte. Tags outside that subset (`Set`,
    /// `Array`, `RecordUnpacked`) never appear in nibble form.
    pub const fn nibble(self) -> Option<u8> {
        use Tag::*;
        Some(match self {
            Null => 0,
            Str => 1,
            I32 => 2,
            I64 => 3,
            Bool => 4,
            F64 => 5,
            F32 => 6,
            I16 => 7,
            ListStr => 8,
            ListGeneric => 9,
            Record => 10,
            Map => 11,
            RecordUnpacked | Set | Array => return None,
        })
    }

    pub const fn from_nibble(n: u8) -> Option<Tag> {
        use Tag::*;
        Some(match n {
            0 => Null,
            1 => Str,
            2 => I32,
            3 => I64,
            4 => Bool,
            5 => F64,
            6 => F32,
            7 => I16,
            8 => ListStr,
            9 => ListGeneric,
            10 => Record,
            11 => Map,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip() {
        for b in 0u8..15 {
            let tag = Tag::from_byte(b).unwrap();
            assert_eq!(tag as u8, b);
        }
        assert!(Tag::from_byte(15).is_none());
    }

    #[test]
    fn nibble_round_trip() {
        for n in 0u8..12 {
            let tag = Tag::from_nibble(n).unwrap();
            assert_eq!(tag.nibble().unwrap(), n);
        }
        assert!(Tag::from_nibble(12).is_none());
        assert!(Tag::Set.nibble().is_none());
        assert!(Tag::Array.nibble().is_none());
        assert!(Tag::RecordUnpacked.nibble().is_none());
    }
}
