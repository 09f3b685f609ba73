/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! End-to-end coverage of the format's universal properties and the seed scenarios: a
//! record carrying every primitive, a record carrying an integer list, a record carrying a
//! string-keyed map, a nested record, a record with a null field, and a heterogeneous list.

use bytewire::error::{DeserializeError, FormatError};
use bytewire::prelude::*;
use indexmap::IndexMap;

#[derive(Record, Debug, Clone, PartialEq)]
struct AllPrimitives {
    a: i8,
    b: i16,
    c: i32,
    d: i64,
    e: f32,
    f: f64,
    g: bool,
    h: char,
}

fn sample_primitives() -> AllPrimitives {
    AllPrimitives {
        a: 42,
        b: 1000,
        c: 123_456,
        d: 9_876_543_210,
        e: 3.14,
        f: 2.718_281_828,
        g: true,
        h: 'Z',
    }
}

#[test]
fn scenario_all_primitives_round_trips() {
    bytewire::clear_cache();
    let p = sample_primitives();
    let bytes = bytewire::serialize(&p).unwrap();
    let back: AllPrimitives = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(p, back);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct IntList {
    list: Vec<i32>,
}

#[test]
fn scenario_integer_list_round_trips_in_order() {
    bytewire::clear_cache();
    let v = IntList {
        list: vec![100, 200, 300, 400, 500],
    };
    let bytes = bytewire::serialize(&v).unwrap();
    let back: IntList = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(v, back);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct StringMap {
    map: IndexMap<String, i32>,
}

#[test]
fn scenario_string_map_round_trips_preserving_insertion_order() {
    bytewire::clear_cache();
    let mut map = IndexMap::new();
    map.insert("one".to_string(), 1);
    map.insert("two".to_string(), 2);
    map.insert("three".to_string(), 3);
    let v = StringMap { map };
    let bytes = bytewire::serialize(&v).unwrap();
    let back: StringMap = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(
        back.map.keys().collect::<Vec<_>>(),
        vec!["one", "two", "three"]
    );
    assert_eq!(v, back);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct Inner {
    x: i32,
    y: i32,
}

#[derive(Record, Debug, Clone, PartialEq)]
struct Outer {
    id: i32,
    inner: Inner,
}

#[test]
fn scenario_nested_record_round_trips() {
    bytewire::clear_cache();
    let v = Outer {
        id: 42,
        inner: Inner { x: 7, y: 9 },
    };
    let bytes = bytewire::serialize(&v).unwrap();
    let back: Outer = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(back.inner.x, 7);
    assert_eq!(back.inner.y, 9);
    assert_eq!(v, back);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct PersonName {
    name: Option<String>,
    age: i32,
}

#[test]
fn scenario_null_field_round_trips() {
    bytewire::clear_cache();
    let v = PersonName {
        name: None,
        age: 30,
    };
    let bytes = bytewire::serialize(&v).unwrap();
    let back: PersonName = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(back.name, None);
    assert_eq!(back.age, 30);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct AnyList {
    items: Vec<Value>,
}

#[test]
fn scenario_heterogeneous_list_preserves_order_and_types() {
    bytewire::clear_cache();
    let v = AnyList {
        items: vec![Value::I32(1), Value::Str("two".into()), Value::F64(3.0)],
    };
    let bytes = bytewire::serialize(&v).unwrap();
    let back: AnyList = bytewire::deserialize(&bytes).unwrap();
    assert_eq!(v, back);
}

// ---- universal properties -------------------------------------------------------------

#[test]
fn determinism_same_value_same_bytes() {
    bytewire::clear_cache();
    let p = sample_primitives();
    let once = bytewire::serialize(&p).unwrap();
    let twice = bytewire::serialize(&p).unwrap();
    assert_eq!(once, twice);
}

#[derive(Record, Debug, Clone, PartialEq)]
struct OrderAB {
    a: i32,
    b: i32,
}

#[derive(Record, Debug, Clone, PartialEq)]
struct OrderBA {
    b: i32,
    a: i32,
}

#[test]
fn field_order_stability_changes_byte_output() {
    bytewire::clear_cache();
    let ab = OrderAB { a: 1, b: 2 };
    let ba = OrderBA { b: 2, a: 1 };
    let ab_bytes = bytewire::serialize(&ab).unwrap();
    let ba_bytes = bytewire::serialize(&ba).unwrap();
    assert_ne!(ab_bytes, ba_bytes);
}

#[test]
fn header_invariant_holds_for_even_and_odd_field_counts() {
    bytewire::clear_cache();
    // AllPrimitives has 8 fields (even): header = 2 + ceil(8/2) = 6 bytes.
    let p_bytes = bytewire::serialize(&sample_primitives()).unwrap();
    assert_eq!(p_bytes[0], bytewire::tag::Tag::Record as u8);
    assert_eq!(p_bytes[1], 8);
    let primitives_header = 2 + (8usize).div_ceil(2);
    assert_eq!(primitives_header, 6);

    // Outer has 2 fields (even): header = 2 + ceil(2/2) = 3 bytes, then the i32 payload.
    let o_bytes = bytewire::serialize(&Outer {
        id: 1,
        inner: Inner { x: 0, y: 0 },
    })
    .unwrap();
    assert_eq!(o_bytes[1], 2);
    let outer_header = 2 + (2usize).div_ceil(2);
    assert_eq!(outer_header, 3);

    // PersonName has 2 fields too, but one is nullable -- header size is unaffected by
    // whether a nullable field is present or absent.
    let n_bytes = bytewire::serialize(&PersonName {
        name: None,
        age: 1,
    })
    .unwrap();
    assert_eq!(n_bytes[1], 2);
}

#[test]
fn uniform_compression_emits_one_tag_byte_for_homogeneous_lists() {
    bytewire::clear_cache();
    let v = IntList {
        list: vec![1, 2, 3],
    };
    let bytes = bytewire::serialize(&v).unwrap();
    // header (2 + ceil(1/2) = 3 bytes) then: 4-byte count, 1-byte uniform flag, 1-byte tag.
    let uniform_flag_pos = 3 + 4;
    assert_eq!(bytes[uniform_flag_pos], 1, "uniform flag must be set");
}

#[test]
fn uniform_compression_emits_per_element_tags_for_heterogeneous_lists() {
    bytewire::clear_cache();
    let v = AnyList {
        items: vec![Value::I32(1), Value::Str("x".into()), Value::I32(2)],
    };
    let bytes = bytewire::serialize(&v).unwrap();
    let uniform_flag_pos = 3 + 4;
    assert_eq!(bytes[uniform_flag_pos], 0, "uniform flag must be clear");
}

#[test]
fn field_count_check_rejects_mismatched_wire_count_without_allocating() {
    bytewire::clear_cache();
    let mut bytes = bytewire::serialize(&Inner { x: 1, y: 2 }).unwrap();
    // Field count byte sits right after the Record tag.
    bytes[1] = 3;
    let err = bytewire::deserialize::<Inner>(&bytes).unwrap_err();
    assert!(matches!(
        err,
        DeserializeError::Format(FormatError::FieldCountMismatch { expected: 2, found: 3, .. })
    ));
}

#[test]
fn truncation_safety_rejects_every_strict_prefix() {
    bytewire::clear_cache();
    let bytes = bytewire::serialize(&sample_primitives()).unwrap();
    for len in 0..bytes.len() {
        let prefix = &bytes[..len];
        let result = bytewire::deserialize::<AllPrimitives>(prefix);
        assert!(result.is_err(), "prefix of length {len} should not decode");
    }
    assert!(bytewire::deserialize::<AllPrimitives>(&bytes).is_ok());
}

#[test]
fn round_trip_identity_across_varied_values() {
    bytewire::clear_cache();
    for value in [
        AllPrimitives {
            a: i8::MIN,
            b: i16::MIN,
            c: i32::MIN,
            d: i64::MIN,
            e: f32::NAN,
            f: f64::NAN,
            g: false,
            h: '\u{0}',
        },
        AllPrimitives {
            a: i8::MAX,
            b: i16::MAX,
            c: i32::MAX,
            d: i64::MAX,
            e: f32::INFINITY,
            f: f64::NEG_INFINITY,
            g: true,
            h: '\u{ffff}',
        },
    ] {
        let bytes = bytewire::serialize(&value).unwrap();
        let back: AllPrimitives = bytewire::deserialize(&bytes).unwrap();
        // NaN != NaN under plain equality; compare bit patterns for the float fields and
        // structural equality for everything else.
        assert_eq!(back.a, value.a);
        assert_eq!(back.b, value.b);
        assert_eq!(back.c, value.c);
        assert_eq!(back.d, value.d);
        assert_eq!(back.e.to_bits(), value.e.to_bits());
        assert_eq!(back.f.to_bits(), value.f.to_bits());
        assert_eq!(back.g, value.g);
        assert_eq!(back.h, value.h);
    }
}
