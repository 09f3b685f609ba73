/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Usage examples for `bytewire`: a plain record, a nested record, a record carrying
//! collections and a nullable field, and an enum field.

use anyhow::Result;
use bytewire::prelude::*;
use indexmap::IndexMap;

#[derive(Record, Debug, PartialEq)]
struct Address {
    city: String,
    zip: i32,
}

#[derive(WireEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Admin,
    Member,
    Guest,
}

#[derive(Record, Debug, PartialEq)]
struct Person {
    name: String,
    age: i32,
    nickname: Option<String>,
    home: Address,
    scores: Vec<i32>,
    tags: Vec<String>,
    attributes: IndexMap<String, String>,
    #[bytewire(wire_enum)]
    role: Option<Role>,
}

fn main() -> Result<()> {
    let mut attributes = IndexMap::new();
    attributes.insert("team".to_string(), "infra".to_string());
    attributes.insert("level".to_string(), "senior".to_string());

    let person = Person {
        name: "Ada Lovelace".to_string(),
        age: 36,
        nickname: None,
        home: Address {
            city: "London".to_string(),
            zip: 10000,
        },
        scores: vec![98, 87, 91],
        tags: vec!["engineer".to_string(), "mathematician".to_string()],
        attributes,
        role: Some(Role::Admin),
    };

    let bytes = bytewire::serialize(&person)?;
    println!("encoded {} bytes", bytes.len());

    let decoded: Person = bytewire::deserialize(&bytes)?;
    assert_eq!(person, decoded);
    println!("round-tripped: {decoded:?}");

    Ok(())
}
