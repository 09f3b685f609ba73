/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The process-wide, type-keyed cache of compiled [`Schema`] values.
//!
//! A `Schema` is metadata only: field names, tags, and (for container and record fields)
//! the nested shape they carry. It exists for introspection and for the field-count check
//! performed at decode time; it plays no part in dispatching the actual field reads and
//! writes, which are resolved at compile time through [`crate::field::WireField`] and
//! [`crate::record::Record`].
//!
//! Building a schema for a record type that (through `Box`) refers back to itself would
//! recurse forever if each reference triggered a fresh build. To break the cycle, a
//! placeholder entry is installed for a type the moment its schema build starts; a nested
//! build that revisits the same type mid-flight is handed a shallow placeholder schema
//! instead of recursing again, and the real entry is installed once the build completes.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::SchemaError;
use crate::tag::Tag;

/// Metadata describing one field of a compiled [`Schema`].
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// The tag this field carries when present. For a nullable field this is the tag of
    /// the wrapped value, not [`Tag::Null`] -- `Null` only ever appears as a per-instance
    /// override on the wire, never as part of the static schema.
    pub tag: Tag,
    pub nullable: bool,
    /// For `ListGeneric`/`ListStr`/`Map`/`Set`/`Array` fields, the tag carried by elements
    /// (or, for `Map`, by values).
    pub element_tag: Option<Tag>,
    /// For `Map` fields, the tag carried by keys.
    pub key_tag: Option<Tag>,
    /// The nested schema of a `Record`-tagged field or element, or of a `Map` field's
    /// `Record`-tagged value. Self-referential record graphs are safe to resolve eagerly
    /// here: building the nested type's schema re-enters [`schema_for`], which hands back a
    /// placeholder instead of recursing if that type's schema is already mid-build (see the
    /// module documentation).
    pub nested_schema: Option<Result<Arc<Schema>, SchemaError>>,
    /// The nested schema of a `Map` field whose keys are themselves `Record`-tagged.
    pub key_nested_schema: Option<Result<Arc<Schema>, SchemaError>>,
}

/// The compiled shape of one record type: its fields, in declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub type_name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn placeholder(type_name: &'static str) -> Schema {
        Schema {
            type_name,
            fields: Vec::new(),
        }
    }
}

enum Slot {
    Building,
    Ready(Arc<Schema>),
}

static CACHE: std::sync::OnceLock<DashMap<TypeId, Slot>> = std::sync::OnceLock::new();

fn cache() -> &'static DashMap<TypeId, Slot> {
    CACHE.get_or_init(DashMap::new)
}

/// Looks up or builds the schema for `R`, using `build` to compute it on first visit.
/// `build` itself may call `schema_for` again for nested record types; a re-entrant call
/// for the same `TypeId` observes the building placeholder and returns a shallow stub
/// rather than recursing.
pub fn schema_for<R: 'static>(
    build: impl FnOnce() -> Result<Schema, SchemaError>,
) -> Result<Arc<Schema>, SchemaError> {
    let tid = TypeId::of::<R>();
    let cache = cache();

    match cache.entry(tid) {
        Entry::Occupied(occ) => match occ.get() {
            Slot::Ready(schema) => Ok(schema.clone()),
            Slot::Building => Ok(Arc::new(Schema::placeholder(std::any::type_name::<R>()))),
        },
        Entry::Vacant(vac) => {
            vac.insert(Slot::Building);
            let result = build();
            match result {
                Ok(schema) => {
                    let schema = Arc::new(schema);
                    cache.insert(tid, Slot::Ready(schema.clone()));
                    Ok(schema)
                }
                Err(e) => {
                    cache.remove(&tid);
                    Err(e)
                }
            }
        }
    }
}

/// Drops every compiled schema from the process-wide cache. Subsequent use of a registered
/// type rebuilds its schema from scratch.
pub fn clear_cache() {
    if let Some(cache) = CACHE.get() {
        cache.clear();
    }
}
