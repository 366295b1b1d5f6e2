// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Entity records and the id → entity manager.
//!
//! Entities refer to cover keys and nodes refer to entity ids; both are
//! plain values, so no back-references exist between the two maps. The
//! manager owns the primary record; nodes hold lookup-only ids.

use crate::voxtree::geometry::{Aabb, Point3};
use crate::voxtree::key::SpatialKey;
use crate::voxtree::voxstream::{conflict, not_found, EntityId, VoxResult};
use std::collections::{BTreeSet, HashMap};

/// Primary record of an indexed entity.
#[derive(Debug, Clone)]
pub struct Entity<K: SpatialKey, I: EntityId, C> {
    pub id: I,
    pub position: Point3,
    pub bounds: Option<Aabb>,
    pub content: C,
    /// Level the entity was registered at; updates re-key at this level.
    pub level: u8,
    /// Keys currently referencing the entity.
    keys: BTreeSet<K>,
}

impl<K: SpatialKey, I: EntityId, C> Entity<K, I, C> {
    pub fn new(
        id: I,
        position: Point3,
        bounds: Option<Aabb>,
        content: C,
        level: u8,
    ) -> Self {
        Self {
            id,
            position,
            bounds,
            content,
            level,
            keys: BTreeSet::new(),
        }
    }

    /// Cover-set in ascending key order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn cover_len(&self) -> usize {
        self.keys.len()
    }

    pub fn covers(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn add_key(&mut self, key: K) -> bool {
        self.keys.insert(key)
    }

    pub fn remove_key(&mut self, key: &K) -> bool {
        self.keys.remove(key)
    }

    pub fn set_keys(&mut self, keys: impl IntoIterator<Item = K>) {
        self.keys = keys.into_iter().collect();
    }

    pub fn keys_set(&self) -> &BTreeSet<K> {
        &self.keys
    }
}

/// Id → entity map with conflict and missing-id semantics at the API
/// boundary.
#[derive(Debug, Clone)]
pub struct EntityManager<K: SpatialKey, I: EntityId, C> {
    entities: HashMap<I, Entity<K, I, C>>,
}

impl<K: SpatialKey, I: EntityId, C> Default for EntityManager<K, I, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SpatialKey, I: EntityId, C> EntityManager<K, I, C> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: &I) -> bool {
        self.entities.contains_key(id)
    }

    /// Stores a fresh entity.
    ///
    /// ## Error Conditions
    /// - `Conflict` on a duplicate id
    pub fn insert(&mut self, entity: Entity<K, I, C>) -> VoxResult<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(conflict(
                format!("entity {:?}", entity.id),
                "duplicate id on insert",
            ));
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    pub fn get(&self, id: &I) -> Option<&Entity<K, I, C>> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &I) -> Option<&mut Entity<K, I, C>> {
        self.entities.get_mut(id)
    }

    /// Looks up an entity that must exist.
    ///
    /// ## Error Conditions
    /// - `NotFound` with the operation as context
    pub fn expect(&self, id: &I, operation: &str) -> VoxResult<&Entity<K, I, C>> {
        self.entities
            .get(id)
            .ok_or_else(|| not_found(format!("entity {:?}", id)).with_context(operation))
    }

    pub fn expect_mut(
        &mut self,
        id: &I,
        operation: &str,
    ) -> VoxResult<&mut Entity<K, I, C>> {
        self.entities
            .get_mut(id)
            .ok_or_else(|| not_found(format!("entity {:?}", id)).with_context(operation))
    }

    /// Removes and returns the record.
    ///
    /// ## Error Conditions
    /// - `NotFound` for a missing id
    pub fn remove(&mut self, id: &I) -> VoxResult<Entity<K, I, C>> {
        self.entities
            .remove(id)
            .ok_or_else(|| not_found(format!("entity {:?}", id)).with_context("remove"))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&I, &Entity<K, I, C>)> {
        self.entities.iter()
    }
}
