// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Node store and entity manager.
//!
//! - node: per-cell payload (entity ids + child bitmap)
//! - node_store: ordered key → node map with chain maintenance
//! - entity: id → entity records with cover-sets
//! - spanning: cover computation for bounded entities

pub mod entity;
pub mod node;
pub mod node_store;
pub mod spanning;

pub use entity::{Entity, EntityManager};
pub use node::Node;
pub use node_store::NodeStore;
pub use spanning::{cover_keys, SpanningPolicy};

#[cfg(test)]
mod node_test;
