// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! ASCII dump of the tree in traversal order.

use crate::voxtree::geometry::Aabb;
use crate::voxtree::index::{NodeSnapshot, SpatialIndex};
use crate::voxtree::key::SpatialKey;
use crate::voxtree::voxstream::{EntityId, VoxResult};
use std::collections::HashMap;
use std::io::Write;

/// Sink receiving one record per node, in depth-first traversal order.
pub trait DumpSink<K: SpatialKey, I: EntityId> {
    fn record(&mut self, level: u8, key: &K, bbox: &Aabb, ids: &[I]) -> VoxResult<()>;
}

/// Indented plain-text dump over any writer.
pub struct AsciiDump<W: Write> {
    out: W,
}

impl<W: Write> AsciiDump<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<K: SpatialKey, I: EntityId, W: Write> DumpSink<K, I> for AsciiDump<W> {
    fn record(&mut self, level: u8, key: &K, bbox: &Aabb, ids: &[I]) -> VoxResult<()> {
        let indent = "  ".repeat(level as usize);
        writeln!(
            self.out,
            "{}[L{:02}] {:?} bbox=[({}, {}, {})..({}, {}, {})] entities={:?}",
            indent,
            level,
            key,
            bbox.min.x,
            bbox.min.y,
            bbox.min.z,
            bbox.max.x,
            bbox.max.y,
            bbox.max.z,
            ids
        )?;
        Ok(())
    }
}

/// Walks the tree depth-first in child order and feeds the sink.
pub fn dump<K, I, C, S>(index: &SpatialIndex<K, I, C>, sink: &mut S) -> VoxResult<()>
where
    K: SpatialKey,
    I: EntityId,
    C: Clone + Send + Sync + 'static,
    S: DumpSink<K, I>,
{
    let snapshots = index.nodes();
    let by_key: HashMap<K, &NodeSnapshot<K, I>> =
        snapshots.iter().map(|node| (node.key, node)).collect();

    let mut stack = Vec::new();
    if by_key.contains_key(&K::root()) {
        stack.push(K::root());
    }
    while let Some(key) = stack.pop() {
        let node = match by_key.get(&key) {
            Some(node) => node,
            None => continue,
        };
        sink.record(node.level, &node.key, &node.aabb, &node.entity_ids)?;
        // Reverse order so the stack pops children ascending.
        for i in (0..8u8).rev() {
            if node.child_bitmap & (1 << i) != 0 {
                stack.push(key.child(i));
            }
        }
    }
    Ok(())
}
