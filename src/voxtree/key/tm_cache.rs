// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide cache for TM-index materialisation.
//!
//! A striped, open-addressed slot table mapping (anchor, level, type) to
//! packed bits. The cache is optional for correctness: any miss falls
//! through to the O(level) parent-chain walk. Stripes carry independent
//! locks so lookups never contend with the store lease.

use crate::voxtree::key::tet::Tet;
use crate::voxtree::key::tm_index;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Stripes; must be a power of two.
const STRIPE_COUNT: usize = 16;

/// Slots per stripe; must be a power of two.
const STRIPE_CAPACITY: usize = 4096;

/// Probes before evicting the first slot of the window.
const MAX_PROBES: usize = 8;

#[derive(Clone, Copy)]
struct Slot {
    x: u32,
    y: u32,
    z: u32,
    level: u8,
    kind: u8,
    bits: u128,
}

struct Stripe {
    slots: Vec<Option<Slot>>,
}

impl Stripe {
    fn new() -> Self {
        Self {
            slots: vec![None; STRIPE_CAPACITY],
        }
    }
}

/// Striped TM-index cache with hit/miss counters.
pub struct TmIndexCache {
    stripes: [Mutex<Stripe>; STRIPE_COUNT],
    hits: AtomicU64,
    misses: AtomicU64,
}

/// The per-process cache instance.
pub static TM_CACHE: Lazy<TmIndexCache> = Lazy::new(TmIndexCache::new);

impl TmIndexCache {
    fn new() -> Self {
        Self {
            stripes: std::array::from_fn(|_| Mutex::new(Stripe::new())),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn slot_hash(tet: &Tet) -> u64 {
        // FNV-1a over the five identifying fields.
        let mut hash = 0xcbf2_9ce4_8422_2325u64;
        for word in [tet.x, tet.y, tet.z, tet.level as u32, tet.kind as u32] {
            for byte in word.to_le_bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
        }
        hash
    }

    /// Returns the packed bits for `tet`, walking and caching on a miss.
    pub fn bits_for(&self, tet: &Tet) -> u128 {
        let hash = Self::slot_hash(tet);
        let stripe_index = (hash as usize) & (STRIPE_COUNT - 1);
        let base = ((hash >> 32) as usize) & (STRIPE_CAPACITY - 1);

        let mut stripe = self
            .stripes[stripe_index]
            .lock()
            .expect("TM cache stripe poisoned");

        for probe in 0..MAX_PROBES {
            let index = (base + probe) & (STRIPE_CAPACITY - 1);
            match &stripe.slots[index] {
                Some(slot)
                    if slot.x == tet.x
                        && slot.y == tet.y
                        && slot.z == tet.z
                        && slot.level == tet.level
                        && slot.kind == tet.kind =>
                {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return slot.bits;
                }
                Some(_) => continue,
                None => break,
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let bits = tm_index::encode(tet);

        // Insert into the first free probe, else evict the window base.
        let mut target = base;
        for probe in 0..MAX_PROBES {
            let index = (base + probe) & (STRIPE_CAPACITY - 1);
            if stripe.slots[index].is_none() {
                target = index;
                break;
            }
        }
        stripe.slots[target] = Some(Slot {
            x: tet.x,
            y: tet.y,
            z: tet.z,
            level: tet.level,
            kind: tet.kind,
            bits,
        });
        bits
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
