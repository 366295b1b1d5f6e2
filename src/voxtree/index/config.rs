// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Index configuration with TOML loading.
//!
//! Mirrors the project configuration layer: serde-derived structs with
//! defaults, parsed from TOML and validated into `ConfigError`s.

use crate::voxtree::key::MAX_REFINEMENT_LEVEL;
use crate::voxtree::store::SpanningPolicy;
use crate::voxtree::voxstream::{config_error, VoxResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Deepest level entities may be registered at.
    #[serde(default = "default_max_depth")]
    pub max_depth: u8,

    /// Level used by single inserts without an explicit level.
    #[serde(default = "default_level")]
    pub default_level: u8,

    /// Subdivision threshold per node.
    #[serde(default = "default_max_entities")]
    pub max_entities_per_node: usize,

    /// Cover strategy for bounded entities.
    #[serde(default)]
    pub spanning: SpanningPolicy,

    /// Sibling-merge threshold; `None` computes
    /// `max_entities_per_node / 4`.
    #[serde(default)]
    pub merge_threshold: Option<usize>,

    /// Cover budget for `SpanningPolicy::ClampedSpan`.
    #[serde(default = "default_max_span_cells")]
    pub max_span_cells: usize,

    #[serde(default)]
    pub adaptive: AdaptiveConfig,

    #[serde(default)]
    pub bulk: BulkConfig,
}

/// Occupancy band for adaptive level selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Enables adaptive level selection in bulk inserts.
    #[serde(default)]
    pub enabled: bool,

    /// Lower bound of the target per-cell occupancy.
    #[serde(default = "default_occupancy_lo")]
    pub occupancy_lo: f64,

    /// Upper bound of the target per-cell occupancy; `None` uses
    /// `max_entities_per_node`.
    #[serde(default)]
    pub occupancy_hi: Option<f64>,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            occupancy_lo: default_occupancy_lo(),
            occupancy_hi: None,
        }
    }
}

/// Bulk pipeline tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Inputs below this count skip the parallel phases.
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Minimum chunk size when partitioning sorted runs.
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,

    /// Worker threads; 0 resolves to the machine's logical CPUs.
    #[serde(default)]
    pub threads: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            chunk_threshold: default_chunk_threshold(),
            threads: 0,
        }
    }
}

fn default_max_depth() -> u8 {
    MAX_REFINEMENT_LEVEL
}

fn default_level() -> u8 {
    10
}

fn default_max_entities() -> usize {
    16
}

fn default_max_span_cells() -> usize {
    64
}

fn default_occupancy_lo() -> f64 {
    1.0
}

fn default_parallel_threshold() -> usize {
    1024
}

fn default_chunk_threshold() -> usize {
    256
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_level: default_level(),
            max_entities_per_node: default_max_entities(),
            spanning: SpanningPolicy::default(),
            merge_threshold: None,
            max_span_cells: default_max_span_cells(),
            adaptive: AdaptiveConfig::default(),
            bulk: BulkConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Parses and validates a TOML document.
    ///
    /// ## Example Usage
    /// ```rust
    /// use voxtree::voxtree::index::config::IndexConfig;
    ///
    /// let config = IndexConfig::from_toml_str(
    ///     "default_level = 12\nmax_entities_per_node = 32",
    /// )
    /// .unwrap();
    /// assert_eq!(config.default_level, 12);
    /// ```
    pub fn from_toml_str(input: &str) -> VoxResult<Self> {
        let config: IndexConfig = toml::from_str(input)
            .map_err(|e| config_error("index_config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> VoxResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            config_error(
                "index_config",
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates field ranges and cross-field constraints.
    pub fn validate(&self) -> VoxResult<()> {
        if self.max_depth > MAX_REFINEMENT_LEVEL {
            return Err(config_error(
                "max_depth",
                format!(
                    "{} exceeds deepest level {}",
                    self.max_depth, MAX_REFINEMENT_LEVEL
                ),
            ));
        }
        if self.default_level > self.max_depth {
            return Err(config_error(
                "default_level",
                format!("{} exceeds max_depth {}", self.default_level, self.max_depth),
            ));
        }
        if self.max_entities_per_node == 0 {
            return Err(config_error(
                "max_entities_per_node",
                "must be at least 1",
            ));
        }
        if self.max_span_cells == 0 {
            return Err(config_error("max_span_cells", "must be at least 1"));
        }
        if self.adaptive.occupancy_lo <= 0.0 {
            return Err(config_error("adaptive.occupancy_lo", "must be positive"));
        }
        if let Some(hi) = self.adaptive.occupancy_hi {
            if hi < self.adaptive.occupancy_lo {
                return Err(config_error(
                    "adaptive.occupancy_hi",
                    "must be at least occupancy_lo",
                ));
            }
        }
        Ok(())
    }

    /// Effective sibling-merge threshold.
    pub fn effective_merge_threshold(&self) -> usize {
        self.merge_threshold
            .unwrap_or(self.max_entities_per_node / 4)
    }

    /// Effective adaptive occupancy ceiling.
    pub fn effective_occupancy_hi(&self) -> f64 {
        self.adaptive
            .occupancy_hi
            .unwrap_or(self.max_entities_per_node as f64)
    }

    /// Effective bulk worker count.
    pub fn effective_threads(&self) -> usize {
        if self.bulk.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.bulk.threads
        }
    }

    pub fn with_default_level(mut self, level: u8) -> Self {
        self.default_level = level;
        self
    }

    pub fn with_max_entities_per_node(mut self, limit: usize) -> Self {
        self.max_entities_per_node = limit;
        self
    }

    pub fn with_spanning(mut self, policy: SpanningPolicy) -> Self {
        self.spanning = policy;
        self
    }

    pub fn with_adaptive(mut self, enabled: bool) -> Self {
        self.adaptive.enabled = enabled;
        self
    }
}
