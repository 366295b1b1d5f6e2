// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Debug and statistics surface.
//!
//! - stats: node/entity counts, depth histogram, occupancy
//! - ascii: indented plain-text dump through a sink capability
//! - obj: Wavefront wireframe export through a sink capability

pub mod ascii;
pub mod obj;
pub mod stats;

pub use ascii::{dump, AsciiDump, DumpSink};
pub use obj::{export_wireframe, ObjSink, ObjWriter};
pub use stats::{tree_stats, TreeStats};
