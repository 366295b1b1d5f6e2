// Copyright 2025 Vivian Voss. Licensed under the Apache Licence, Version 2.0.
// SPDX-Licence-Identifier: Apache-2.0

//! Bulk-insertion pipeline.
//!
//! Stages: validate → select level → compute covers in parallel → sort by
//! key → partition into contiguous key ranges → build per-thread delta
//! maps → merge under one writer section → deferred subdivision. The
//! sort is the heart of the pipeline: it recovers spatial locality so the
//! merge walks the store in order.

pub mod pipeline;
