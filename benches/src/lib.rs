// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for the nearfield crates. See the `benches/` directory.
