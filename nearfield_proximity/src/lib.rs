// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=nearfield_proximity --heading-base-level=0

//! Nearfield Proximity: range counting over movable circular proxies.
//!
//! Nearfield Proximity answers one question every simulation tick: for each
//! tracked proxy, how many other proxies lie within its configured range?
//!
//! - Register proxies with a position, a small body radius, and a per-proxy
//!   query range ([`ProxySet::insert`]).
//! - Feed position updates from the surrounding simulation
//!   ([`ProxySet::set_position`]), then [`ProxySet::commit`] to apply them —
//!   the barrier between moving the population and querying it.
//! - Run the counting pass ([`ProxySet::update_counts`]) to write every
//!   proxy's count, or query one proxy ad hoc
//!   ([`ProxySet::count_in_range`], [`ProxySet::nearest_in_range`]).
//!
//! Counting is the standard two-phase pattern: a broad-phase rectangle query
//! against a [`nearfield_index`] AABB index (the box around a position with
//! half-extents equal to the range), then an exact squared-distance narrow
//! phase, boundary inclusive, with the querying proxy excluded explicitly.
//! Broad-phase false positives (box corners) are filtered; nothing in range
//! is ever missed. A query with no candidates yields count 0 — there is no
//! error state.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use nearfield_proximity::{Proxy, ProxySet};
//!
//! let mut set = ProxySet::new();
//! let a = set.insert(Proxy::at((0.0, 0.0)).with_range(10.0));
//! let b = set.insert(Proxy::at((5.0, 0.0)).with_range(10.0));
//! set.update_counts();
//! assert_eq!(set.count(a), Some(1));
//!
//! // Moves apply at the barrier, not before.
//! set.set_position(b, Point::new(50.0, 0.0));
//! assert_eq!(set.count_in_range(a), Some(1));
//! set.update_counts();
//! assert_eq!(set.count(a), Some(0));
//! ```
//!
//! ## Scaling up
//!
//! The default backend scans linearly, which is fine for small populations.
//! For larger ones, wire in the grid backend:
//!
//! ```rust
//! use nearfield_index::backends::GridF64;
//! use nearfield_proximity::{Proxy, ProxySet};
//!
//! // Cell size on the order of the typical query box.
//! let mut set = ProxySet::with_backend(GridF64::new(20.0));
//! let a = set.insert(Proxy::at((-40.0, 25.0)));
//! set.update_counts();
//! assert_eq!(set.count(a), Some(0));
//! ```
//!
//! ## Features
//!
//! - `std` *(default)*: float math via the standard library.
//! - `libm`: float math via `libm` for `no_std` builds.
//! - `parallel`: the counting pass fans out over rayon (implies `std`).
//!   Queries only read shared state during the pass, so proxies are counted
//!   independently; results are identical to the serial pass.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod set;
mod types;
mod util;

pub use set::ProxySet;
pub use types::{Proxy, ProxyId};
