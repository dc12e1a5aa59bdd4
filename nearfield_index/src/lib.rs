// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=nearfield_index --heading-base-level=0

//! Nearfield Index: a generic 2D AABB index (boundary index).
//!
//! Nearfield Index is a reusable building block for broad-phase spatial
//! queries.
//!
//! - Insert, update, and remove axis-aligned bounding boxes (AABBs) with user
//!   payloads.
//! - Query by intersecting rectangle; matches are a faithful superset for a
//!   narrow phase to filter (false positives possible, false negatives never).
//! - Batch changes and apply them with [`Index::commit`], the barrier between
//!   moving a population and querying it.
//!
//! It is generic over the scalar type `T` and does not depend on any geometry
//! crate. Higher layers (like a proxy arena tracking moving agents) can
//! compute world-space AABBs and feed them here.
//!
//! Backends are pluggable via a simple trait so you can swap the spatial
//! strategy without API churn. The default backend is a flat vector (linear
//! scan). A uniform grid backend is available behind the `backend_grid`
//! feature (default).
//!
//! ## Features
//!
//! - `backend_grid` *(default)*: enables a uniform grid backend backed by
//!   `hashbrown`. Disable this feature to avoid the `hashbrown` dependency
//!   and grid types.
//!
//! # Example
//!
//! ```rust
//! use nearfield_index::{Aabb2D, Index};
//!
//! // Create an index and add two boxes.
//! let mut idx: Index<f64, u32> = Index::new();
//! let k1 = idx.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
//! let k2 = idx.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
//! let applied = idx.commit();
//! assert_eq!(applied, 2);
//!
//! // Query a rectangle overlapping only the second box.
//! let hits: Vec<_> = idx.query_rect(Aabb2D::new(12.0, 12.0, 20.0, 20.0)).collect();
//! assert_eq!(hits, vec![(k2, 2)]);
//!
//! // Move the first box; the move is observable only after the next commit.
//! idx.update(k1, Aabb2D::new(12.0, 12.0, 14.0, 14.0));
//! let _ = idx.commit();
//! assert_eq!(idx.query_rect(Aabb2D::new(12.0, 12.0, 20.0, 20.0)).count(), 2);
//! ```
//!
//! With the `backend_grid` feature enabled (default), you can also use a
//! uniform grid backend:
//!
//! ```rust
//! # #[cfg(feature = "backend_grid")]
//! # {
//! use nearfield_index::{Aabb2D, Index};
//!
//! // Use a grid backend (f64) with a 16-unit cell size.
//! let mut idx = Index::<f64, u32>::with_grid(16.0);
//! let _k = idx.insert(Aabb2D::around(0.0, 0.0, 5.0, 5.0), 1);
//! let _ = idx.commit();
//!
//! let hits: Vec<_> = idx.query_rect(Aabb2D::around(2.0, 2.0, 1.0, 1.0)).collect();
//! assert_eq!(hits.len(), 1);
//! # }
//! ```
//!
//! ## Choosing a backend
//!
//! - `FlatVec` (default): simplest and smallest, linear scans. Good for very
//!   small sets or when inserts/updates vastly outnumber queries.
//! - `GridF32`/`GridF64` *(feature `backend_grid`)*: uniform grid with
//!   configurable cell size. A good fit for agents roughly uniformly
//!   distributed over a play area where query rectangles are small compared
//!   to the world extent.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds may
//! assert.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod index;
mod types;

pub use backend::Backend;
pub use index::{Index, IndexGeneric, Key};
pub use types::{Aabb2D, Scalar};
