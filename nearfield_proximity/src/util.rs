// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;
use nearfield_index::Aabb2D;

/// The AABB kept in the spatial index for a body at `position`.
pub(crate) fn body_box(position: Point, radius: f64) -> Aabb2D<f64> {
    Aabb2D::around(position.x, position.y, radius, radius)
}

/// The broad-phase query box for a range query at `position`.
///
/// Half-extents equal the range on both axes, so every body whose center lies
/// within `range` is guaranteed to overlap the box. False positives in the
/// corners are filtered by the distance narrow phase.
pub(crate) fn range_box(position: Point, range: f64) -> Aabb2D<f64> {
    Aabb2D::around(position.x, position.y, range, range)
}
