// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the proxy set: proxy identifiers and registration data.

use kurbo::Point;

/// Identifier for a proxy in the set (generational).
///
/// A `ProxyId` becomes stale when its proxy is removed. Slot reuse bumps the
/// generation, so a stale id never aliases a later proxy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProxyId(pub(crate) u32, pub(crate) u32);

impl ProxyId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Registration data for a proxy.
///
/// A proxy is a movable circular body with a query range. The body `radius`
/// determines the AABB kept in the spatial index; the `range` determines the
/// query region used for range counting and nearest-target scans. The range
/// is fixed at registration; only the position changes afterwards, via
/// [`ProxySet::set_position`][crate::ProxySet::set_position].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Proxy {
    /// Position on the simulation plane.
    pub position: Point,
    /// Body radius. Must be finite and non-negative.
    pub radius: f64,
    /// Query radius for range counting. Must be finite and non-negative.
    pub range: f64,
}

impl Default for Proxy {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            radius: 0.5,
            range: 10.0,
        }
    }
}

impl Proxy {
    /// A proxy at the given position with the default body radius and range.
    pub fn at(position: impl Into<Point>) -> Self {
        Self {
            position: position.into(),
            ..Self::default()
        }
    }

    /// Set the query range.
    #[must_use]
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = range;
        self
    }

    /// Set the body radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}
