// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core proxy set implementation: registration, commits, range counting.

use alloc::vec::Vec;
use kurbo::Point;
use nearfield_index::{Backend, IndexGeneric, Key as AabbKey, backends::FlatVec};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs;

use crate::types::{Proxy, ProxyId};
use crate::util::{body_box, range_box};

/// An arena of movable circular proxies with per-proxy range counting.
///
/// The type parameter `B` controls which spatial index backend is used. It
/// defaults to a flat-vector backend ([`FlatVec<f64>`]), so most callers can
/// simply use [`ProxySet`] without specifying `B`. Advanced callers can
/// override `B` with a grid backend from `nearfield_index` when the
/// population grows.
///
/// Position changes do **not** take effect immediately. They are batched and
/// applied when [`ProxySet::commit`] is called, which synchronizes the
/// spatial index. Query APIs ([`count_in_range`](ProxySet::count_in_range),
/// [`nearest_in_range`](ProxySet::nearest_in_range)) observe committed state
/// only; [`update_counts`](ProxySet::update_counts) commits internally before
/// counting, so a counting pass never mixes old index state with new
/// positions.
///
/// ## Example
///
/// ```rust
/// use nearfield_proximity::{Proxy, ProxySet};
///
/// // Three proxies on a line, all with the default range of 10.
/// let mut set = ProxySet::new();
/// let a = set.insert(Proxy::at((0.0, 0.0)));
/// let b = set.insert(Proxy::at((5.0, 0.0)));
/// let c = set.insert(Proxy::at((20.0, 0.0)));
/// set.update_counts();
///
/// // a and b are within range of each other; c is 15 away from b.
/// assert_eq!(set.count(a), Some(1));
/// assert_eq!(set.count(b), Some(1));
/// assert_eq!(set.count(c), Some(0));
/// ```
pub struct ProxySet<B: Backend<f64> = FlatVec<f64>> {
    /// slots
    slots: Vec<Option<Slot>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    index: IndexGeneric<f64, ProxyId, B>,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    radius: f64,
    range: f64,
    /// Latest position supplied from outside; applied on commit.
    pending: Point,
    /// Committed position, what queries observe.
    position: Point,
    count: u32,
    dirty: bool,
    index_key: AabbKey,
}

impl<B: Backend<f64> + core::fmt::Debug> core::fmt::Debug for ProxySet<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.slots.len();
        let alive = self.slots.iter().filter(|s| s.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("ProxySet")
            .field("slots_total", &total)
            .field("slots_alive", &alive)
            .field("free_list", &free)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl ProxySet {
    /// Create a new empty set using the default backend (`FlatVec<f64>`).
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            index: IndexGeneric::new(),
        }
    }
}

impl Default for ProxySet {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend<f64>> ProxySet<B> {
    /// Create a new set with a specific backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            index: IndexGeneric::with_backend(backend),
        }
    }

    /// Register a proxy. Returns a stable handle `ProxyId`.
    ///
    /// The proxy participates in queries after the next
    /// [`commit`](Self::commit). Its range is fixed for its lifetime.
    pub fn insert(&mut self, proxy: Proxy) -> ProxyId {
        debug_assert!(
            proxy.range.is_finite() && proxy.range >= 0.0,
            "proxy range must be finite and non-negative"
        );
        debug_assert!(
            proxy.radius.is_finite() && proxy.radius >= 0.0,
            "proxy radius must be finite and non-negative"
        );
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.generations.push(1);
            self.slots.push(None);
            (self.slots.len() - 1, 1_u32)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ProxyId uses 32-bit indices by design."
        )]
        let id = ProxyId::new(idx as u32, generation);
        let index_key = self.index.insert(body_box(proxy.position, proxy.radius), id);
        self.slots[idx] = Some(Slot {
            generation,
            radius: proxy.radius,
            range: proxy.range,
            pending: proxy.position,
            position: proxy.position,
            count: 0,
            dirty: false,
            index_key,
        });
        id
    }

    /// Remove a proxy. Stale ids are ignored.
    ///
    /// The id becomes stale immediately; the spatial index entry is dropped
    /// on the next [`commit`](Self::commit).
    pub fn remove(&mut self, id: ProxyId) {
        let Some(key) = self.slot(id).map(|s| s.index_key) else {
            return;
        };
        self.index.remove(key);
        self.slots[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Update a proxy's position. Stale ids are ignored.
    ///
    /// This is the once-per-tick refresh from the surrounding simulation.
    /// The move is observable to queries only after the next
    /// [`commit`](Self::commit).
    pub fn set_position(&mut self, id: ProxyId, position: Point) {
        if let Some(s) = self.slot_mut(id)
            && s.pending != position
        {
            s.pending = position;
            s.dirty = true;
        }
    }

    /// Apply pending position changes and membership changes to the spatial
    /// index. Returns the number of applied index changes.
    ///
    /// This is the ordering barrier between moving proxies and querying them:
    /// no query observes a half-applied population.
    pub fn commit(&mut self) -> usize {
        for slot in self.slots.iter_mut().flatten() {
            if slot.dirty {
                slot.position = slot.pending;
                slot.dirty = false;
                self.index.update(slot.index_key, body_box(slot.position, slot.radius));
            }
        }
        self.index.commit()
    }

    /// Whether `id` refers to a live proxy.
    pub fn is_alive(&self, id: ProxyId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of live proxies.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the set has no live proxies.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// The committed position of a live proxy, or `None` for stale ids.
    ///
    /// A position set since the last [`commit`](Self::commit) is not yet
    /// visible here, matching what queries observe.
    pub fn position(&self, id: ProxyId) -> Option<Point> {
        self.slot(id).map(|s| s.position)
    }

    /// The query range of a live proxy, or `None` for stale ids.
    pub fn range(&self, id: ProxyId) -> Option<f64> {
        self.slot(id).map(|s| s.range)
    }

    /// The body radius of a live proxy, or `None` for stale ids.
    pub fn radius(&self, id: ProxyId) -> Option<f64> {
        self.slot(id).map(|s| s.radius)
    }

    /// The count written by the last counting pass, or `None` for stale ids.
    pub fn count(&self, id: ProxyId) -> Option<u32> {
        self.slot(id).map(|s| s.count)
    }

    /// Iterate `(id, count)` over all live proxies.
    pub fn counts(&self) -> impl Iterator<Item = (ProxyId, u32)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            let s = s.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ProxyId uses 32-bit indices by design."
            )]
            let id = ProxyId::new(i as u32, s.generation);
            Some((id, s.count))
        })
    }

    /// Count the other live proxies whose center lies within `id`'s range
    /// (boundary inclusive), against committed state.
    ///
    /// Returns `None` for stale ids. This does not write the stored count;
    /// use [`update_counts`](Self::update_counts) for the per-tick pass.
    pub fn count_in_range(&self, id: ProxyId) -> Option<u32> {
        let s = self.slot(id)?;
        Some(self.count_for(id, s.position, s.range))
    }

    /// The nearest other live proxy within `id`'s range, with its distance.
    ///
    /// Candidates come from the same broad phase as counting; the nearest is
    /// chosen by squared center distance, so ties resolve to the first
    /// candidate encountered (backend order). Returns `None` for stale ids
    /// and when nothing is in range.
    pub fn nearest_in_range(&self, id: ProxyId) -> Option<(ProxyId, f64)> {
        let s = self.slot(id)?;
        let r2 = s.range * s.range;
        let mut best: Option<(ProxyId, f64)> = None;
        self.index.visit_rect(range_box(s.position, s.range), |_key, other| {
            if other == id {
                return;
            }
            let Some(o) = self.slot(other) else {
                return;
            };
            let d2 = (o.position - s.position).hypot2();
            if d2 <= r2 && best.is_none_or(|(_, b2)| d2 < b2) {
                best = Some((other, d2));
            }
        });
        best.map(|(other, d2)| (other, d2.sqrt()))
    }

    /// Broad phase over the committed index, then exact distance filtering.
    /// Self-exclusion is explicit; entries whose slot died since the last
    /// commit are skipped.
    fn count_for(&self, id: ProxyId, position: Point, range: f64) -> u32 {
        let r2 = range * range;
        let mut n = 0;
        self.index.visit_rect(range_box(position, range), |_key, other| {
            if other == id {
                return;
            }
            let Some(o) = self.slot(other) else {
                return;
            };
            if (o.position - position).hypot2() <= r2 {
                n += 1;
            }
        });
        n
    }

    fn slot(&self, id: ProxyId) -> Option<&Slot> {
        let s = self.slots.get(id.idx())?.as_ref()?;
        if s.generation != id.1 {
            return None;
        }
        Some(s)
    }

    fn slot_mut(&mut self, id: ProxyId) -> Option<&mut Slot> {
        let s = self.slots.get_mut(id.idx())?.as_mut()?;
        if s.generation != id.1 {
            return None;
        }
        Some(s)
    }

    fn write_counts(&mut self, results: Vec<(usize, u32)>) -> usize {
        let counted = results.len();
        for (i, n) in results {
            if let Some(s) = self.slots[i].as_mut() {
                s.count = n;
            }
        }
        counted
    }
}

#[cfg(not(feature = "parallel"))]
impl<B: Backend<f64>> ProxySet<B> {
    /// Run the per-tick counting pass: commit pending changes, then compute
    /// and store every live proxy's range count. Returns the number of
    /// proxies counted.
    ///
    /// Committing first is what keeps a pass coherent: the index is frozen
    /// before the first query, and every count is computed against the same
    /// committed population.
    pub fn update_counts(&mut self) -> usize {
        self.commit();
        let results: Vec<(usize, u32)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let s = s.as_ref()?;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "ProxyId uses 32-bit indices by design."
                )]
                let id = ProxyId::new(i as u32, s.generation);
                Some((i, self.count_for(id, s.position, s.range)))
            })
            .collect();
        self.write_counts(results)
    }
}

#[cfg(feature = "parallel")]
impl<B: Backend<f64> + Sync> ProxySet<B> {
    /// Run the per-tick counting pass: commit pending changes, then compute
    /// and store every live proxy's range count. Returns the number of
    /// proxies counted.
    ///
    /// Committing first is what keeps a pass coherent: the index is frozen
    /// before the first query, and every count is computed against the same
    /// committed population. The compute phase fans out over rayon; it only
    /// reads shared state, and each proxy's count is written back exactly
    /// once by the serial write pass.
    pub fn update_counts(&mut self) -> usize {
        use rayon::prelude::*;

        self.commit();
        let results: Vec<(usize, u32)> = self
            .slots
            .par_iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let s = s.as_ref()?;
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "ProxyId uses 32-bit indices by design."
                )]
                let id = ProxyId::new(i as u32, s.generation);
                Some((i, self.count_for(id, s.position, s.range)))
            })
            .collect();
        self.write_counts(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn line_set(xs: &[f64], range: f64) -> (ProxySet, Vec<ProxyId>) {
        let mut set = ProxySet::new();
        let ids = xs
            .iter()
            .map(|&x| set.insert(Proxy::at((x, 0.0)).with_range(range)))
            .collect();
        (set, ids)
    }

    #[test]
    fn lone_proxy_counts_zero() {
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(100.0));
        set.update_counts();
        assert_eq!(set.count(a), Some(0), "a proxy must not count itself");
    }

    #[test]
    fn coincident_proxies_count_each_other() {
        let mut set = ProxySet::new();
        let ids: Vec<ProxyId> = (0..5)
            .map(|_| set.insert(Proxy::at((3.0, -7.0)).with_range(1.0)))
            .collect();
        set.update_counts();
        for id in ids {
            assert_eq!(set.count(id), Some(4));
        }
    }

    #[test]
    fn boundary_is_inclusive() {
        // Exactly at distance == range, both proxies count each other.
        let (mut set, ids) = line_set(&[0.0, 10.0], 10.0);
        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(1));
        assert_eq!(set.count(ids[1]), Some(1));

        // Just beyond, neither does.
        let (mut set, ids) = line_set(&[0.0, 10.0 + 1e-9], 10.0);
        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(0));
        assert_eq!(set.count(ids[1]), Some(0));
    }

    #[test]
    fn zero_range_counts_only_coincident() {
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(0.0));
        let _b = set.insert(Proxy::at((0.1, 0.0)).with_range(0.0));
        let _c = set.insert(Proxy::at((0.0, 0.0)).with_range(0.0));
        set.update_counts();
        // c is coincident with a (distance 0 <= 0); b is not.
        assert_eq!(set.count(a), Some(1));
    }

    #[test]
    fn three_on_a_line() {
        let (mut set, ids) = line_set(&[0.0, 5.0, 20.0], 10.0);
        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(1));
        assert_eq!(set.count(ids[1]), Some(1), "distance to the far proxy is 15 > 10");
        assert_eq!(set.count(ids[2]), Some(0));
    }

    #[test]
    fn ranges_are_per_proxy() {
        // Asymmetric ranges: a sees b, b does not see a.
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(10.0));
        let b = set.insert(Proxy::at((8.0, 0.0)).with_range(5.0));
        set.update_counts();
        assert_eq!(set.count(a), Some(1));
        assert_eq!(set.count(b), Some(0));
    }

    #[test]
    fn diagonal_distance_is_euclidean() {
        // The corner of the query box is within the box but beyond the range.
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(10.0));
        let _corner = set.insert(Proxy::at((8.0, 8.0)).with_range(10.0));
        let _edge = set.insert(Proxy::at((7.0, 7.0)).with_range(10.0));
        set.update_counts();
        // hypot(8, 8) ≈ 11.3 > 10; hypot(7, 7) ≈ 9.9 <= 10.
        assert_eq!(set.count(a), Some(1));
    }

    #[test]
    fn moves_are_invisible_until_commit() {
        let (mut set, ids) = line_set(&[0.0, 5.0], 10.0);
        let _ = set.commit();

        // Move b out of range, but do not commit.
        set.set_position(ids[1], kurbo::Point::new(100.0, 0.0));
        assert_eq!(set.count_in_range(ids[0]), Some(1));
        assert_eq!(set.position(ids[1]), Some(kurbo::Point::new(5.0, 0.0)));

        // update_counts commits first, so it observes the move.
        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(0));
        assert_eq!(set.position(ids[1]), Some(kurbo::Point::new(100.0, 0.0)));
    }

    #[test]
    fn removed_proxy_stops_counting_and_being_counted() {
        let (mut set, ids) = line_set(&[0.0, 5.0], 10.0);
        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(1));

        set.remove(ids[1]);
        assert!(!set.is_alive(ids[1]));
        assert_eq!(set.count(ids[1]), None);

        // Even before the next commit, dead slots are filtered defensively.
        assert_eq!(set.count_in_range(ids[0]), Some(0));

        set.update_counts();
        assert_eq!(set.count(ids[0]), Some(0));
    }

    #[test]
    fn slot_reuse_bumps_generation() {
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)));
        set.remove(a);
        let b = set.insert(Proxy::at((1.0, 0.0)));
        assert!(set.is_alive(b));
        assert!(!set.is_alive(a));
        if a.0 == b.0 {
            assert!(b.1 > a.1, "generation must increase on reuse");
        }
    }

    #[test]
    fn counts_iterator_covers_live_proxies() {
        let (mut set, ids) = line_set(&[0.0, 5.0, 20.0], 10.0);
        set.update_counts();
        let collected: Vec<_> = set.counts().collect();
        assert_eq!(collected.len(), 3);
        assert!(collected.contains(&(ids[0], 1)));
        assert!(collected.contains(&(ids[2], 0)));
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn count_matches_brute_force_oracle() {
        // Deterministic LCG scatter; the count must equal the exact
        // cardinality of {other : distance <= range} for every proxy.
        let mut lcg = 0x9e37_79b9_u32;
        let mut next = move || {
            lcg = lcg.wrapping_mul(1664525).wrapping_add(1013904223);
            (f64::from(lcg >> 8) / f64::from(1_u32 << 24)) * 160.0 - 80.0
        };

        let mut set = ProxySet::new();
        let mut points = Vec::new();
        let mut ids = Vec::new();
        for _ in 0..48 {
            let p = kurbo::Point::new(next(), next());
            points.push(p);
            ids.push(set.insert(Proxy::at(p).with_range(25.0)));
        }
        set.update_counts();

        for (i, &id) in ids.iter().enumerate() {
            let expected = points
                .iter()
                .enumerate()
                .filter(|&(j, q)| j != i && (*q - points[i]).hypot2() <= 25.0 * 25.0)
                .count();
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Oracle count is far below u32::MAX."
            )]
            let expected = expected as u32;
            assert_eq!(set.count(id), Some(expected), "proxy {i} disagrees with oracle");
        }
    }

    #[test]
    fn nearest_picks_the_closest_in_range() {
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(10.0));
        let near = set.insert(Proxy::at((3.0, 0.0)));
        let _far = set.insert(Proxy::at((7.0, 0.0)));
        let _out = set.insert(Proxy::at((30.0, 0.0)));
        let _ = set.commit();

        let (hit, dist) = set.nearest_in_range(a).expect("expected a target in range");
        assert_eq!(hit, near);
        assert!((dist - 3.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_excludes_self_and_empty_range() {
        let mut set = ProxySet::new();
        let a = set.insert(Proxy::at((0.0, 0.0)).with_range(10.0));
        let _ = set.commit();
        assert_eq!(set.nearest_in_range(a), None);

        let b = set.insert(Proxy::at((20.1, 0.0)).with_range(10.0));
        let _ = set.commit();
        // Both out of each other's range.
        assert_eq!(set.nearest_in_range(a), None);
        assert_eq!(set.nearest_in_range(b), None);
    }
}
