// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A minimal simulation loop: scatter proxies, drift them, count neighbors.
//!
//! Each tick follows the canonical ordering: positions in, commit (the
//! barrier), counting pass, counts out.
//!
//! Run:
//! - `cargo run -p nearfield_proximity --example swarm_tick`

use kurbo::{Point, Vec2};
use nearfield_index::backends::GridF64;
use nearfield_proximity::{Proxy, ProxySet};

/// Deterministic LCG so runs are reproducible.
struct Lcg(u32);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(1664525).wrapping_add(1013904223);
        f64::from(self.0 >> 8) / f64::from(1_u32 << 24)
    }

    /// A point in the [-80, 80) square, the play-area scale.
    fn next_point(&mut self) -> Point {
        Point::new(self.next_unit() * 160.0 - 80.0, self.next_unit() * 160.0 - 80.0)
    }

    /// A small drift step.
    fn next_step(&mut self) -> Vec2 {
        Vec2::new(self.next_unit() * 2.0 - 1.0, self.next_unit() * 2.0 - 1.0)
    }
}

fn main() {
    let mut rng = Lcg(0xdecafbad);

    // Grid cells on the order of the query box, as the backend docs suggest.
    let mut set = ProxySet::with_backend(GridF64::new(20.0));
    let ids: Vec<_> = (0..256)
        .map(|_| set.insert(Proxy::at(rng.next_point()).with_range(10.0)))
        .collect();

    for tick in 0..10 {
        // Position refresh from the "simulation".
        for &id in &ids {
            let p = set.position(id).expect("all proxies stay alive");
            set.set_position(id, p + rng.next_step());
        }

        // Barrier + counting pass.
        let counted = set.update_counts();

        let total: u32 = set.counts().map(|(_, n)| n).sum();
        let busiest = set.counts().max_by_key(|&(_, n)| n).expect("set is non-empty");
        println!(
            "tick {tick}: counted {counted} proxies, {total} neighbor sightings, busiest sees {}",
            busiest.1
        );
    }
}
