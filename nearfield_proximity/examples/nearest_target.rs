// Copyright 2026 the Nearfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target acquisition: each proxy scans its range and locks the nearest other.
//!
//! Run:
//! - `cargo run -p nearfield_proximity --example nearest_target`

use nearfield_proximity::{Proxy, ProxySet};

fn main() {
    let mut set = ProxySet::new();

    // A small skirmish line; the default range is 10.
    let names = ["alpha", "bravo", "charlie", "delta"];
    let ids = [
        set.insert(Proxy::at((0.0, 0.0))),
        set.insert(Proxy::at((4.0, 3.0))),
        set.insert(Proxy::at((9.0, 0.0))),
        set.insert(Proxy::at((40.0, 0.0))),
    ];
    let _ = set.commit();

    for (name, id) in names.iter().zip(ids) {
        match set.nearest_in_range(id) {
            Some((target, dist)) => {
                let who = ids
                    .iter()
                    .position(|&other| other == target)
                    .map(|i| names[i])
                    .unwrap_or("?");
                println!("{name}: locked {who} at distance {dist:.2}");
            }
            None => println!("{name}: nothing in range"),
        }
    }
}
