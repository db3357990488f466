// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Closest-hit ray casting.
//!
//! Cast a ray through a row of boxes and narrow the segment at each
//! candidate, the way a narrow phase reports its exact hit fraction back to
//! the walk.
//!
//! Run:
//! - `cargo run -p thicket_examples --example ray_cast_closest`

use kurbo::{Point, Rect};
use thicket_aabb_tree::{DynamicTree, ProxyId, RayCastInput};

fn main() {
    let mut tree: DynamicTree<u32> = DynamicTree::new();
    for i in 0..6u32 {
        let x = 3.0 + f64::from(i) * 4.0;
        tree.create_proxy(Rect::new(x, -1.0, x + 1.0, 1.0), i);
    }

    let input = RayCastInput {
        p1: Point::new(0.0, 0.0),
        p2: Point::new(30.0, 0.0),
        max_fraction: 1.0,
    };

    let mut closest: Option<(ProxyId, f64)> = None;
    let mut candidates = 0usize;
    tree.ray_cast(&input, |sub, id| {
        candidates += 1;
        // Stand-in narrow phase: clip the ray at the candidate's entry
        // plane. Anything farther than the current clip is skipped by the
        // walk before we ever see it.
        let t = (tree.fat_aabb(id).x0 - sub.p1.x) / (sub.p2.x - sub.p1.x);
        if t <= 0.0 {
            return -1.0;
        }
        closest = Some((id, t));
        t
    });

    let (id, t) = closest.expect("the ray crosses the whole row");
    println!("candidates visited: {candidates}");
    println!(
        "closest proxy: #{} at t = {:.3} (x = {:.2})",
        tree.user_data(id),
        t,
        input.p1.x + t * (input.p2.x - input.p1.x)
    );
    assert_eq!(tree.user_data(id), 0);
}
