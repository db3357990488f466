// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase basics.
//!
//! Register a few proxies, move one with and without reinsertion, and run a
//! region query.
//!
//! Run:
//! - `cargo run -p thicket_examples --example broadphase_basics`

use kurbo::{Rect, Vec2};
use thicket_aabb_tree::DynamicTree;

fn main() {
    let mut tree: DynamicTree<&str> = DynamicTree::new();

    let player = tree.create_proxy(Rect::new(0.0, 0.0, 1.0, 2.0), "player");
    let _crate_a = tree.create_proxy(Rect::new(5.0, 0.0, 6.0, 1.0), "crate a");
    let _crate_b = tree.create_proxy(Rect::new(6.5, 0.0, 7.5, 1.0), "crate b");
    let _door = tree.create_proxy(Rect::new(20.0, 0.0, 21.0, 3.0), "door");

    // A small step stays inside the stored fat AABB: no tree update.
    let stepped = tree.move_proxy(
        player,
        Rect::new(0.05, 0.0, 1.05, 2.0),
        Vec2::new(0.05, 0.0),
    );
    println!("small step reinserted: {stepped}");

    // A dash across the room reinserts the leaf with a motion-extended AABB.
    let dashed = tree.move_proxy(
        player,
        Rect::new(15.0, 0.0, 16.0, 2.0),
        Vec2::new(15.0, 0.0),
    );
    println!("dash reinserted: {dashed}");
    println!("player fat AABB: {:?}", tree.fat_aabb(player));

    // What could the player touch near the door?
    let region = Rect::new(14.0, -1.0, 22.0, 4.0);
    let mut candidates = Vec::new();
    tree.query(region, |id| {
        candidates.push(tree.user_data(id));
        true
    });
    println!("candidates near the door: {candidates:?}");

    assert!(!stepped);
    assert!(dashed);
    assert!(candidates.contains(&"player"));
    assert!(candidates.contains(&"door"));
}
