// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Region overlap and ray-segment walks over the tree.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Rect, Vec2};

use crate::tree::DynamicTree;
use crate::types::{ProxyId, RayCastInput};
use crate::util::aabbs_overlap;

impl<P: Copy + Debug> DynamicTree<P> {
    /// Call `callback` for every proxy whose fat AABB overlaps `aabb`.
    ///
    /// Returning `false` from the callback terminates the walk. The order
    /// in which proxies are visited is unspecified. The callback may call
    /// read-only accessors on the same tree; the `&self` receiver makes
    /// mutation during the walk impossible to express.
    pub fn query<F>(&self, aabb: Rect, mut callback: F)
    where
        F: FnMut(ProxyId) -> bool,
    {
        let mut stack: Vec<ProxyId> = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            if id.is_none() {
                continue;
            }

            let node = &self.nodes[id.idx()];
            if !aabbs_overlap(&node.aabb, &aabb) {
                continue;
            }

            if node.is_leaf() {
                if !callback(id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Cast a ray segment against the tree, calling `callback` for every
    /// candidate proxy whose fat AABB the segment may pass through.
    ///
    /// The callback receives the current clipped input and returns a new
    /// fraction:
    ///
    /// - `0.0` terminates the cast,
    /// - a negative value ignores this proxy and continues,
    /// - a positive value narrows the segment to `t <= value` for the rest
    ///   of the walk (the usual closest-hit pattern returns the exact hit
    ///   fraction computed by the narrow phase).
    ///
    /// Cost is roughly `k * log(n)` for `k` candidate hits over `n`
    /// proxies. `input.p1` and `input.p2` must be distinct.
    pub fn ray_cast<F>(&self, input: &RayCastInput, mut callback: F)
    where
        F: FnMut(&RayCastInput, ProxyId) -> f64,
    {
        let p1 = input.p1;
        let p2 = input.p2;
        let r = p2 - p1;
        debug_assert!(r.hypot2() > 0.0, "degenerate ray");
        let r = r / r.hypot();

        // v is perpendicular to the segment; only its direction matters.
        let v = Vec2::new(-r.y, r.x);
        let abs_v = Vec2::new(v.x.abs(), v.y.abs());

        let mut max_fraction = input.max_fraction;
        let mut segment_aabb = Rect::from_points(p1, p1 + max_fraction * (p2 - p1));

        let mut stack: Vec<ProxyId> = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            if id.is_none() {
                continue;
            }

            let node = &self.nodes[id.idx()];
            if !aabbs_overlap(&node.aabb, &segment_aabb) {
                continue;
            }

            // Separating axis between the segment's supporting line and the
            // box: |dot(v, p1 - c)| > dot(|v|, h).
            let c = node.aabb.center();
            let h = Vec2::new(0.5 * node.aabb.width(), 0.5 * node.aabb.height());
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1: input.p1,
                    p2: input.p2,
                    max_fraction,
                };
                let value = callback(&sub_input, id);

                if value == 0.0 {
                    // The client has terminated the ray cast.
                    return;
                }
                if value > 0.0 {
                    // Narrow the segment.
                    max_fraction = value;
                    segment_aabb = Rect::from_points(p1, p1 + max_fraction * (p2 - p1));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }
}
