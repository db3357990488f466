// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket AABB Tree: a kurbo-native dynamic AABB tree broad-phase.
//!
//! Thicket AABB Tree is a reusable building block for the cheap,
//! candidate-finding stage of 2D collision detection and picking.
//!
//! - Register "proxies" — a [`kurbo::Rect`] plus an opaque payload — and
//!   move them as the underlying objects move.
//! - Enumerate proxies overlapping a query rectangle, or candidates along a
//!   ray segment, through early-terminating callbacks.
//! - Self-balancing: insertions pick a sibling by a surface-area heuristic
//!   and a single-step rotation keeps sibling heights within one of each
//!   other, so queries stay `O(log n)` per reported leaf.
//!
//! Proxies are stored with a fattened AABB ([`AABB_EXTENSION`] of margin,
//! plus a predicted-motion extension on moves). Small movements stay inside
//! the fat box and cost nothing; only larger ones reinsert the leaf. Nodes
//! live in a pooled, index-linked arena, so handles are small copyable
//! integers ([`ProxyId`]) rather than references.
//!
//! The tree reports *candidates*: anything whose fat AABB passes the cheap
//! tests. Exact narrow-phase intersection is the caller's job, typically
//! inside the query or ray callback.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Rect, Vec2};
//! use thicket_aabb_tree::DynamicTree;
//!
//! let mut tree: DynamicTree<u32> = DynamicTree::new();
//! let a = tree.create_proxy(Rect::new(0.0, 0.0, 1.0, 1.0), 1);
//! let _b = tree.create_proxy(Rect::new(10.0, 10.0, 11.0, 11.0), 2);
//!
//! // Everything overlapping a region.
//! let mut hits = Vec::new();
//! tree.query(Rect::new(-1.0, -1.0, 2.0, 2.0), |id| {
//!     hits.push(tree.user_data(id));
//!     true // keep walking
//! });
//! assert_eq!(hits, vec![1]);
//!
//! // A small move stays inside the stored fat AABB: no tree update.
//! let moved = tree.move_proxy(a, Rect::new(0.02, 0.0, 1.02, 1.0), Vec2::new(0.02, 0.0));
//! assert!(!moved);
//! ```
//!
//! ## Ray casts
//!
//! The ray callback steers the walk with its return value: `0.0` stops the
//! cast, a negative value skips the candidate, and a positive value narrows
//! the segment to that fraction — the usual closest-hit pattern.
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use thicket_aabb_tree::{DynamicTree, RayCastInput};
//!
//! let mut tree: DynamicTree<&str> = DynamicTree::new();
//! tree.create_proxy(Rect::new(4.0, -1.0, 6.0, 1.0), "near");
//! tree.create_proxy(Rect::new(14.0, -1.0, 16.0, 1.0), "far");
//!
//! let input = RayCastInput {
//!     p1: Point::new(0.0, 0.0),
//!     p2: Point::new(20.0, 0.0),
//!     max_fraction: 1.0,
//! };
//! let mut closest: Option<&str> = None;
//! tree.ray_cast(&input, |sub, id| {
//!     // A real narrow phase would intersect the ray with the shape here;
//!     // clipping at the candidate's entry plane is enough for an AABB.
//!     let t = (tree.fat_aabb(id).x0 - sub.p1.x) / (sub.p2.x - sub.p1.x);
//!     if t < 0.0 {
//!         return -1.0; // started inside; not a closest hit candidate
//!     }
//!     closest = Some(tree.user_data(id));
//!     t
//! });
//! assert_eq!(closest, Some("near"));
//! ```
//!
//! ## Concurrency
//!
//! The tree is a single-owner structure with no interior locking. Mutations
//! take `&mut self`; queries take `&self` and may run concurrently with
//! each other but not with mutation. Query callbacks can call the
//! read-only accessors on the same tree, and the borrow checker rules out
//! calling anything mutating mid-walk.
//!
//! Float inputs are assumed finite (no NaNs). Misuse of handles — a stale
//! [`ProxyId`], destroying a non-leaf slot, a zero-length ray — is a
//! programmer error caught by debug assertions.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod query;
mod tree;
mod types;
mod util;

pub use tree::DynamicTree;
pub use types::{AABB_EXTENSION, AABB_MULTIPLIER, ProxyId, RayCastInput};
