// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: node pool, topology, and updates.

use alloc::vec::Vec;
use core::fmt::Debug;

use kurbo::{Rect, Vec2};

use crate::types::{AABB_EXTENSION, AABB_MULTIPLIER, INITIAL_POOL_CAPACITY, ProxyId};
use crate::util::{contains_rect, perimeter};

/// A pool slot. While allocated (`height >= 0`) it is a tree node; while on
/// the free list (`height == -1`) only `parent` is meaningful, reused as the
/// next-free link.
#[derive(Clone, Debug)]
pub(crate) struct Node<P> {
    /// Fat AABB: the proxy's tight AABB grown by [`AABB_EXTENSION`] plus the
    /// predicted-motion margin, as of the last insertion.
    pub(crate) aabb: Rect,
    /// Payload; `Some` only on leaves.
    pub(crate) user_data: Option<P>,
    /// Parent link while allocated, next-free link while freed.
    pub(crate) parent: ProxyId,
    pub(crate) child1: ProxyId,
    pub(crate) child2: ProxyId,
    /// 0 for leaves, `1 + max(child heights)` for interior nodes, -1 for
    /// free slots.
    pub(crate) height: i32,
    /// Set when the leaf is created and whenever a move reinserts it;
    /// cleared by the client via [`DynamicTree::clear_moved`].
    pub(crate) moved: bool,
}

impl<P> Node<P> {
    const fn free(next: ProxyId) -> Self {
        Self {
            aabb: Rect::ZERO,
            user_data: None,
            parent: next,
            child1: ProxyId::NONE,
            child2: ProxyId::NONE,
            height: -1,
            moved: false,
        }
    }

    pub(crate) const fn is_leaf(&self) -> bool {
        self.child1.is_none()
    }
}

/// A dynamic AABB tree broad-phase.
///
/// Leaves are proxies: a fat AABB plus a client payload. The tree arranges
/// them in an incrementally balanced binary hierarchy so that region and
/// ray queries visit `O(log n)` interior nodes per reported leaf. Interior
/// nodes are pooled and relocatable, so everything is linked by index
/// rather than by reference; see [`ProxyId`].
///
/// All mutating operations keep these invariants: every interior node's
/// AABB is the union of its children's, stored heights match the real
/// subtree heights, and the two children of any interior node differ in
/// height by at most one.
pub struct DynamicTree<P: Copy + Debug> {
    pub(crate) root: ProxyId,
    pub(crate) nodes: Vec<Node<P>>,
    node_count: usize,
    free_list: ProxyId,
    insertion_count: u64,
}

impl<P: Copy + Debug> Default for DynamicTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy + Debug> Debug for DynamicTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicTree")
            .field("capacity", &self.nodes.len())
            .field("node_count", &self.node_count)
            .field("proxy_count", &self.proxy_count())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl<P: Copy + Debug> DynamicTree<P> {
    /// Create an empty tree. The node pool starts with a small preallocated
    /// capacity and doubles on demand.
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(INITIAL_POOL_CAPACITY);
        for i in 0..INITIAL_POOL_CAPACITY {
            let next = if i + 1 < INITIAL_POOL_CAPACITY {
                ProxyId::from_index(i + 1)
            } else {
                ProxyId::NONE
            };
            nodes.push(Node::free(next));
        }
        Self {
            root: ProxyId::NONE,
            nodes,
            node_count: 0,
            free_list: ProxyId(0),
            insertion_count: 0,
        }
    }

    /// Register a proxy. `aabb` is the tight bounding box of the client
    /// object; the tree stores it fattened by [`AABB_EXTENSION`] on all
    /// sides. The returned handle stays valid until [`Self::destroy_proxy`].
    pub fn create_proxy(&mut self, aabb: Rect, user_data: P) -> ProxyId {
        let id = self.allocate_node();
        let node = &mut self.nodes[id.idx()];
        node.aabb = aabb.inflate(AABB_EXTENSION, AABB_EXTENSION);
        node.user_data = Some(user_data);
        node.height = 0;
        node.moved = true;
        self.insert_leaf(id);
        id
    }

    /// Unregister a proxy and return its slot to the pool.
    pub fn destroy_proxy(&mut self, id: ProxyId) {
        debug_assert!(id.idx() < self.nodes.len());
        debug_assert!(self.nodes[id.idx()].is_leaf());
        self.remove_leaf(id);
        self.free_node(id);
    }

    /// Move a proxy to a new tight AABB, with `displacement` hinting where
    /// it is headed.
    ///
    /// If the stored fat AABB still contains `aabb` and is not excessively
    /// large, the tree is left untouched and `false` is returned. Otherwise
    /// the leaf is reinserted with a new fat AABB (extended one-sided along
    /// each axis by [`AABB_MULTIPLIER`] times the displacement), the moved
    /// flag is set, and `true` is returned.
    pub fn move_proxy(&mut self, id: ProxyId, aabb: Rect, displacement: Vec2) -> bool {
        debug_assert!(id.idx() < self.nodes.len());
        debug_assert!(self.nodes[id.idx()].is_leaf());

        let mut fat = aabb.inflate(AABB_EXTENSION, AABB_EXTENSION);

        // Predict motion.
        let d = AABB_MULTIPLIER * displacement;
        if d.x < 0.0 {
            fat.x0 += d.x;
        } else {
            fat.x1 += d.x;
        }
        if d.y < 0.0 {
            fat.y0 += d.y;
        } else {
            fat.y1 += d.y;
        }

        let tree_aabb = self.nodes[id.idx()].aabb;
        if contains_rect(&tree_aabb, &aabb) {
            // The stored AABB still covers the object, but it may be stale:
            // the object might have been moving fast and has since slowed.
            let huge = fat.inflate(4.0 * AABB_EXTENSION, 4.0 * AABB_EXTENSION);
            if contains_rect(&huge, &tree_aabb) {
                return false;
            }
            // The stored AABB is oversized; shrink it by reinserting.
        }

        self.remove_leaf(id);
        self.nodes[id.idx()].aabb = fat;
        self.insert_leaf(id);
        self.nodes[id.idx()].moved = true;
        true
    }

    /// Payload of a live proxy.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live leaf.
    pub fn user_data(&self, id: ProxyId) -> P {
        debug_assert!(id.idx() < self.nodes.len());
        self.nodes[id.idx()].user_data.expect("stale proxy id")
    }

    /// The fat AABB currently stored for a proxy.
    pub fn fat_aabb(&self, id: ProxyId) -> Rect {
        debug_assert!(id.idx() < self.nodes.len());
        debug_assert!(self.nodes[id.idx()].is_leaf());
        self.nodes[id.idx()].aabb
    }

    /// Whether the proxy has been (re)inserted since the flag was last
    /// cleared. Set by [`Self::create_proxy`] and by moves that reinsert.
    pub fn was_moved(&self, id: ProxyId) -> bool {
        debug_assert!(id.idx() < self.nodes.len());
        self.nodes[id.idx()].moved
    }

    /// Clear the moved flag for a proxy.
    pub fn clear_moved(&mut self, id: ProxyId) {
        debug_assert!(id.idx() < self.nodes.len());
        self.nodes[id.idx()].moved = false;
    }

    /// Height of the tree: 0 when empty or a single leaf.
    pub fn height(&self) -> i32 {
        if self.root.is_none() {
            return 0;
        }
        self.nodes[self.root.idx()].height
    }

    /// Largest height difference between the two children of any interior
    /// node. Stays at most 1 after every public mutation.
    pub fn max_balance(&self) -> i32 {
        let mut max_balance = 0;
        for node in &self.nodes {
            if node.height <= 1 {
                continue;
            }
            debug_assert!(!node.is_leaf());
            let balance =
                (self.nodes[node.child2.idx()].height - self.nodes[node.child1.idx()].height).abs();
            max_balance = max_balance.max(balance);
        }
        max_balance
    }

    /// Sum of all allocated nodes' perimeters over the root's perimeter, or
    /// 0 for an empty tree. A packing-quality diagnostic: lower is better.
    pub fn area_ratio(&self) -> f64 {
        if self.root.is_none() {
            return 0.0;
        }
        let root_perimeter = perimeter(&self.nodes[self.root.idx()].aabb);
        let mut total = 0.0;
        for node in &self.nodes {
            if node.height < 0 {
                continue;
            }
            total += perimeter(&node.aabb);
        }
        total / root_perimeter
    }

    /// Number of live proxies.
    pub fn proxy_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.height == 0).count()
    }

    /// Total number of leaf insertions performed over the tree's lifetime,
    /// including reinsertion on moves. Diagnostic only.
    pub fn insertion_count(&self) -> u64 {
        self.insertion_count
    }

    /// Tear the tree down to its leaves and rebuild it bottom-up, greedily
    /// pairing the two subtrees whose union has the smallest perimeter.
    ///
    /// `O(n^2)` per level and intended for offline compaction and tests;
    /// leaves keep their handles, AABBs, and payloads.
    pub fn rebuild_bottom_up(&mut self) {
        let mut roots: Vec<ProxyId> = Vec::with_capacity(self.node_count);

        // Collect leaves; free every interior node.
        for i in 0..self.nodes.len() {
            if self.nodes[i].height < 0 {
                continue;
            }
            let id = ProxyId::from_index(i);
            if self.nodes[i].is_leaf() {
                self.nodes[i].parent = ProxyId::NONE;
                roots.push(id);
            } else {
                self.free_node(id);
            }
        }

        if roots.is_empty() {
            self.root = ProxyId::NONE;
            return;
        }

        while roots.len() > 1 {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..roots.len() {
                let aabb_i = self.nodes[roots[i].idx()].aabb;
                for j in (i + 1)..roots.len() {
                    let aabb_j = self.nodes[roots[j].idx()].aabb;
                    let cost = perimeter(&aabb_i.union(aabb_j));
                    if best.map(|(_, _, c)| cost < c).unwrap_or(true) {
                        best = Some((i, j, cost));
                    }
                }
            }
            let (i_min, j_min, _) = best.expect("at least two roots remain");

            let child1 = roots[i_min];
            let child2 = roots[j_min];
            let parent = self.allocate_node();
            {
                let aabb = self.nodes[child1.idx()]
                    .aabb
                    .union(self.nodes[child2.idx()].aabb);
                let height = 1 + self.nodes[child1.idx()]
                    .height
                    .max(self.nodes[child2.idx()].height);
                let node = &mut self.nodes[parent.idx()];
                node.child1 = child1;
                node.child2 = child2;
                node.aabb = aabb;
                node.height = height;
                node.parent = ProxyId::NONE;
            }
            self.nodes[child1.idx()].parent = parent;
            self.nodes[child2.idx()].parent = parent;

            // j_min > i_min, so i_min stays in place.
            roots.swap_remove(j_min);
            roots[i_min] = parent;
        }

        self.root = roots[0];

        #[cfg(debug_assertions)]
        self.validate();
    }

    /// Translate every stored AABB by `-origin`. Recenters world
    /// coordinates in large worlds without touching the tree structure.
    pub fn shift_origin(&mut self, origin: Vec2) {
        for node in &mut self.nodes {
            if node.height < 0 {
                continue;
            }
            node.aabb = node.aabb - origin;
        }
    }

    /// Check every structural invariant, panicking on the first violation.
    /// For tests and debugging; `O(n)`.
    pub fn validate(&self) {
        self.validate_structure(self.root);
        self.validate_metrics(self.root);

        let mut free_count = 0;
        let mut free_index = self.free_list;
        while !free_index.is_none() {
            assert!(free_index.idx() < self.nodes.len());
            assert_eq!(self.nodes[free_index.idx()].height, -1);
            free_index = self.nodes[free_index.idx()].parent;
            free_count += 1;
        }

        if !self.root.is_none() {
            assert_eq!(self.height(), self.compute_height(self.root));
        }
        assert_eq!(self.node_count + free_count, self.nodes.len());
    }

    // --- pool ---

    /// Pop a node off the free list, growing the pool if it is exhausted.
    fn allocate_node(&mut self) -> ProxyId {
        if self.free_list.is_none() {
            debug_assert_eq!(self.node_count, self.nodes.len());

            // The free list is empty; double the pool and thread the new
            // tail into a fresh free list.
            let old_capacity = self.nodes.len();
            let new_capacity = old_capacity * 2;
            self.nodes.reserve(new_capacity - old_capacity);
            for i in old_capacity..new_capacity {
                let next = if i + 1 < new_capacity {
                    ProxyId::from_index(i + 1)
                } else {
                    ProxyId::NONE
                };
                self.nodes.push(Node::free(next));
            }
            self.free_list = ProxyId::from_index(old_capacity);
        }

        let id = self.free_list;
        let node = &mut self.nodes[id.idx()];
        self.free_list = node.parent;
        node.parent = ProxyId::NONE;
        node.child1 = ProxyId::NONE;
        node.child2 = ProxyId::NONE;
        node.height = 0;
        node.user_data = None;
        node.moved = false;
        self.node_count += 1;
        id
    }

    /// Push a node back onto the free list.
    fn free_node(&mut self, id: ProxyId) {
        debug_assert!(id.idx() < self.nodes.len());
        debug_assert!(self.node_count > 0);
        let next = self.free_list;
        let node = &mut self.nodes[id.idx()];
        node.parent = next;
        node.height = -1;
        node.user_data = None;
        self.free_list = id;
        self.node_count -= 1;
    }

    // --- insertion and removal ---

    /// Cost of descending into `child` while looking for a sibling: the
    /// enlargement it would suffer, plus the full candidate perimeter if it
    /// is a leaf (a new parent would be created there).
    fn descend_cost(&self, child: ProxyId, leaf_aabb: Rect, inheritance_cost: f64) -> f64 {
        let node = &self.nodes[child.idx()];
        let candidate = leaf_aabb.union(node.aabb);
        if node.is_leaf() {
            perimeter(&candidate) + inheritance_cost
        } else {
            (perimeter(&candidate) - perimeter(&node.aabb)) + inheritance_cost
        }
    }

    fn insert_leaf(&mut self, leaf: ProxyId) {
        self.insertion_count += 1;

        if self.root.is_none() {
            self.root = leaf;
            self.nodes[leaf.idx()].parent = ProxyId::NONE;
            return;
        }

        // Walk down from the root looking for the cheapest sibling by the
        // surface-area heuristic (perimeter in 2D).
        let leaf_aabb = self.nodes[leaf.idx()].aabb;
        let mut index = self.root;
        while !self.nodes[index.idx()].is_leaf() {
            let child1 = self.nodes[index.idx()].child1;
            let child2 = self.nodes[index.idx()].child2;

            let area = perimeter(&self.nodes[index.idx()].aabb);
            let combined_area = perimeter(&self.nodes[index.idx()].aabb.union(leaf_aabb));

            // Cost of pairing the leaf with this whole subtree under a new
            // parent, versus the floor cost any deeper placement still pays
            // for enlarging this node.
            let cost = 2.0 * combined_area;
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descend_cost(child1, leaf_aabb, inheritance_cost);
            let cost2 = self.descend_cost(child2, leaf_aabb, inheritance_cost);

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        // Splice a new parent above the sibling.
        let old_parent = self.nodes[sibling.idx()].parent;
        let new_parent = self.allocate_node();
        {
            let aabb = leaf_aabb.union(self.nodes[sibling.idx()].aabb);
            let height = self.nodes[sibling.idx()].height + 1;
            let node = &mut self.nodes[new_parent.idx()];
            node.parent = old_parent;
            node.user_data = None;
            node.aabb = aabb;
            node.height = height;
        }

        if old_parent.is_none() {
            // The sibling was the root.
            self.root = new_parent;
        } else if self.nodes[old_parent.idx()].child1 == sibling {
            self.nodes[old_parent.idx()].child1 = new_parent;
        } else {
            self.nodes[old_parent.idx()].child2 = new_parent;
        }
        self.nodes[new_parent.idx()].child1 = sibling;
        self.nodes[new_parent.idx()].child2 = leaf;
        self.nodes[sibling.idx()].parent = new_parent;
        self.nodes[leaf.idx()].parent = new_parent;

        // Walk back up rebalancing and refitting.
        let mut index = self.nodes[leaf.idx()].parent;
        while !index.is_none() {
            index = self.balance(index);
            self.refit(index);
            index = self.nodes[index.idx()].parent;
        }
    }

    fn remove_leaf(&mut self, leaf: ProxyId) {
        if leaf == self.root {
            self.root = ProxyId::NONE;
            return;
        }

        let parent = self.nodes[leaf.idx()].parent;
        let grandparent = self.nodes[parent.idx()].parent;
        let sibling = if self.nodes[parent.idx()].child1 == leaf {
            self.nodes[parent.idx()].child2
        } else {
            self.nodes[parent.idx()].child1
        };

        if grandparent.is_none() {
            // The parent was the root; promote the sibling.
            self.root = sibling;
            self.nodes[sibling.idx()].parent = ProxyId::NONE;
            self.free_node(parent);
            return;
        }

        // Splice the sibling into the grandparent and collapse the parent.
        if self.nodes[grandparent.idx()].child1 == parent {
            self.nodes[grandparent.idx()].child1 = sibling;
        } else {
            self.nodes[grandparent.idx()].child2 = sibling;
        }
        self.nodes[sibling.idx()].parent = grandparent;
        self.free_node(parent);

        let mut index = grandparent;
        while !index.is_none() {
            index = self.balance(index);
            self.refit(index);
            index = self.nodes[index.idx()].parent;
        }
    }

    /// Recompute an interior node's AABB and height from its children.
    fn refit(&mut self, index: ProxyId) {
        let child1 = self.nodes[index.idx()].child1;
        let child2 = self.nodes[index.idx()].child2;
        debug_assert!(!child1.is_none());
        debug_assert!(!child2.is_none());
        let aabb = self.nodes[child1.idx()]
            .aabb
            .union(self.nodes[child2.idx()].aabb);
        let height = 1 + self.nodes[child1.idx()]
            .height
            .max(self.nodes[child2.idx()].height);
        let node = &mut self.nodes[index.idx()];
        node.aabb = aabb;
        node.height = height;
    }

    // --- balancing ---

    /// Perform at most one rotation at `a`, restoring a child height
    /// difference of at most 1 there. Returns the root of the (possibly
    /// rotated) subtree.
    fn balance(&mut self, a: ProxyId) -> ProxyId {
        debug_assert!(!a.is_none());

        if self.nodes[a.idx()].is_leaf() || self.nodes[a.idx()].height < 2 {
            return a;
        }

        let b = self.nodes[a.idx()].child1;
        let c = self.nodes[a.idx()].child2;
        let balance = self.nodes[c.idx()].height - self.nodes[b.idx()].height;

        if balance > 1 {
            self.rotate_up(a, c)
        } else if balance < -1 {
            self.rotate_up(a, b)
        } else {
            a
        }
    }

    /// Rotate `child` (one of `a`'s children) above `a`. The taller of
    /// `child`'s children stays with it; the other takes the slot `child`
    /// vacated under `a`.
    fn rotate_up(&mut self, a: ProxyId, child: ProxyId) -> ProxyId {
        let f = self.nodes[child.idx()].child1;
        let g = self.nodes[child.idx()].child2;
        debug_assert!(f.idx() < self.nodes.len());
        debug_assert!(g.idx() < self.nodes.len());

        // Swap a and child.
        let a_parent = self.nodes[a.idx()].parent;
        self.nodes[child.idx()].child1 = a;
        self.nodes[child.idx()].parent = a_parent;
        self.nodes[a.idx()].parent = child;

        if a_parent.is_none() {
            self.root = child;
        } else if self.nodes[a_parent.idx()].child1 == a {
            self.nodes[a_parent.idx()].child1 = child;
        } else {
            debug_assert_eq!(self.nodes[a_parent.idx()].child2, a);
            self.nodes[a_parent.idx()].child2 = child;
        }

        let (keep, give) = if self.nodes[f.idx()].height > self.nodes[g.idx()].height {
            (f, g)
        } else {
            (g, f)
        };
        self.nodes[child.idx()].child2 = keep;
        if self.nodes[a.idx()].child2 == child {
            self.nodes[a.idx()].child2 = give;
        } else {
            self.nodes[a.idx()].child1 = give;
        }
        self.nodes[give.idx()].parent = a;

        // Refit bottom-up: a first, then the new subtree root above it.
        self.refit(a);
        self.refit(child);
        child
    }

    // --- validation ---

    /// Height of the subtree at `id`, recomputed by recursion.
    fn compute_height(&self, id: ProxyId) -> i32 {
        debug_assert!(id.idx() < self.nodes.len());
        let node = &self.nodes[id.idx()];
        if node.is_leaf() {
            return 0;
        }
        let height1 = self.compute_height(node.child1);
        let height2 = self.compute_height(node.child2);
        1 + height1.max(height2)
    }

    fn validate_structure(&self, index: ProxyId) {
        if index.is_none() {
            return;
        }
        if index == self.root {
            assert!(self.nodes[index.idx()].parent.is_none());
        }

        let node = &self.nodes[index.idx()];
        let child1 = node.child1;
        let child2 = node.child2;

        if node.is_leaf() {
            assert!(child1.is_none());
            assert!(child2.is_none());
            assert_eq!(node.height, 0);
            return;
        }

        assert!(child1.idx() < self.nodes.len());
        assert!(child2.idx() < self.nodes.len());
        assert_eq!(self.nodes[child1.idx()].parent, index);
        assert_eq!(self.nodes[child2.idx()].parent, index);

        self.validate_structure(child1);
        self.validate_structure(child2);
    }

    fn validate_metrics(&self, index: ProxyId) {
        if index.is_none() {
            return;
        }

        let node = &self.nodes[index.idx()];
        let child1 = node.child1;
        let child2 = node.child2;

        if node.is_leaf() {
            return;
        }

        let height1 = self.nodes[child1.idx()].height;
        let height2 = self.nodes[child2.idx()].height;
        assert_eq!(node.height, 1 + height1.max(height2));

        let aabb = self.nodes[child1.idx()]
            .aabb
            .union(self.nodes[child2.idx()].aabb);
        assert_eq!(node.aabb, aabb);

        self.validate_metrics(child1);
        self.validate_metrics(child2);
    }
}
