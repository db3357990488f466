// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rect helpers the tree needs beyond what [`kurbo::Rect`] exposes directly.

use kurbo::Rect;

/// Perimeter of a rectangle. The tree's surface-area heuristic uses this as
/// its cost metric in 2D.
pub(crate) fn perimeter(r: &Rect) -> f64 {
    2.0 * (r.width() + r.height())
}

/// Whether two rectangles overlap. Edges are inclusive: rectangles that
/// share (part of) an edge count as overlapping.
pub(crate) fn aabbs_overlap(a: &Rect, b: &Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Whether `outer` fully contains `inner`, edges inclusive.
pub(crate) fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}
