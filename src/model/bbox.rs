//! Page-stamped bounding boxes.
//!
//! Coordinates follow PDF user space: `y` grows upwards, so on a single page
//! `bottom <= top`. Vertical positions are only comparable within one page; a box
//! that spans several pages takes its `top` from the first page and its `bottom`
//! from the last page (reading order).

use serde::{Deserialize, Serialize};

/// Default comparison tolerance for font-derived coordinates.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// An axis-aligned rectangle stamped with the page range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// First page covered (0-indexed)
    pub page_start: u32,
    /// Last page covered
    pub page_end: u32,
    /// Left edge
    pub left: f64,
    /// Bottom edge (on `page_end`)
    pub bottom: f64,
    /// Right edge
    pub right: f64,
    /// Top edge (on `page_start`)
    pub top: f64,
}

impl BoundingBox {
    /// Create a single-page box. Swapped edges are normalized.
    pub fn new(page: u32, left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            page_start: page,
            page_end: page,
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// Create a box spanning `page_start..=page_end`.
    ///
    /// `top` is taken on the first page and `bottom` on the last one, so the two
    /// are not reordered unless the box covers a single page.
    pub fn spanning(
        page_start: u32,
        page_end: u32,
        left: f64,
        bottom: f64,
        right: f64,
        top: f64,
    ) -> Self {
        if page_start == page_end {
            return Self::new(page_start, left, bottom, right, top);
        }
        Self {
            page_start: page_start.min(page_end),
            page_end: page_start.max(page_end),
            left: left.min(right),
            bottom,
            right: left.max(right),
            top,
        }
    }

    /// The first page covered.
    pub fn page(&self) -> u32 {
        self.page_start
    }

    /// Whether the box lies on one page.
    pub fn is_single_page(&self) -> bool {
        self.page_start == self.page_end
    }

    /// Whether both boxes lie on the same single page.
    pub fn same_page(&self, other: &BoundingBox) -> bool {
        self.is_single_page() && other.is_single_page() && self.page_start == other.page_start
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height of a single-page box. Multi-page boxes have no meaningful height
    /// and report zero.
    pub fn height(&self) -> f64 {
        if self.is_single_page() {
            self.top - self.bottom
        } else {
            0.0
        }
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// Grow this box to cover `other`.
    pub fn union(&mut self, other: &BoundingBox) {
        let top = match self.page_start.cmp(&other.page_start) {
            std::cmp::Ordering::Less => self.top,
            std::cmp::Ordering::Greater => other.top,
            std::cmp::Ordering::Equal => self.top.max(other.top),
        };
        let bottom = match self.page_end.cmp(&other.page_end) {
            std::cmp::Ordering::Greater => self.bottom,
            std::cmp::Ordering::Less => other.bottom,
            std::cmp::Ordering::Equal => self.bottom.min(other.bottom),
        };

        self.page_start = self.page_start.min(other.page_start);
        self.page_end = self.page_end.max(other.page_end);
        self.left = self.left.min(other.left);
        self.right = self.right.max(other.right);
        self.top = top;
        self.bottom = bottom;
    }

    /// Non-mutating form of [`BoundingBox::union`].
    pub fn united(&self, other: &BoundingBox) -> BoundingBox {
        let mut result = *self;
        result.union(other);
        result
    }

    /// Intersection of two boxes on the same single page.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.same_page(other) {
            return None;
        }
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        let bottom = self.bottom.max(other.bottom);
        let top = self.top.min(other.top);
        if left > right || bottom > top {
            return None;
        }
        Some(BoundingBox::new(self.page_start, left, bottom, right, top))
    }

    fn pages_intersect(&self, other: &BoundingBox) -> bool {
        self.page_start <= other.page_end && other.page_start <= self.page_end
    }

    /// Whether the boxes touch or overlap, within `epsilon`.
    ///
    /// For boxes that are not on one common page only the horizontal extent is
    /// compared.
    pub fn overlaps(&self, other: &BoundingBox, epsilon: f64) -> bool {
        if !self.pages_intersect(other) {
            return false;
        }
        let horizontal = self.left <= other.right + epsilon && other.left <= self.right + epsilon;
        if !self.same_page(other) {
            return horizontal;
        }
        horizontal && self.bottom <= other.top + epsilon && other.bottom <= self.top + epsilon
    }

    /// Whether `other` lies inside this box, within `epsilon`.
    pub fn contains(&self, other: &BoundingBox, epsilon: f64) -> bool {
        if other.page_start < self.page_start || other.page_end > self.page_end {
            return false;
        }
        let horizontal = self.left <= other.left + epsilon && other.right <= self.right + epsilon;
        if !self.same_page(other) {
            return horizontal;
        }
        horizontal && self.bottom <= other.bottom + epsilon && other.top <= self.top + epsilon
    }

    /// Whether the interiors intersect by more than `epsilon` on both axes.
    ///
    /// Unlike [`BoundingBox::overlaps`], boxes that merely touch do not cross.
    pub fn cross(&self, other: &BoundingBox, epsilon: f64) -> bool {
        self.same_page(other)
            && self.left < other.right - epsilon
            && other.left < self.right - epsilon
            && self.bottom < other.top - epsilon
            && other.bottom < self.top - epsilon
    }
}

/// A collection of single-page boxes plus their envelope.
///
/// Used for content that can continue across pages. The envelope is recomputed
/// from the page boxes after every union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBoundingBox {
    boxes: Vec<BoundingBox>,
    envelope: BoundingBox,
}

impl MultiBoundingBox {
    pub fn new(first: BoundingBox) -> Self {
        Self {
            boxes: vec![first],
            envelope: first,
        }
    }

    /// Per-page boxes, ordered by page.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn envelope(&self) -> &BoundingBox {
        &self.envelope
    }

    /// The box covering `page`, if any.
    pub fn page_box(&self, page: u32) -> Option<&BoundingBox> {
        self.boxes
            .iter()
            .find(|b| b.page_start <= page && page <= b.page_end)
    }

    /// Add `other`, merging it into the box on the same page when there is one.
    pub fn union(&mut self, other: &BoundingBox) {
        let same_page = self
            .boxes
            .iter_mut()
            .find(|b| other.is_single_page() && b.same_page(other));

        match same_page {
            Some(existing) => existing.union(other),
            None => {
                let position = self
                    .boxes
                    .iter()
                    .position(|b| b.page_start > other.page_start)
                    .unwrap_or(self.boxes.len());
                self.boxes.insert(position, *other);
            }
        }

        self.recompute_envelope();
    }

    /// Add every page box of `other`.
    pub fn union_multi(&mut self, other: &MultiBoundingBox) {
        for b in &other.boxes {
            self.union(b);
        }
    }

    /// Whether any page box overlaps `other`.
    pub fn overlaps(&self, other: &BoundingBox, epsilon: f64) -> bool {
        self.boxes.iter().any(|b| b.overlaps(other, epsilon))
    }

    fn recompute_envelope(&mut self) {
        let mut boxes = self.boxes.iter();
        if let Some(first) = boxes.next() {
            self.envelope = boxes.fold(*first, |acc, b| acc.united(b));
        }
    }
}

impl From<BoundingBox> for MultiBoundingBox {
    fn from(bbox: BoundingBox) -> Self {
        Self::new(bbox)
    }
}
