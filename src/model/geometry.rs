//! Axis-aligned boxes in page space.

use serde::{Deserialize, Serialize};

/// Rectangle `(x0, y0, x1, y1)` with `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a box, normalizing swapped corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of a sequence of boxes, `None` when empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = &'a BBox>,
    {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(u) => Some(u.union(b)),
        })
    }

    /// Inclusive point-in-box test.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Length of the shared horizontal span; negative when disjoint.
    pub fn horizontal_overlap(&self, other: &BBox) -> f32 {
        self.x1.min(other.x1) - self.x0.max(other.x0)
    }

    /// Whether the box has a positive, finite area.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Grow the box to at least `min` in each dimension, anchored at the
    /// top-left corner.
    pub fn with_min_size(&self, min: f32) -> BBox {
        BBox {
            x0: self.x0,
            y0: self.y0,
            x1: self.x0 + self.width().max(min),
            y1: self.y0 + self.height().max(min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes() {
        let b = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(b, BBox::new(0.0, 5.0, 10.0, 20.0));
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 15.0);
    }

    #[test]
    fn test_union_all() {
        let boxes = [
            BBox::new(0.0, 0.0, 10.0, 10.0),
            BBox::new(5.0, -2.0, 20.0, 4.0),
        ];
        assert_eq!(
            BBox::union_all(&boxes),
            Some(BBox::new(0.0, -2.0, 20.0, 10.0))
        );
        assert_eq!(BBox::union_all(&[]), None);
    }

    #[test]
    fn test_horizontal_overlap() {
        let a = BBox::new(0.0, 0.0, 100.0, 10.0);
        let b = BBox::new(50.0, 20.0, 200.0, 30.0);
        let c = BBox::new(150.0, 0.0, 160.0, 10.0);
        assert_eq!(a.horizontal_overlap(&b), 50.0);
        assert!(a.horizontal_overlap(&c) < 0.0);
    }

    #[test]
    fn test_validity_and_min_size() {
        let flat = BBox::new(5.0, 5.0, 5.0, 9.0);
        assert!(!flat.is_valid());
        let fixed = flat.with_min_size(10.0);
        assert!(fixed.is_valid());
        assert_eq!(fixed.width(), 10.0);
        assert_eq!(fixed.height(), 10.0);
    }

    #[test]
    fn test_contains_point() {
        let b = BBox::new(100.0, 100.0, 150.0, 120.0);
        assert!(b.contains_point(100.0, 110.0));
        assert!(!b.contains_point(151.0, 110.0));
    }
}
