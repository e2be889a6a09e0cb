// m_bbox.rs — axis-aligned bounding boxes in map space

use crate::m_fixed::Fixed;

pub const BOXTOP: usize = 0;
pub const BOXBOTTOM: usize = 1;
pub const BOXLEFT: usize = 2;
pub const BOXRIGHT: usize = 3;

/// Bounding box indexed by `BOXTOP`, `BOXBOTTOM`, `BOXLEFT`, `BOXRIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BBox(pub [Fixed; 4]);

impl Default for BBox {
    fn default() -> Self {
        let mut b = BBox([Fixed::ZERO; 4]);
        b.clear();
        b
    }
}

impl BBox {
    /// Inverted box that any added point will replace.
    pub fn clear(&mut self) {
        self.0[BOXTOP] = Fixed::MIN;
        self.0[BOXRIGHT] = Fixed::MIN;
        self.0[BOXBOTTOM] = Fixed::MAX;
        self.0[BOXLEFT] = Fixed::MAX;
    }

    pub fn add_point(&mut self, x: Fixed, y: Fixed) {
        if x < self.0[BOXLEFT] {
            self.0[BOXLEFT] = x;
        }
        if x > self.0[BOXRIGHT] {
            self.0[BOXRIGHT] = x;
        }
        if y < self.0[BOXBOTTOM] {
            self.0[BOXBOTTOM] = y;
        }
        if y > self.0[BOXTOP] {
            self.0[BOXTOP] = y;
        }
    }

    /// Box spanning two points, each axis ordered independently.
    pub fn from_points(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Self {
        let mut b = BBox([Fixed::ZERO; 4]);
        if x1 < x2 {
            b.0[BOXLEFT] = x1;
            b.0[BOXRIGHT] = x2;
        } else {
            b.0[BOXLEFT] = x2;
            b.0[BOXRIGHT] = x1;
        }
        if y1 < y2 {
            b.0[BOXBOTTOM] = y1;
            b.0[BOXTOP] = y2;
        } else {
            b.0[BOXBOTTOM] = y2;
            b.0[BOXTOP] = y1;
        }
        b
    }

    #[inline]
    pub fn top(&self) -> Fixed {
        self.0[BOXTOP]
    }
    #[inline]
    pub fn bottom(&self) -> Fixed {
        self.0[BOXBOTTOM]
    }
    #[inline]
    pub fn left(&self) -> Fixed {
        self.0[BOXLEFT]
    }
    #[inline]
    pub fn right(&self) -> Fixed {
        self.0[BOXRIGHT]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_point_grows_box() {
        let mut b = BBox::default();
        b.add_point(Fixed::from_int(10), Fixed::from_int(-5));
        b.add_point(Fixed::from_int(-3), Fixed::from_int(20));
        assert_eq!(b.left(), Fixed::from_int(-3));
        assert_eq!(b.right(), Fixed::from_int(10));
        assert_eq!(b.bottom(), Fixed::from_int(-5));
        assert_eq!(b.top(), Fixed::from_int(20));
    }

    #[test]
    fn test_from_points_orders_axes() {
        let b = BBox::from_points(
            Fixed::from_int(64),
            Fixed::from_int(0),
            Fixed::from_int(0),
            Fixed::from_int(128),
        );
        assert_eq!(b.left(), Fixed::ZERO);
        assert_eq!(b.right(), Fixed::from_int(64));
        assert_eq!(b.bottom(), Fixed::ZERO);
        assert_eq!(b.top(), Fixed::from_int(128));
    }
}
