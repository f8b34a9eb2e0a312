use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Left-top-width-height box in the dataset's native coordinates
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    #[inline]
    pub fn ltwh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    #[inline(always)]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline(always)]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline(always)]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline(always)]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Left-top-right-bottom corners
    #[inline]
    pub fn as_ltrb(&self) -> [f64; 4] {
        [self.left(), self.top(), self.right(), self.bottom()]
    }

    #[inline]
    pub fn centroid(&self) -> na::Point2<f64> {
        na::Point2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    #[inline]
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::ltwh(self.x * sx, self.y * sy, self.w * sx, self.h * sy)
    }
}
