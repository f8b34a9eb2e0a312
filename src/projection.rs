use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::dataset::{CoordinateSystem, VideoMeta};

#[inline]
pub fn clamp_percent(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

/// Box in percent of the rendering viewport, each field in [0, 100]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PercentBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentBox {
    #[inline(always)]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline(always)]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PercentPoint {
    pub left: f64,
    pub top: f64,
}

/// Maps native dataset coordinates to percent of the viewport.
///
/// Out-of-frame values are clamped, never rejected: a centroid slightly off screen
/// is still a valid sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    width: f64,
    height: f64,
}

impl Projector {
    pub fn new(system: CoordinateSystem, video: &VideoMeta) -> Self {
        match system {
            CoordinateSystem::Normalized => Self {
                width: 1.0,
                height: 1.0,
            },
            CoordinateSystem::Pixels => Self {
                width: if video.width == 0 { 1.0 } else { video.width as f64 },
                height: if video.height == 0 { 1.0 } else { video.height as f64 },
            },
        }
    }

    #[inline(always)]
    fn px(&self, x: f64) -> f64 {
        clamp_percent(x / self.width * 100.0)
    }

    #[inline(always)]
    fn py(&self, y: f64) -> f64 {
        clamp_percent(y / self.height * 100.0)
    }

    #[inline]
    pub fn project_box(&self, bbox: &BBox) -> PercentBox {
        PercentBox {
            left: self.px(bbox.x),
            top: self.py(bbox.y),
            width: self.px(bbox.w),
            height: self.py(bbox.h),
        }
    }

    #[inline]
    pub fn project_point(&self, x: f64, y: f64) -> PercentPoint {
        PercentPoint {
            left: self.px(x),
            top: self.py(y),
        }
    }
}

#[inline]
pub fn project_box(bbox: &BBox, system: CoordinateSystem, video: &VideoMeta) -> PercentBox {
    Projector::new(system, video).project_box(bbox)
}

#[inline]
pub fn project_point(x: f64, y: f64, system: CoordinateSystem, video: &VideoMeta) -> PercentPoint {
    Projector::new(system, video).project_point(x, y)
}
