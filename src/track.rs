use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::Timestamped;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Measured,
    Interpolated,
    Lost,
}

impl Quality {
    /// Measured and interpolated points both count as a known position.
    #[inline(always)]
    pub fn is_covered(self) -> bool {
        !matches!(self, Quality::Lost)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Measured => "measured",
            Quality::Interpolated => "interpolated",
            Quality::Lost => "lost",
        }
    }
}

/// Smoothed centroid of the tracked instructor at one instant
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub t_ms: u64,
    pub track_id: i32,
    pub cx: f64,
    pub cy: f64,
    pub quality: Quality,
}

impl TrackPoint {
    #[inline]
    pub fn new(t_ms: u64, track_id: i32, pos: na::Point2<f64>, quality: Quality) -> Self {
        Self {
            t_ms,
            track_id,
            cx: pos.x,
            cy: pos.y,
            quality,
        }
    }

    #[inline(always)]
    pub fn pos(&self) -> na::Point2<f64> {
        na::Point2::new(self.cx, self.cy)
    }

    #[inline(always)]
    pub fn is_covered(&self) -> bool {
        self.quality.is_covered()
    }
}

impl Timestamped for TrackPoint {
    #[inline(always)]
    fn t_ms(&self) -> u64 {
        self.t_ms
    }
}
