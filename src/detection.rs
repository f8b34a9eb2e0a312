use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::Timestamped;

/// Detector output for one processed frame. `bbox == None` is a detector miss.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameDetection {
    #[serde(rename = "tMs")]
    pub t_ms: u64,
    pub bbox: Option<BBox>,
    #[serde(rename = "conf", default)]
    pub confidence: Option<f64>,
}

impl FrameDetection {
    #[inline]
    pub fn hit(t_ms: u64, bbox: BBox, confidence: f64) -> Self {
        Self {
            t_ms,
            bbox: Some(bbox),
            confidence: Some(confidence),
        }
    }

    #[inline]
    pub fn miss(t_ms: u64) -> Self {
        Self {
            t_ms,
            bbox: None,
            confidence: None,
        }
    }

    #[inline(always)]
    pub fn is_hit(&self) -> bool {
        self.bbox.is_some()
    }
}

impl Timestamped for FrameDetection {
    #[inline(always)]
    fn t_ms(&self) -> u64 {
        self.t_ms
    }
}
