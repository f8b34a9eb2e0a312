use log::debug;
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::detection::FrameDetection;
use crate::track::{Quality, TrackPoint};

/// Turns per-frame detector picks into the frame and track series of a dataset.
pub trait Tracking {
    fn update(
        &mut self,
        t_ms: u64,
        bbox: Option<BBox>,
        confidence: Option<f64>,
    ) -> (FrameDetection, TrackPoint);
}

/// Follows one target by its bbox centroid.
///
/// A miss yields a `Lost` point parked at the last known centroid, or at
/// `fallback` before the first hit.
#[derive(Debug, Clone)]
pub struct SingleTargetTracker {
    pub track_id: i32,
    pub lost_count: u32,
    last: Option<BBox>,
    fallback: na::Point2<f64>,
}

impl SingleTargetTracker {
    pub fn new(track_id: i32, fallback: na::Point2<f64>) -> Self {
        Self {
            track_id,
            lost_count: 0,
            last: None,
            fallback,
        }
    }

    #[inline]
    pub fn last_bbox(&self) -> Option<&BBox> {
        self.last.as_ref()
    }
}

impl Default for SingleTargetTracker {
    fn default() -> Self {
        Self::new(1, na::Point2::new(0.5, 0.5))
    }
}

impl Tracking for SingleTargetTracker {
    fn update(
        &mut self,
        t_ms: u64,
        bbox: Option<BBox>,
        confidence: Option<f64>,
    ) -> (FrameDetection, TrackPoint) {
        if let Some(bbox) = bbox {
            self.last = Some(bbox);
            self.lost_count = 0;

            let frame = FrameDetection {
                t_ms,
                bbox: Some(bbox),
                confidence,
            };

            return (
                frame,
                TrackPoint::new(t_ms, self.track_id, bbox.centroid(), Quality::Measured),
            );
        }

        self.lost_count += 1;
        let pos = self.last.map(|b| b.centroid()).unwrap_or(self.fallback);

        (
            FrameDetection::miss(t_ms),
            TrackPoint::new(t_ms, self.track_id, pos, Quality::Lost),
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GapFillConfig {
    pub enabled: bool,
    pub max_gap_frames: usize,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_gap_frames: 5,
        }
    }
}

/// Linearly interpolates every run of `Lost` points that is at most `max_gap`
/// long and sits between two `Measured` points. Longer runs, runs touching either
/// end of the series and runs next to interpolated points are left alone.
pub fn fill_short_gaps(points: &[TrackPoint], max_gap: usize) -> Vec<TrackPoint> {
    let mut out = points.to_vec();
    if max_gap == 0 || out.len() < 3 {
        return out;
    }

    let mut filled = 0;
    let mut idx = 0;

    while idx < out.len() {
        if out[idx].quality != Quality::Lost {
            idx += 1;
            continue;
        }

        let mut end = idx;
        while end < out.len() && out[end].quality == Quality::Lost {
            end += 1;
        }

        let run = end - idx;
        let bounded = idx > 0
            && end < out.len()
            && out[idx - 1].quality == Quality::Measured
            && out[end].quality == Quality::Measured;

        if bounded && run <= max_gap {
            let a = out[idx - 1].pos();
            let b = out[end].pos();
            let span = (run + 1) as f64;

            for (k, p) in out[idx..end].iter_mut().enumerate() {
                let alpha = (k + 1) as f64 / span;
                let pos = a + (b - a) * alpha;

                p.cx = pos.x;
                p.cy = pos.y;
                p.quality = Quality::Interpolated;
            }

            filled += run;
        }

        idx = end;
    }

    debug!("gap fill: {} of {} points interpolated", filled, out.len());

    out
}

/// Runs `tracker` over `frames` and optionally fills short gaps in the result.
pub fn track_frames<T: Tracking>(
    tracker: &mut T,
    frames: &[FrameDetection],
    gap_fill: &GapFillConfig,
) -> (Vec<FrameDetection>, Vec<TrackPoint>) {
    let (frames, points): (Vec<_>, Vec<_>) = frames
        .iter()
        .map(|f| tracker.update(f.t_ms, f.bbox, f.confidence))
        .unzip();

    let points = if gap_fill.enabled {
        fill_short_gaps(&points, gap_fill.max_gap_frames)
    } else {
        points
    };

    (frames, points)
}
