use log::trace;
use serde_derive::Serialize;

use crate::index::SampleIndex;
use crate::projection::{PercentPoint, Projector};
use crate::track::TrackPoint;

pub const DEFAULT_TRAIL_LEN: usize = 100;

/// Weight of the oldest point in a trail of two or more points.
pub const MIN_DECAY_WEIGHT: f64 = 0.28;

#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint<'a> {
    pub point: &'a TrackPoint,
    pub position: PercentPoint,
    pub weight: f64,
}

/// Linear fade from [`MIN_DECAY_WEIGHT`] at rank 0 (oldest) to 1.0 at rank `len - 1`.
#[inline]
pub fn decay_weight(rank: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }

    let ratio = rank.min(len - 1) as f64 / (len - 1) as f64;

    MIN_DECAY_WEIGHT + (1.0 - MIN_DECAY_WEIGHT) * ratio
}

/// Up to `max_points` most recent points with `t_ms <= query_ms`, oldest first.
///
/// Checks the time order of `points` on every call. Playback loops should use
/// [`TrackingDataset::trail`](crate::TrackingDataset::trail), which keeps the order
/// from construction.
pub fn build_trail<'a>(
    points: &'a [TrackPoint],
    projector: &Projector,
    query_ms: u64,
    max_points: usize,
) -> Vec<TrailPoint<'a>> {
    build_trail_indexed(SampleIndex::new(points), *projector, query_ms, max_points)
}

pub(crate) fn build_trail_indexed<'a>(
    index: SampleIndex<'a, TrackPoint>,
    projector: Projector,
    query_ms: u64,
    max_points: usize,
) -> Vec<TrailPoint<'a>> {
    if max_points == 0 || index.is_empty() {
        return Vec::new();
    }

    let window: Vec<&'a TrackPoint> = if index.is_sorted() {
        let end = index.causal_len(query_ms);
        let start = end.saturating_sub(max_points);

        index.samples()[start..end].iter().collect()
    } else {
        let mut causal: Vec<&'a TrackPoint> = index
            .samples()
            .iter()
            .filter(|p| p.t_ms <= query_ms)
            .collect();

        // stable, so equal timestamps keep their series order
        causal.sort_by_key(|p| p.t_ms);

        let start = causal.len().saturating_sub(max_points);
        causal.split_off(start)
    };

    trace!("trail at {} ms: {} points", query_ms, window.len());

    let len = window.len();
    window
        .into_iter()
        .enumerate()
        .map(|(rank, point)| TrailPoint {
            point,
            position: projector.project_point(point.cx, point.cy),
            weight: decay_weight(rank, len),
        })
        .collect()
}
