use log::{debug, trace};

use crate::detection::FrameDetection;
use crate::track::TrackPoint;
use crate::Timestamped;

#[inline]
pub fn is_time_sorted<T: Timestamped>(samples: &[T]) -> bool {
    samples.windows(2).all(|w| w[0].t_ms() <= w[1].t_ms())
}

#[inline(always)]
fn delta<T: Timestamped>(sample: &T, query_ms: u64) -> u64 {
    sample.t_ms().abs_diff(query_ms)
}

/// Nearest-in-time lookup over a borrowed series.
///
/// A time-ordered series is searched with two binary searches per query, anything
/// else with a linear fold. Both paths pick the sample with the smallest
/// `|t_ms - query_ms|` and, on a tie, the one that comes first in the series.
/// No cursor is kept, so backward seeks cost the same as forward playback.
#[derive(Debug)]
pub struct SampleIndex<'a, T> {
    samples: &'a [T],
    sorted: bool,
}

impl<'a, T> Clone for SampleIndex<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for SampleIndex<'a, T> {}

impl<'a, T: Timestamped> SampleIndex<'a, T> {
    pub fn new(samples: &'a [T]) -> Self {
        let sorted = is_time_sorted(samples);
        if !sorted {
            debug!("sample index over {} unordered samples", samples.len());
        }

        Self { samples, sorted }
    }

    /// `sorted` must be the result of [`is_time_sorted`] over `samples`.
    #[inline]
    pub(crate) fn with_order(samples: &'a [T], sorted: bool) -> Self {
        Self { samples, sorted }
    }

    #[inline]
    pub fn samples(&self) -> &'a [T] {
        self.samples
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn nearest(&self, query_ms: u64) -> Option<&'a T> {
        trace!("nearest sample to {} ms", query_ms);

        if self.sorted {
            self.nearest_sorted(query_ms)
        } else {
            self.nearest_scan(query_ms)
        }
    }

    #[inline]
    fn nearest_scan(&self, query_ms: u64) -> Option<&'a T> {
        nearest_of(self.samples.iter(), query_ms)
    }

    fn nearest_sorted(&self, query_ms: u64) -> Option<&'a T> {
        let samples = self.samples;

        // first sample at or after the query
        let after = samples.partition_point(|s| s.t_ms() < query_ms);

        // first sample sharing the timestamp of the last one before the query
        let before = if after > 0 {
            let t = samples[after - 1].t_ms();
            Some(&samples[samples.partition_point(|s| s.t_ms() < t)])
        } else {
            None
        };

        match (before, samples.get(after)) {
            (Some(b), Some(a)) if delta(a, query_ms) < delta(b, query_ms) => Some(a),
            (Some(b), _) => Some(b),
            (None, a) => a,
        }
    }

    /// Number of leading samples with `t_ms <= query_ms`. Time-ordered series only.
    #[inline]
    pub(crate) fn causal_len(&self, query_ms: u64) -> usize {
        debug_assert!(self.sorted);
        self.samples.partition_point(|s| s.t_ms() <= query_ms)
    }
}

fn nearest_of<'a, T, I>(samples: I, query_ms: u64) -> Option<&'a T>
where
    T: Timestamped + 'a,
    I: Iterator<Item = &'a T>,
{
    samples.fold(None, |best, sample| match best {
        Some(best) if delta(best, query_ms) <= delta(sample, query_ms) => Some(best),
        _ => Some(sample),
    })
}

/// Nearest frame that carries a bbox. Misses are never returned, so `None`
/// means no frame in the series has a detection.
///
/// One linear pass per call. Playback loops should query
/// [`TrackingDataset::nearest_frame`](crate::TrackingDataset::nearest_frame),
/// which keeps the hits and their time order from construction.
#[inline]
pub fn nearest_frame(frames: &[FrameDetection], query_ms: u64) -> Option<&FrameDetection> {
    nearest_of(frames.iter().filter(|f| f.is_hit()), query_ms)
}

/// Checks the time order of `points` on every call. Playback loops should query
/// [`TrackingDataset::nearest_track_point`](crate::TrackingDataset::nearest_track_point)
/// or keep a [`SampleIndex`] around.
#[inline]
pub fn nearest_track_point(points: &[TrackPoint], query_ms: u64) -> Option<&TrackPoint> {
    SampleIndex::new(points).nearest(query_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::track::Quality;
    use nalgebra as na;

    fn point(t_ms: u64, track_id: i32) -> TrackPoint {
        TrackPoint::new(t_ms, track_id, na::Point2::new(0.5, 0.5), Quality::Measured)
    }

    fn reference<T: Timestamped>(samples: &[T], query_ms: u64) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, s) in samples.iter().enumerate() {
            match best {
                Some(b) if delta(&samples[b], query_ms) <= delta(s, query_ms) => {}
                _ => best = Some(i),
            }
        }
        best
    }

    #[test]
    fn test_empty_series() {
        assert!(nearest_frame(&[], 100).is_none());
        assert!(nearest_track_point(&[], 0).is_none());
    }

    #[test]
    fn test_nearest_frame_skips_misses() {
        let bbox = BBox::ltwh(0.4, 0.3, 0.1, 0.2);
        let frames = [
            FrameDetection::hit(0, bbox, 0.9),
            FrameDetection::miss(1_000),
            FrameDetection::hit(2_000, bbox, 0.8),
        ];

        assert_eq!(nearest_frame(&frames, 900).unwrap().t_ms, 0);
        assert_eq!(nearest_frame(&frames, 1_000).unwrap().t_ms, 0);
        assert_eq!(nearest_frame(&frames, 1_001).unwrap().t_ms, 2_000);
        assert!(nearest_frame(&frames, 1_000).unwrap().is_hit());
    }

    #[test]
    fn test_nearest_frame_all_misses() {
        let frames = [FrameDetection::miss(0), FrameDetection::miss(40)];
        assert!(nearest_frame(&frames, 20).is_none());
    }

    #[test]
    fn test_tie_prefers_earlier() {
        let points = [point(100, 1), point(200, 2)];
        assert_eq!(nearest_track_point(&points, 150).unwrap().track_id, 1);
        assert_eq!(nearest_track_point(&points, 151).unwrap().track_id, 2);
        assert_eq!(nearest_track_point(&points, 149).unwrap().track_id, 1);
    }

    #[test]
    fn test_out_of_range_queries() {
        let points = [point(100, 1), point(200, 2), point(300, 3)];
        assert_eq!(nearest_track_point(&points, 0).unwrap().track_id, 1);
        assert_eq!(nearest_track_point(&points, 10_000).unwrap().track_id, 3);
        assert_eq!(nearest_track_point(&points, 200).unwrap().track_id, 2);
    }

    #[test]
    fn test_duplicate_timestamps_pick_first() {
        let points = [
            point(100, 1),
            point(200, 2),
            point(200, 3),
            point(300, 4),
            point(300, 5),
        ];
        assert_eq!(nearest_track_point(&points, 200).unwrap().track_id, 2);
        assert_eq!(nearest_track_point(&points, 240).unwrap().track_id, 2);
        assert_eq!(nearest_track_point(&points, 250).unwrap().track_id, 2);
        assert_eq!(nearest_track_point(&points, 260).unwrap().track_id, 4);
        assert_eq!(nearest_track_point(&points, 900).unwrap().track_id, 4);
    }

    #[test]
    fn test_unordered_series() {
        let points = [point(300, 1), point(100, 2), point(200, 3), point(100, 4)];
        let index = SampleIndex::new(&points[..]);
        assert!(!index.is_sorted());
        assert_eq!(index.nearest(120).unwrap().track_id, 2);
        assert_eq!(index.nearest(250).unwrap().track_id, 1);
        assert_eq!(index.nearest(260).unwrap().track_id, 1);
    }

    #[test]
    fn test_sorted_matches_linear_fold() {
        let times = [0u64, 33, 66, 66, 100, 180, 181, 400, 400, 400, 1000];
        let points: Vec<_> = times
            .iter()
            .enumerate()
            .map(|(i, &t)| point(t, i as i32))
            .collect();
        let index = SampleIndex::new(&points[..]);
        assert!(index.is_sorted());

        for q in 0..1100 {
            let expected = reference(&points, q).unwrap() as i32;
            assert_eq!(index.nearest(q).unwrap().track_id, expected, "query {}", q);
        }
    }

    #[test]
    fn test_seek_backwards() {
        let frames: Vec<_> = (0..500u64)
            .map(|i| FrameDetection::hit(i * 40, BBox::ltwh(0.0, 0.0, 0.1, 0.1), 0.9))
            .collect();
        let index = SampleIndex::new(&frames[..]);

        assert_eq!(index.nearest(19_000).unwrap().t_ms, 19_000);
        assert_eq!(index.nearest(1_019).unwrap().t_ms, 1_000);
        assert_eq!(index.nearest(1_020).unwrap().t_ms, 1_000);
        assert_eq!(index.nearest(1_021).unwrap().t_ms, 1_040);
    }

    #[test]
    fn test_causal_len() {
        let points = [point(100, 1), point(200, 2), point(200, 3), point(300, 4)];
        let index = SampleIndex::new(&points[..]);
        assert_eq!(index.causal_len(50), 0);
        assert_eq!(index.causal_len(200), 3);
        assert_eq!(index.causal_len(299), 3);
        assert_eq!(index.causal_len(300), 4);
    }
}
