use log::{debug, warn};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::detection::FrameDetection;
use crate::index::is_time_sorted;
use crate::track::TrackPoint;
use crate::Timestamped;

/// How coverage weighs each sample of the timeline
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Every sample counts once
    #[default]
    Samples,
    /// Every sample counts for the time until the next one
    Elapsed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct MetricsConfig {
    pub coverage: CoverageMode,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Covered share of the timeline, in [0, 1]
    pub coverage: f64,
    pub gap_count: u32,
    pub longest_gap_ms: u64,
    /// Path length in native coordinate units
    pub distance: f64,
    /// Population std-dev of step lengths, absent without at least one step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    t_ms: u64,
    pos: na::Point2<f64>,
    covered: bool,
}

impl Timestamped for Sample {
    #[inline(always)]
    fn t_ms(&self) -> u64 {
        self.t_ms
    }
}

#[inline]
pub fn compute(frames: &[FrameDetection], points: &[TrackPoint]) -> DerivedMetrics {
    compute_with(frames, points, &MetricsConfig::default())
}

pub fn compute_with(
    frames: &[FrameDetection],
    points: &[TrackPoint],
    config: &MetricsConfig,
) -> DerivedMetrics {
    let samples = timeline(frames, points);
    if samples.is_empty() {
        return DerivedMetrics::default();
    }

    let (gap_count, longest_gap_ms) = gaps(&samples);
    let steps = steps(&samples);
    let distance: f64 = steps.iter().sum();

    let metrics = DerivedMetrics {
        coverage: coverage(&samples, config.coverage),
        gap_count,
        longest_gap_ms,
        distance,
        jitter: std_dev(&steps),
    };

    debug!("derived metrics over {} samples: {:?}", samples.len(), metrics);

    metrics
}

// Track points carry the gap-filled trajectory, so they win over raw frames.
fn timeline(frames: &[FrameDetection], points: &[TrackPoint]) -> Vec<Sample> {
    let mut samples: Vec<Sample> = if !points.is_empty() {
        points
            .iter()
            .map(|p| Sample {
                t_ms: p.t_ms,
                pos: p.pos(),
                covered: p.is_covered(),
            })
            .collect()
    } else {
        frames
            .iter()
            .map(|f| Sample {
                t_ms: f.t_ms,
                pos: f.bbox.map(|b| b.centroid()).unwrap_or_else(|| na::Point2::origin()),
                covered: f.is_hit(),
            })
            .collect()
    };

    if !is_time_sorted(&samples) {
        warn!("metrics timeline is out of time order, sorting");
        samples.sort_by_key(|s| s.t_ms);
    }

    samples
}

fn coverage(samples: &[Sample], mode: CoverageMode) -> f64 {
    let weights = sample_weights(samples, mode);
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let covered: f64 = samples
        .iter()
        .zip(weights.iter())
        .filter(|(s, _)| s.covered)
        .map(|(_, w)| w)
        .sum();

    covered / total
}

fn sample_weights(samples: &[Sample], mode: CoverageMode) -> Vec<f64> {
    match mode {
        CoverageMode::Samples => vec![1.0; samples.len()],
        CoverageMode::Elapsed => {
            let mut weights: Vec<f64> = samples
                .windows(2)
                .map(|w| (w[1].t_ms - w[0].t_ms) as f64)
                .collect();

            // the last sample lasts as long as the one before it
            let last = weights.last().copied().unwrap_or(1.0);
            weights.push(last);

            if weights.iter().sum::<f64>() > 0.0 {
                weights
            } else {
                vec![1.0; samples.len()]
            }
        }
    }
}

/// A gap runs from its first uncovered sample to the next covered one, or to
/// the last sample when the timeline ends uncovered.
fn gaps(samples: &[Sample]) -> (u32, u64) {
    let mut count = 0;
    let mut longest = 0;
    let mut start: Option<u64> = None;

    for s in samples {
        if !s.covered {
            start.get_or_insert(s.t_ms);
        } else if let Some(t0) = start.take() {
            count += 1;
            longest = longest.max(s.t_ms.saturating_sub(t0));
        }
    }

    if let (Some(t0), Some(last)) = (start, samples.last()) {
        count += 1;
        longest = longest.max(last.t_ms.saturating_sub(t0));
    }

    (count, longest)
}

/// Step lengths between neighbours that are both covered. Nothing bridges a gap.
fn steps(samples: &[Sample]) -> Vec<f64> {
    samples
        .windows(2)
        .filter(|w| w[0].covered && w[1].covered)
        .map(|w| na::distance(&w[0].pos, &w[1].pos))
        .collect()
}

fn std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

    Some(var.sqrt())
}
