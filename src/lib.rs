pub mod bbox;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod index;
pub mod metrics;
pub mod overlay;
pub mod projection;
pub mod track;
pub mod tracker;
pub mod trail;


pub use bbox::BBox;
pub use config::EngineConfig;
pub use dataset::{CoordinateSystem, ProcessingMeta, TrackingDataset, VideoMeta};
pub use detection::FrameDetection;
pub use error::{Error, Result};
pub use metrics::DerivedMetrics;
pub use overlay::{OverlayFrame, OverlayOptions};
pub use projection::{PercentBox, PercentPoint, Projector};
pub use track::{Quality, TrackPoint};

/// Anything placed on the video timeline, in ms from the start of the video
pub trait Timestamped {
    fn t_ms(&self) -> u64;
}

/// A loaded session plus the settings it is replayed with.
///
/// Metrics are computed once on construction; [`Session::overlay`] is the
/// per-`timeupdate` entry point and only borrows the dataset. Track points are
/// taken as given: `config.gap_fill` belongs to [`tracker::track_frames`].
#[derive(Debug, Clone)]
pub struct Session {
    dataset: TrackingDataset,
    config: EngineConfig,
    metrics: DerivedMetrics,
}

impl Session {
    pub fn new(dataset: TrackingDataset, config: EngineConfig) -> Self {
        let metrics = dataset.metrics(&config.metrics);

        Self {
            dataset,
            config,
            metrics,
        }
    }

    #[inline]
    pub fn dataset(&self) -> &TrackingDataset {
        &self.dataset
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    #[inline]
    pub fn overlay(&self, query_ms: u64) -> OverlayFrame<'_> {
        overlay::build(&self.dataset, query_ms, &self.config.overlay)
    }

    /// Same as [`Session::overlay`] for a playback position in seconds.
    #[inline]
    pub fn overlay_at_secs(&self, secs: f64) -> OverlayFrame<'_> {
        self.overlay(secs_to_ms(secs))
    }
}

/// Video clocks report seconds; the engine works in whole milliseconds.
#[inline]
pub fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
