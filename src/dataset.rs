use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::detection::FrameDetection;
use crate::error::{Error, Result};
use crate::index::{is_time_sorted, SampleIndex};
use crate::metrics::{self, DerivedMetrics, MetricsConfig};
use crate::projection::Projector;
use crate::trail::{self, TrailPoint};
use crate::track::TrackPoint;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    /// Every coordinate lies in [0, 1] relative to the frame
    #[default]
    Normalized,
    /// Coordinates are pixels of the source video
    Pixels,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoMeta {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }
}

/// Descriptive record of the upstream pipeline, never read by the engine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingMeta {
    pub detector: String,
    pub detector_runtime: Option<String>,
    pub detector_version: Option<String>,
    pub model_source: Option<String>,
    pub tracker: String,
    pub tracker_params: serde_json::Value,
    pub cleaning: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetPayload {
    #[serde(default)]
    coordinate_system: CoordinateSystem,
    #[serde(default)]
    video: VideoMeta,
    #[serde(default)]
    processing_meta: ProcessingMeta,
    #[serde(default)]
    frame_detections: Vec<FrameDetection>,
    #[serde(default)]
    track_points: Vec<TrackPoint>,
}

impl TryFrom<DatasetPayload> for TrackingDataset {
    type Error = Error;

    fn try_from(p: DatasetPayload) -> Result<Self> {
        TrackingDataset::new(
            p.coordinate_system,
            p.video,
            p.processing_meta,
            p.frame_detections,
            p.track_points,
        )
    }
}

/// One session's tracking result. Validated on construction and read-only afterwards.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", try_from = "DatasetPayload")]
pub struct TrackingDataset {
    coordinate_system: CoordinateSystem,
    video: VideoMeta,
    processing_meta: ProcessingMeta,
    frame_detections: Vec<FrameDetection>,
    track_points: Vec<TrackPoint>,

    // frames with a bbox, in series order; the only candidates for the active frame
    #[serde(skip)]
    frame_hits: Vec<FrameDetection>,
    #[serde(skip)]
    frames_sorted: bool,
    #[serde(skip)]
    points_sorted: bool,
}

impl TrackingDataset {
    pub fn new(
        coordinate_system: CoordinateSystem,
        video: VideoMeta,
        processing_meta: ProcessingMeta,
        frame_detections: Vec<FrameDetection>,
        track_points: Vec<TrackPoint>,
    ) -> Result<Self> {
        if coordinate_system == CoordinateSystem::Pixels && (video.width == 0 || video.height == 0)
        {
            return Err(Error::InvalidVideoDimensions {
                width: video.width,
                height: video.height,
            });
        }

        for frame in &frame_detections {
            if let Some(bbox) = &frame.bbox {
                validate_bbox(frame.t_ms, bbox)?;
            }
        }

        for point in &track_points {
            if !point.cx.is_finite() || !point.cy.is_finite() {
                return Err(Error::NonFiniteCoordinate { t_ms: point.t_ms });
            }
        }

        let frames_sorted = is_time_sorted(&frame_detections);
        let points_sorted = is_time_sorted(&track_points);

        if !frames_sorted {
            warn!("frame detections are out of time order, falling back to linear scans");
        }

        if !points_sorted {
            warn!("track points are out of time order, falling back to linear scans");
        }

        let frame_hits: Vec<_> = frame_detections
            .iter()
            .filter(|f| f.is_hit())
            .copied()
            .collect();

        debug!(
            "tracking dataset: {:?} {}x{}, {} frames ({} hits), {} points",
            coordinate_system,
            video.width,
            video.height,
            frame_detections.len(),
            frame_hits.len(),
            track_points.len()
        );

        Ok(Self {
            coordinate_system,
            video,
            processing_meta,
            frame_detections,
            track_points,
            frame_hits,
            frames_sorted,
            points_sorted,
        })
    }

    /// Dataset with no samples yet, e.g. while upstream processing is running.
    pub fn empty(coordinate_system: CoordinateSystem, video: VideoMeta) -> Result<Self> {
        Self::new(
            coordinate_system,
            video,
            ProcessingMeta::default(),
            Vec::new(),
            Vec::new(),
        )
    }

    pub fn from_json(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn from_reader<R: std::io::Read>(rdr: R) -> Result<Self> {
        Ok(serde_json::from_reader(rdr)?)
    }

    #[inline]
    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    #[inline]
    pub fn video(&self) -> &VideoMeta {
        &self.video
    }

    #[inline]
    pub fn processing_meta(&self) -> &ProcessingMeta {
        &self.processing_meta
    }

    #[inline]
    pub fn frame_detections(&self) -> &[FrameDetection] {
        &self.frame_detections
    }

    #[inline]
    pub fn track_points(&self) -> &[TrackPoint] {
        &self.track_points
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_detections.is_empty() && self.track_points.is_empty()
    }

    /// Index over the frames that carry a bbox. A subsequence of a time-ordered
    /// series is time-ordered too, so it shares the order flag of the full series.
    #[inline]
    pub fn frame_index(&self) -> SampleIndex<'_, FrameDetection> {
        SampleIndex::with_order(&self.frame_hits, self.frames_sorted)
    }

    #[inline]
    pub fn point_index(&self) -> SampleIndex<'_, TrackPoint> {
        SampleIndex::with_order(&self.track_points, self.points_sorted)
    }

    #[inline]
    pub fn projector(&self) -> Projector {
        Projector::new(self.coordinate_system, &self.video)
    }

    /// Nearest frame with a bbox. Misses never become the active frame.
    #[inline]
    pub fn nearest_frame(&self, query_ms: u64) -> Option<&FrameDetection> {
        self.frame_index().nearest(query_ms)
    }

    #[inline]
    pub fn nearest_track_point(&self, query_ms: u64) -> Option<&TrackPoint> {
        self.point_index().nearest(query_ms)
    }

    pub fn trail(&self, query_ms: u64, max_points: usize) -> Vec<TrailPoint<'_>> {
        trail::build_trail_indexed(self.point_index(), self.projector(), query_ms, max_points)
    }

    pub fn metrics(&self, config: &MetricsConfig) -> DerivedMetrics {
        metrics::compute_with(&self.frame_detections, &self.track_points, config)
    }

    /// Rescales a normalized dataset into pixels of its source video.
    pub fn to_pixels(&self) -> Result<Self> {
        if self.coordinate_system == CoordinateSystem::Pixels {
            return Ok(self.clone());
        }

        let (w, h) = (self.video.width, self.video.height);
        if w == 0 || h == 0 {
            return Err(Error::InvalidVideoDimensions {
                width: w,
                height: h,
            });
        }

        let (sx, sy) = (w as f64, h as f64);

        let frame_detections = self
            .frame_detections
            .iter()
            .map(|f| FrameDetection {
                bbox: f.bbox.map(|b| b.scaled(sx, sy)),
                ..*f
            })
            .collect();

        let track_points = self
            .track_points
            .iter()
            .map(|p| TrackPoint {
                cx: p.cx * sx,
                cy: p.cy * sy,
                ..*p
            })
            .collect();

        Self::new(
            CoordinateSystem::Pixels,
            self.video,
            self.processing_meta.clone(),
            frame_detections,
            track_points,
        )
    }
}

fn validate_bbox(t_ms: u64, bbox: &BBox) -> Result<()> {
    if !bbox.is_finite() {
        return Err(Error::NonFiniteCoordinate { t_ms });
    }

    if bbox.w < 0.0 || bbox.h < 0.0 {
        return Err(Error::NegativeBoxSize { t_ms });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Quality;
    use approx::assert_abs_diff_eq;

    const PAYLOAD: &str = r#"{
        "coordinateSystem": "normalized",
        "video": {"width": 1920, "height": 1080, "fps": 30.0},
        "processingMeta": {"detector": "yolov8n", "tracker": "single-target-iou",
                           "trackerParams": {"maxGapFrames": 5}},
        "frameDetections": [
            {"tMs": 0, "bbox": {"x": 0.4, "y": 0.3, "w": 0.1, "h": 0.2}, "conf": 0.9},
            {"tMs": 1000, "bbox": null, "conf": null},
            {"tMs": 2000, "bbox": {"x": 0.45, "y": 0.3, "w": 0.1, "h": 0.2}}
        ],
        "trackPoints": [
            {"tMs": 0, "trackId": 1, "cx": 0.45, "cy": 0.4, "quality": "measured"},
            {"tMs": 1000, "trackId": 1, "cx": 0.475, "cy": 0.4, "quality": "interpolated"},
            {"tMs": 2000, "trackId": 1, "cx": 0.5, "cy": 0.4, "quality": "measured"}
        ],
        "derivedMetrics": {"coverage": 1.0, "gapCount": 0, "longestGapMs": 0, "distance": 0.05}
    }"#;

    #[test]
    fn test_parse_payload() {
        let ds = TrackingDataset::from_json(PAYLOAD).unwrap();

        assert_eq!(ds.coordinate_system(), CoordinateSystem::Normalized);
        assert_eq!(ds.video().width, 1920);
        assert_eq!(ds.processing_meta().detector, "yolov8n");
        assert_eq!(ds.frame_detections().len(), 3);
        assert!(ds.frame_detections()[1].bbox.is_none());
        assert_eq!(ds.frame_detections()[2].confidence, None);
        assert_eq!(ds.track_points()[1].quality, Quality::Interpolated);
    }

    #[test]
    fn test_pixels_without_dimensions_rejected() {
        let res = TrackingDataset::empty(CoordinateSystem::Pixels, VideoMeta::new(0, 1080, 30.0));
        assert!(matches!(
            res,
            Err(Error::InvalidVideoDimensions {
                width: 0,
                height: 1080
            })
        ));
    }

    #[test]
    fn test_negative_box_rejected() {
        let frames = vec![FrameDetection::hit(40, BBox::ltwh(0.1, 0.1, -0.1, 0.2), 0.8)];
        let res = TrackingDataset::new(
            CoordinateSystem::Normalized,
            VideoMeta::default(),
            ProcessingMeta::default(),
            frames,
            Vec::new(),
        );
        assert!(matches!(res, Err(Error::NegativeBoxSize { t_ms: 40 })));
    }

    #[test]
    fn test_invalid_payload_is_a_json_error() {
        let src = r#"{"coordinateSystem": "pixels", "video": {"width": 0, "height": 0, "fps": 0}}"#;
        assert!(matches!(TrackingDataset::from_json(src), Err(Error::Json(_))));
    }

    #[test]
    fn test_to_pixels() {
        let ds = TrackingDataset::from_json(PAYLOAD).unwrap();
        let px = ds.to_pixels().unwrap();

        assert_eq!(px.coordinate_system(), CoordinateSystem::Pixels);
        let bbox = px.frame_detections()[0].bbox.unwrap();
        assert_abs_diff_eq!(bbox.x, 768.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.h, 216.0, epsilon = 1e-9);
        assert_abs_diff_eq!(px.track_points()[2].cx, 960.0, epsilon = 1e-9);
        assert_eq!(px.frame_detections()[1].bbox, None);

        let pb = ds.projector().project_box(&ds.frame_detections()[0].bbox.unwrap());
        let qb = px.projector().project_box(&bbox);
        assert_abs_diff_eq!(pb.left, qb.left, epsilon = 1e-9);
        assert_abs_diff_eq!(pb.height, qb.height, epsilon = 1e-9);
    }

    #[test]
    fn test_nearest_frame_skips_misses() {
        let ds = TrackingDataset::from_json(PAYLOAD).unwrap();
        assert_eq!(ds.frame_index().len(), 2);
        assert_eq!(ds.nearest_frame(900).unwrap().t_ms, 0);
        assert_eq!(ds.nearest_frame(1_000).unwrap().t_ms, 0);
        assert_eq!(ds.nearest_frame(1_100).unwrap().t_ms, 2_000);

        let px = ds.to_pixels().unwrap();
        assert_eq!(px.nearest_frame(900).unwrap().t_ms, 0);
        assert_abs_diff_eq!(px.nearest_frame(900).unwrap().bbox.unwrap().x, 768.0, epsilon = 1e-9);

        let misses = TrackingDataset::new(
            CoordinateSystem::Normalized,
            VideoMeta::default(),
            ProcessingMeta::default(),
            vec![FrameDetection::miss(0), FrameDetection::miss(40)],
            Vec::new(),
        )
        .unwrap();
        assert!(misses.nearest_frame(20).is_none());
    }

    #[test]
    fn test_serialize_round_trips_through_validation() {
        let ds = TrackingDataset::from_json(PAYLOAD).unwrap();
        let json = serde_json::to_string(&ds).unwrap();
        assert!(json.contains("\"frameDetections\""));
        assert!(json.contains("\"tMs\""));

        let back = TrackingDataset::from_json(&json).unwrap();
        assert_eq!(back.track_points(), ds.track_points());
    }
}
