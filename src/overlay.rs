use log::trace;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::dataset::{CoordinateSystem, TrackingDataset};
use crate::detection::FrameDetection;
use crate::projection::{PercentBox, PercentPoint};
use crate::trail::{TrailPoint, DEFAULT_TRAIL_LEN};
use crate::track::TrackPoint;

/// Distance in percent between a bbox corner and its label anchor
pub const LABEL_OFFSET: f64 = 0.8;
pub const LABEL_MIN: f64 = 0.8;
pub const LABEL_MAX: f64 = 99.2;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlayOptions {
    pub show_bbox: bool,
    pub show_trail: bool,
    pub show_corner_labels: bool,
    pub trail_len: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            show_bbox: true,
            show_trail: true,
            show_corner_labels: false,
            trail_len: DEFAULT_TRAIL_LEN,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Corner {
    Tl,
    Tr,
    Bl,
    Br,
}

impl Corner {
    pub fn as_str(self) -> &'static str {
        match self {
            Corner::Tl => "TL",
            Corner::Tr => "TR",
            Corner::Bl => "BL",
            Corner::Br => "BR",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CornerLabel {
    pub corner: Corner,
    /// Corner coordinates in native units, e.g. `TL(768, 324)`
    pub text: String,
    pub anchor: PercentPoint,
}

/// Everything a renderer needs to draw one playback instant
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame<'a> {
    pub t_ms: u64,
    /// Nearest frame that has a bbox
    pub active_frame: Option<&'a FrameDetection>,
    pub active_point: Option<&'a TrackPoint>,
    pub coordinate_label: Option<String>,
    pub bbox: Option<PercentBox>,
    pub trail: Vec<TrailPoint<'a>>,
    pub corner_labels: Vec<CornerLabel>,
}

impl<'a> OverlayFrame<'a> {
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.bbox.is_none() && self.trail.is_empty() && self.corner_labels.is_empty()
    }
}

/// Pixel values are rounded half up, normalized ones keep three decimals.
pub fn format_coordinate(value: f64, system: CoordinateSystem) -> String {
    match system {
        CoordinateSystem::Pixels => format!("{}", (value + 0.5).floor() as i64),
        CoordinateSystem::Normalized => format!("{:.3}", value),
    }
}

#[inline]
fn clamp_label(v: f64) -> f64 {
    v.clamp(LABEL_MIN, LABEL_MAX)
}

fn corner_labels(bbox: &BBox, projected: &PercentBox, system: CoordinateSystem) -> Vec<CornerLabel> {
    let [x1, y1, x2, y2] = bbox.as_ltrb();
    let fmt = |v| format_coordinate(v, system);

    let left = clamp_label(projected.left - LABEL_OFFSET);
    let right = clamp_label(projected.right() + LABEL_OFFSET);
    let top = clamp_label(projected.top - LABEL_OFFSET);
    let bottom = clamp_label(projected.bottom() + LABEL_OFFSET);

    [
        (Corner::Tl, x1, y1, left, top),
        (Corner::Tr, x2, y1, right, top),
        (Corner::Bl, x1, y2, left, bottom),
        (Corner::Br, x2, y2, right, bottom),
    ]
    .iter()
    .map(|&(corner, x, y, ax, ay)| CornerLabel {
        corner,
        text: format!("{}({}, {})", corner.as_str(), fmt(x), fmt(y)),
        anchor: PercentPoint { left: ax, top: ay },
    })
    .collect()
}

/// Recomputes the overlay for `query_ms` from scratch. Calls are independent of
/// each other, so seeking in either direction needs no bookkeeping.
pub fn build<'a>(
    dataset: &'a TrackingDataset,
    query_ms: u64,
    options: &OverlayOptions,
) -> OverlayFrame<'a> {
    let system = dataset.coordinate_system();
    let projector = dataset.projector();

    let active_frame = dataset.nearest_frame(query_ms);
    let active_point = dataset.nearest_track_point(query_ms);

    let active_bbox = active_frame.and_then(|f| f.bbox.as_ref());
    let projected = active_bbox.map(|b| projector.project_box(b));

    let corner_labels = match (options.show_corner_labels, active_bbox, &projected) {
        (true, Some(bbox), Some(projected)) => corner_labels(bbox, projected, system),
        _ => Vec::new(),
    };

    let trail = if options.show_trail {
        dataset.trail(query_ms, options.trail_len)
    } else {
        Vec::new()
    };

    let coordinate_label = active_point.map(|p| {
        format!(
            "{}, {}",
            format_coordinate(p.cx, system),
            format_coordinate(p.cy, system)
        )
    });

    trace!(
        "overlay at {} ms: bbox={} trail={} labels={}",
        query_ms,
        projected.is_some(),
        trail.len(),
        corner_labels.len()
    );

    OverlayFrame {
        t_ms: query_ms,
        active_frame,
        active_point,
        coordinate_label,
        bbox: if options.show_bbox { projected } else { None },
        trail,
        corner_labels,
    }
}
