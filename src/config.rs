use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::metrics::MetricsConfig;
use crate::overlay::OverlayOptions;
use crate::tracker::GapFillConfig;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub overlay: OverlayOptions,
    pub metrics: MetricsConfig,
    /// Only read when building track points from raw frames through
    /// [`tracker::track_frames`](crate::tracker::track_frames). A loaded dataset
    /// and its [`Session`](crate::Session) keep their track points as given.
    pub gap_fill: GapFillConfig,
}

impl EngineConfig {
    pub fn from_json_str(src: &str) -> Result<Self> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
