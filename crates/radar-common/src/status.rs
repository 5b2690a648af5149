//! Acquisition cycle status shared between the pipeline and playback.

use serde::{Deserialize, Serialize};

/// Status of the current acquisition cycle.
///
/// A cycle starts in `Loading` and moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RadarStatus {
    Loading,
    Loaded,
    NoData,
    Failed,
}

impl RadarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::NoData => "noData",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }

    /// Only a loaded frame set may be played back.
    pub fn allows_playback(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

impl std::fmt::Display for RadarStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
