//! Configuration loading for the radar loop.
//!
//! Loads a single YAML file (default `config/radar.yaml`). Every section has
//! defaults except `location`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use radar_common::{GeoPosition, DEFAULT_EXCLUDED_REGIONS};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RadarConfig {
    pub location: GeoPosition,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub frames: FramesConfig,
    #[serde(default)]
    pub basemaps: BasemapConfig,
    #[serde(default)]
    pub regions: RegionConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Seconds between acquisition cycles in continuous mode
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    600
}

/// Remote archive layout and HTTP behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive root; day paths are appended as `yyyy/mm/dd`
    pub base_url: String,
    /// Appended after the day path
    pub path_suffix: String,
    /// Anchor text must contain this to be a candidate
    pub product_marker: String,
    pub request_timeout_secs: u64,
    /// Retries for transport errors (not HTTP status errors)
    pub max_retries: u32,
    /// Initial retry delay (doubles each retry)
    pub initial_retry_delay_ms: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mesonet.agron.iastate.edu/archive/data/".to_string(),
            path_suffix: "/GIS/uscomp/".to_string(),
            product_marker: "n0r_".to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
            initial_retry_delay_ms: 500,
        }
    }
}

impl ArchiveConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Most recent mosaics kept per cycle
    pub max_images: usize,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self { max_images: 6 }
    }
}

/// Paths of the static background rasters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BasemapConfig {
    pub continental: PathBuf,
    pub hawaii: PathBuf,
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self {
            continental: PathBuf::from("images/4000RadarMap2.jpg"),
            hawaii: PathBuf::from("images/HawaiiRadarMap2.png"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Region codes answered with no data, without any network activity
    pub excluded: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_REGIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One step of the playback timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingEntry {
    /// Ticks this frame stays visible
    pub repeat: u32,
    /// Frame index shown
    pub frame: usize,
}

impl TimingEntry {
    pub const fn new(repeat: u32, frame: usize) -> Self {
        Self { repeat, frame }
    }
}

/// Reference dwell table: long pause on the newest frame, quick run through
/// the rest, repeated three times, then a final long hold.
pub fn default_timing() -> Vec<TimingEntry> {
    let mut timing = Vec::with_capacity(19);
    for _ in 0..3 {
        timing.push(TimingEntry::new(4, 5));
        timing.extend((0..5).map(|frame| TimingEntry::new(1, frame)));
    }
    timing.push(TimingEntry::new(12, 5));
    timing
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Milliseconds per tick
    pub base_delay_ms: u64,
    /// Height of one frame in the scroll region, including spacing
    pub frame_height_px: i64,
    pub timing: Vec<TimingEntry>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 350,
            frame_height_px: 371,
            timing: default_timing(),
        }
    }
}

impl RadarConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), region = %config.location.region_code, "Loaded radar config");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: RadarConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.frames.max_images == 0 {
            bail!("frames.max_images must be at least 1");
        }
        if self.playback.timing.is_empty() {
            bail!("playback.timing must not be empty");
        }
        if self.playback.timing.iter().all(|entry| entry.repeat == 0) {
            bail!("playback.timing must contain at least one entry with repeat > 0");
        }
        if !self.archive.base_url.ends_with('/') {
            bail!("archive.base_url must end with '/'");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml = r#"
location:
  latitude: 39.0997
  longitude: -94.5786
  region: MO
"#;
        let config = RadarConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.location.region_code, "MO");
        assert_eq!(config.frames.max_images, 6);
        assert_eq!(config.archive.product_marker, "n0r_");
        assert_eq!(config.regions.excluded, vec!["AK", "HI"]);
        assert_eq!(config.playback.base_delay_ms, 350);
        assert_eq!(config.playback.timing.len(), 19);
        assert_eq!(config.refresh_interval_secs, 600);
    }

    #[test]
    fn test_default_timing_table() {
        let timing = default_timing();
        let total: u32 = timing.iter().map(|e| e.repeat).sum();

        assert_eq!(timing[0], TimingEntry::new(4, 5));
        assert_eq!(timing[1], TimingEntry::new(1, 0));
        assert_eq!(timing[5], TimingEntry::new(1, 4));
        assert_eq!(timing[18], TimingEntry::new(12, 5));
        assert_eq!(total, 3 * 9 + 12);
    }

    #[test]
    fn test_missing_location_rejected() {
        assert!(RadarConfig::from_yaml("frames:\n  max_images: 4\n").is_err());
    }

    #[test]
    fn test_custom_timing_and_regions() {
        let yaml = r#"
location: { latitude: 21.3, longitude: -157.8, region: HI }
regions:
  excluded: [AK]
playback:
  timing:
    - { repeat: 4, frame: 5 }
    - { repeat: 1, frame: 0 }
"#;
        let config = RadarConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.regions.excluded, vec!["AK"]);
        assert_eq!(config.playback.timing.len(), 2);
        assert_eq!(config.playback.frame_height_px, 371);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = "location: { latitude: 39.0, longitude: -94.0, region: MO }\n";
        assert!(RadarConfig::from_yaml(&format!("{base}frames: {{ max_images: 0 }}\n")).is_err());
        assert!(RadarConfig::from_yaml(&format!("{base}playback: {{ timing: [] }}\n")).is_err());
        assert!(RadarConfig::from_yaml(&format!(
            "{base}archive: {{ base_url: \"https://example.com/data\" }}\n"
        ))
        .is_err());
    }
}
