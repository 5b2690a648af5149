//! Finished radar frames.

use bytes::Bytes;
use chrono::{DateTime, Local, Utc};
use image::RgbaImage;
use radar_common::{format_time_simple, RadarResult};
use renderer::png::encode_png;
use serde::Serialize;

/// One composited frame. Immutable once built.
#[derive(Debug, Clone)]
pub struct RadarFrame {
    pub timestamp: DateTime<Utc>,
    pub source_url: String,
    /// Always `FRAME_WIDTH` x `FRAME_HEIGHT`
    pub image: RgbaImage,
    /// `image` encoded as PNG
    pub png: Bytes,
}

impl RadarFrame {
    pub fn new(timestamp: DateTime<Utc>, source_url: String, image: RgbaImage) -> RadarResult<Self> {
        let png = Bytes::from(encode_png(&image)?);
        Ok(Self {
            timestamp,
            source_url,
            image,
            png,
        })
    }

    /// Local clock label shown under the frame.
    pub fn time_label(&self) -> String {
        format_time_simple(&self.timestamp.with_timezone(&Local))
    }

    pub fn summary(&self, index: usize) -> FrameSummary {
        FrameSummary {
            index,
            timestamp: self.timestamp,
            time_label: self.time_label(),
            source_url: self.source_url.clone(),
        }
    }
}

/// Frame metadata without pixels.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub time_label: String,
    pub source_url: String,
}
