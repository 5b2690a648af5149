//! Playback scheduler: maps host ticks to frames on a variable-cadence
//! timetable.
//!
//! The host calls `advance()` once per tick (every `tick_delay()`), then
//! `render()` to get the frame to show. Only the `Loaded` status enables
//! playback. The acquisition pipeline replaces the frame set and drives the
//! status; the scheduler never does I/O.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use radar_common::RadarStatus;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{PlaybackConfig, TimingEntry};
use crate::frame::RadarFrame;

/// Called on every status change.
pub type StatusListener = Arc<dyn Fn(RadarStatus) + Send + Sync>;

/// Scheduler shared between the acquisition pipeline, the ticker and the
/// HTTP surface.
pub type SharedPlayback = Arc<RwLock<PlaybackScheduler>>;

/// Cyclic tick-to-frame mapping.
#[derive(Debug, Clone)]
pub struct Timetable {
    entries: Vec<TimingEntry>,
    period: u64,
}

impl Timetable {
    pub fn new(entries: Vec<TimingEntry>) -> Self {
        let period = entries.iter().map(|e| e.repeat as u64).sum();
        Self { entries, period }
    }

    /// Ticks in one full pass.
    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn entries(&self) -> &[TimingEntry] {
        &self.entries
    }

    /// Frame index shown at absolute tick `tick`.
    pub fn frame_at(&self, tick: u64) -> Option<usize> {
        if self.period == 0 {
            return None;
        }

        let mut remaining = tick % self.period;
        for entry in &self.entries {
            let repeat = entry.repeat as u64;
            if remaining < repeat {
                return Some(entry.frame);
            }
            remaining -= repeat;
        }
        None
    }
}

/// Observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub current_screen_index: usize,
    pub total_frames: usize,
    pub status: RadarStatus,
}

/// What the host draws for the current tick.
#[derive(Debug, Clone, Serialize)]
pub struct FrameView {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// Local time, `h:mm AM`, left-padded to 8 characters
    pub time_label: String,
    /// Vertical offset of the scroll region (`-index * frame_height`)
    pub scroll_offset: i64,
    #[serde(skip)]
    pub png: Bytes,
}

pub struct PlaybackScheduler {
    state: PlaybackState,
    timetable: Timetable,
    tick: u64,
    frames: Arc<Vec<RadarFrame>>,
    base_delay: Duration,
    frame_height: i64,
    listener: Option<StatusListener>,
}

impl PlaybackScheduler {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: PlaybackState {
                current_screen_index: 0,
                total_frames: 0,
                status: RadarStatus::Loading,
            },
            timetable: Timetable::new(config.timing.clone()),
            tick: 0,
            frames: Arc::new(Vec::new()),
            base_delay: Duration::from_millis(config.base_delay_ms),
            frame_height: config.frame_height_px,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: StatusListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn shared(self) -> SharedPlayback {
        Arc::new(RwLock::new(self))
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn status(&self) -> RadarStatus {
        self.state.status
    }

    pub fn timetable(&self) -> &Timetable {
        &self.timetable
    }

    pub fn frames(&self) -> Arc<Vec<RadarFrame>> {
        Arc::clone(&self.frames)
    }

    /// Delay between host ticks.
    pub fn tick_delay(&self) -> Duration {
        self.base_delay
    }

    /// Start a new acquisition cycle: back to `Loading`, playback rewound.
    pub fn begin_cycle(&mut self) {
        self.tick = 0;
        self.state.current_screen_index = 0;
        if self.state.status != RadarStatus::Loading {
            self.state.status = RadarStatus::Loading;
            self.notify(RadarStatus::Loading);
        }
    }

    /// Move out of `Loading`. Only the first terminal status of a cycle
    /// sticks; returns whether `status` was applied.
    pub fn set_status(&mut self, status: RadarStatus) -> bool {
        if self.state.status.is_terminal() || status == RadarStatus::Loading {
            return false;
        }

        self.state.status = status;
        self.notify(status);
        true
    }

    fn notify(&self, status: RadarStatus) {
        debug!(status = %status, "Radar status changed");
        if let Some(listener) = &self.listener {
            listener(status);
        }
    }

    /// Replace the frame set. Frames must already be in timestamp order.
    pub fn publish(&mut self, frames: Vec<RadarFrame>) {
        self.state.total_frames = frames.len();
        self.frames = Arc::new(frames);
        self.tick = 0;
        self.state.current_screen_index = self.frame_for_tick(0).unwrap_or(0);
    }

    /// Drop the frame set.
    pub fn clear(&mut self) {
        self.publish(Vec::new());
    }

    fn frame_for_tick(&self, tick: u64) -> Option<usize> {
        let last = self.state.total_frames.checked_sub(1)?;
        self.timetable.frame_at(tick).map(|frame| frame.min(last))
    }

    /// Advance one tick. Returns the new screen index, or `None` when
    /// playback is not enabled.
    pub fn advance(&mut self) -> Option<usize> {
        if !self.state.status.allows_playback() {
            return None;
        }

        let index = self.frame_for_tick(self.tick + 1)?;
        self.tick += 1;
        self.state.current_screen_index = index;
        Some(index)
    }

    /// The frame to draw for the current tick.
    pub fn render(&self) -> Option<FrameView> {
        if !self.state.status.allows_playback() {
            return None;
        }

        let index = self.state.current_screen_index;
        let frame = self.frames.get(index)?;
        Some(FrameView {
            index,
            timestamp: frame.timestamp,
            time_label: frame.time_label(),
            scroll_offset: -(index as i64) * self.frame_height,
            png: frame.png.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(u32, usize)]) -> Timetable {
        Timetable::new(entries.iter().map(|&(r, f)| TimingEntry::new(r, f)).collect())
    }

    #[test]
    fn test_frame_at_cycles() {
        let timetable = table(&[(4, 5), (1, 0), (1, 1)]);
        let frames: Vec<_> = (0..12).filter_map(|t| timetable.frame_at(t)).collect();

        assert_eq!(timetable.period(), 6);
        assert_eq!(frames, vec![5, 5, 5, 5, 0, 1, 5, 5, 5, 5, 0, 1]);
    }

    #[test]
    fn test_zero_repeat_entries_are_skipped() {
        let timetable = table(&[(0, 3), (2, 1)]);
        assert_eq!(timetable.frame_at(0), Some(1));
        assert_eq!(timetable.frame_at(1), Some(1));
    }

    #[test]
    fn test_empty_timetable() {
        assert_eq!(table(&[]).frame_at(0), None);
    }

    #[test]
    fn test_status_is_one_way_per_cycle() {
        let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
        assert!(scheduler.set_status(RadarStatus::Failed));
        assert!(!scheduler.set_status(RadarStatus::Loaded));
        assert_eq!(scheduler.status(), RadarStatus::Failed);

        scheduler.begin_cycle();
        assert_eq!(scheduler.status(), RadarStatus::Loading);
        assert!(scheduler.set_status(RadarStatus::Loaded));
    }

    #[test]
    fn test_advance_requires_loaded() {
        let mut scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
        assert_eq!(scheduler.advance(), None);
        assert!(scheduler.render().is_none());
    }

    #[test]
    fn test_tick_delay() {
        let scheduler = PlaybackScheduler::new(&PlaybackConfig::default());
        assert_eq!(scheduler.tick_delay(), Duration::from_millis(350));
    }
}
