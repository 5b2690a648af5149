//! Animated weather radar loop.
//!
//! Acquires recent reflectivity mosaics from a remote archive, composites
//! them onto a regional basemap and plays them back on a variable-cadence
//! timetable:
//! - `listing`: candidate discovery from daily directory indexes
//! - `fetch`: concurrent retrieval and decoding
//! - `basemap`: process-lifetime basemap cache
//! - `engine`: the acquisition cycle with single-flight protection
//! - `playback`: tick-to-frame scheduling
//! - `server`: HTTP surface for display hosts

pub mod archive;
pub mod basemap;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod frame;
pub mod listing;
pub mod playback;
pub mod server;

pub use archive::{ArchiveClient, FetchError, FetchedImage, HttpArchive};
pub use config::{RadarConfig, TimingEntry};
pub use engine::{CycleReport, RadarEngine};
pub use frame::RadarFrame;
pub use listing::CandidateImage;
pub use playback::{FrameView, PlaybackScheduler, PlaybackState, SharedPlayback, Timetable};
