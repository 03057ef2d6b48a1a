//! Local media tooling for Reelgen.
//!
//! Everything here shells out to external executables: ffprobe for
//! durations, ffmpeg for silence synthesis, the beat analyzer for music
//! timestamps, and the stitcher that assembles the final video from a
//! JSON manifest.

pub mod beats;
pub mod error;
pub mod probe;
pub mod silence;
pub mod stitch;
pub mod toolkit;

pub use beats::{snap_forward, BeatAnalyzer};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use silence::synthesize_silence;
pub use stitch::{StitchManifestEntry, StitchRequest, Stitcher};
pub use toolkit::{ExternalToolkit, MediaToolkit};
