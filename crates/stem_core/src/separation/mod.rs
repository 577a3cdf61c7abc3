//! Audio separation via an external command-line tool.
//!
//! The tool (demucs by default) does all of the audio work. This module
//! only builds its command line, streams its merged stdout/stderr, and
//! turns `NN%` tokens in that output into progress events.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use stem_core::config::ToolSettings;
//! use stem_core::separation::{RunEvent, SeparationRunner};
//!
//! let runner = SeparationRunner::new(ToolSettings::default(), 20);
//! runner.run(Path::new("song.mp3"), Path::new("stems"), |event| match event {
//!     RunEvent::Progress(pct) => println!("{}%", pct),
//!     RunEvent::Completed(result) => println!("done: {:?}", result.is_ok()),
//!     _ => {}
//! });
//! ```

mod command;
mod errors;
mod progress;
mod runner;

pub use command::{stems_dir, SeparationCommand, SEPARATED_SUBDIR};
pub use errors::{RunFailure, SeparationError, SeparationFailure, SeparationResult};
pub use progress::{decode_ignoring_invalid, parse_progress, LineSplitter};
pub use runner::{
    OutputTail, ProcessLauncher, RunEvent, RunSummary, SeparationRunner, SystemLauncher,
    ToolProcess,
};

/// Audio file extensions offered by the input file picker.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a"];
