// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![cfg_attr(not(test), warn(clippy::unwrap_used))] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release

//! # hertz
//!
//! A sine tone generator with two playback modes.
//!
//! - **Blocking**: the whole tone is rendered up front and written to the
//!   output device in one synchronous call.
//! - **Non-blocking**: the device pulls audio through a callback for as long as
//!   the stream lives, while the calling thread reads frequencies from standard
//!   input and retunes the tone without a phase discontinuity.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use hertz::{CpalBackend, ToneConfig, ToneGenerator, generate};
//!
//! # fn main() -> hertz::ToneResult<()> {
//! let config = ToneConfig::default().with_frequency(440.0);
//! let mut stream = generate(None, config, CpalBackend::new(), None);
//! stream.play()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `playback` (default): real audio output through [cpal](https://docs.rs/cpal).
//!   Without it only the in-memory [`MemoryBackend`] is available.
//!
//! ## Error handling
//!
//! Every fallible operation returns [`ToneResult`]. Malformed command input is
//! never an error for the stream itself: it is logged and ignored.

pub mod command;
pub mod config;
pub mod error;
pub mod oscillator;
pub mod playback;
pub mod stream;

pub use crate::command::{
    Command, CommandChannel, FrequencyCommand, parse_command, parse_frequency,
};
pub use crate::config::{DEFAULT_FRAMES_PER_BUFFER, MAX_RENDERED_SAMPLES, ToneConfig};
pub use crate::error::{ToneError, ToneResult};
pub use crate::oscillator::{
    Oscillator, PhaseAccumulation, SharedFrequency, frame_count, phase_increment, render_block,
    render_into, render_whole,
};
pub use crate::playback::{
    AudioBackend, BlockingStream, CallbackFlow, Interrupt, MemoryBackend, MemoryStream,
    OutputStream, RenderCallback, StreamFormat,
};
#[cfg(feature = "playback")]
pub use crate::playback::{CpalBackend, CpalBlockingStream, CpalCallbackStream};
pub use crate::stream::{
    BlockingTone, Mode, NonBlockingTone, Session, ToneGenerator, ToneStream, generate,
    non_blocking::{LineOutcome, apply_line},
};
