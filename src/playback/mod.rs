//! Audio output infrastructure.
//!
//! The tone controllers never talk to a sound API directly. They open streams
//! through an [`AudioBackend`], which hands back either a stream accepting
//! synchronous writes or a stream that repeatedly calls a render callback.
//!
//! - [`CpalBackend`] plays through the default output device via cpal
//!   (feature `playback`, enabled by default).
//! - [`MemoryBackend`] records what would have been played and lets the caller
//!   drive callbacks by hand.

pub mod memory;
pub mod traits;

#[cfg(feature = "playback")]
pub mod devices;

pub use memory::{MemoryBackend, MemoryStream};
pub use traits::{
    AudioBackend, BlockingStream, CallbackFlow, Interrupt, OutputStream, RenderCallback,
    StreamFormat,
};

#[cfg(feature = "playback")]
pub use devices::{CpalBackend, CpalBlockingStream, CpalCallbackStream};
