//! Core traits for the audio output collaborator.

use crate::error::ToneResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Format of an output stream. Samples are always interleaved 32-bit floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Sampling rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Fixed callback size in frames, `None` lets the device choose
    pub frames_per_buffer: Option<u32>,
}

impl StreamFormat {
    /// Create a new format with a device-chosen buffer size
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            frames_per_buffer: None,
        }
    }

    /// Set a fixed callback buffer size
    pub const fn with_frames_per_buffer(mut self, frames: u32) -> Self {
        self.frames_per_buffer = Some(frames);
        self
    }

    /// Samples in one callback buffer, if the size is fixed
    pub fn samples_per_buffer(&self) -> Option<usize> {
        self.frames_per_buffer
            .map(|frames| frames as usize * self.channels as usize)
    }
}

/// A flag raised from outside a stream, typically a Ctrl-C handler, to end
/// playback.
///
/// Streams opened by a backend carrying a raised interrupt report themselves
/// inactive, so the controllers wind down and close them normally. Clones share
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Create a lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Cannot be lowered again.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the flag has been raised.
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What a render callback wants the stream to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFlow {
    /// Keep calling back
    Continue,
    /// The buffer just returned is the last one; the stream becomes inactive
    Complete,
}

/// Render callback run on the device's audio thread.
///
/// Receives the interleaved output buffer the device wants filled. Its length is
/// `frames × channels`, where `frames` is usually the configured
/// `frames_per_buffer` but may differ at stream edges.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) -> CallbackFlow + Send + 'static>;

/// An open output stream.
pub trait OutputStream {
    /// Whether the device is still pulling audio
    fn is_active(&self) -> bool;

    /// Halt playback. No callback runs after this returns.
    fn stop(&mut self) -> ToneResult<()>;

    /// Release the stream and its device handle. Safe to call more than once.
    fn close(&mut self) -> ToneResult<()>;
}

/// An output stream accepting synchronous writes.
pub trait BlockingStream: OutputStream {
    /// Play `samples` and return once the device has consumed all of them.
    fn write(&mut self, samples: &[f32]) -> ToneResult<()>;
}

/// Something that can open output streams on a device.
pub trait AudioBackend {
    /// Stream type for synchronous writes
    type Blocking: BlockingStream;

    /// Stream type driven by a render callback
    type Callback: OutputStream;

    /// Open an output stream that is fed with [`BlockingStream::write`].
    fn open_blocking(&self, format: &StreamFormat) -> ToneResult<Self::Blocking>;

    /// Open an output stream and start calling `callback` for audio.
    fn open_callback(
        &self,
        format: &StreamFormat,
        callback: RenderCallback,
    ) -> ToneResult<Self::Callback>;
}
