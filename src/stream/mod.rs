//! Tone stream controllers and the factory that picks one.
//!
//! Every controller follows the same lifecycle: [`ToneGenerator::enter`] opens
//! the device stream, [`ToneGenerator::sound`] plays, and
//! [`ToneGenerator::exit`] stops and closes the stream. [`ToneGenerator::open`]
//! returns a [`Session`] guard that runs `exit` however the session ends.
//!
//! ```rust
//! use hertz::{MemoryBackend, ToneConfig, ToneGenerator, generate};
//! use std::time::Duration;
//!
//! let backend = MemoryBackend::new();
//! let config = ToneConfig::default()
//!     .with_sample_rate(8000)
//!     .with_duration(Duration::from_millis(250));
//!
//! let mut stream = generate(Some("b"), config, backend.clone(), None);
//! stream.play().unwrap();
//!
//! assert_eq!(backend.written().len(), 2000);
//! assert_eq!(backend.close_calls(), 1);
//! ```

pub mod blocking;
pub mod non_blocking;

#[cfg(test)]
mod tests;

pub use blocking::BlockingTone;
pub use non_blocking::NonBlockingTone;

use crate::command::CommandChannel;
use crate::config::ToneConfig;
use crate::error::ToneResult;
use crate::playback::AudioBackend;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Shared lifecycle of the tone controllers.
pub trait ToneGenerator {
    /// Open the output stream.
    fn enter(&mut self) -> ToneResult<()>;

    /// Play through the open stream.
    fn sound(&mut self) -> ToneResult<()>;

    /// Stop and close the stream. Does nothing if it is not open.
    fn exit(&mut self) -> ToneResult<()>;

    /// Whether a stream is currently open.
    fn is_open(&self) -> bool;

    /// Open the stream and return a guard that closes it when dropped.
    fn open(&mut self) -> ToneResult<Session<'_, Self>>
    where
        Self: Sized,
    {
        self.enter()?;
        Ok(Session {
            generator: self,
            closed: false,
        })
    }

    /// Open, sound and close.
    ///
    /// An error from `sound` takes precedence over one from closing.
    fn play(&mut self) -> ToneResult<()>
    where
        Self: Sized,
    {
        let mut session = self.open()?;
        let sounded = session.sound();
        let closed = session.close();
        sounded.and(closed)
    }
}

/// An open stream. Dropping it runs [`ToneGenerator::exit`].
pub struct Session<'a, G: ToneGenerator> {
    generator: &'a mut G,
    closed: bool,
}

impl<G: ToneGenerator> Session<'_, G> {
    /// Close the stream now and report any failure.
    pub fn close(mut self) -> ToneResult<()> {
        self.closed = true;
        self.generator.exit()
    }
}

impl<G: ToneGenerator> Deref for Session<'_, G> {
    type Target = G;

    fn deref(&self) -> &G {
        self.generator
    }
}

impl<G: ToneGenerator> DerefMut for Session<'_, G> {
    fn deref_mut(&mut self) -> &mut G {
        self.generator
    }
}

impl<G: ToneGenerator> Drop for Session<'_, G> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.generator.exit() {
            tracing::error!("failed to close stream: {err}");
        }
    }
}

/// Which controller to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Render everything up front and write it synchronously
    Blocking,
    /// Render on demand from the device callback, retunable while playing
    NonBlocking,
}

impl Mode {
    /// `"b"` selects [`Mode::Blocking`]; anything else, or nothing, selects
    /// [`Mode::NonBlocking`].
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            Some("b") => Self::Blocking,
            _ => Self::NonBlocking,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking => f.write_str("Blocking"),
            Self::NonBlocking => f.write_str("NonBlocking"),
        }
    }
}

/// Either tone controller.
pub enum ToneStream<B: AudioBackend> {
    /// One-shot synchronous write
    Blocking(BlockingTone<B>),
    /// Callback-driven live stream
    NonBlocking(NonBlockingTone<B>),
}

impl<B: AudioBackend> ToneStream<B> {
    /// The mode this stream was built for.
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Blocking(_) => Mode::Blocking,
            Self::NonBlocking(_) => Mode::NonBlocking,
        }
    }
}

impl<B: AudioBackend> ToneGenerator for ToneStream<B> {
    fn enter(&mut self) -> ToneResult<()> {
        match self {
            Self::Blocking(tone) => tone.enter(),
            Self::NonBlocking(tone) => tone.enter(),
        }
    }

    fn sound(&mut self) -> ToneResult<()> {
        match self {
            Self::Blocking(tone) => tone.sound(),
            Self::NonBlocking(tone) => tone.sound(),
        }
    }

    fn exit(&mut self) -> ToneResult<()> {
        match self {
            Self::Blocking(tone) => tone.exit(),
            Self::NonBlocking(tone) => tone.exit(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Self::Blocking(tone) => tone.is_open(),
            Self::NonBlocking(tone) => tone.is_open(),
        }
    }
}

/// Build the controller named by `selector`.
///
/// The non-blocking controller takes its commands from `commands`, or from
/// standard input when `None`. The blocking controller reads no input.
pub fn generate<B: AudioBackend>(
    selector: Option<&str>,
    config: ToneConfig,
    backend: B,
    commands: Option<CommandChannel>,
) -> ToneStream<B> {
    match Mode::from_selector(selector) {
        Mode::Blocking => ToneStream::Blocking(BlockingTone::new(config, backend)),
        Mode::NonBlocking => {
            let commands = commands.unwrap_or_else(CommandChannel::stdin);
            ToneStream::NonBlocking(NonBlockingTone::new(config, backend, commands))
        }
    }
}
