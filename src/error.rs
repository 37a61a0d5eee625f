//! Error types and result utilities for tone generation.

use thiserror::Error;

/// Convenience type alias for results that may contain a [`ToneError`].
pub type ToneResult<T> = Result<T, ToneError>;

/// Error types that can occur while opening, driving or steering a tone stream.
#[derive(Error, Debug)]
pub enum ToneError {
    /// The output device could not be opened.
    ///
    /// Covers a missing output device, a busy device, a rate or channel count the
    /// device rejects, and configurations that can never describe a valid stream.
    /// Always fatal.
    #[error("Failed to open output device: {reason}")]
    DeviceOpen {
        /// Human readable cause
        reason: String,
    },

    /// A line of command input did not denote a number.
    #[error("Could not parse '{input}' as a frequency: {reason}")]
    Parse {
        /// The offending input, trimmed
        input: String,
        /// Why parsing failed
        reason: String,
    },

    /// A frequency parsed fine but is not usable (zero or negative).
    #[error("Invalid frequency: {hz} Hz, frequency must be positive")]
    InvalidFrequency {
        /// The rejected value
        hz: f64,
    },

    /// Writing to, stopping or closing an open stream failed.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Playback was ended early by an [`Interrupt`](crate::playback::Interrupt).
    #[error("Playback interrupted")]
    Interrupted,

    /// Backend-specific errors (CPAL, etc.)
    #[error("Backend error: {backend} - {details}")]
    Backend {
        /// Backend name
        backend: &'static str,
        /// Backend supplied details
        details: String,
    },
}

impl ToneError {
    /// Create a device open error
    pub fn device_open(reason: impl Into<String>) -> Self {
        Self::DeviceOpen {
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid frequency error
    pub const fn invalid_frequency(hz: f64) -> Self {
        Self::InvalidFrequency { hz }
    }

    /// Create a stream error
    pub fn stream(details: impl Into<String>) -> Self {
        Self::Stream(details.into())
    }

    /// Create a backend error
    pub fn backend(backend: &'static str, details: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            details: details.into(),
        }
    }

    /// Check if this is an input error the supervisory loop shrugs off
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::InvalidFrequency { .. })
    }

    /// Check if playback was cut short on request rather than by a failure
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }

    /// Check if this error means the device never opened
    pub const fn is_device_open_error(&self) -> bool {
        matches!(self, Self::DeviceOpen { .. })
    }
}

#[cfg(feature = "playback")]
impl From<cpal::BuildStreamError> for ToneError {
    fn from(err: cpal::BuildStreamError) -> Self {
        Self::device_open(format!("failed to build stream: {err}"))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PlayStreamError> for ToneError {
    fn from(err: cpal::PlayStreamError) -> Self {
        Self::backend("cpal", format!("failed to play stream: {err}"))
    }
}

#[cfg(feature = "playback")]
impl From<cpal::PauseStreamError> for ToneError {
    fn from(err: cpal::PauseStreamError) -> Self {
        Self::backend("cpal", format!("failed to pause stream: {err}"))
    }
}
