//! Configuration shared by both stream controllers.

use crate::error::{ToneError, ToneResult};
use crate::oscillator::{PhaseAccumulation, frame_count};
use std::time::Duration;

/// Default frames per callback buffer in non-blocking mode.
pub const DEFAULT_FRAMES_PER_BUFFER: u32 = 2048;

/// Largest tone the blocking variant renders, in interleaved samples (1 GiB of `f32`).
pub const MAX_RENDERED_SAMPLES: usize = 1 << 28;

/// Configuration for a tone stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneConfig {
    /// How long the blocking variant plays. Ignored by the non-blocking variant.
    pub duration: Duration,

    /// Sampling rate in Hz
    pub sample_rate: u32,

    /// Number of interleaved output channels, each carrying the same signal
    pub channels: u16,

    /// Initial sine frequency in Hz
    pub frequency: f64,

    /// Frames the device requests per callback in non-blocking mode
    pub frames_per_buffer: u32,

    /// Whether the oscillator phase is wrapped into `[0, 2π)`
    pub phase_accumulation: PhaseAccumulation,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            sample_rate: 44100,
            channels: 1,
            frequency: 40.0,
            frames_per_buffer: DEFAULT_FRAMES_PER_BUFFER,
            phase_accumulation: PhaseAccumulation::Wrapped,
        }
    }
}

impl ToneConfig {
    /// Set the blocking-mode duration
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the sampling rate
    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the channel count
    pub const fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    /// Set the initial frequency
    pub const fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the callback buffer size
    pub const fn with_frames_per_buffer(mut self, frames_per_buffer: u32) -> Self {
        self.frames_per_buffer = frames_per_buffer;
        self
    }

    /// Set the phase accumulation strategy
    pub const fn with_phase_accumulation(mut self, phase_accumulation: PhaseAccumulation) -> Self {
        self.phase_accumulation = phase_accumulation;
        self
    }

    /// Total number of frames the blocking variant renders.
    pub fn total_frames(&self) -> usize {
        frame_count(self.duration, self.sample_rate)
    }

    /// Total number of interleaved samples the blocking variant renders.
    pub fn total_samples(&self) -> usize {
        self.total_frames().saturating_mul(self.channels as usize)
    }

    /// Reject configurations no device could ever open.
    ///
    /// These surface as [`ToneError::DeviceOpen`] since they are discovered at
    /// the point a stream is opened.
    pub fn validate(&self) -> ToneResult<()> {
        if self.sample_rate == 0 {
            return Err(ToneError::device_open("sample rate must be > 0"));
        }
        if self.channels == 0 {
            return Err(ToneError::device_open("channel count must be > 0"));
        }
        if self.frames_per_buffer == 0 {
            return Err(ToneError::device_open("frames per buffer must be > 0"));
        }
        if !self.frequency.is_finite() || self.frequency <= 0.0 {
            return Err(ToneError::device_open(format!(
                "initial frequency must be a positive number, got {}",
                self.frequency
            )));
        }
        if self.duration.is_zero() {
            return Err(ToneError::device_open("duration must be > 0"));
        }
        Ok(())
    }

    /// [`validate`](Self::validate), and also reject tones too long to render
    /// up front.
    pub fn validate_blocking(&self) -> ToneResult<()> {
        self.validate()?;
        let samples = self.total_samples();
        if samples > MAX_RENDERED_SAMPLES {
            return Err(ToneError::device_open(format!(
                "{samples} samples exceeds the blocking limit of {MAX_RENDERED_SAMPLES}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ToneConfig::default();

        assert_eq!(config.duration, Duration::from_secs(5));
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 1);
        assert_eq!(config.frequency, 40.0);
        assert_eq!(config.frames_per_buffer, 2048);
        assert_eq!(config.phase_accumulation, PhaseAccumulation::Wrapped);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_total_frames_rounds() {
        let config = ToneConfig::default()
            .with_sample_rate(48000)
            .with_duration(Duration::from_secs(1));
        assert_eq!(config.total_frames(), 48000);

        let config = ToneConfig::default()
            .with_sample_rate(44100)
            .with_duration(Duration::from_secs_f64(0.5));
        assert_eq!(config.total_frames(), 22050);
    }

    #[test]
    fn test_validate_rejects_degenerate_configs() {
        let bad = [
            ToneConfig::default().with_sample_rate(0),
            ToneConfig::default().with_channels(0),
            ToneConfig::default().with_frames_per_buffer(0),
            ToneConfig::default().with_frequency(0.0),
            ToneConfig::default().with_frequency(-40.0),
            ToneConfig::default().with_frequency(f64::NAN),
            ToneConfig::default().with_duration(Duration::ZERO),
        ];

        for config in bad {
            let err = config.validate().unwrap_err();
            assert!(err.is_device_open_error(), "{config:?} gave {err}");
        }
    }

    #[test]
    fn test_validate_blocking_bounds_render_length() {
        let huge = ToneConfig::default().with_duration(Duration::from_secs(1_000_000_000));
        assert!(huge.validate().is_ok());
        assert!(huge.validate_blocking().unwrap_err().is_device_open_error());

        // the bound counts every channel
        let frames = MAX_RENDERED_SAMPLES / 2 + 1;
        let stereo = ToneConfig::default()
            .with_sample_rate(frames as u32)
            .with_duration(Duration::from_secs(1))
            .with_channels(2);
        assert!(stereo.validate_blocking().is_err());
        assert!(stereo.with_channels(1).validate_blocking().is_ok());
    }
}
