//! Phase-accumulating sine oscillator.
//!
//! All rendering goes through [`render_into`], which writes interleaved `f32`
//! frames and advances a caller-owned phase. The same phase value feeds every
//! channel of a frame, so multi-channel output is a duplicated mono signal.
//!
//! The phase is advanced one frame at a time regardless of how a render is
//! split into blocks, so rendering `a` frames then `b` frames produces exactly
//! the samples of a single `a + b` frame render.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How the phase accumulator is kept between samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhaseAccumulation {
    /// Reduce the phase into `[0, 2π)` after every increment.
    ///
    /// Keeps `sin` accurate over arbitrarily long sessions.
    #[default]
    Wrapped,
    /// Let the phase grow without bound.
    ///
    /// `sin` of very large arguments loses precision, audible after many hours.
    Unbounded,
}

impl PhaseAccumulation {
    #[inline(always)]
    fn advance(self, phase: f64, increment: f64) -> f64 {
        let next = phase + increment;
        match self {
            Self::Wrapped => next.rem_euclid(TAU),
            Self::Unbounded => next,
        }
    }
}

/// Phase advance in radians per frame.
#[inline]
pub fn phase_increment(frequency: f64, sample_rate: u32) -> f64 {
    TAU * frequency / sample_rate as f64
}

/// Render `out.len() / channels` frames into `out`, advancing `phase`.
///
/// `frequency` is held constant for the whole call. Any trailing samples that do
/// not make up a whole frame are left untouched.
///
/// # Panics
/// Panics if `channels` is zero.
pub fn render_into(
    out: &mut [f32],
    channels: usize,
    frequency: f64,
    sample_rate: u32,
    phase: &mut f64,
    accumulation: PhaseAccumulation,
) {
    let increment = phase_increment(frequency, sample_rate);
    for frame in out.chunks_exact_mut(channels) {
        let value = phase.sin() as f32;
        frame.fill(value);
        *phase = accumulation.advance(*phase, increment);
    }
}

/// Render `frame_count` frames into a fresh interleaved buffer, advancing `phase`.
///
/// # Panics
/// Panics if `channels` is zero.
pub fn render_block(
    frame_count: usize,
    channels: usize,
    frequency: f64,
    sample_rate: u32,
    phase: &mut f64,
    accumulation: PhaseAccumulation,
) -> Vec<f32> {
    let mut buffer = vec![0.0f32; frame_count * channels];
    render_into(
        &mut buffer,
        channels,
        frequency,
        sample_rate,
        phase,
        accumulation,
    );
    buffer
}

/// Number of frames in `duration` at `sample_rate`, rounded to the nearest frame.
///
/// Saturates at `usize::MAX` for durations no buffer could hold.
pub fn frame_count(duration: Duration, sample_rate: u32) -> usize {
    (sample_rate as f64 * duration.as_secs_f64()).round() as usize
}

/// Render a whole tone of `duration` starting from phase zero.
///
/// The frame count is [`frame_count`]`(duration, sample_rate)`.
///
/// # Panics
/// Panics if `channels` is zero.
pub fn render_whole(
    duration: Duration,
    sample_rate: u32,
    channels: usize,
    frequency: f64,
    accumulation: PhaseAccumulation,
) -> Vec<f32> {
    let mut phase = 0.0;
    render_block(
        frame_count(duration, sample_rate),
        channels,
        frequency,
        sample_rate,
        &mut phase,
        accumulation,
    )
}

/// A frequency value shared between the control thread and the audio callback.
///
/// Stored as the bit pattern of an `f64` in an [`AtomicU64`], so a reader never
/// sees a torn value and neither side takes a lock. Relaxed ordering is enough:
/// no other memory is published alongside the frequency.
#[derive(Debug, Clone)]
pub struct SharedFrequency(Arc<AtomicU64>);

impl SharedFrequency {
    /// Create a new shared frequency.
    pub fn new(hz: f64) -> Self {
        Self(Arc::new(AtomicU64::new(hz.to_bits())))
    }

    /// Current frequency in Hz.
    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Replace the frequency. Visible to the next block the callback renders.
    #[inline]
    pub fn set(&self, hz: f64) {
        self.0.store(hz.to_bits(), Ordering::Relaxed);
    }
}

/// Oscillator state owned by one stream.
#[derive(Debug)]
pub struct Oscillator {
    sample_rate: u32,
    channels: usize,
    frequency: SharedFrequency,
    phase: f64,
    accumulation: PhaseAccumulation,
}

impl Oscillator {
    /// Create an oscillator starting at phase zero.
    pub const fn new(
        sample_rate: u32,
        channels: usize,
        frequency: SharedFrequency,
        accumulation: PhaseAccumulation,
    ) -> Self {
        Self {
            sample_rate,
            channels,
            frequency,
            phase: 0.0,
            accumulation,
        }
    }

    /// Fill an interleaved output buffer with the next frames of the tone.
    ///
    /// The shared frequency is read once, so a concurrent update takes effect
    /// from the following call. Does not allocate.
    pub fn fill(&mut self, out: &mut [f32]) {
        let frequency = self.frequency.get();
        render_into(
            out,
            self.channels,
            frequency,
            self.sample_rate,
            &mut self.phase,
            self.accumulation,
        );
    }

    /// Current phase in radians.
    pub const fn phase(&self) -> f64 {
        self.phase
    }

    /// Handle to the frequency this oscillator reads.
    pub const fn frequency(&self) -> &SharedFrequency {
        &self.frequency
    }

    /// Number of interleaved channels.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Sampling rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
