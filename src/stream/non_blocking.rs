//! Non-blocking tone: the device pulls audio through a callback while the
//! calling thread retunes the oscillator from command input.
//!
//! The callback owns the [`Oscillator`] outright, so its phase is never shared.
//! The only state crossing threads is the [`SharedFrequency`].
//!
//! [`ToneGenerator::sound`] busy-polls: it never sleeps or blocks, re-checking
//! stream liveness and pending input as fast as it can. That keeps one core
//! awake for the life of the stream, and in exchange the loop notices a stopped
//! stream or a new frequency straight away.

use super::ToneGenerator;
use crate::command::{Command, CommandChannel, parse_command};
use crate::config::ToneConfig;
use crate::error::{ToneError, ToneResult};
use crate::oscillator::{Oscillator, SharedFrequency};
use crate::playback::{AudioBackend, CallbackFlow, OutputStream, StreamFormat};
use std::thread;

/// Plays an endless tone whose frequency follows command input.
pub struct NonBlockingTone<B: AudioBackend> {
    config: ToneConfig,
    backend: B,
    commands: CommandChannel,
    frequency: SharedFrequency,
    stream: Option<B::Callback>,
}

/// What a single line of input did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOutcome {
    /// The frequency was changed to this value
    Retuned(f64),
    /// The line asked the stream to stop
    Stop,
    /// The line was discarded; the frequency is unchanged
    Rejected,
}

impl<B: AudioBackend> NonBlockingTone<B> {
    /// Create a controller. No device is touched until [`ToneGenerator::enter`].
    pub fn new(config: ToneConfig, backend: B, commands: CommandChannel) -> Self {
        let frequency = SharedFrequency::new(config.frequency);
        Self {
            config,
            backend,
            commands,
            frequency,
            stream: None,
        }
    }

    /// The frequency the callback will render next, in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency.get()
    }

    /// A handle for changing the frequency from elsewhere.
    pub fn frequency_handle(&self) -> SharedFrequency {
        self.frequency.clone()
    }

    /// The configuration this controller was built with.
    pub const fn config(&self) -> &ToneConfig {
        &self.config
    }
}

/// Apply one line of command input to `frequency`.
///
/// Malformed and non-positive frequencies are logged and dropped.
pub fn apply_line(frequency: &SharedFrequency, line: &str) -> LineOutcome {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!("ignoring command: {err}");
            return LineOutcome::Rejected;
        }
    };

    match command {
        Command::Stop => LineOutcome::Stop,
        Command::SetFrequency(cmd) if cmd.hz > 0.0 => {
            frequency.set(cmd.hz);
            tracing::debug!(hz = cmd.hz, "frequency updated");
            println!("Set new frequency to: {} hz", line.trim_end_matches(['\r', '\n']));
            LineOutcome::Retuned(cmd.hz)
        }
        Command::SetFrequency(cmd) => {
            let err = ToneError::invalid_frequency(cmd.hz);
            tracing::warn!(
                current = frequency.get(),
                "ignoring command: {err}, keeping current frequency"
            );
            LineOutcome::Rejected
        }
    }
}

impl<B: AudioBackend> ToneGenerator for NonBlockingTone<B> {
    fn enter(&mut self) -> ToneResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        self.config.validate()?;

        let format = StreamFormat::new(self.config.sample_rate, self.config.channels)
            .with_frames_per_buffer(self.config.frames_per_buffer);

        let mut oscillator = Oscillator::new(
            self.config.sample_rate,
            self.config.channels as usize,
            self.frequency.clone(),
            self.config.phase_accumulation,
        );
        let callback = Box::new(move |out: &mut [f32]| {
            oscillator.fill(out);
            CallbackFlow::Continue
        });

        self.stream = Some(self.backend.open_callback(&format, callback)?);
        tracing::debug!(
            frames_per_buffer = self.config.frames_per_buffer,
            frequency = self.frequency.get(),
            "non-blocking stream running"
        );
        Ok(())
    }

    fn sound(&mut self) -> ToneResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ToneError::stream("sound called before enter"))?;

        while stream.is_active() {
            for line in self.commands.poll_available() {
                if apply_line(&self.frequency, &line) == LineOutcome::Stop {
                    tracing::debug!("stop requested");
                    stream.stop()?;
                    break;
                }
            }
            thread::yield_now();
        }
        Ok(())
    }

    fn exit(&mut self) -> ToneResult<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        let stopped = stream.stop();
        let closed = stream.close();
        stopped.and(closed)
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

impl<B: AudioBackend> Drop for NonBlockingTone<B> {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            tracing::error!("failed to release callback stream: {err}");
        }
    }
}
