//! Blocking tone: render the whole tone, write it in one call.

use super::ToneGenerator;
use crate::config::ToneConfig;
use crate::error::{ToneError, ToneResult};
use crate::oscillator::render_whole;
use crate::playback::{AudioBackend, BlockingStream, OutputStream, StreamFormat};

/// Plays `config.duration` of tone through a synchronous write.
pub struct BlockingTone<B: AudioBackend> {
    config: ToneConfig,
    backend: B,
    stream: Option<B::Blocking>,
}

impl<B: AudioBackend> BlockingTone<B> {
    /// Create a controller. No device is touched until [`ToneGenerator::enter`].
    pub fn new(config: ToneConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            stream: None,
        }
    }

    /// The configuration this controller plays.
    pub const fn config(&self) -> &ToneConfig {
        &self.config
    }
}

impl<B: AudioBackend> ToneGenerator for BlockingTone<B> {
    fn enter(&mut self) -> ToneResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        self.config.validate_blocking()?;

        let format = StreamFormat::new(self.config.sample_rate, self.config.channels);
        self.stream = Some(self.backend.open_blocking(&format)?);
        Ok(())
    }

    fn sound(&mut self) -> ToneResult<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| ToneError::stream("sound called before enter"))?;

        let samples = render_whole(
            self.config.duration,
            self.config.sample_rate,
            self.config.channels as usize,
            self.config.frequency,
            self.config.phase_accumulation,
        );
        tracing::debug!(
            samples = samples.len(),
            frequency = self.config.frequency,
            "writing rendered tone"
        );
        stream.write(&samples)
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

impl<B: AudioBackend> Drop for BlockingTone<B> {
    fn drop(&mut self) {
        if let Err(err) = self.exit() {
            tracing::error!("failed to release blocking stream: {err}");
        }
    }
}
