//! Output streams on the system's default device using CPAL.

use super::traits::{
    AudioBackend, BlockingStream, CallbackFlow, Interrupt, OutputStream, RenderCallback,
    StreamFormat,
};
use crate::error::{ToneError, ToneResult};
use parking_lot::{Condvar, Mutex};
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;

use cpal::{
    BufferSize, Device, SampleRate, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};

/// How often a blocked writer re-checks stream liveness.
const WRITE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Opens streams on the default output device of the default host.
#[derive(Debug, Default, Clone)]
pub struct CpalBackend {
    interrupt: Interrupt,
}

impl CpalBackend {
    /// Create a backend for the default host.
    pub fn new() -> Self {
        Self::default()
    }

    /// End playback on every stream this backend opens once `interrupt` is
    /// raised.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn output_device(&self) -> ToneResult<Device> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| ToneError::device_open("no output device available"))?;

        match device.name() {
            Ok(name) => {
                tracing::debug!(host = ?host.id(), device = %name, "selected output device")
            }
            Err(err) => tracing::debug!("output device has no name: {err}"),
        }
        Ok(device)
    }

    fn stream_config(format: &StreamFormat) -> StreamConfig {
        StreamConfig {
            channels: format.channels as cpal::ChannelCount,
            sample_rate: SampleRate(format.sample_rate),
            buffer_size: format
                .frames_per_buffer
                .map_or(BufferSize::Default, BufferSize::Fixed),
        }
    }
}

/// Marks the stream dead when the device goes away; anything else is logged.
fn error_callback(active: Arc<AtomicBool>) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        tracing::error!("audio stream error: {err}");
        if matches!(err, cpal::StreamError::DeviceNotAvailable) {
            active.store(false, Ordering::Relaxed);
        }
    }
}

impl AudioBackend for CpalBackend {
    type Blocking = CpalBlockingStream;
    type Callback = CpalCallbackStream;

    fn open_blocking(&self, format: &StreamFormat) -> ToneResult<Self::Blocking> {
        let device = self.output_device()?;
        let config = Self::stream_config(format);

        let shared = Arc::new(PendingWrite::default());
        let active = Arc::new(AtomicBool::new(true));

        let callback_shared = Arc::clone(&shared);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                callback_shared.drain_into(data);
            },
            error_callback(Arc::clone(&active)),
            None,
        )?;

        tracing::debug!(?format, "opened blocking output stream");
        Ok(CpalBlockingStream {
            stream: Some(stream),
            shared,
            active,
            interrupt: self.interrupt.clone(),
            sample_rate: format.sample_rate,
            channels: format.channels as usize,
        })
    }

    fn open_callback(
        &self,
        format: &StreamFormat,
        mut callback: RenderCallback,
    ) -> ToneResult<Self::Callback> {
        let device = self.output_device()?;
        let config = Self::stream_config(format);

        let active = Arc::new(AtomicBool::new(true));
        let callback_active = Arc::clone(&active);
        let callback_interrupt = self.interrupt.clone();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if !callback_active.load(Ordering::Relaxed) || callback_interrupt.is_raised() {
                    data.fill(0.0);
                    return;
                }
                if callback(data) == CallbackFlow::Complete {
                    callback_active.store(false, Ordering::Relaxed);
                }
            },
            error_callback(Arc::clone(&active)),
            None,
        )?;

        stream
            .play()
            .map_err(|err| ToneError::device_open(format!("failed to start stream: {err}")))?;

        tracing::debug!(?format, "opened callback output stream");
        Ok(CpalCallbackStream {
            stream: Some(stream),
            active,
            interrupt: self.interrupt.clone(),
        })
    }
}

/// Samples handed from a blocked writer to the audio thread.
#[derive(Default)]
struct PendingWrite {
    state: Mutex<PendingState>,
    drained: Condvar,
    // frames the device asked for in its most recent callback
    last_callback_frames: AtomicUsize,
}

#[derive(Default)]
struct PendingState {
    samples: Vec<f32>,
    cursor: usize,
}

impl PendingWrite {
    /// Queue `samples` for the audio thread, replacing anything left over.
    fn load(&self, samples: &[f32]) {
        let mut state = self.state.lock();
        state.samples.clear();
        state.samples.extend_from_slice(samples);
        state.cursor = 0;
    }

    /// Audio-thread side: copy the next queued samples into `data`, padding with
    /// silence once the queue runs dry.
    fn drain_into(&self, data: &mut [f32]) {
        self.last_callback_frames
            .store(data.len(), Ordering::Relaxed);

        let mut state = self.state.lock();
        let remaining = state.samples.len() - state.cursor;
        let n = remaining.min(data.len());
        let start = state.cursor;
        data[..n].copy_from_slice(&state.samples[start..start + n]);
        data[n..].fill(0.0);
        state.cursor += n;

        if n > 0 && state.cursor == state.samples.len() {
            self.drained.notify_all();
        }
    }

    /// Block until every queued sample has been handed to the device.
    ///
    /// Gives up early when `active` drops or `interrupt` is raised.
    fn wait_drained(&self, active: &AtomicBool, interrupt: &Interrupt) -> ToneResult<()> {
        let mut state = self.state.lock();
        while state.cursor < state.samples.len() {
            if interrupt.is_raised() {
                return Err(ToneError::Interrupted);
            }
            if !active.load(Ordering::Relaxed) {
                return Err(ToneError::stream(format!(
                    "device stopped after {} of {} samples",
                    state.cursor,
                    state.samples.len()
                )));
            }
            self.drained.wait_for(&mut state, WRITE_POLL_INTERVAL);
        }
        Ok(())
    }
}

/// A CPAL stream fed by synchronous writes.
pub struct CpalBlockingStream {
    stream: Option<Stream>,
    shared: Arc<PendingWrite>,
    active: Arc<AtomicBool>,
    interrupt: Interrupt,
    sample_rate: u32,
    channels: usize,
}

impl OutputStream for CpalBlockingStream {
    fn is_active(&self) -> bool {
        self.stream.is_some() && self.active.load(Ordering::Relaxed) && !self.interrupt.is_raised()
    }

    fn stop(&mut self) -> ToneResult<()> {
        self.active.store(false, Ordering::Relaxed);
        if let Some(stream) = &self.stream {
            stream.pause()?;
        }
        Ok(())
    }

    fn close(&mut self) -> ToneResult<()> {
        self.active.store(false, Ordering::Relaxed);
        if self.stream.take().is_some() {
            tracing::debug!("closed blocking output stream");
        }
        Ok(())
    }
}

impl BlockingStream for CpalBlockingStream {
    fn write(&mut self, samples: &[f32]) -> ToneResult<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| ToneError::stream("write on a closed stream"))?;

        self.shared.load(samples);
        stream.play()?;
        self.shared.wait_drained(&self.active, &self.interrupt)?;

        // the final callback's buffer is still queued in the device
        let tail_frames = self.shared.last_callback_frames.load(Ordering::Relaxed)
            / self.channels.max(1);
        std::thread::sleep(Duration::from_secs_f64(
            tail_frames as f64 / self.sample_rate as f64,
        ));
        Ok(())
    }
}

/// A CPAL stream that pulls audio from a render callback.
pub struct CpalCallbackStream {
    stream: Option<Stream>,
    active: Arc<AtomicBool>,
    interrupt: Interrupt,
}

impl OutputStream for CpalCallbackStream {
    fn is_active(&self) -> bool {
        self.stream.is_some() && self.active.load(Ordering::Relaxed) && !self.interrupt.is_raised()
    }

    fn stop(&mut self) -> ToneResult<()> {
        self.active.store(false, Ordering::Relaxed);
        if let Some(stream) = &self.stream {
            stream.pause()?;
        }
        Ok(())
    }

    fn close(&mut self) -> ToneResult<()> {
        self.active.store(false, Ordering::Relaxed);
        if self.stream.take().is_some() {
            tracing::debug!("closed callback output stream");
        }
        Ok(())
    }
}
