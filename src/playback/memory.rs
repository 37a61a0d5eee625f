//! An in-memory output device.
//!
//! Nothing is played. Writes are recorded, and callback streams only run when
//! the owner calls [`MemoryBackend::pump`], standing in for the device's audio
//! thread. Useful for offline rendering and for exercising the controllers
//! without sound hardware.

use super::traits::{
    AudioBackend, BlockingStream, CallbackFlow, Interrupt, OutputStream, RenderCallback,
    StreamFormat,
};
use crate::error::{ToneError, ToneResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything the in-memory device has seen.
#[derive(Default)]
struct DeviceState {
    fail_open: Option<String>,
    fail_write: Option<String>,
    opened: Vec<StreamFormat>,
    written: Vec<f32>,
    write_calls: usize,
    callback: Option<RenderCallback>,
    callback_released: bool,
    active: bool,
    stop_calls: usize,
    close_calls: usize,
}

/// Handle to a shared in-memory device. Clones observe the same device.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<DeviceState>>,
    interrupt: Interrupt,
}

impl MemoryBackend {
    /// Create an idle device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent open fail with [`ToneError::DeviceOpen`].
    pub fn failing(reason: impl Into<String>) -> Self {
        let backend = Self::new();
        backend.state.lock().fail_open = Some(reason.into());
        backend
    }

    /// End playback on every stream of this device once `interrupt` is raised.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Make every subsequent blocking write fail with [`ToneError::Stream`].
    pub fn fail_writes(&self, reason: impl Into<String>) {
        self.state.lock().fail_write = Some(reason.into());
    }

    /// Drive the registered callback once, as the device would.
    ///
    /// Returns the interleaved buffer of `frames × channels` samples the callback
    /// produced, or `None` if no active callback stream is open or the device was
    /// interrupted.
    pub fn pump(&self, frames: usize) -> Option<Vec<f32>> {
        if self.interrupt.is_raised() {
            return None;
        }
        // render outside the lock so the callback may take its time
        let (mut callback, channels) = {
            let mut state = self.state.lock();
            if !state.active {
                return None;
            }
            let channels = state.opened.last().map_or(1, |f| f.channels as usize);
            (state.callback.take()?, channels)
        };

        let mut buffer = vec![0.0f32; frames * channels];
        let flow = callback(&mut buffer);

        let mut state = self.state.lock();
        if flow == CallbackFlow::Complete {
            state.active = false;
        }
        // a stream closed while we rendered drops its callback here
        if !state.callback_released {
            state.callback = Some(callback);
        }
        Some(buffer)
    }

    /// Simulate the device ending the stream on its own.
    pub fn finish(&self) {
        self.state.lock().active = false;
    }

    /// Formats of every stream opened so far.
    pub fn opened_formats(&self) -> Vec<StreamFormat> {
        self.state.lock().opened.clone()
    }

    /// Every sample written through blocking streams.
    pub fn written(&self) -> Vec<f32> {
        self.state.lock().written.clone()
    }

    /// Number of blocking writes.
    pub fn write_calls(&self) -> usize {
        self.state.lock().write_calls
    }

    /// Number of times a stream was stopped.
    pub fn stop_calls(&self) -> usize {
        self.state.lock().stop_calls
    }

    /// Number of times a stream was closed.
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }

    /// Whether the current stream is active.
    pub fn is_active(&self) -> bool {
        !self.interrupt.is_raised() && self.state.lock().active
    }

    fn open(&self, format: &StreamFormat) -> ToneResult<()> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.fail_open {
            return Err(ToneError::device_open(reason.clone()));
        }
        state.opened.push(*format);
        state.active = true;
        Ok(())
    }
}

impl AudioBackend for MemoryBackend {
    type Blocking = MemoryStream;
    type Callback = MemoryStream;

    fn open_blocking(&self, format: &StreamFormat) -> ToneResult<Self::Blocking> {
        self.open(format)?;
        Ok(MemoryStream::new(self.clone()))
    }

    fn open_callback(
        &self,
        format: &StreamFormat,
        callback: RenderCallback,
    ) -> ToneResult<Self::Callback> {
        self.open(format)?;
        let mut state = self.state.lock();
        state.callback = Some(callback);
        state.callback_released = false;
        drop(state);
        Ok(MemoryStream::new(self.clone()))
    }
}

/// A stream on a [`MemoryBackend`].
pub struct MemoryStream {
    device: MemoryBackend,
    closed: bool,
}

impl MemoryStream {
    const fn new(device: MemoryBackend) -> Self {
        Self {
            device,
            closed: false,
        }
    }
}

impl OutputStream for MemoryStream {
    fn is_active(&self) -> bool {
        !self.closed && self.device.is_active()
    }

    fn stop(&mut self) -> ToneResult<()> {
        let mut state = self.device.state.lock();
        state.active = false;
        state.stop_calls += 1;
        Ok(())
    }

    fn close(&mut self) -> ToneResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let mut state = self.device.state.lock();
        state.active = false;
        state.callback = None;
        state.callback_released = true;
        state.close_calls += 1;
        Ok(())
    }
}

impl BlockingStream for MemoryStream {
    fn write(&mut self, samples: &[f32]) -> ToneResult<()> {
        if self.closed {
            return Err(ToneError::stream("write on a closed stream"));
        }
        if self.device.interrupt.is_raised() {
            return Err(ToneError::Interrupted);
        }
        let mut state = self.device.state.lock();
        if let Some(reason) = &state.fail_write {
            return Err(ToneError::stream(reason.clone()));
        }
        state.written.extend_from_slice(samples);
        state.write_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_callback() -> RenderCallback {
        let mut calls = 0.0f32;
        Box::new(move |out: &mut [f32]| {
            calls += 1.0;
            out.fill(calls);
            CallbackFlow::Continue
        })
    }

    #[test]
    fn test_pump_honours_requested_frames() {
        let backend = MemoryBackend::new();
        let format = StreamFormat::new(48000, 2).with_frames_per_buffer(2048);
        let _stream = backend.open_callback(&format, counting_callback()).unwrap();

        assert_eq!(backend.pump(2048).unwrap(), vec![1.0; 4096]);
        // a short buffer at the stream edge
        assert_eq!(backend.pump(100).unwrap(), vec![2.0; 200]);
    }

    #[test]
    fn test_no_callbacks_after_stop_or_close() {
        let backend = MemoryBackend::new();
        let format = StreamFormat::new(44100, 1);
        let mut stream = backend.open_callback(&format, counting_callback()).unwrap();

        stream.stop().unwrap();
        assert!(!stream.is_active());
        assert!(backend.pump(16).is_none());

        stream.close().unwrap();
        stream.close().unwrap();
        assert_eq!(backend.close_calls(), 1);
    }

    #[test]
    fn test_complete_deactivates_stream() {
        let backend = MemoryBackend::new();
        let format = StreamFormat::new(44100, 1);
        let stream = backend
            .open_callback(&format, Box::new(|_: &mut [f32]| CallbackFlow::Complete))
            .unwrap();

        assert!(backend.pump(8).is_some());
        assert!(!stream.is_active());
        assert!(backend.pump(8).is_none());
    }

    #[test]
    fn test_failing_backend_refuses_to_open() {
        let backend = MemoryBackend::failing("device busy");
        let err = backend
            .open_blocking(&StreamFormat::new(44100, 1))
            .err()
            .unwrap();
        assert!(err.is_device_open_error());
        assert!(backend.opened_formats().is_empty());
    }

    #[test]
    fn test_interrupt_ends_streams() {
        let interrupt = Interrupt::new();
        let backend = MemoryBackend::new().with_interrupt(interrupt.clone());
        let format = StreamFormat::new(44100, 1);
        let callback_stream = backend.open_callback(&format, counting_callback()).unwrap();
        let mut blocking_stream = backend.open_blocking(&format).unwrap();

        assert!(backend.pump(8).is_some());
        interrupt.raise();

        assert!(!callback_stream.is_active());
        assert!(backend.pump(8).is_none());
        assert!(blocking_stream.write(&[0.0]).unwrap_err().is_interrupted());
        assert!(backend.written().is_empty());
    }

    #[test]
    fn test_blocking_writes_are_recorded() {
        let backend = MemoryBackend::new();
        let mut stream = backend.open_blocking(&StreamFormat::new(8000, 1)).unwrap();

        stream.write(&[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(backend.written(), vec![0.0, 0.5, 1.0]);
        assert_eq!(backend.write_calls(), 1);

        stream.close().unwrap();
        assert!(stream.write(&[0.0]).is_err());
    }
}
