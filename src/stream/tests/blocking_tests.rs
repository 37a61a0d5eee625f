//! Tests for the blocking controller.

use super::*;
use crate::error::ToneError;
use crate::oscillator::{PhaseAccumulation, render_block, render_whole};
use crate::playback::{Interrupt, MemoryBackend, StreamFormat};
use crate::stream::{BlockingTone, ToneGenerator};

#[test]
fn test_blocking_renders_exact_duration() {
    let backend = MemoryBackend::new();
    let mut tone = BlockingTone::new(reference_config(), backend.clone());

    tone.play().unwrap();

    let written = backend.written();
    assert_eq!(written.len(), 48000);
    assert_eq!(backend.write_calls(), 1);
    assert_eq!(
        written,
        render_whole(
            Duration::from_secs(1),
            48000,
            1,
            40.0,
            PhaseAccumulation::Wrapped
        )
    );
    assert_eq!(backend.opened_formats(), vec![StreamFormat::new(48000, 1)]);
}

#[test]
fn test_blocking_releases_stream_after_play() {
    let backend = MemoryBackend::new();
    let mut tone = BlockingTone::new(reference_config(), backend.clone());

    tone.play().unwrap();

    assert!(!tone.is_open());
    assert_eq!(backend.stop_calls(), 1);
    assert_eq!(backend.close_calls(), 1);

    // exit is idempotent
    tone.exit().unwrap();
    assert_eq!(backend.close_calls(), 1);
}

#[test]
fn test_blocking_stereo_duplicates_channels() {
    let backend = MemoryBackend::new();
    let config = reference_config()
        .with_channels(2)
        .with_duration(Duration::from_millis(100));
    let mut tone = BlockingTone::new(config, backend.clone());

    tone.play().unwrap();

    let written = backend.written();
    assert_eq!(written.len(), 4800 * 2);
    for frame in written.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

#[test]
fn test_blocking_honours_unbounded_phase() {
    let backend = MemoryBackend::new();
    let config = reference_config()
        .with_frequency(997.0)
        .with_duration(Duration::from_secs(30))
        .with_phase_accumulation(PhaseAccumulation::Unbounded);
    let mut tone = BlockingTone::new(config, backend.clone());

    tone.play().unwrap();

    let mut phase = 0.0;
    let expected = render_block(
        48000 * 30,
        1,
        997.0,
        48000,
        &mut phase,
        PhaseAccumulation::Unbounded,
    );
    assert_eq!(backend.written(), expected);
}

#[test]
fn test_blocking_rejects_tone_too_long_to_render() {
    let backend = MemoryBackend::new();
    let config = reference_config().with_duration(Duration::from_secs(1_000_000_000));
    let mut tone = BlockingTone::new(config, backend.clone());

    let err = tone.play().unwrap_err();

    assert!(err.is_device_open_error());
    assert!(backend.opened_formats().is_empty());
    assert!(backend.written().is_empty());
}

#[test]
fn test_blocking_device_open_failure_propagates() {
    let backend = MemoryBackend::failing("no output device available");
    let mut tone = BlockingTone::new(reference_config(), backend.clone());

    let err = tone.play().unwrap_err();

    assert!(err.is_device_open_error());
    assert!(!tone.is_open());
    assert!(backend.written().is_empty());
    assert_eq!(backend.close_calls(), 0);
}

#[test]
fn test_blocking_invalid_config_never_opens_device() {
    let backend = MemoryBackend::new();
    let mut tone = BlockingTone::new(reference_config().with_sample_rate(0), backend.clone());

    let err = tone.enter().unwrap_err();

    assert!(err.is_device_open_error());
    assert!(backend.opened_formats().is_empty());
}

#[test]
fn test_blocking_closes_stream_when_write_fails() {
    let backend = MemoryBackend::new();
    backend.fail_writes("device unplugged");
    let mut tone = BlockingTone::new(reference_config(), backend.clone());

    let err = tone.play().unwrap_err();

    assert!(matches!(err, ToneError::Stream(_)));
    assert!(!tone.is_open());
    assert_eq!(backend.close_calls(), 1);
}

#[test]
fn test_blocking_sound_requires_enter() {
    let mut tone = BlockingTone::new(reference_config(), MemoryBackend::new());
    assert!(matches!(tone.sound(), Err(ToneError::Stream(_))));
}

#[test]
fn test_session_drop_closes_stream() {
    let backend = MemoryBackend::new();
    let mut tone = BlockingTone::new(reference_config(), backend.clone());

    {
        let session = tone.open().unwrap();
        assert!(session.is_open());
    }

    assert!(!tone.is_open());
    assert_eq!(backend.close_calls(), 1);
}

#[test]
fn test_dropping_open_controller_closes_stream() {
    let backend = MemoryBackend::new();
    let mut tone = BlockingTone::new(reference_config(), backend.clone());
    tone.enter().unwrap();

    drop(tone);

    assert_eq!(backend.close_calls(), 1);
}

#[test]
fn test_interrupted_write_still_closes_stream() {
    let interrupt = Interrupt::new();
    let backend = MemoryBackend::new().with_interrupt(interrupt.clone());
    let mut tone = BlockingTone::new(reference_config(), backend.clone());
    interrupt.raise();

    let err = tone.play().unwrap_err();

    assert!(err.is_interrupted());
    assert!(!tone.is_open());
    assert_eq!(backend.close_calls(), 1);
    assert!(backend.written().is_empty());
}
