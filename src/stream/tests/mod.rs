//! Tests for the tone controllers.
//!
//! Streams run against a [`MemoryBackend`], with the test standing in for the
//! device's audio thread.

use crate::command::CommandChannel;
use crate::config::ToneConfig;
use crossbeam::channel::{self, Sender};
use std::time::Duration;

mod blocking_tests;

/// A command channel the test can feed.
pub(crate) fn command_pair() -> (Sender<String>, CommandChannel) {
    let (sender, receiver) = channel::unbounded();
    (sender, CommandChannel::from_receiver(receiver))
}

/// A command channel preloaded with `lines`, closed afterwards.
pub(crate) fn scripted_commands(lines: &[&str]) -> CommandChannel {
    let (sender, commands) = command_pair();
    for line in lines {
        sender
            .send((*line).to_string())
            .expect("receiver is alive");
    }
    commands
}

/// 48 kHz, one second, mono, 40 Hz.
pub(crate) fn reference_config() -> ToneConfig {
    ToneConfig::default()
        .with_sample_rate(48000)
        .with_duration(Duration::from_secs(1))
        .with_channels(1)
        .with_frequency(40.0)
}
