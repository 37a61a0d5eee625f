//! # hertz
//!
//! Plays a sine tone on the default output device.
//!
//! `hertz b` renders the whole tone and plays it in one blocking write. Any
//! other mode, or none, starts a live stream: type a frequency in Hz and press
//! enter to retune, or type `stop` to end playback. Ctrl-C stops either mode
//! and releases the device before exiting.

use clap::Parser;
use hertz::{DEFAULT_FRAMES_PER_BUFFER, Interrupt, Mode, PhaseAccumulation, ToneConfig};
use std::error::Error;
use std::time::Duration;

/// Sine tone generator with blocking and live playback
#[derive(Parser, Debug)]
#[command(name = "hertz")]
#[command(version, about)]
struct Args {
    /// `b` for a blocking one-shot tone, anything else for a live stream
    mode: Option<String>,

    /// Starting frequency in Hz
    #[arg(short, long, default_value_t = 40.0)]
    frequency: f64,

    /// Sample rate in Hz
    #[arg(short, long, default_value_t = 44100)]
    rate: u32,

    /// Length of the blocking tone in seconds
    #[arg(short, long, default_value_t = 5.0)]
    duration: f64,

    /// Number of output channels; every channel carries the same signal
    #[arg(short, long, default_value_t = 1)]
    channels: u16,

    /// Frames per device callback in live mode
    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_BUFFER)]
    frames_per_buffer: u32,

    /// Let the phase grow without wrapping it into [0, 2π)
    #[arg(long)]
    unbounded_phase: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn tone_config(&self) -> Result<ToneConfig, Box<dyn Error>> {
        let duration = Duration::try_from_secs_f64(self.duration)
            .map_err(|err| format!("invalid duration {}: {err}", self.duration))?;
        let accumulation = if self.unbounded_phase {
            PhaseAccumulation::Unbounded
        } else {
            PhaseAccumulation::Wrapped
        };

        Ok(ToneConfig::default()
            .with_duration(duration)
            .with_sample_rate(self.rate)
            .with_channels(self.channels)
            .with_frequency(self.frequency)
            .with_frames_per_buffer(self.frames_per_buffer)
            .with_phase_accumulation(accumulation))
    }
}

fn init_logging(verbose: bool) -> Result<(), Box<dyn Error>> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;
    Ok(())
}

/// Raise `interrupt` on Ctrl-C, so the running stream winds down and closes.
fn install_interrupt_handler(interrupt: &Interrupt) -> Result<(), Box<dyn Error>> {
    let handler = interrupt.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupted, stopping playback");
        handler.raise();
    })?;
    Ok(())
}

#[cfg(feature = "playback")]
fn run(mode: Option<&str>, config: ToneConfig, interrupt: Interrupt) -> Result<(), Box<dyn Error>> {
    use hertz::{CpalBackend, ToneGenerator, generate};

    let backend = CpalBackend::new().with_interrupt(interrupt);
    let mut stream = generate(mode, config, backend, None);
    match stream.play() {
        Err(err) if err.is_interrupted() => Ok(()),
        result => Ok(result?),
    }
}

#[cfg(not(feature = "playback"))]
fn run(
    _mode: Option<&str>,
    _config: ToneConfig,
    _interrupt: Interrupt,
) -> Result<(), Box<dyn Error>> {
    Err("hertz was built without the `playback` feature; no output device is available".into())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    let config = args.tone_config()?;
    let interrupt = Interrupt::new();
    install_interrupt_handler(&interrupt)?;

    let mode = args.mode.as_deref();
    println!("Generating {} Stream", Mode::from_selector(mode));

    run(mode, config, interrupt)
}
