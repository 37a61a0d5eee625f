//! Line-oriented command input that never blocks the caller.
//!
//! A background thread performs the blocking reads and forwards each line over
//! a channel. The supervisory loop then checks the channel with `try_recv`, a
//! zero-timeout readiness check, so it can always get back to watching the
//! stream.

use crate::error::{ToneError, ToneResult};
use crossbeam::channel::{self, Receiver, TryRecvError};
use std::cell::Cell;
use std::io::{self, BufRead};
use std::thread;

/// A request to change the oscillator frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyCommand {
    /// Requested frequency in Hz. Not yet checked for positivity.
    pub hz: f64,
}

/// Anything a line of input can ask for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Retune the oscillator.
    SetFrequency(FrequencyCommand),
    /// Stop the stream and leave the supervisory loop.
    Stop,
}

const STOP_WORDS: [&str; 3] = ["stop", "quit", "exit"];

/// Parse a frequency from one line of text.
///
/// Surrounding whitespace, including the trailing newline, is ignored. Zero and
/// negative values parse successfully; rejecting them is up to the caller.
pub fn parse_frequency(line: &str) -> ToneResult<FrequencyCommand> {
    let text = line.trim();
    let hz: f64 = text
        .parse()
        .map_err(|e: std::num::ParseFloatError| ToneError::parse(text, e.to_string()))?;
    if !hz.is_finite() {
        return Err(ToneError::parse(text, "not a finite number"));
    }
    Ok(FrequencyCommand { hz })
}

/// Parse a line into a [`Command`].
pub fn parse_command(line: &str) -> ToneResult<Command> {
    let text = line.trim();
    if STOP_WORDS.iter().any(|word| text.eq_ignore_ascii_case(word)) {
        return Ok(Command::Stop);
    }
    parse_frequency(text).map(Command::SetFrequency)
}

/// Non-blocking source of text lines.
pub struct CommandChannel {
    lines: Receiver<String>,
    // a line pulled off the channel by `is_closed`
    stashed: Cell<Option<String>>,
    closed: Cell<bool>,
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("lines", &self.lines)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl CommandChannel {
    /// Read lines from the process's standard input.
    pub fn stdin() -> Self {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    /// Read lines from any reader on a background thread.
    ///
    /// The thread exits at end of input, on a read error, or once the channel
    /// has been dropped and the next line arrives.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (sender, receiver) = channel::unbounded();

        let spawned = thread::Builder::new()
            .name("hertz-stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if sender.send(line).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!("stopped reading commands: {err}");
                            break;
                        }
                    }
                }
                tracing::debug!("command input closed");
            });
        if let Err(err) = spawned {
            tracing::error!("could not start command reader: {err}");
        }

        Self::from_receiver(receiver)
    }

    /// Wrap an existing receiver of lines.
    pub const fn from_receiver(lines: Receiver<String>) -> Self {
        Self {
            lines,
            stashed: Cell::new(None),
            closed: Cell::new(false),
        }
    }

    /// Drain the lines that are already waiting, without blocking.
    ///
    /// Yields nothing when no input is pending or the source has closed.
    pub fn poll_available(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::from_fn(|| self.next_pending())
    }

    /// True once the source has ended and every line was consumed.
    pub fn is_closed(&self) -> bool {
        match self.next_pending() {
            Some(line) => {
                self.stashed.set(Some(line));
                false
            }
            None => self.closed.get(),
        }
    }

    fn next_pending(&self) -> Option<String> {
        if let Some(line) = self.stashed.take() {
            return Some(line);
        }
        match self.lines.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed.set(true);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    #[test]
    fn test_parse_frequency_accepts_numbers() {
        assert_eq!(parse_frequency("440").unwrap().hz, 440.0);
        assert_eq!(parse_frequency("440.5\n").unwrap().hz, 440.5);
        assert_eq!(parse_frequency("  1e3 \r\n").unwrap().hz, 1000.0);
    }

    #[test]
    fn test_parse_frequency_leaves_sign_policy_to_caller() {
        assert_eq!(parse_frequency("0").unwrap().hz, 0.0);
        assert_eq!(parse_frequency("-40").unwrap().hz, -40.0);
    }

    #[test]
    fn test_parse_frequency_rejects_garbage() {
        for line in ["", "\n", "abc", "440hz", "NaN", "inf", "1,5"] {
            let err = parse_frequency(line).unwrap_err();
            assert!(matches!(err, ToneError::Parse { .. }), "{line:?} gave {err}");
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("STOP\n").unwrap(), Command::Stop);
        assert_eq!(parse_command("quit").unwrap(), Command::Stop);
        assert_eq!(
            parse_command("220\n").unwrap(),
            Command::SetFrequency(FrequencyCommand { hz: 220.0 })
        );
        assert!(parse_command("louder").is_err());
    }

    #[test]
    fn test_poll_returns_immediately_when_empty() {
        let (_sender, receiver) = channel::unbounded::<String>();
        let commands = CommandChannel::from_receiver(receiver);

        assert_eq!(commands.poll_available().count(), 0);
        assert!(!commands.is_closed());
    }

    #[test]
    fn test_poll_drains_pending_lines_in_order() {
        let (sender, receiver) = channel::unbounded();
        let commands = CommandChannel::from_receiver(receiver);

        sender.send("100".to_string()).unwrap();
        sender.send("200".to_string()).unwrap();

        let lines: Vec<String> = commands.poll_available().collect();
        assert_eq!(lines, vec!["100", "200"]);
        assert_eq!(commands.poll_available().count(), 0);

        drop(sender);
        assert!(commands.is_closed());
    }

    #[test]
    fn test_reader_thread_forwards_lines() {
        let commands = CommandChannel::from_reader(Cursor::new("440\nabc\n880\n"));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut lines = Vec::new();
        while !commands.is_closed() && Instant::now() < deadline {
            lines.extend(commands.poll_available());
            thread::yield_now();
        }
        lines.extend(commands.poll_available());

        assert_eq!(lines, vec!["440", "abc", "880"]);
    }
}
