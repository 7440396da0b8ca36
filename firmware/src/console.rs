//! UART operator console.
//!
//! Bytes from the serial port are assembled into lines, parsed by the shared
//! grammar and executed against the dimmer. Replies are rendered into a
//! fixed-size buffer the console task writes back out.

use core::fmt::{self, Write as _};
use core::str;

use dimmer_core::repl::commands::{
    CommandError, CommandExecutor, CommandOutcome, DimmerControl, HELP_LINES,
};
use dimmer_core::repl::status::StatusFormatter;
use heapless::{String, Vec};

/// Maximum number of bytes accepted on a single console line (excluding terminator).
pub const MAX_LINE_LEN: usize = 96;

/// Room for the longest reply (`help`, or `status` across every channel).
pub const REPLY_CAPACITY: usize = 768;

pub type Reply = String<REPLY_CAPACITY>;

/// Errors surfaced while assembling a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    InvalidUtf8,
    LineOverflow,
    Command(CommandError),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
            ConsoleError::LineOverflow => write!(f, "line longer than {MAX_LINE_LEN} bytes"),
            ConsoleError::Command(err) => err.fmt(f),
        }
    }
}

impl From<CommandError> for ConsoleError {
    fn from(error: CommandError) -> Self {
        Self::Command(error)
    }
}

/// Line-oriented session on top of a byte stream.
pub struct ConsoleSession<C> {
    executor: CommandExecutor<C>,
    buffer: Vec<u8, MAX_LINE_LEN>,
}

impl<C> ConsoleSession<C>
where
    C: DimmerControl,
{
    pub const fn new(executor: CommandExecutor<C>) -> Self {
        Self {
            executor,
            buffer: Vec::new(),
        }
    }

    /// Feeds a single byte. A line terminator executes the buffered line.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when the line overflows, is not UTF-8, or the
    /// command fails. The buffer is cleared after every terminator.
    pub fn ingest(&mut self, byte: u8) -> Result<Option<CommandOutcome>, ConsoleError> {
        match byte {
            b'\r' | b'\n' => self.process_line(),
            0x08 | 0x7f => {
                self.buffer.pop();
                Ok(None)
            }
            value => {
                if self.buffer.push(value).is_err() {
                    self.buffer.clear();
                    return Err(ConsoleError::LineOverflow);
                }
                Ok(None)
            }
        }
    }

    fn process_line(&mut self) -> Result<Option<CommandOutcome>, ConsoleError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let result = match str::from_utf8(self.buffer.as_slice()) {
            Ok(line) if line.trim().is_empty() => Ok(None),
            Ok(line) => self.executor.execute(line).map(Some).map_err(Into::into),
            Err(_) => Err(ConsoleError::InvalidUtf8),
        };
        self.buffer.clear();
        result
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Renders a command result as CRLF-terminated text.
///
/// Output that does not fit is cut short.
pub fn render(result: &Result<Option<CommandOutcome>, ConsoleError>, reply: &mut Reply) {
    reply.clear();
    // A full buffer truncates the reply; nothing else can fail here.
    let _ = write_reply(result, reply);
}

fn write_reply(
    result: &Result<Option<CommandOutcome>, ConsoleError>,
    out: &mut Reply,
) -> fmt::Result {
    match result {
        Ok(None) => Ok(()),
        Ok(Some(CommandOutcome::Applied(snapshot))) => {
            write!(out, "OK {}\r\n", StatusFormatter::new(snapshot))
        }
        Ok(Some(CommandOutcome::Status(snapshots))) => {
            for snapshot in snapshots {
                write!(out, "{}\r\n", StatusFormatter::new(snapshot))?;
            }
            Ok(())
        }
        Ok(Some(CommandOutcome::Interrupt(enabled))) => {
            write!(out, "OK irq {}\r\n", if *enabled { "on" } else { "off" })
        }
        Ok(Some(CommandOutcome::Run(_))) => {
            out.write_str("ERR run needs the simulated clock\r\n")
        }
        Ok(Some(CommandOutcome::Help)) => {
            for line in HELP_LINES {
                write!(out, "{line}\r\n")?;
            }
            Ok(())
        }
        Err(ConsoleError::Command(CommandError::Parse(err))) => {
            write!(out, "ERR syntax {err}\r\n")
        }
        Err(err) => write!(out, "ERR {err}\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimmer_core::{ChannelConfig, ChannelId, DimmerConfig, Micros, SharedDimmer};

    fn dimmer() -> SharedDimmer<Micros, 2, 6, 16> {
        let dimmer = SharedDimmer::new(DimmerConfig::default());
        let id = dimmer.register(ChannelConfig::phase_control()).unwrap();
        dimmer.begin(id, 25).unwrap();
        dimmer
    }

    fn feed<C: DimmerControl>(
        session: &mut ConsoleSession<C>,
        bytes: &[u8],
    ) -> std::vec::Vec<Result<Option<CommandOutcome>, ConsoleError>> {
        bytes
            .iter()
            .map(|byte| session.ingest(*byte))
            .filter(|result| !matches!(result, Ok(None)))
            .collect()
    }

    #[test]
    fn complete_lines_are_executed() {
        let dimmer = dimmer();
        let mut session = ConsoleSession::new(CommandExecutor::new(&dimmer));

        let results = feed(&mut session, b"set 80\r\n");
        assert_eq!(results.len(), 1);
        assert!(matches!(
            &results[0],
            Ok(Some(CommandOutcome::Applied(snapshot))) if snapshot.target == 80
        ));
        assert_eq!(session.buffered(), 0);
        assert_eq!(dimmer.value(ChannelId::new(0)), Ok(80));
    }

    #[test]
    fn backspace_edits_the_line() {
        let dimmer = dimmer();
        let mut session = ConsoleSession::new(CommandExecutor::new(&dimmer));

        feed(&mut session, b"set 49\x7f0\n");
        assert_eq!(dimmer.value(ChannelId::new(0)), Ok(40));
    }

    #[test]
    fn overflow_is_reported_and_buffer_reset() {
        let dimmer = dimmer();
        let mut session = ConsoleSession::new(CommandExecutor::new(&dimmer));

        for _ in 0..MAX_LINE_LEN {
            assert_eq!(session.ingest(b'a'), Ok(None));
        }
        assert_eq!(session.ingest(b'b'), Err(ConsoleError::LineOverflow));
        assert_eq!(session.buffered(), 0);
    }

    #[test]
    fn replies_are_rendered_per_outcome() {
        let dimmer = dimmer();
        let mut session = ConsoleSession::new(CommandExecutor::new(&dimmer));
        let mut reply = Reply::new();

        let result = session.ingest(b'?').and_then(|_| session.ingest(b'\n'));
        render(&result, &mut reply);
        assert_eq!(reply.lines().count(), HELP_LINES.len());

        feed(&mut session, b"status");
        render(&session.ingest(b'\r'), &mut reply);
        assert_eq!(
            reply.as_str(),
            "ch0 value=25 target=25 min=0 state=on ramp=idle mode=phase\r\n"
        );

        feed(&mut session, b"frobnicate");
        render(&session.ingest(b'\n'), &mut reply);
        assert!(reply.starts_with("ERR syntax"));

        feed(&mut session, b"run 1s");
        render(&session.ingest(b'\n'), &mut reply);
        assert_eq!(reply.as_str(), "ERR run needs the simulated clock\r\n");
    }

    #[test]
    fn empty_lines_produce_no_reply() {
        let dimmer = dimmer();
        let mut session = ConsoleSession::new(CommandExecutor::new(&dimmer));
        let mut reply = Reply::new();

        render(&session.ingest(b'\r'), &mut reply);
        assert!(reply.is_empty());
        feed(&mut session, b"  ");
        render(&session.ingest(b'\n'), &mut reply);
        assert!(reply.is_empty());
    }
}
