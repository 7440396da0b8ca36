//! Parser for the dimmer console.
//!
//! Grammar (keywords are case-insensitive, `[ch=N]` defaults to channel 0):
//!
//! ```text
//! on | off | toggle [ch=N]
//! set <level> [ch=N]
//! min <level> [ch=N]
//! ramp <n>ms|<n>s [ch=N]
//! status [ch=N]
//! irq on|off
//! run <n>ms|<n>s
//! help
//! ```

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, dec_uint, digit1, space1};
use winnow::combinator::{alt, opt, preceded};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::{literal, one_of};

use crate::channel::ChannelId;

/// Switching commands that take no argument.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PowerAction {
    On,
    Off,
    Toggle,
}

/// Structured commands produced by the parser.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Power {
        action: PowerAction,
        channel: Option<ChannelId>,
    },
    /// Brightness as typed; clamping happens on execution.
    Set {
        level: i32,
        channel: Option<ChannelId>,
    },
    Minimum {
        level: i32,
        channel: Option<ChannelId>,
    },
    Ramp {
        duration: Duration,
        channel: Option<ChannelId>,
    },
    Status {
        channel: Option<ChannelId>,
    },
    Interrupt(bool),
    /// Advance the simulated clock (host tooling only).
    Run(Duration),
    Help,
}

/// Rejected console input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    /// Byte offset into the submitted line where parsing stopped.
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised input at column {}", self.offset + 1)
    }
}

/// Parses one console line. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`ParseError`] with the offset of the first unexpected byte.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim_start();
    let leading = line.len() - trimmed.len();
    command
        .parse(trimmed.trim_end())
        .map_err(|err| ParseError {
            offset: leading + err.offset(),
        })
}

fn command(input: &mut &str) -> Result<Command, ContextError> {
    alt((power, set, minimum, ramp, status, interrupt, run, help)).parse_next(input)
}

fn power(input: &mut &str) -> Result<Command, ContextError> {
    let action = alt((
        literal(Caseless("toggle")).value(PowerAction::Toggle),
        literal(Caseless("off")).value(PowerAction::Off),
        literal(Caseless("on")).value(PowerAction::On),
    ))
    .parse_next(input)?;
    let channel = channel_suffix(input)?;
    Ok(Command::Power { action, channel })
}

fn set(input: &mut &str) -> Result<Command, ContextError> {
    let level = preceded((literal(Caseless("set")), space1), level).parse_next(input)?;
    let channel = channel_suffix(input)?;
    Ok(Command::Set { level, channel })
}

fn minimum(input: &mut &str) -> Result<Command, ContextError> {
    let level = preceded((literal(Caseless("min")), space1), level).parse_next(input)?;
    let channel = channel_suffix(input)?;
    Ok(Command::Minimum { level, channel })
}

fn ramp(input: &mut &str) -> Result<Command, ContextError> {
    let duration = preceded((literal(Caseless("ramp")), space1), duration).parse_next(input)?;
    let channel = channel_suffix(input)?;
    Ok(Command::Ramp { duration, channel })
}

fn status(input: &mut &str) -> Result<Command, ContextError> {
    literal(Caseless("status")).parse_next(input)?;
    let channel = channel_suffix(input)?;
    Ok(Command::Status { channel })
}

fn interrupt(input: &mut &str) -> Result<Command, ContextError> {
    let enabled = preceded(
        (literal(Caseless("irq")), space1),
        alt((
            literal(Caseless("on")).value(true),
            literal(Caseless("off")).value(false),
        )),
    )
    .parse_next(input)?;
    Ok(Command::Interrupt(enabled))
}

fn run(input: &mut &str) -> Result<Command, ContextError> {
    let duration = preceded((literal(Caseless("run")), space1), duration).parse_next(input)?;
    Ok(Command::Run(duration))
}

fn help(input: &mut &str) -> Result<Command, ContextError> {
    alt((literal(Caseless("help")), literal("?")))
        .value(Command::Help)
        .parse_next(input)
}

/// Signed level; magnitudes past `i32` saturate so they still clamp later.
fn level(input: &mut &str) -> Result<i32, ContextError> {
    let (sign, digits) = (opt(one_of(['-', '+'])), digit1).parse_next(input)?;
    let magnitude = digits.bytes().fold(0_i32, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i32::from(digit - b'0'))
    });
    Ok(if sign == Some('-') { -magnitude } else { magnitude })
}

fn duration(input: &mut &str) -> Result<Duration, ContextError> {
    let amount: u64 = dec_uint.parse_next(input)?;
    alt((
        literal(Caseless("ms")).value(Duration::from_millis(amount)),
        literal(Caseless("s")).value(Duration::from_secs(amount)),
    ))
    .parse_next(input)
}

fn channel_suffix(input: &mut &str) -> Result<Option<ChannelId>, ContextError> {
    opt(preceded(
        (space1, literal(Caseless("ch")), literal("=")),
        dec_uint.map(ChannelId::new),
    ))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_commands_accept_optional_channel() {
        assert_eq!(
            parse("on"),
            Ok(Command::Power {
                action: PowerAction::On,
                channel: None
            })
        );
        assert_eq!(
            parse("  TOGGLE ch=2 "),
            Ok(Command::Power {
                action: PowerAction::Toggle,
                channel: Some(ChannelId::new(2))
            })
        );
        assert_eq!(
            parse("off"),
            Ok(Command::Power {
                action: PowerAction::Off,
                channel: None
            })
        );
    }

    #[test]
    fn levels_keep_their_sign() {
        assert_eq!(
            parse("set -5"),
            Ok(Command::Set {
                level: -5,
                channel: None
            })
        );
        assert_eq!(
            parse("min 20 ch=1"),
            Ok(Command::Minimum {
                level: 20,
                channel: Some(ChannelId::new(1))
            })
        );
    }

    #[test]
    fn oversized_levels_saturate() {
        assert_eq!(
            parse("set 99999999999"),
            Ok(Command::Set {
                level: i32::MAX,
                channel: None
            })
        );
        assert_eq!(
            parse("min -99999999999 ch=1"),
            Ok(Command::Minimum {
                level: -i32::MAX,
                channel: Some(ChannelId::new(1))
            })
        );
        assert_eq!(parse("set +7"), Ok(Command::Set { level: 7, channel: None }));
    }

    #[test]
    fn durations_take_unit_suffix() {
        assert_eq!(
            parse("ramp 400ms"),
            Ok(Command::Ramp {
                duration: Duration::from_millis(400),
                channel: None
            })
        );
        assert_eq!(parse("run 2s"), Ok(Command::Run(Duration::from_secs(2))));
        assert!(parse("ramp 400").is_err());
    }

    #[test]
    fn interrupt_switch_and_help() {
        assert_eq!(parse("irq off"), Ok(Command::Interrupt(false)));
        assert_eq!(parse("irq on"), Ok(Command::Interrupt(true)));
        assert_eq!(parse("help"), Ok(Command::Help));
        assert_eq!(parse("?"), Ok(Command::Help));
        assert_eq!(parse("status"), Ok(Command::Status { channel: None }));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse("onward").is_err());
        assert!(parse("set 10 please").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn error_offset_accounts_for_leading_space() {
        let err = parse("  set x").unwrap_err();
        assert!(err.offset >= 2);
    }
}
