//! Command-line flags for the emulator.

use std::path::PathBuf;
use std::time::Duration;

use dimmer_core::config::{DEFAULT_AC_FREQUENCY_HZ, DimmerMode};
use dimmer_core::registry::DEFAULT_CHANNEL_CAPACITY;

use crate::bus::DEFAULT_DEVICE_IDX;

pub const USAGE: &str = "Usage: dimmer-emulator [--frequency <hz>] [--ramp <ms>] \
[--mode <phase|burst>] [--channels <1-4>] [--idx <n>] [--bounce <us>] \
[--transcript <path>] [--trace]";

/// Settings for one emulator session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    pub frequency_hz: u16,
    pub ramp: Duration,
    pub mode: DimmerMode,
    pub channels: usize,
    /// Bus device index routed to channel 0.
    pub idx: u16,
    pub bounce: Option<Duration>,
    pub transcript: Option<PathBuf>,
    /// Print telemetry events after each command.
    pub trace: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_AC_FREQUENCY_HZ,
            ramp: Duration::ZERO,
            mode: DimmerMode::PhaseControl,
            channels: 1,
            idx: DEFAULT_DEVICE_IDX,
            bounce: None,
            transcript: None,
            trace: false,
        }
    }
}

/// Parses flags in either `--flag value` or `--flag=value` form.
pub fn parse_options<I>(args: I) -> Result<SessionOptions, String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = SessionOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        if flag == "--trace" {
            options.trace = true;
            continue;
        }

        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| format!("Expected value after {flag}"))?,
        };

        match flag.as_str() {
            "--frequency" => options.frequency_hz = number(&flag, &value)?,
            "--ramp" => options.ramp = Duration::from_millis(number(&flag, &value)?),
            "--mode" => options.mode = mode_from_tag(&value)?,
            "--channels" => {
                let channels: usize = number(&flag, &value)?;
                if channels == 0 || channels > DEFAULT_CHANNEL_CAPACITY {
                    return Err(format!(
                        "--channels must be between 1 and {DEFAULT_CHANNEL_CAPACITY}"
                    ));
                }
                options.channels = channels;
            }
            "--idx" => options.idx = number(&flag, &value)?,
            "--bounce" => options.bounce = Some(Duration::from_micros(number(&flag, &value)?)),
            "--transcript" => options.transcript = Some(PathBuf::from(value)),
            _ => return Err(format!("Unknown flag `{flag}`")),
        }
    }

    Ok(options)
}

fn number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid value `{value}` for {flag}"))
}

fn mode_from_tag(tag: &str) -> Result<DimmerMode, String> {
    if tag.eq_ignore_ascii_case("phase") {
        Ok(DimmerMode::PhaseControl)
    } else if tag.eq_ignore_ascii_case("burst") {
        Ok(DimmerMode::PulseDensity)
    } else {
        Err(format!("Unknown dimmer mode `{tag}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<SessionOptions, String> {
        parse_options(args.iter().map(ToString::to_string))
    }

    #[test]
    fn no_flags_gives_defaults() {
        assert_eq!(parse(&[]).unwrap(), SessionOptions::default());
    }

    #[test]
    fn both_flag_forms_are_accepted() {
        let options = parse(&[
            "--frequency",
            "60",
            "--ramp=400",
            "--mode",
            "burst",
            "--channels=2",
            "--idx",
            "12",
            "--trace",
        ])
        .unwrap();
        assert_eq!(options.frequency_hz, 60);
        assert_eq!(options.ramp, Duration::from_millis(400));
        assert_eq!(options.mode, DimmerMode::PulseDensity);
        assert_eq!(options.channels, 2);
        assert_eq!(options.idx, 12);
        assert!(options.trace);
    }

    #[test]
    fn bad_flags_are_reported() {
        assert!(parse(&["--mode", "fast"]).is_err());
        assert!(parse(&["--channels", "9"]).is_err());
        assert!(parse(&["--frequency"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }
}
