//! Home-automation message bus codec.
//!
//! Inbound device commands look like
//! `{"command": "switchlight", "idx": 1385, "nvalue": 1, "svalue1": "40"}`;
//! older publishers send the level as `svalue` instead of `svalue1`.
//! Outbound status is a `udevice` update for the same device index, and
//! switch changes are also announced as `switchlight` with `switchcmd`.

use std::fmt;

use dimmer_core::ChannelSnapshot;
use dimmer_core::timing::clamp_level;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Device index the emulator answers to when `--idx` is not given.
pub const DEFAULT_DEVICE_IDX: u16 = 1385;

#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    command: String,
    #[serde(default)]
    idx: u16,
    #[serde(default, deserialize_with = "lenient_number")]
    nvalue: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    svalue: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    svalue1: Option<f64>,
}

impl InboundMessage {
    fn level(&self) -> f64 {
        self.svalue1.or(self.svalue).unwrap_or(0.0)
    }
}

#[derive(Debug, Serialize)]
struct DeviceUpdate<'a> {
    command: &'a str,
    idx: u16,
    nvalue: u8,
    svalue: String,
}

#[derive(Debug, Serialize)]
struct SwitchLight {
    command: &'static str,
    idx: u16,
    switchcmd: &'static str,
}

/// What an inbound message asks the dimmer to do.
#[derive(Clone, Debug, PartialEq)]
pub enum BusAction {
    /// The message addressed another device.
    Ignored { idx: u16 },
    /// Switch on at the given level.
    Set { level: u8, command: String },
    Off { command: String },
}

#[derive(Debug)]
pub struct BusError(serde_json::Error);

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed bus message: {}", self.0)
    }
}

impl std::error::Error for BusError {}

/// Decodes an inbound payload for the device at `idx`.
///
/// A non-zero `nvalue` sets the level from `svalue1`, or `svalue` when
/// `svalue1` is absent (clamped to 0-100); zero switches the channel off.
///
/// # Errors
///
/// Returns [`BusError`] when the payload is not a JSON object with the
/// expected field types.
pub fn decode(payload: &str, idx: u16) -> Result<BusAction, BusError> {
    let message: InboundMessage = serde_json::from_str(payload).map_err(BusError)?;
    if message.idx != idx {
        return Ok(BusAction::Ignored { idx: message.idx });
    }

    if message.nvalue.unwrap_or(0.0) == 0.0 {
        Ok(BusAction::Off {
            command: message.command,
        })
    } else {
        Ok(BusAction::Set {
            level: level_from_float(message.level()),
            command: message.command,
        })
    }
}

/// Encodes a `udevice` status update for the given channel state.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn encode_status(idx: u16, snapshot: &ChannelSnapshot) -> Result<String, BusError> {
    let update = DeviceUpdate {
        command: "udevice",
        idx,
        nvalue: u8::from(snapshot.state()),
        svalue: snapshot.value.to_string(),
    };
    serde_json::to_string(&update).map_err(BusError)
}

/// Encodes a `switchlight` announcement for an on/off change.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn encode_switch(idx: u16, on: bool) -> Result<String, BusError> {
    let switch = SwitchLight {
        command: "switchlight",
        idx,
        switchcmd: if on { "On" } else { "Off" },
    };
    serde_json::to_string(&switch).map_err(BusError)
}

#[allow(clippy::cast_possible_truncation)]
fn level_from_float(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Clamped into i32 range first, so the truncating cast is exact.
    clamp_level(value.clamp(-1.0, 101.0).trunc() as i32)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("number out of range")),
        Value::String(text) => text.trim().parse().map(Some).map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected a number, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimmer_core::config::DimmerMode;
    use dimmer_core::ramp::RampState;
    use dimmer_core::ChannelId;

    fn snapshot(value: u8) -> ChannelSnapshot {
        ChannelSnapshot {
            id: ChannelId::new(0),
            mode: DimmerMode::PhaseControl,
            value,
            target: value,
            minimum: 0,
            powered: value > 0,
            ramp_state: RampState::Idle,
            ramp_elapsed: 0,
            ramp_total: 0,
        }
    }

    #[test]
    fn nonzero_nvalue_sets_level() {
        let action = decode(
            r#"{"command":"switchlight","idx":1385,"nvalue":1,"svalue1":"40"}"#,
            1385,
        )
        .unwrap();
        assert_eq!(
            action,
            BusAction::Set {
                level: 40,
                command: "switchlight".into()
            }
        );
    }

    #[test]
    fn zero_nvalue_switches_off() {
        let action = decode(r#"{"idx":7,"nvalue":0,"svalue1":80}"#, 7).unwrap();
        assert_eq!(
            action,
            BusAction::Off {
                command: String::new()
            }
        );
    }

    #[test]
    fn other_devices_are_ignored() {
        let action = decode(r#"{"idx":12,"nvalue":1,"svalue1":50}"#, 7).unwrap();
        assert_eq!(action, BusAction::Ignored { idx: 12 });
    }

    #[test]
    fn levels_are_clamped() {
        let high = decode(r#"{"idx":1,"nvalue":1,"svalue1":250.5}"#, 1).unwrap();
        assert!(matches!(high, BusAction::Set { level: 100, .. }));
        let low = decode(r#"{"idx":1,"nvalue":1,"svalue1":"-4"}"#, 1).unwrap();
        assert!(matches!(low, BusAction::Set { level: 0, .. }));
        let fraction = decode(r#"{"idx":1,"nvalue":2,"svalue1":"37.9"}"#, 1).unwrap();
        assert!(matches!(fraction, BusAction::Set { level: 37, .. }));
    }

    #[test]
    fn plain_svalue_is_a_fallback_level() {
        let action = decode(r#"{"idx":1,"nvalue":1,"svalue":"65"}"#, 1).unwrap();
        assert!(matches!(action, BusAction::Set { level: 65, .. }));

        let both = decode(r#"{"idx":1,"nvalue":1,"svalue":65,"svalue1":20}"#, 1).unwrap();
        assert!(matches!(both, BusAction::Set { level: 20, .. }));

        let neither = decode(r#"{"idx":1,"nvalue":1}"#, 1).unwrap();
        assert!(matches!(neither, BusAction::Set { level: 0, .. }));
    }

    #[test]
    fn switch_changes_are_encoded_as_switchlight() {
        assert_eq!(
            encode_switch(2450, true).unwrap(),
            r#"{"command":"switchlight","idx":2450,"switchcmd":"On"}"#
        );
        assert_eq!(
            encode_switch(2450, false).unwrap(),
            r#"{"command":"switchlight","idx":2450,"switchcmd":"Off"}"#
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(decode("not json", 1).is_err());
        assert!(decode(r#"{"idx":1,"nvalue":"abc"}"#, 1).is_err());
    }

    #[test]
    fn status_is_encoded_as_udevice() {
        let json = encode_status(1385, &snapshot(42)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["command"], "udevice");
        assert_eq!(value["idx"], 1385);
        assert_eq!(value["nvalue"], 1);
        assert_eq!(value["svalue"], "42");

        let json = encode_status(1385, &snapshot(0)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nvalue"], 0);
    }
}
