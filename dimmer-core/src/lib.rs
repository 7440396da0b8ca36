#![cfg_attr(not(test), no_std)]

// Triac dimmer control logic shared by the MCU firmware and host tooling.
//
// Nothing here touches hardware or reads a clock. The firmware feeds zero-cross
// edges and timestamps in from its interrupt and executor tasks; the emulator
// does the same from a simulated mains source.

pub mod channel;
pub mod config;
pub mod dimmer;
pub mod driver;
pub mod instant;
pub mod ramp;
pub mod registry;
pub mod repl;
pub mod shared;
pub mod telemetry;
pub mod timer;
pub mod timing;
pub mod zero_cross;

pub use channel::{ChannelId, ChannelSnapshot};
pub use config::{ChannelConfig, ConfigError, DimmerConfig, DimmerMode};
pub use dimmer::{DimmerEngine, DimmerError};
pub use driver::{GateAction, GateDriver, NoopGateDriver};
pub use instant::{MonotonicInstant, Micros};
pub use shared::SharedDimmer;
