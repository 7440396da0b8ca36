//! Operator console shared between firmware and emulator targets.
//!
//! The grammar lives in [`grammar`], command dispatch in [`commands`] and
//! output rendering in [`status`]. Everything stays `no_std`.

pub mod commands;
pub mod grammar;
pub mod status;
