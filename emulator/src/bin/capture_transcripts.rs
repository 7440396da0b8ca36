use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[allow(dead_code)]
#[path = "../bus.rs"]
mod bus;
#[allow(dead_code)]
#[path = "../cli.rs"]
mod cli;
#[allow(dead_code)]
#[path = "../mains.rs"]
mod mains;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use cli::SessionOptions;
use dimmer_core::config::DimmerMode;
use session::Session;

const TRANSCRIPT_DIR: &str = "transcripts";

fn main() -> io::Result<()> {
    record_ramp()?;
    record_burst()?;
    record_bus()?;
    Ok(())
}

fn open(name: &str, options: SessionOptions) -> io::Result<Session> {
    let options = SessionOptions {
        transcript: Some(PathBuf::from(TRANSCRIPT_DIR).join(name)),
        trace: true,
        ..options
    };
    Session::new(&options).map_err(|err| io::Error::other(err.to_string()))
}

fn record_ramp() -> io::Result<()> {
    let mut session = open(
        "emulator-ramp.log",
        SessionOptions {
            ramp: Duration::from_millis(400),
            ..SessionOptions::default()
        },
    )?;
    let _ = session.handle_command("set 100")?;
    let _ = session.handle_command("run 200ms")?;
    let _ = session.handle_command("status")?;
    let _ = session.handle_command("min 20")?;
    let _ = session.handle_command("off")?;
    let _ = session.handle_command("run 500ms")?;
    let _ = session.handle_command("status")?;
    Ok(())
}

fn record_burst() -> io::Result<()> {
    let mut session = open(
        "emulator-burst.log",
        SessionOptions {
            mode: DimmerMode::PulseDensity,
            bounce: Some(Duration::from_micros(800)),
            ..SessionOptions::default()
        },
    )?;
    let _ = session.handle_command("set 50")?;
    let _ = session.handle_command("run 100ms")?;
    let _ = session.handle_command("irq off")?;
    let _ = session.handle_command("run 40ms")?;
    let _ = session.handle_command("irq on")?;
    let _ = session.handle_command("run 40ms")?;
    Ok(())
}

fn record_bus() -> io::Result<()> {
    let mut session = open("emulator-bus.log", SessionOptions::default())?;
    let _ = session.handle_command(
        r#"{"command":"switchlight","idx":1385,"nvalue":1,"svalue1":"40"}"#,
    )?;
    let _ = session.handle_command("run 20ms")?;
    let _ = session.handle_command(r#"{"command":"switchlight","idx":1385,"nvalue":0}"#)?;
    let _ = session.handle_command(r#"{"command":"switchlight","idx":2450,"nvalue":1}"#)?;
    let _ = session.handle_command("status")?;
    Ok(())
}
