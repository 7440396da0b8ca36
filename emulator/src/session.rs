use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use dimmer_core::repl::commands::{CommandError, CommandExecutor, CommandOutcome, HELP_LINES};
use dimmer_core::repl::grammar::{self, Command};
use dimmer_core::repl::status::StatusFormatter;
use dimmer_core::{ChannelConfig, ChannelId, DimmerConfig, DimmerError, Micros, SharedDimmer};

use crate::bus::{self, BusAction};
use crate::cli::SessionOptions;
use crate::mains::{MainsSimulator, MainsStats, RecordingGateDriver};

/// Brightness every emulated channel starts at.
const INITIAL_LEVEL: u8 = 0;

pub type EmulatedDimmer = SharedDimmer<Micros>;

#[derive(Debug)]
pub enum SessionError {
    Io(io::Error),
    Dimmer(DimmerError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(err) => write!(f, "transcript: {err}"),
            SessionError::Dimmer(err) => write!(f, "dimmer setup: {err}"),
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<DimmerError> for SessionError {
    fn from(error: DimmerError) -> Self {
        Self::Dimmer(error)
    }
}

pub struct Session {
    dimmer: EmulatedDimmer,
    mains: MainsSimulator,
    driver: RecordingGateDriver,
    channels: Vec<ChannelId>,
    idx: u16,
    trace: bool,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(options: &SessionOptions) -> Result<Self, SessionError> {
        let dimmer = EmulatedDimmer::new(DimmerConfig::default());
        let channel = ChannelConfig::new(options.mode, options.frequency_hz, options.ramp);
        let mut channels = Vec::with_capacity(options.channels);
        for _ in 0..options.channels {
            let id = dimmer.register(channel)?;
            dimmer.begin(id, INITIAL_LEVEL)?;
            channels.push(id);
        }

        let mut mains = MainsSimulator::new(options.frequency_hz);
        if let Some(offset) = options.bounce {
            mains = mains.with_bounce(offset);
        }

        let transcript = match &options.transcript {
            Some(path) => Some(TranscriptLogger::new(path, options)?),
            None => None,
        };

        Ok(Self {
            dimmer,
            mains,
            driver: RecordingGateDriver::new(),
            channels,
            idx: options.idx,
            trace: options.trace,
            transcript,
        })
    }

    /// Handles one console line. Lines starting with `{` are bus messages.
    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.log(TranscriptRole::Host, trimmed)?;

        let mut lines = if trimmed.starts_with('{') {
            self.handle_bus(trimmed)
        } else {
            self.handle_console(trimmed)
        };
        if self.trace {
            self.trace_telemetry(&mut lines);
        } else {
            self.dimmer.drain_telemetry(|_| {});
        }

        for line in &lines {
            self.log(TranscriptRole::Emulator, line)?;
        }
        Ok(lines)
    }

    /// Advances the simulated mains clock.
    pub fn run(&mut self, duration: Duration) -> MainsStats {
        self.mains.advance(&self.dimmer, &mut self.driver, duration)
    }

    fn handle_console(&mut self, line: &str) -> Vec<String> {
        let switched = matches!(grammar::parse(line), Ok(Command::Power { .. }));
        let mut executor = CommandExecutor::new(&self.dimmer);
        match executor.execute(line) {
            Ok(CommandOutcome::Applied(snapshot)) => {
                let mut lines = vec![format!("OK {}", StatusFormatter::new(&snapshot))];
                if switched && self.channels.first() == Some(&snapshot.id) {
                    match bus::encode_switch(self.idx, snapshot.powered) {
                        Ok(json) => lines.push(format!("bus: {json}")),
                        Err(err) => lines.push(format!("ERR {err}")),
                    }
                }
                lines
            }
            Ok(CommandOutcome::Status(snapshots)) => snapshots
                .iter()
                .map(|snapshot| StatusFormatter::new(snapshot).to_string())
                .collect(),
            Ok(CommandOutcome::Interrupt(enabled)) => {
                if !enabled {
                    self.dimmer.release_all(&mut self.driver);
                }
                vec![format!("OK irq {}", if enabled { "on" } else { "off" })]
            }
            Ok(CommandOutcome::Run(duration)) => self.describe_run(duration),
            Ok(CommandOutcome::Help) => {
                let mut lines: Vec<String> = HELP_LINES.iter().map(ToString::to_string).collect();
                lines.push("{\"idx\":N,\"nvalue\":N,\"svalue1\":N}  bus message for ch0".into());
                lines.push("exit|quit              leave the emulator".into());
                lines
            }
            Err(CommandError::Parse(err)) => vec![format!("ERR syntax {err}")],
            Err(CommandError::Dimmer(err)) => vec![format!("ERR {err}")],
        }
    }

    fn describe_run(&mut self, duration: Duration) -> Vec<String> {
        let stats = self.run(duration);
        let mut lines = vec![format!(
            "ran {}: crossings={} bounces={} gate-actions={}",
            format_duration_short(duration),
            stats.crossings,
            stats.bounces,
            stats.gate_actions
        )];

        for id in &self.channels {
            let delay = self
                .driver
                .last_delay(*id)
                .map_or_else(|| "-".to_string(), |delay| format!("{}us", delay.as_micros()));
            lines.push(format!(
                "  {id} pulses={} last-delay={delay}",
                self.driver.pulse_count(*id)
            ));
        }
        lines
    }

    fn handle_bus(&mut self, payload: &str) -> Vec<String> {
        let Some(&channel) = self.channels.first() else {
            return vec!["ERR no channels".to_string()];
        };

        let result = match bus::decode(payload, self.idx) {
            Ok(BusAction::Ignored { idx }) => return vec![format!("bus: ignored idx {idx}")],
            Ok(BusAction::Set { level, .. }) => self.dimmer.set(channel, level),
            Ok(BusAction::Off { .. }) => self.dimmer.off(channel),
            Err(err) => return vec![format!("ERR {err}")],
        };

        let snapshot = match result.and_then(|()| self.dimmer.snapshot(channel)) {
            Ok(snapshot) => snapshot,
            Err(err) => return vec![format!("ERR {err}")],
        };
        let mut lines = vec![format!("OK {}", StatusFormatter::new(&snapshot))];
        match bus::encode_status(self.idx, &snapshot) {
            Ok(json) => lines.push(format!("bus: {json}")),
            Err(err) => lines.push(format!("ERR {err}")),
        }
        lines
    }

    fn trace_telemetry(&self, lines: &mut Vec<String>) {
        self.dimmer.drain_telemetry(|record| {
            lines.push(format!(
                "  [{}] #{} {}",
                format_timestamp(record.timestamp),
                record.id,
                record.event
            ));
        });
    }

    fn log(&mut self, role: TranscriptRole, line: &str) -> io::Result<()> {
        let now = self.mains.now();
        match self.transcript.as_mut() {
            Some(transcript) => transcript.append_line(now, role, line),
            None => Ok(()),
        }
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path, options: &SessionOptions) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(options)?;
        Ok(logger)
    }

    fn write_header(&mut self, options: &SessionOptions) -> io::Result<()> {
        writeln!(self.writer, "# Triac dimmer emulator transcript")?;
        writeln!(
            self.writer,
            "# {} Hz, mode={}, channels={}, ramp={}",
            options.frequency_hz,
            options.mode,
            options.channels,
            format_duration_short(options.ramp)
        )?;
        writeln!(self.writer, "# Timestamps are simulated mains time")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, now: Micros, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[{:>12}] {} {}",
            format_timestamp(now),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

fn format_timestamp(at: Micros) -> String {
    let micros = at.as_micros();
    format!("+{}.{:03}ms", micros / 1_000, micros % 1_000)
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimmer_core::GateAction;

    fn session(options: SessionOptions) -> Session {
        Session::new(&options).expect("session")
    }

    fn single(session: &mut Session, line: &str) -> String {
        let lines = session.handle_command(line).unwrap();
        assert_eq!(lines.len(), 1, "{lines:?}");
        lines.into_iter().next().unwrap()
    }

    #[test]
    fn set_and_status_report_channel_state() {
        let mut session = session(SessionOptions::default());
        assert_eq!(
            single(&mut session, "set 40"),
            "OK ch0 value=40 target=40 min=0 state=on ramp=idle mode=phase"
        );
        assert_eq!(
            single(&mut session, "status"),
            "ch0 value=40 target=40 min=0 state=on ramp=idle mode=phase"
        );
    }

    #[test]
    fn run_reports_pulses_and_delay() {
        let mut session = session(SessionOptions::default());
        single(&mut session, "set 30");
        let lines = session.handle_command("run 100ms").unwrap();
        assert_eq!(lines[0], "ran 100ms: crossings=10 bounces=0 gate-actions=20");
        assert_eq!(lines[1], "  ch0 pulses=10 last-delay=7000us");
        assert_eq!(session.mains.now(), Micros::from_millis(100));
    }

    #[test]
    fn ramp_progresses_with_simulated_time() {
        let options = SessionOptions {
            ramp: Duration::from_millis(400),
            ..SessionOptions::default()
        };
        let mut session = session(options);
        single(&mut session, "set 100");
        session.run(Duration::from_millis(200));
        let value = session.dimmer.value(ChannelId::new(0)).unwrap();
        assert!(value > 0 && value < 100, "mid-ramp value {value}");
        session.run(Duration::from_millis(250));
        assert_eq!(session.dimmer.value(ChannelId::new(0)), Ok(100));
    }

    #[test]
    fn bus_messages_drive_channel_zero() {
        let mut session = session(SessionOptions::default());
        let lines = session
            .handle_command(r#"{"command":"switchlight","idx":1385,"nvalue":1,"svalue1":"60"}"#)
            .unwrap();
        assert_eq!(
            lines[0],
            "OK ch0 value=60 target=60 min=0 state=on ramp=idle mode=phase"
        );
        assert_eq!(
            lines[1],
            r#"bus: {"command":"udevice","idx":1385,"nvalue":1,"svalue":"60"}"#
        );

        assert_eq!(
            single(&mut session, r#"{"idx":99,"nvalue":0}"#),
            "bus: ignored idx 99"
        );
        assert!(session.dimmer.state(ChannelId::new(0)).unwrap());
    }

    #[test]
    fn irq_off_drops_a_held_gate() {
        let mut session = session(SessionOptions::default());
        single(&mut session, "set 50");
        session.run(Duration::from_micros(5_100));
        assert_eq!(
            session.driver.events.last().map(|event| event.action),
            Some(GateAction::Assert)
        );

        assert_eq!(single(&mut session, "irq off"), "OK irq off");
        let last = session.driver.events.last().copied().unwrap();
        assert_eq!(last.channel, ChannelId::new(0));
        assert_eq!(last.action, GateAction::Release);
        assert_eq!(session.dimmer.next_deadline(), None);
    }

    #[test]
    fn power_commands_announce_switchlight() {
        let mut session = session(SessionOptions::default());
        single(&mut session, "set 40");
        let lines = session.handle_command("off").unwrap();
        assert_eq!(
            lines[1],
            r#"bus: {"command":"switchlight","idx":1385,"switchcmd":"Off"}"#
        );
        let lines = session.handle_command("toggle").unwrap();
        assert_eq!(
            lines[1],
            r#"bus: {"command":"switchlight","idx":1385,"switchcmd":"On"}"#
        );
    }

    #[test]
    fn errors_are_reported_inline() {
        let mut session = session(SessionOptions::default());
        assert!(single(&mut session, "brighter").starts_with("ERR syntax"));
        assert_eq!(
            single(&mut session, "on ch=3"),
            format!("ERR {}", DimmerError::UnknownChannel(ChannelId::new(3)))
        );
        assert!(single(&mut session, "{\"idx\":").starts_with("ERR malformed bus message"));
    }

    #[test]
    fn trace_prints_telemetry() {
        let options = SessionOptions {
            trace: true,
            ..SessionOptions::default()
        };
        let mut session = session(options);
        single(&mut session, "set 50");
        let lines = session.handle_command("run 10ms").unwrap();
        assert!(lines.iter().any(|line| line.ends_with("zero-cross")));
        assert!(lines.iter().any(|line| line.contains("gate-asserted ch0")));
    }
}
