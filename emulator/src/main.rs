mod bus;
mod cli;
mod mains;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let options = cli::parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{}", cli::USAGE);
        process::exit(2);
    });

    let mut session = Session::new(&options).unwrap_or_else(|err| {
        eprintln!("{err}");
        process::exit(1);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Triac Dimmer Emulator ready ({} Hz, {} channel(s), mode {}). Type `help` for commands or `exit` to quit.",
        options.frequency_hz, options.channels, options.mode
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}
