use std::io::{self, BufRead, Write};

use crate::exec::Dispatcher;
use crate::parse::{ParsedCommand, parse};

/// Line-oriented front end: read, parse, dispatch, print. Every error —
/// parse or command — is printed and the loop continues; only `exit` (or
/// end of input) leaves.
pub fn run(dispatcher: &mut Dispatcher) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    writeln!(stdout, "troika — type 'help' for commands")?;
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let cmd = match parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                writeln!(stdout, "error: {}", e)?;
                continue;
            }
        };

        let leaving = matches!(cmd, ParsedCommand::Exit);
        match dispatcher.execute(cmd) {
            Ok(feedback) => {
                writeln!(stdout, "{}", feedback)?;
                if leaving {
                    break;
                }
            }
            Err(e) => writeln!(stdout, "error: {}", e)?,
        }
    }
    Ok(())
}
