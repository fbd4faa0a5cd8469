//! Terminal implementations of the front-end hooks.

use std::io::{self, BufRead, Write};

use herald_core::{Confirm, EventKind, Result, SoundPlayer};

/// Asks on stderr and reads the answer from stdin.
///
/// Anything starting with `s` or `y` (case-insensitive) counts as yes; EOF
/// and read errors count as no.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [s/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().chars().next().map(|c| c.to_ascii_lowercase()),
        Some('s') | Some('y')
    )
}

/// Rings the terminal bell for every toast.
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play(&self, _kind: &EventKind) -> Result<()> {
        let mut stderr = io::stderr();
        stderr.write_all(b"\x07")?;
        stderr.flush()?;
        Ok(())
    }
}
