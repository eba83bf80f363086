use std::io::Write;

use anyhow::Context;

use triage_cell::AlertPlayer;

/// Rings the terminal bell.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AlertPlayer for TerminalBell {
    fn play(&self) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .context("failed to ring terminal bell")
    }
}
