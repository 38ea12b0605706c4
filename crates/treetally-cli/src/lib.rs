pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::diagnostics::DiagnosticsSession;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }
    diagnostics.record(format!("command={:?}", cli.command));

    let result = dispatch::run(cli);
    if let Err(error) = &result {
        diagnostics.record(format!("command failed: {error:#}"));
    }
    result
}
