//! `roster` command-line front end.
//!
//! # Responsibility
//! - Map list/add/show/delete commands onto the registry service.
//! - Turn service error categories into distinct exit codes.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match commands::run_command(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("roster: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
