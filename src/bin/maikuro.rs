//! Maikuro
//!
//! Command-line client for the Chisai window manager. Joins its arguments
//! into one message and writes it to the Chisai socket.

use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "maikuro".into());
    let words: Vec<String> = args.collect();

    if words.is_empty() {
        eprintln!("{program}: not enough arguments");
        eprintln!("usage: {program} <command> [args...]");
        return ExitCode::FAILURE;
    }

    let path = chisai_ipc::socket_path();
    let message = chisai_ipc::join_args(&words);

    match chisai_ipc::send(&path, &message) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{program}: {e:#}");
            ExitCode::FAILURE
        }
    }
}
