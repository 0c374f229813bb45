//! `fanfetch fetch-one <request>`: the isolated-process worker.
//!
//! Stdout carries exactly one JSON line, the report. Everything else
//! (logs, errors) goes to the log file or stderr.

use std::process::ExitCode;

use fanfetch_core::worker;

/// Exit code for a request that could not be parsed.
const EXIT_BAD_REQUEST: u8 = 2;

pub fn run_fetch_one(request: &str) -> ExitCode {
    let report = match worker::serve(request) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("malformed worker request: {}", e);
            eprintln!("fanfetch fetch-one: malformed request: {e}");
            return ExitCode::from(EXIT_BAD_REQUEST);
        }
    };
    match serde_json::to_string(&report) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("fanfetch fetch-one: cannot encode report: {e}");
            ExitCode::FAILURE
        }
    }
}
