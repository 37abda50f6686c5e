//! Taskdown CLI - query and lint Markdown task lists

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskdown_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
