//! shape - build, validate and query shape models

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = shape_model::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
