//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `memo_core` linkage with deterministic output.
//! - Print the active access rule table for review.
//! - Bootstrap a database file to the latest schema on request.

use memo_core::db::migrations::latest_version;
use memo_core::RULES;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("memo_core ping={}", memo_core::ping());
            println!("memo_core version={}", memo_core::core_version());
            ExitCode::SUCCESS
        }
        [command] if command == "rules" => {
            for rule in RULES {
                println!("{rule}");
            }
            ExitCode::SUCCESS
        }
        [command, path] if command == "migrate" => match memo_core::open_db(path) {
            Ok(_) => {
                println!("schema_version={} path={path}", latest_version());
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("migrate failed: {err}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: memo_cli [rules | migrate <db-path>]");
            ExitCode::from(2)
        }
    }
}
