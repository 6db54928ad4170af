//! record-forms - validate record imports, bulk renames and filter forms
//! from the command line

use record_forms::cli;
use record_forms::FormsConfig;
use std::io;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "record_forms=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    std::process::exit(run());
}

fn run() -> i32 {
    let command = match cli::parse_args_from(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(err) => return report(err),
    };

    let config = FormsConfig::load().unwrap_or_else(|err| {
        warn!(error = %err, "Failed to load configuration, using defaults");
        FormsConfig::default()
    });

    match cli::execute(command, &config) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            0
        }
        Err(err) => report(err),
    }
}

fn report(err: cli::CliError) -> i32 {
    for line in err.report() {
        eprintln!("{line}");
    }
    err.exit_code()
}
