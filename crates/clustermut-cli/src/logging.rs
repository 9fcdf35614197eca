use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

/// Environment variable holding per-module filter directives, such as
/// `clustermut::engine::packing=trace`. Ignored under `--quiet`.
pub const LOG_ENV: &str = "CLUSTERMUT_LOG";

/// Maps the `-v` count and `-q` flag to a level filter.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn build_filter(verbosity: u8, quiet: bool, directives: Option<&str>) -> Result<EnvFilter> {
    let default_level = level_filter(verbosity, quiet);
    let builder = EnvFilter::builder().with_default_directive(default_level.into());
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) if !quiet => builder.parse(directives).map_err(|e| {
            CliError::Argument(format!("Invalid {} directives '{}': {}", LOG_ENV, directives, e))
        }),
        _ => Ok(builder.parse_lossy("")),
    }
}

pub fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    directives: Option<String>,
) -> Result<()> {
    let filter = build_filter(verbosity, quiet, directives.as_deref())?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            // Structures are packed on several threads at once.
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
