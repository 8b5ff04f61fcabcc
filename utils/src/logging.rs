use std::env;

use chrono::Local;
use log::LevelFilter;

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

pub fn level_from_str(value: Option<&str>) -> LevelFilter {
    match value {
        Some("trace") => LevelFilter::Trace,
        Some("debug") => LevelFilter::Debug,
        Some("info") => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        _ => LevelFilter::Warn,
    }
}

/// Routes the `log` facade to stderr, filtered by `LOG_LEVEL`.
pub fn setup_logging() -> Result<(), fern::InitError> {
    let level = level_from_str(env::var(LOG_LEVEL_ENV).ok().as_deref());

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}] {}: {}",
                Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        // reqwest/hyper are chatty at debug
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
