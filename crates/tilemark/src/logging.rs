//! Logging initialization.
//!
//! Uses `tracing` with human-readable or JSON output, always on stderr so that
//! stdout only carries output paths. Only the tilemark crates log at the chosen
//! level; dependencies (image codecs, tokio) are held at `warn`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log line layout on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    Pretty,
    Json,
}

/// Initialize the logging subsystem at `level` for the tilemark crates.
///
/// `RUST_LOG`, when set, replaces the computed filter entirely.
pub fn init(level: &str, style: LogStyle) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    match style {
        LogStyle::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogStyle::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init(),
    }
}

/// Initialize logging from the `[logging]` config section plus CLI overrides.
pub fn init_from_config(
    config: &tilemark_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let level = resolve_level(&config.logging.level, verbose_override);
    let style = if json_logs_override || config.logging.format.eq_ignore_ascii_case("json") {
        LogStyle::Json
    } else {
        LogStyle::Pretty
    };
    init(level, style);
}

/// Pick the effective level: `-v` raises anything quieter than `debug`,
/// and an unknown config value falls back to `info`.
fn resolve_level(configured: &str, verbose: bool) -> &'static str {
    let configured = LEVELS
        .iter()
        .copied()
        .find(|level| level.eq_ignore_ascii_case(configured.trim()))
        .unwrap_or("info");
    match (verbose, configured) {
        (true, "trace") => "trace",
        (true, _) => "debug",
        (false, level) => level,
    }
}

fn filter_directive(level: &str) -> String {
    format!("warn,tilemark={level},tilemark_core={level}")
}
