//! Minimal logger.
//!
//! Progress messages go to stderr as `[elapsed LEVEL] message`. Records from
//! other crates are only shown at `warn` and above so dependency chatter does
//! not drown the per-sequence progress lines. Use `init_with_level` once at
//! startup.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_TARGET_PREFIX: &str = "frame_manager";

struct ProgressLogger {
    level: LevelFilter,
    started: Instant,
}

impl ProgressLogger {
    fn is_own_target(target: &str) -> bool {
        target.starts_with(OWN_TARGET_PREFIX)
    }
}

impl Log for ProgressLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() > self.level {
            return false;
        }
        Self::is_own_target(metadata.target()) || metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5}] {}",
            elapsed,
            record.level(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ProgressLogger> = OnceLock::new();

/// Install the progress logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| ProgressLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Map `-v`/`-q` style counters onto a level filter.
///
/// `info` is the baseline so the per-sequence progress lines are visible.
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,{OWN_TARGET_PREFIX}=info")));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .with_writer(std::io::stderr)
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0, false), LevelFilter::Info);
        assert_eq!(level_from_verbosity(1, false), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(5, false), LevelFilter::Trace);
        assert_eq!(level_from_verbosity(3, true), LevelFilter::Warn);
    }

    #[test]
    fn foreign_targets_are_filtered_below_warn() {
        let logger = ProgressLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        let own = Metadata::builder()
            .level(Level::Info)
            .target("frame_manager::render")
            .build();
        let foreign_info = Metadata::builder()
            .level(Level::Info)
            .target("walkdir")
            .build();
        let foreign_warn = Metadata::builder()
            .level(Level::Warn)
            .target("walkdir")
            .build();
        assert!(logger.enabled(&own));
        assert!(!logger.enabled(&foreign_info));
        assert!(logger.enabled(&foreign_warn));
    }
}
