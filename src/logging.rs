use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "catalog.log";
const DEFAULT_DIRECTIVE: &str = "catalog_cache=info";

/// Human-readable lines on stderr plus JSON lines in `logs/catalog.log.<date>`.
/// `RUST_LOG` overrides the default `catalog_cache=info` directive. Safe to
/// call more than once; later calls leave the first subscriber in place.
pub fn init_logging() {
    // Without the directory the file layer silently writes nothing
    let _ = fs::create_dir_all(LOG_DIR);

    let (json_writer, flush_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX));

    // stdout carries listings, so diagnostics stay off it
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let json_layer = fmt::layer().json().with_writer(json_writer);

    let directives =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let installed = tracing_subscriber::registry()
        .with(directives)
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .is_ok();

    // Buffered JSON lines are only flushed while the guard lives
    if installed {
        std::mem::forget(flush_guard);
    }
}
