// Logging for tierpool
//
// Thin setup layer over the `tracing` ecosystem. The pool itself only emits
// events; installing a subscriber is left to the application, which can use
// one of the initializers below or bring its own.
//
// # Usage Examples
//
// ```rust
// use tierpool::logging;
//
// // INFO level, human readable console output
// logging::init_default();
//
// // DEBUG for the pool, TRACE for every enqueue
// logging::init_development();
//
// // JSON lines for log aggregation
// logging::init_production();
// ```
//
// Worker threads inherit the dispatcher that was current when the pool was
// constructed, so a scoped subscriber set with
// `tracing::subscriber::with_default` also captures worker events.

use std::io;
use std::sync::Once;
use tracing::{Level, Subscriber};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id; worker names identify the worker
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter = EnvFilter::from_default_env().add_directive(config.level.into());
    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let registry = tracing_subscriber::registry().with(env_filter(&config));

        let subscriber: Box<dyn Subscriber + Send + Sync> = if config.json_format {
            Box::new(registry.with(fmt::layer().json().flatten_event(true)
                .with_thread_names(config.show_thread_info)))
        } else {
            let fmt_layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_info)
                .with_thread_ids(config.show_thread_info);
            if config.show_time {
                Box::new(registry.with(fmt_layer))
            } else {
                Box::new(registry.with(fmt_layer.without_time()))
            }
        };

        set_global_subscriber(subscriber);
    });
}

fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Opens `path` for appending, creating it if needed.
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Box::new(file))
}

/// Initialize logging with both console and file output
///
/// The file is opened up front so a bad path is reported to the caller;
/// file output is always plain text with file, line and thread info.
pub fn init_with_file(config: LogConfig, log_file: &str) -> Result<(), io::Error> {
    file_writer(log_file)?;

    INIT.call_once(|| {
        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let log_file_path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || match file_writer(&log_file_path) {
                Ok(writer) => writer,
                Err(_) => Box::new(std::io::stderr()),
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter(&config))
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// INFO level, human-readable console output.
pub fn init_default() {
    init(LogConfig::default());
}

/// Settings for local development
///
/// - DEBUG for the pool, TRACE for queue operations
/// - Colorized output with file/line information
/// - Thread names shown, so each line names its worker
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        json_format: false,
        show_file_line: true,
        show_thread_info: true,
        show_time: true,
        target_filters: Some("tierpool=debug,tierpool::scheduler::queue=trace".to_string()),
    });
}

/// Settings for production
///
/// JSON lines, no file/line information, thread names kept for diagnosis.
/// `RUST_LOG` still applies on top of the INFO default.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// Settings for tests: warnings and errors only, no timestamps.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Span covering everything the pool does under one name.
///
/// ```rust
/// let span = tierpool::pool_span!("ingest");
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! pool_span {
    ($pool:expr) => {
        tracing::info_span!("pool", name = $pool)
    };
    ($pool:expr, $($fields:tt)*) => {
        tracing::info_span!("pool", name = $pool, $($fields)*)
    };
}

/// Span covering one task's execution on a worker.
#[macro_export]
macro_rules! task_span {
    ($task_id:expr, $priority:expr) => {
        tracing::debug_span!("task", id = %$task_id, priority = %$priority)
    };
    ($task_id:expr, $priority:expr, $($fields:tt)*) => {
        tracing::debug_span!("task", id = %$task_id, priority = %$priority, $($fields)*)
    };
}

/// Log lifecycle events of the pool and its workers
///
/// ```rust
/// tierpool::log_lifecycle!("worker", "tierpool-worker-0", "started");
/// tierpool::log_lifecycle!("pool", "ingest", "stop requested", queued = 4);
/// ```
#[macro_export]
macro_rules! log_lifecycle {
    ($component:expr, $name:expr, $event:expr) => {
        tracing::info!(component = $component, name = $name, event = $event);
    };
    ($component:expr, $name:expr, $event:expr, $($fields:tt)*) => {
        tracing::info!(component = $component, name = $name, event = $event, $($fields)*);
    };
}

/// Log error events
///
/// ```rust
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "worker lost");
/// tierpool::log_error!(error, component = "pool");
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error);
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*);
    };
}

/// Log scheduling events
///
/// ```rust
/// tierpool::log_scheduler!("tier_queue", "task_admitted", priority = "high");
/// ```
#[macro_export]
macro_rules! log_scheduler {
    ($scheduler:expr, $event:expr) => {
        tracing::debug!(scheduler = $scheduler, event = $event);
    };
    ($scheduler:expr, $event:expr, $($fields:tt)*) => {
        tracing::debug!(scheduler = $scheduler, event = $event, $($fields)*);
    };
}

/// Get the current tracing dispatcher
///
/// The pool captures this at construction and installs it on every worker
/// thread.
#[inline]
pub fn current_subscriber() -> tracing::Dispatch {
    tracing::dispatcher::get_default(|d| d.clone())
}

// Re-export the most commonly used tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
