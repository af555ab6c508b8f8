//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize the `flexi_logger` backend exactly once per process, either
//!   as rolling files in a directory or as stderr output.
//! - Emit stable, metadata-only diagnostic events.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and target.
//! - Initialization must not panic.
//! - Re-initialization with a different level or target is rejected.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "datajpa";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rolling files under an absolute directory.
    Directory(PathBuf),
}

impl Display for LogTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Initializes rolling file logging under `log_dir`.
///
/// # Errors
/// - Returns an error when `level` is unsupported.
/// - Returns an error when `log_dir` is empty, non-absolute, or cannot be created.
/// - Returns an error when logging is already active with another level or target.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let target = LogTarget::Directory(normalize_log_dir(log_dir)?);
    init_with_target(level, target)
}

/// Initializes logging to stderr, for interactive runs without a log directory.
pub fn init_stderr_logging(level: &str) -> Result<(), String> {
    init_with_target(level, LogTarget::Stderr)
}

/// Returns `(level, target)` of the active logger, or `None` before init.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn init_with_target(level: &str, target: LogTarget) -> Result<(), String> {
    let normalized_level = normalize_level(level)?;

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(normalized_level, &target))?;
    ensure_same_config(state, normalized_level, &target)
}

fn start_logger(level: &'static str, target: &LogTarget) -> Result<LoggingState, String> {
    let builder = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let builder = match target {
        LogTarget::Stderr => builder
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                format!("failed to create log directory `{}`: {err}", dir.display())
            })?;
            builder
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };

    let logger = builder
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    install_panic_hook_once();

    info!(
        "event=app_start module=core status=ok platform={} build_mode={} version={}",
        std::env::consts::OS,
        build_mode(),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=logging_init module=core status=ok level={} target={}",
        level, target
    );

    Ok(LoggingState {
        level,
        target: target.clone(),
        _logger: logger,
    })
}

fn ensure_same_config(
    state: &LoggingState,
    level: &'static str,
    target: &LogTarget,
) -> Result<(), String> {
    if &state.target != target {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            state.target, target
        ));
    }
    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            state.level, level
        ));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Payload may echo request data; keep it to one capped line.
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_summary(panic_info);
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location, payload
        );
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}

fn panic_payload_summary(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = if let Some(message) = info.payload().downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = info.payload().downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    sanitize_message(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
