//! Tracing bootstrap for hosts embedding the reader core.
//!
//! The core emits events under a fixed set of targets ([`TARGETS`]). Nothing is printed until a
//! host calls [`init`], which installs a stderr sink and, unless disabled, a rolling file sink.
//! The first successful call wins; later calls return the installed handle unchanged.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{Context, anyhow};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::Rotation;
use tracing_log::AsLog;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use crate::Result;

pub use tracing_subscriber::filter::LevelFilter as LogLevel;

/// Event targets used across the crate.
pub const TARGETS: [&str; 5] = ["nav", "geometry", "reader", "config", "store::progress"];

/// Checked in order when no explicit filter is configured.
const FILTER_ENV_VARS: [&str; 2] = ["COMIC_READER_LOG", "RUST_LOG"];

static INSTALLED: OnceLock<LogHandle> = OnceLock::new();

/// Where and how log files are written.
#[derive(Debug, Clone)]
pub struct FileSink {
    pub directory: PathBuf,
    /// File names are `<prefix>.<date>.log`.
    pub prefix: String,
    pub rotation: LogRotation,
    /// Older files beyond this count are removed at startup. `None` keeps everything.
    pub keep: Option<usize>,
    pub level: LevelFilter,
}

impl FileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: "comic-reader".to_string(),
            rotation: LogRotation::Daily,
            keep: Some(7),
            level: LevelFilter::DEBUG,
        }
    }

    /// `<data dir>/logs` for the reader, or a temp directory when none can be resolved.
    pub fn in_data_dir() -> Self {
        let directory = directories::ProjectDirs::from("com", "ComicReader", "comic-reader")
            .map(|dirs| dirs.data_dir().join("logs"))
            .unwrap_or_else(|| std::env::temp_dir().join("comic-reader-logs"));
        Self::new(directory)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Logging requested by the host.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `None` logs to stderr only.
    pub file: Option<FileSink>,
    pub console_level: LevelFilter,
    /// Directive such as `nav=trace,geometry=debug`. Falls back to [`FILTER_ENV_VARS`] and then
    /// to [`default_directive`].
    pub filter: Option<String>,
    /// Forward `log` crate records into `tracing`.
    pub capture_log: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: Some(FileSink::in_data_dir()),
            console_level: if cfg!(debug_assertions) {
                LevelFilter::INFO
            } else {
                LevelFilter::WARN
            },
            filter: None,
            capture_log: true,
        }
    }
}

impl LogConfig {
    pub fn console_only() -> Self {
        Self { file: None, ..Self::default() }
    }

    pub fn with_file(mut self, sink: FileSink) -> Self {
        self.file = Some(sink);
        self
    }

    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = Some(directive.into());
        self
    }

    fn max_level(&self) -> LevelFilter {
        let file_level = self.file.as_ref().map_or(LevelFilter::OFF, |sink| sink.level);
        file_level.max(self.console_level)
    }

    fn resolved_directive(&self) -> String {
        self.filter
            .clone()
            .or_else(|| {
                FILTER_ENV_VARS
                    .iter()
                    .filter_map(|var| std::env::var(var).ok())
                    .find(|directive| !directive.trim().is_empty())
            })
            .unwrap_or_else(default_directive)
    }
}

/// Everything outside the crate at `warn`; the crate's own targets at `debug` in debug builds
/// and `info` in release builds.
pub fn default_directive() -> String {
    let level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let mut directive = String::from("warn");
    for target in TARGETS {
        directive.push_str(&format!(",{target}={level}"));
    }
    directive
}

/// Installed logging. Dropping it would stop the file writer, so it lives in a static.
#[derive(Debug)]
pub struct LogHandle {
    _file_guard: Option<WorkerGuard>,
    file: Option<FileSink>,
    directive: String,
}

impl LogHandle {
    pub fn file_sink(&self) -> Option<&FileSink> {
        self.file.as_ref()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.file.as_ref().map(|sink| sink.directory.as_path())
    }

    pub fn directive(&self) -> &str {
        &self.directive
    }
}

pub fn init(config: LogConfig) -> Result<&'static LogHandle> {
    if let Some(handle) = INSTALLED.get() {
        return Ok(handle);
    }

    let handle = install(config)?;
    let _ = INSTALLED.set(handle);
    INSTALLED.get().ok_or_else(|| anyhow!("log handle missing after initialisation"))
}

fn install(config: LogConfig) -> Result<LogHandle> {
    if config.capture_log {
        // A `log` logger may already be set by the host; tracing events are unaffected.
        let max_level = config.max_level().as_log();
        let _ = tracing_log::LogTracer::builder().with_max_level(max_level).init();
    }

    let directive = config.resolved_directive();
    let env_filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("parsing log filter directive `{directive}`"))?;

    let (file_layer, file_guard) = match &config.file {
        Some(sink) => {
            let (writer, guard) = open_file_sink(sink)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_line_number(true)
                .with_filter(sink.level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(config.console_level);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(LogHandle { _file_guard: file_guard, file: config.file, directive })
}

fn open_file_sink(
    sink: &FileSink,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&sink.directory)
        .with_context(|| format!("creating log directory at {}", sink.directory.display()))?;

    if let Some(keep) = sink.keep.filter(|keep| *keep > 0) {
        for stale in stale_logs(&sink.directory, &sink.prefix, keep)? {
            let _ = fs::remove_file(stale);
        }
    }

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(sink.rotation.into())
        .filename_prefix(&sink.prefix)
        .filename_suffix("log")
        .build(&sink.directory)
        .context("creating rolling log appender")?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Files in `dir` named after `prefix`, oldest first, beyond the newest `keep`.
fn stale_logs(dir: &Path, prefix: &str, keep: usize) -> Result<Vec<PathBuf>> {
    let mut logs: Vec<(SystemTime, PathBuf)> = fs::read_dir(dir)
        .with_context(|| format!("reading log directory at {}", dir.display()))?
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let stem = path.file_stem().and_then(OsStr::to_str)?;
            if !stem.starts_with(prefix) {
                return None;
            }
            let meta = entry.metadata().ok().filter(|meta| meta.is_file())?;
            Some((meta.modified().unwrap_or(SystemTime::UNIX_EPOCH), path))
        })
        .collect();

    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    Ok(logs.into_iter().take(excess).map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_names_crate_targets() {
        let directive = default_directive();
        assert!(directive.starts_with("warn,"));
        for target in TARGETS {
            assert!(directive.contains(&format!("{target}=")), "missing {target}");
        }
        assert!(EnvFilter::try_new(&directive).is_ok());
    }

    #[test]
    fn explicit_filter_beats_environment() {
        let config = LogConfig::console_only().with_filter("nav=trace");
        assert_eq!(config.resolved_directive(), "nav=trace");
        assert_eq!(config.max_level(), config.console_level);

        let with_file = config.with_file(FileSink::new("logs"));
        assert_eq!(with_file.max_level(), LevelFilter::DEBUG);
    }

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let sink =
            FileSink { prefix: "test-log".into(), ..FileSink::new(temp.path().join("logs")) };
        let config = LogConfig::default().with_file(sink).with_filter("nav=trace");

        let first = init(config.clone()).expect("init once");
        assert!(first.directory().is_some_and(Path::exists));
        tracing::debug!(target: "nav", "logging initialised for test");

        let second = init(LogConfig::console_only()).expect("init twice");
        assert!(std::ptr::eq(first, second));
        assert_eq!(second.directive(), "nav=trace");
        assert_eq!(second.file_sink().map(|sink| sink.prefix.as_str()), Some("test-log"));
    }

    #[test]
    fn stale_logs_are_the_oldest_matching_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        for name in ["reader.1.log", "reader.2.log", "reader.3.log", "other.log"] {
            fs::write(temp.path().join(name), b"x").expect("write log");
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        let stale = stale_logs(temp.path(), "reader", 2).expect("scan");
        assert_eq!(stale, vec![temp.path().join("reader.1.log")]);
        assert!(stale_logs(temp.path(), "reader", 5).expect("scan").is_empty());
    }
}
