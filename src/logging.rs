use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,parley=info";
const DEFAULT_LOG_FILE: &str = "logs/parley.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    /// Rolling file under `logs/`. The default: the alternate screen owns
    /// the terminal, so stderr output would corrupt the interface.
    File,
    Stderr,
    Off,
}

fn parse_output(raw: Option<&str>) -> LogOutput {
    match raw.unwrap_or("file").trim().to_ascii_lowercase().as_str() {
        "stderr" => LogOutput::Stderr,
        "off" | "0" | "none" => LogOutput::Off,
        _ => LogOutput::File,
    }
}

fn parse_file_path(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn build_file_writer(path: &Path) -> std::io::Result<(non_blocking::NonBlocking, WorkerGuard)> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new("parley.log"));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global tracing subscriber. Controlled by `RUST_LOG` (filter),
/// `PARLEY_LOG` (`file` | `stderr` | `off`), and `PARLEY_LOG_FILE` (path).
/// Failures fall back to stderr rather than aborting startup.
pub fn init() {
    let output = parse_output(env::var("PARLEY_LOG").ok().as_deref());
    let file_path = parse_file_path(env::var("PARLEY_LOG_FILE").ok().as_deref());

    match output {
        LogOutput::Off => {}
        LogOutput::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(BoxMakeWriter::new(std::io::stderr))
                .try_init();
        }
        LogOutput::File => match build_file_writer(&file_path) {
            Ok((writer, guard)) => {
                let init_result = tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_writer(BoxMakeWriter::new(writer))
                    .with_ansi(false)
                    .try_init();
                if init_result.is_ok() {
                    let _ = LOG_GUARD.set(guard);
                }
            }
            Err(err) => {
                eprintln!(
                    "parley: failed to open log file '{}': {}; logging to stderr",
                    file_path.display(),
                    err
                );
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter())
                    .with_writer(BoxMakeWriter::new(std::io::stderr))
                    .try_init();
            }
        },
    }
}
