//! Log backend.
//!
//! Installs an `env_logger` logger that prints every record as
//!
//! ```text
//! (16.10.2026 - 08:00:00) [INFO] Feed 2 portions
//! ```
//!
//! to stderr and, when enabled, appends the same lines to
//! `logger_<ddmmyy_HHMMSS>.log` in the configured directory. `RUST_LOG`
//! overrides the default `info` filter.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use env_logger::{Builder, Target};
use log::{Level, LevelFilter};

use crate::config::FeederConfig;

/// Name of the log file for a process started at `started`.
pub fn log_file_name<Tz: TimeZone>(started: &DateTime<Tz>) -> String
where
    Tz::Offset: core::fmt::Display,
{
    format!("logger_{}.log", started.format("%d%m%y_%H%M%S"))
}

/// Level tag as it appears in the log lines.
fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Writes every buffer to stderr and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A broken console must not stop the file log.
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

fn open_log_file(dir: &Path) -> io::Result<(File, PathBuf)> {
    let path = dir.join(log_file_name(&Local::now()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Install the global logger. Returns the log file path when file logging
/// is enabled.
pub fn init_logger(config: &FeederConfig) -> io::Result<Option<PathBuf>> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "({}) [{}] {}",
                Local::now().format("%d.%m.%Y - %H:%M:%S"),
                level_tag(record.level()),
                record.args()
            )
        });

    let path = if config.log_to_file {
        let (file, path) = open_log_file(Path::new(&config.log_dir))?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
        Some(path)
    } else {
        builder.target(Target::Stderr);
        None
    };

    builder.try_init().map_err(io::Error::other)?;
    Ok(path)
}
