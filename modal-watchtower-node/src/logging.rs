use anyhow::Result;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

pub const LOG_FILE_NAME: &str = "watchtower.log";

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize logging with optional file output and configurable log level
pub fn init_logging(
    logs_path: Option<PathBuf>,
    logs_enabled: Option<bool>,
    log_level: Option<String>,
) -> Result<()> {
    let save_logs = logs_enabled.unwrap_or(true);
    let level_str = log_level.unwrap_or_else(|| "info".to_string());

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&level_str));
    builder.filter_level(parse_level(&level_str));

    match logs_path.filter(|_| save_logs) {
        Some(logs_dir) => {
            std::fs::create_dir_all(&logs_dir)?;
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(logs_dir.join(LOG_FILE_NAME))?;
            builder.target(env_logger::Target::Pipe(Box::new(DualWriter::new(log_file))));
            builder.try_init()?;
            log::info!(
                "Logging initialized. Logs will be written to both terminal and: {} (level: {})",
                logs_dir.display(),
                level_str
            );
        }
        None => {
            builder.try_init()?;
            log::info!(
                "Logging initialized. Logs will be written to terminal only (level: {})",
                level_str
            );
        }
    }

    Ok(())
}

/// Tees log output into the log file and stdout.
///
/// The terminal always gets the record, even when the file write fails, and
/// the file is flushed before a write error is reported so earlier records
/// are not lost.
struct DualWriter {
    file: std::fs::File,
}

impl DualWriter {
    fn new(file: std::fs::File) -> Self {
        Self { file }
    }
}

impl Write for DualWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let to_file = self.file.write_all(buf);
        io::stdout().write_all(buf)?;
        if let Err(e) = to_file {
            let _ = self.file.flush();
            return Err(e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let to_file = self.file.flush();
        io::stdout().flush()?;
        to_file
    }
}
