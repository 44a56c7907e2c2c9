use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Maximum size per log file before rotation (~5 MB)
const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Number of rotated log files to keep
const MAX_LOG_FILES: usize = 5;
const LOG_STEM: &str = "fabagen";

/// `fabagen.log` for the active file, `fabagen.N.log` for rotated ones.
fn log_file_name(generation: usize) -> String {
    match generation {
        0 => format!("{}.log", LOG_STEM),
        n => format!("{}.{}.log", LOG_STEM, n),
    }
}

/// Logger that echoes to stderr and keeps a rotating run log on disk.
pub struct RunLogger {
    log_dir: Mutex<Option<PathBuf>>,
    debug_mode: AtomicBool,
}

impl RunLogger {
    pub fn new(debug: bool) -> Self {
        Self {
            log_dir: Mutex::new(None),
            debug_mode: AtomicBool::new(debug),
        }
    }

    /// Default location: `<data_local_dir>/fabagen/logs`.
    pub fn default_log_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("fabagen")
            .join("logs")
    }

    /// Initialise the persistent log directory.
    pub fn init_log_dir(&self, log_dir: &Path) {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("[RunLogger] Failed to create log directory {:?}: {}", log_dir, e);
            return;
        }

        if let Ok(mut dir) = self.log_dir.lock() {
            *dir = Some(log_dir.to_path_buf());
        }

        self.write_to_file(
            "INFO",
            &format!(
                "=== fabagen run started at {} ===",
                Local::now().format("%Y-%m-%d %H:%M:%S %Z")
            ),
        );
    }

    /// The current (active) log file path.
    pub fn current_log_path(&self) -> Option<PathBuf> {
        self.log_dir.lock().ok()?.as_ref().map(|d| d.join(log_file_name(0)))
    }

    pub fn is_debug(&self) -> bool {
        self.debug_mode.load(Ordering::Relaxed)
    }

    /// Shifts every generation up by one; the oldest falls off after MAX_LOG_FILES.
    fn rotate_if_needed(&self) {
        let Some(current) = self.current_log_path() else { return };
        let file_size = fs::metadata(&current).map(|m| m.len()).unwrap_or(0);
        if file_size < MAX_LOG_FILE_SIZE {
            return;
        }

        let Some(dir) = current.parent() else { return };

        for generation in (0..MAX_LOG_FILES).rev() {
            let from = dir.join(log_file_name(generation));
            if from.exists() {
                let _ = fs::rename(&from, dir.join(log_file_name(generation + 1)));
            }
        }
    }

    /// Append a formatted line to the persistent log file.
    fn write_to_file(&self, level: &str, message: &str) {
        self.rotate_if_needed();
        let Some(path) = self.current_log_path() else { return };

        let line = format!(
            "[{}] [{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            message
        );

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = file.write_all(line.as_bytes());
        }
    }
}

impl Log for RunLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info || self.is_debug()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        eprintln!("{} - {}", record.level(), message);
        self.write_to_file(record.level().as_str(), &message);
    }

    fn flush(&self) {}
}

/// Installs the process-wide logger. `log_dir` of `None` uses [`RunLogger::default_log_dir`].
pub fn init(debug: bool, log_dir: Option<&Path>) -> Result<(), log::SetLoggerError> {
    let logger = RunLogger::new(debug);
    let dir = log_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(RunLogger::default_log_dir);
    logger.init_log_dir(&dir);

    log::set_boxed_logger(Box::new(logger)).map(|()| {
        log::set_max_level(if debug { LevelFilter::Debug } else { LevelFilter::Info })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let logger = RunLogger::new(false);
        logger.init_log_dir(dir.path());

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("00.faba written"))
                .build(),
        );

        let content = fs::read_to_string(dir.path().join(log_file_name(0))).unwrap();
        assert!(content.contains("run started"));
        assert!(content.contains("[INFO] 00.faba written"));
    }

    #[test]
    fn debug_records_need_debug_mode() {
        let dir = TempDir::new().unwrap();
        let logger = RunLogger::new(false);
        logger.init_log_dir(dir.path());

        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("staged"))
                .build(),
        );

        let content = fs::read_to_string(dir.path().join(log_file_name(0))).unwrap();
        assert!(!content.contains("staged"));
    }

    #[test]
    fn rotates_large_log() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(log_file_name(0)), vec![b'x'; MAX_LOG_FILE_SIZE as usize]).unwrap();

        let logger = RunLogger::new(true);
        logger.init_log_dir(dir.path());

        assert!(dir.path().join("fabagen.1.log").exists());
        let fresh = fs::metadata(dir.path().join(log_file_name(0))).unwrap().len();
        assert!(fresh < MAX_LOG_FILE_SIZE);
    }

    #[test]
    fn rotation_shifts_older_generations() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fabagen.1.log"), "previous").unwrap();
        fs::write(dir.path().join("fabagen.log"), vec![b'x'; MAX_LOG_FILE_SIZE as usize]).unwrap();

        let logger = RunLogger::new(false);
        logger.init_log_dir(dir.path());

        assert_eq!(fs::read_to_string(dir.path().join("fabagen.2.log")).unwrap(), "previous");
        assert_eq!(
            fs::metadata(dir.path().join("fabagen.1.log")).unwrap().len(),
            MAX_LOG_FILE_SIZE
        );
    }

    #[test]
    fn file_names_share_one_stem() {
        assert_eq!(log_file_name(0), "fabagen.log");
        assert_eq!(log_file_name(3), "fabagen.3.log");
    }
}
