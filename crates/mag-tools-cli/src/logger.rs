use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};

/// Writes timestamped records to stderr so stdout stays clean for results
pub struct CliLogger {
    level: LevelFilter,
}

impl CliLogger {
    /// `verbosity` is the number of `-v` flags
    pub fn new(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        Self { level }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Library targets only matter when debugging
        if record.level() > Level::Info && !record.target().starts_with("mag") {
            return;
        }
        eprintln!(
            "{} {:<5} [{}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
