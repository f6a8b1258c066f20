// Bounded in-memory log sink for diskmgmt
//
// Keeps the most recent MAX_LOG_ENTRIES records so a console can show what
// the engine did without a terminal logger.

use std::collections::VecDeque;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub const MAX_LOG_ENTRIES: usize = 64;

/// One captured record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
}

pub struct RingLogger {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

static LOGGER: RingLogger = RingLogger::new(MAX_LOG_ENTRIES);

impl RingLogger {
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    // Level filtering already happened in the `log` macros
    fn log(&self, record: &Record) {
        if self.capacity == 0 {
            return;
        }
        let entry = LogEntry {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        if let Ok(mut entries) = self.entries.lock() {
            if entries.len() == self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
    }

    fn flush(&self) {}
}

/// Install the global ring logger.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Records captured by the global logger, oldest first.
pub fn get_logs() -> Vec<LogEntry> {
    LOGGER.entries()
}

pub fn log_count() -> usize {
    LOGGER.len()
}
