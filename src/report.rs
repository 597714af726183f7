//! Log sink for a terminal that is busy drawing the UI: records are kept in a
//! small ring and shown in the messages panel instead of going to stderr.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::{const_mutex, Mutex};
use std::collections::VecDeque;

const CAPACITY: usize = 64;

static MESSAGES: MessageLog = MessageLog::new(LevelFilter::Debug);

pub struct MessageLog {
    level: LevelFilter,
    lines: Mutex<VecDeque<String>>,
}

impl MessageLog {
    pub const fn new(level: LevelFilter) -> Self {
        MessageLog {
            level,
            lines: const_mutex(VecDeque::new()),
        }
    }

    /// up to `count` of the newest messages, oldest first
    pub fn recent(&self, count: usize) -> Vec<String> {
        let lines = self.lines.lock();
        let skip = lines.len().saturating_sub(count);
        lines.iter().skip(skip).cloned().collect()
    }
}

impl Log for MessageLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut lines = self.lines.lock();
        if lines.len() == CAPACITY {
            lines.pop_front();
        }
        lines.push_back(format!("{:<5} {}", record.level(), record.args()));
    }

    fn flush(&self) {}
}

/// install the shared message log as the global logger
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&MESSAGES)?;
    log::set_max_level(level);
    Ok(())
}

/// newest messages from the global log
pub fn recent(count: usize) -> Vec<String> {
    MESSAGES.recent(count)
}
