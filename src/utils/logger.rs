// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::sync::OnceLock;

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Writes level-tagged lines to stderr, keeping stdout free for reports.
struct ConsoleLogger {
  level: LevelFilter,
}

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  let logger = LOGGER.get_or_init(|| ConsoleLogger { level });
  log::set_logger(logger).map(|()| log::set_max_level(level))
}

/// Tag printed in front of each message.
fn tag(level: Level) -> &'static str {
  match level {
    Level::Error => "[error]",
    Level::Warn => "[warn] ",
    Level::Info => "[info] ",
    Level::Debug => "[debug]",
    Level::Trace => "[trace]",
  }
}

impl log::Log for ConsoleLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= self.level
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let mut err = std::io::stderr().lock();
      let _ = writeln!(err, "{} {}", tag(record.level()), record.args());
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use log::Log;

  #[test]
  fn test_level_filter() {
    let logger = ConsoleLogger {
      level: LevelFilter::Info,
    };
    let warn = Metadata::builder().level(Level::Warn).build();
    let debug = Metadata::builder().level(Level::Debug).build();
    assert!(logger.enabled(&warn));
    assert!(!logger.enabled(&debug));
  }

  #[test]
  fn test_tags_are_aligned() {
    for level in [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace] {
      assert_eq!(tag(level).len(), 7);
    }
  }
}
