//! `log` crate 桥接
//!
//! 第三方库通过 `log::info!` 等宏输出的日志经由 [`LogBridge`] 进入组合日志器。
//! `log` 没有 panic/fatal 级别，`Trace` 按 `Debug` 处理。

use crate::log::{LogLevel, LogRecord, Logger};
use std::sync::Arc;

/// 实现 `log::Log` 的适配器
pub struct LogBridge {
    logger: Arc<Logger>,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

fn level_of(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug | log::Level::Trace => LogLevel::Debug,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(level_of(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut entry = LogRecord::new(level_of(record.level()), record.args().to_string());
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            entry = entry.with_location(file.to_string(), line);
        }
        if record.module_path() != Some(record.target()) {
            entry = entry.with_metadata("target", record.target());
        }

        if let Err(e) = self.logger.log(entry) {
            eprintln!("logtee: failed to write log record: {}", e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.logger.sync() {
            eprintln!("logtee: failed to flush logger: {}", e);
        }
    }
}

/// 把 logger 安装为 `log` crate 的全局实现
///
/// `log` 的全局实现只能设置一次，再次调用返回错误
pub fn install(logger: Arc<Logger>, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::testing::MemoryAppender;
    use crate::log::formatter::{JsonFormatter, JsonFormatterConfig};
    use crate::log::Stage;
    use log::Log;

    fn bridge(level: LogLevel) -> (LogBridge, Arc<MemoryAppender>) {
        let memory = Arc::new(MemoryAppender::new());
        let logger = Logger::new(
            vec![Stage::new(
                Arc::new(JsonFormatter::new(JsonFormatterConfig::default())),
                memory.clone(),
                level,
            )],
            1,
        );
        (LogBridge::new(Arc::new(logger)), memory)
    }

    #[test]
    fn test_bridge_forwards_records() {
        let (bridge, memory) = bridge(LogLevel::Info);

        bridge.log(
            &log::Record::builder()
                .args(format_args!("connected to {}", "db"))
                .level(log::Level::Warn)
                .target("pool")
                .module_path(Some("app::db"))
                .file(Some("src/db/pool.rs"))
                .line(Some(42))
                .build(),
        );
        bridge.flush();

        let line: serde_json::Value = serde_json::from_str(&memory.lines()[0]).unwrap();
        assert_eq!(line["level"], "WARN");
        assert_eq!(line["msg"], "connected to db");
        assert_eq!(line["caller"], "db/pool.rs:42");
        assert_eq!(line["target"], "pool");
    }

    #[test]
    fn test_bridge_filters_levels() {
        let (bridge, memory) = bridge(LogLevel::Info);

        let metadata = log::Metadata::builder().level(log::Level::Trace).build();
        assert!(!bridge.enabled(&metadata));

        bridge.log(
            &log::Record::builder()
                .args(format_args!("noisy"))
                .level(log::Level::Debug)
                .build(),
        );
        assert!(memory.contents().is_empty());
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_of(log::Level::Trace), LogLevel::Debug);
        assert_eq!(level_of(log::Level::Debug), LogLevel::Debug);
        assert_eq!(level_of(log::Level::Error), LogLevel::Error);
    }
}
