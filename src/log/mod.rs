//! 日志模块
//!
//! 把一份配置组装成一个同时写多个目标的日志器，每个目标有自己的格式和最低级别。
//!
//! # 特性
//!
//! - 六个级别：Debug, Info, Warn, Error, Panic, Fatal
//! - 终端输出：带颜色的文本格式
//! - 文件输出：JSON 格式，按大小切分，按数量和天数清理，可选 gzip 压缩
//! - 某个目标写入失败不影响其他目标
//! - 调用位置按 `call_depth` 跳过业务代码自己的日志封装
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use logtee::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LoggingConfig::from_slice(br#"
//!         {
//!             "logs": {
//!                 "console": { "level": 1 },
//!                 "file": { "level": 3, "store": { "path": "/var/log/app.log" } }
//!             }
//!         }
//!     "#)?.validated();
//!
//!     let assembly = assemble(&config)?;
//!
//!     assembly.logger.info("Application started")?;
//!     assembly.logger.error("Connection failed")?;
//!
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod assembly;
pub mod bridge;
mod caller;
pub mod config;
pub mod formatter;
pub mod global;
pub mod level;
pub mod log_record;
pub mod logger;
pub mod macros;
pub mod setup;

// 重新导出核心类型
pub use appender::{ConsoleAppender, LogAppender, MultiAppender, RollingFileAppender};
pub use assembly::{assemble, assemble_with, Assembly};
pub use bridge::LogBridge;
pub use config::{
    LogKind, LoggingConfig, SinkConfig, SinkDescriptor, StoreConfig, CONFIG_KEY,
    DEFAULT_CALL_DEPTH, DEFAULT_CONSOLE_LEVEL, DEFAULT_FILE_LEVEL,
};
pub use formatter::{
    formatter_for, JsonFormatter, JsonFormatterConfig, LogFormatter, TextFormatter,
    TextFormatterConfig,
};
pub use level::LogLevel;
pub use log_record::{LogRecord, MetadataValue};
pub use logger::{Logger, Stage};
