//! logtee - 多目标日志组装
//!
//! 从一份 JSON 配置组装出同时写终端和滚动文件的日志器，并通过宿主接口发布给应用的其他组件。
//!
//! ## 模块
//!
//! - **log**: 配置校验、格式化、输出、组合日志器
//! - **host**: 宿主接口与内存组件容器
//! - **global**: 进程级全局 logger 与便捷函数
//! - **error**: 初始化错误

pub mod error;
pub mod host;
pub mod log;

pub use crate::log::global;

// 重新导出主要的公共 API
pub use error::SetupError;
pub use host::{CancelSignal, Host, Registry, Task};
pub use crate::log::{
    assemble, Assembly, LogAppender, LogFormatter, LogLevel, LogRecord, Logger, LoggingConfig,
    MetadataValue,
};
