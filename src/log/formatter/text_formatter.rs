use crate::log::formatter::LogFormatter;
use crate::log::level::LogLevel;
use crate::log::log_record::LogRecord;
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Write;

/// 终端时间戳格式，精确到毫秒
pub const CONSOLE_TIME_LAYOUT: &str = "%Y/%m/%d %H:%M:%S%.3f";

/// TextFormatter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct TextFormatterConfig {
    /// 是否为级别着色
    #[default = true]
    pub colored: bool,

    /// 时间戳格式（chrono 格式串，本地时区）
    #[default(CONSOLE_TIME_LAYOUT.to_string())]
    pub time_layout: String,
}

/// 文本格式化器
///
/// 面向终端阅读的单行格式，字段之间以制表符分隔：
///
/// ```text
/// 2024/05/01 12:34:56.789	INFO	src/main.rs:10	server started	{"port":8080}
/// ```
pub struct TextFormatter {
    config: TextFormatterConfig,
}

impl TextFormatter {
    pub fn new(config: TextFormatterConfig) -> Self {
        Self { config }
    }
}

impl LogFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        let caller = record.caller();
        let mut result = String::with_capacity(
            64 + record.message.len() + caller.as_ref().map_or(0, |c| c.len()),
        );

        let time: DateTime<Local> = record.timestamp.into();
        write!(result, "{}", time.format(&self.config.time_layout))?;
        result.push('\t');

        if self.config.colored {
            result.push_str(colored_level(record.level));
        } else {
            result.push_str(record.level.as_str());
        }
        result.push('\t');

        if let Some(caller) = caller {
            result.push_str(&caller);
            result.push('\t');
        }

        result.push_str(&record.message);

        if !record.metadata.is_empty() {
            result.push('\t');
            result.push('{');
            for (i, (key, value)) in record.metadata.iter().enumerate() {
                if i > 0 {
                    result.push(',');
                }
                result.push_str(&serde_json::to_string(key)?);
                result.push(':');
                result.push_str(&serde_json::to_string(value)?);
            }
            result.push('}');
        }

        Ok(result)
    }
}

/// 带颜色的大写级别（预计算的静态字符串）
fn colored_level(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "\u{1b}[35mDEBUG\u{1b}[0m", // 品红
        LogLevel::Info => "\u{1b}[34mINFO\u{1b}[0m",   // 蓝色
        LogLevel::Warn => "\u{1b}[33mWARN\u{1b}[0m",   // 黄色
        LogLevel::Error => "\u{1b}[31mERROR\u{1b}[0m", // 红色
        LogLevel::Panic => "\u{1b}[31mPANIC\u{1b}[0m",
        LogLevel::Fatal => "\u{1b}[31mFATAL\u{1b}[0m",
    }
}
