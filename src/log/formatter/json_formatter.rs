use crate::log::formatter::LogFormatter;
use crate::log::log_record::LogRecord;
use anyhow::Result;
use serde::Deserialize;
use smart_default::SmartDefault;

/// JsonFormatter 配置（保留扩展性）
#[derive(Debug, Clone, Deserialize, PartialEq, SmartDefault)]
#[serde(default)]
pub struct JsonFormatterConfig {}

/// JSON 格式化器
///
/// 每条记录输出为一个 JSON 对象，级别为不着色的大写名称
pub struct JsonFormatter {}

impl JsonFormatter {
    pub fn new(_: JsonFormatterConfig) -> Self {
        Self {}
    }
}

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        // 直接序列化 LogRecord，复用其 Serialize 实现
        Ok(serde_json::to_string(record)?)
    }
}
