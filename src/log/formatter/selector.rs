use crate::log::config::LogKind;
use crate::log::formatter::{
    json_formatter::{JsonFormatter, JsonFormatterConfig},
    text_formatter::{TextFormatter, TextFormatterConfig},
    LogFormatter,
};
use std::sync::Arc;

/// 根据输出类型选择格式化器
///
/// - console: 着色的文本格式
/// - file: JSON 格式
pub fn formatter_for(kind: LogKind) -> Arc<dyn LogFormatter> {
    match kind {
        LogKind::Console => Arc::new(TextFormatter::new(TextFormatterConfig::default())),
        LogKind::File => Arc::new(JsonFormatter::new(JsonFormatterConfig::default())),
    }
}
