use crate::log::level::LogLevel;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// 元数据值，支持多种类型
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Null,
    /// 任意 JSON 兼容的数据
    Json(Value),
}

impl Serialize for MetadataValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MetadataValue::String(s) => serializer.serialize_str(s),
            MetadataValue::I64(n) => serializer.serialize_i64(*n),
            MetadataValue::U64(n) => serializer.serialize_u64(*n),
            MetadataValue::F64(n) => serializer.serialize_f64(*n),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::Null => serializer.serialize_none(),
            MetadataValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{}", s),
            MetadataValue::I64(n) => write!(f, "{}", n),
            MetadataValue::U64(n) => write!(f, "{}", n),
            MetadataValue::F64(n) => write!(f, "{}", n),
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Json(v) => write!(f, "{}", v),
        }
    }
}

impl MetadataValue {
    /// 从任意实现了 Serialize 的结构体创建 MetadataValue
    ///
    /// 序列化失败时退化为 Null
    pub fn from_struct<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(json_value) => MetadataValue::Json(json_value),
            Err(_) => MetadataValue::Null,
        }
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::I64(n)
    }
}

impl From<i32> for MetadataValue {
    fn from(n: i32) -> Self {
        MetadataValue::I64(n as i64)
    }
}

impl From<u64> for MetadataValue {
    fn from(n: u64) -> Self {
        MetadataValue::U64(n)
    }
}

impl From<u32> for MetadataValue {
    fn from(n: u32) -> Self {
        MetadataValue::U64(n as u64)
    }
}

impl From<usize> for MetadataValue {
    fn from(n: usize) -> Self {
        MetadataValue::U64(n as u64)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::F64(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

impl From<Value> for MetadataValue {
    fn from(v: Value) -> Self {
        MetadataValue::Json(v)
    }
}

/// 日志记录
pub struct LogRecord {
    /// 日志级别
    pub level: LogLevel,
    /// 日志消息
    pub message: String,
    /// 调用方源文件路径
    pub file: Option<String>,
    /// 调用方行号
    pub line: Option<u32>,
    /// 时间戳
    pub timestamp: SystemTime,
    /// 自定义元数据（保持插入顺序）
    pub metadata: Vec<(String, MetadataValue)>,
}

impl LogRecord {
    /// 创建新的日志记录
    pub fn new(level: LogLevel, message: String) -> Self {
        Self {
            level,
            message,
            file: None,
            line: None,
            timestamp: SystemTime::now(),
            metadata: Vec::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// 设置位置信息（文件和行号）
    pub fn with_location(mut self, file: String, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// 调用位置的简短形式：`目录/文件:行号`
    ///
    /// 只保留路径的最后两段，绝对路径和相对路径的输出一致
    pub fn caller(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        let line = self.line?;
        Some(format!("{}:{}", trim_path(file), line))
    }

    /// 自 Unix 纪元以来的秒数（带小数部分）
    pub fn epoch_seconds(&self) -> f64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

fn trim_path(file: &str) -> &str {
    let bytes = file.as_bytes();
    let mut separators = bytes
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, b)| **b == b'/' || **b == b'\\')
        .map(|(i, _)| i);
    match (separators.next(), separators.next()) {
        (Some(_), Some(second)) => &file[second + 1..],
        _ => file,
    }
}

/// 结构化输出的字段布局：level, ts, caller, msg，随后是内联的 metadata
impl Serialize for LogRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        let caller = self.caller();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("level", self.level.as_str())?;
        map.serialize_entry("ts", &self.epoch_seconds())?;
        if let Some(caller) = &caller {
            map.serialize_entry("caller", caller)?;
        }
        map.serialize_entry("msg", &self.message)?;
        for (key, value) in &self.metadata {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
