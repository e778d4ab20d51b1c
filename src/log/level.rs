use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// 日志级别
///
/// 固定的升序刻度，配置中以整数 0..=5 表示
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// 调试信息
    Debug = 0,
    /// 一般信息
    Info = 1,
    /// 警告信息
    Warn = 2,
    /// 错误信息
    Error = 3,
    /// 输出后触发 panic
    Panic = 4,
    /// 输出后终止进程
    Fatal = 5,
}

impl LogLevel {
    /// 所有级别，按严重程度升序
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Panic,
        LogLevel::Fatal,
    ];

    /// 从整数序号解析级别，超出 [Debug, Fatal] 范围时返回 None
    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// 整数序号
    pub fn ordinal(self) -> i64 {
        self as i64
    }

    /// 大写名称
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Panic => "PANIC",
            LogLevel::Fatal => "FATAL",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(format!("invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ordinal = i64::deserialize(deserializer)?;
        LogLevel::from_ordinal(ordinal).ok_or_else(|| {
            serde::de::Error::custom(format!("log level out of range: {}", ordinal))
        })
    }
}
