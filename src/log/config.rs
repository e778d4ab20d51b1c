//! 日志配置与校验
//!
//! 配置中的非法值不会报错，而是回退到默认值：日志初始化本身需要用来报告其他错误，
//! 不能成为启动失败的来源。

use crate::error::SetupError;
use crate::log::level::LogLevel;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::BTreeMap;
use std::str::FromStr;

/// 本模块在宿主中的注册名
pub const CONFIG_KEY: &str = "logtee";

/// 终端输出的默认级别
pub const DEFAULT_CONSOLE_LEVEL: LogLevel = LogLevel::Debug;

/// 文件输出的默认级别
pub const DEFAULT_FILE_LEVEL: LogLevel = LogLevel::Debug;

/// 默认调用深度
pub const DEFAULT_CALL_DEPTH: i64 = 1;

/// 日志输出类型
///
/// 顺序固定：终端在前，文件在后
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Console,
    File,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Console => "console",
            LogKind::File => "file",
        }
    }

    /// 该类型的默认日志级别
    pub fn default_level(self) -> LogLevel {
        match self {
            LogKind::Console => DEFAULT_CONSOLE_LEVEL,
            LogKind::File => DEFAULT_FILE_LEVEL,
        }
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(LogKind::Console),
            "file" => Ok(LogKind::File),
            _ => Err(format!("invalid log type: {}", s)),
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文件日志的存储与切分策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct StoreConfig {
    /// 日志文件路径
    ///
    /// 默认值 `./test.log` 仅用于测试，生产环境必须显式配置
    #[default("./test.log".to_string())]
    pub path: String,

    /// 单个文件最大大小（MB），超过后切分
    #[default(1024)]
    pub max_size: i64,

    /// 保留的切分文件数量
    #[default(7)]
    pub max_backups: i64,

    /// 切分文件最长保留天数
    #[default(30)]
    pub max_age: i64,

    /// 是否用 gzip 压缩切分后的文件
    #[default(true)]
    pub compress: bool,

    /// 切分文件名中的时间戳是否使用本地时区（否则使用 UTC）
    #[default(true)]
    pub local_zone: bool,
}

impl StoreConfig {
    /// 逐字段补全默认值：空路径或非正数的字段单独替换，其余字段保持不变
    pub fn validated(&self) -> StoreConfig {
        let defaults = StoreConfig::default();
        StoreConfig {
            path: if self.path.is_empty() {
                defaults.path
            } else {
                self.path.clone()
            },
            max_size: positive_or(self.max_size, defaults.max_size),
            max_backups: positive_or(self.max_backups, defaults.max_backups),
            max_age: positive_or(self.max_age, defaults.max_age),
            compress: self.compress,
            local_zone: self.local_zone,
        }
    }
}

fn positive_or(value: i64, default: i64) -> i64 {
    if value > 0 {
        value
    } else {
        default
    }
}

/// 单个日志输出的配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SinkConfig {
    /// 最低日志级别，0=debug ... 5=fatal
    pub level: i64,

    /// 文件存储策略，仅 file 类型使用
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
}

impl SinkConfig {
    fn validated(&self, kind: LogKind) -> SinkConfig {
        let level = match LogLevel::from_ordinal(self.level) {
            Some(level) => level,
            None => kind.default_level(),
        };
        let store = match kind {
            LogKind::Console => None,
            LogKind::File => Some(match &self.store {
                Some(store) => store.validated(),
                None => StoreConfig::default(),
            }),
        };
        SinkConfig {
            level: level.ordinal(),
            store,
        }
    }
}

/// 校验后的单个日志输出描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    pub kind: LogKind,
    pub level: LogLevel,
    pub store: Option<StoreConfig>,
}

/// 日志模块配置
///
/// ```json
/// {
///     "logs": {
///         "console": { "level": 1 },
///         "file": { "level": 3, "store": { "path": "/var/log/app.log" } }
///     },
///     "call_depth": 1,
///     "coexist": false,
///     "run_after": ["config"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志输出类型 -> 输出配置
    #[default(Some(default_logs()))]
    pub logs: Option<BTreeMap<String, SinkConfig>>,

    /// 调用位置向外跳过的栈帧数
    ///
    /// 大于 1 时每条输出的记录都要捕获并解析一次调用栈，开销明显高于默认值 1
    #[default(DEFAULT_CALL_DEPTH)]
    pub call_depth: i64,

    /// 是否允许与宿主中已存在的其他 logger 共存（目前仅作记录）
    pub coexist: bool,

    /// 初始化前必须完成的任务
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
}

fn default_logs() -> BTreeMap<String, SinkConfig> {
    let mut logs = BTreeMap::new();
    logs.insert(
        LogKind::Console.as_str().to_string(),
        SinkConfig {
            level: DEFAULT_CONSOLE_LEVEL.ordinal(),
            store: None,
        },
    );
    logs
}

impl LoggingConfig {
    /// 从 JSON 字节解析配置
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SetupError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// 校验并补全默认值，返回一份新的规范化配置
    ///
    /// - 未知的输出类型被丢弃
    /// - 没有任何可用输出时使用默认终端输出
    /// - 超出范围的级别回退到该类型的默认级别
    /// - `call_depth <= 0` 时使用默认值
    ///
    /// 对相同输入多次调用结果相同，且对结果再次调用不会产生变化
    pub fn validated(&self) -> LoggingConfig {
        let mut logs = BTreeMap::new();
        for (name, sink) in self.logs.iter().flatten() {
            if let Ok(kind) = name.parse::<LogKind>() {
                logs.insert(kind.as_str().to_string(), sink.validated(kind));
            }
        }
        if logs.is_empty() {
            logs = default_logs();
        }

        LoggingConfig {
            logs: Some(logs),
            call_depth: if self.call_depth > 0 {
                self.call_depth
            } else {
                DEFAULT_CALL_DEPTH
            },
            coexist: self.coexist,
            run_after: self.run_after.clone(),
        }
    }

    /// 调用深度（至少为 1）
    pub fn call_depth(&self) -> usize {
        usize::try_from(self.call_depth).unwrap_or(0).max(1)
    }

    /// 按固定顺序列出所有输出描述
    ///
    /// 应在 [`validated`](Self::validated) 之后调用；遇到未知类型时返回
    /// [`SetupError::InvalidLogType`]
    pub fn sinks(&self) -> Result<Vec<SinkDescriptor>, SetupError> {
        let mut sinks = Vec::new();
        for (name, sink) in self.logs.iter().flatten() {
            let kind = name
                .parse::<LogKind>()
                .map_err(|_| SetupError::InvalidLogType(name.clone()))?;
            let level = LogLevel::from_ordinal(sink.level).unwrap_or_else(|| kind.default_level());
            let store = match kind {
                LogKind::Console => None,
                LogKind::File => Some(sink.store.clone().unwrap_or_default()),
            };
            sinks.push(SinkDescriptor { kind, level, store });
        }
        sinks.sort_by_key(|s| s.kind);
        Ok(sinks)
    }
}
