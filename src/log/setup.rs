//! 在宿主中注册与初始化
//!
//! ```rust,no_run
//! use logtee::host::{CancelSignal, Registry};
//! use logtee::log::setup;
//!
//! fn main() -> anyhow::Result<()> {
//!     let registry = Registry::global();
//!     registry.set_config_bytes("logtee", r#"{"logs":{"console":{"level":1}}}"#)?;
//!
//!     setup::register(registry)?;
//!     registry.run(&CancelSignal::new())?;
//!
//!     logtee::global::install_from(registry)?;
//!     logtee::global::info("application started")?;
//!     Ok(())
//! }
//! ```

use crate::error::SetupError;
use crate::host::{CancelSignal, Host, Task};
use crate::log::assembly::assemble;
use crate::log::config::{LoggingConfig, CONFIG_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 只读取依赖列表，配置其余部分的错误留到初始化时报告
#[derive(Deserialize, Default)]
#[serde(default)]
struct Prerequisites {
    run_after: Vec<String>,
}

/// 向宿主注册初始化任务
///
/// 任务名为 [`CONFIG_KEY`]，依赖配置中的 `run_after`；同一宿主只能注册一次
pub fn register(host: &dyn Host) -> Result<(), SetupError> {
    let run_after = host
        .config_bytes(CONFIG_KEY)
        .and_then(|bytes| serde_json::from_slice::<Prerequisites>(&bytes).ok())
        .unwrap_or_default()
        .run_after;

    host.register(Task::new(CONFIG_KEY, run_after, |host, cancel| {
        init(host, cancel).map_err(anyhow::Error::from)
    }))?;
    Ok(())
}

/// 初始化日志模块
///
/// 1. 已取消时直接返回 [`SetupError::Canceled`]，不做任何事
/// 2. 读取配置：未配置时使用默认值，解析失败返回 [`SetupError::Malformed`]
/// 3. 校验并补全默认值，发布规范化后的配置
/// 4. 组装 logger 和 writer 并发布
pub fn init(host: &dyn Host, cancel: &CancelSignal) -> Result<(), SetupError> {
    if cancel.is_canceled() {
        return Err(SetupError::Canceled(CONFIG_KEY.to_string()));
    }

    let config = match host.config_bytes(CONFIG_KEY) {
        Some(bytes) => LoggingConfig::from_slice(&bytes)?,
        None => LoggingConfig::default(),
    }
    .validated();

    host.set_config(CONFIG_KEY, to_published(&config)?)?;

    let assembly = assemble(&config)?;
    host.set_logger(CONFIG_KEY, assembly.logger)?;
    host.set_writer(CONFIG_KEY, assembly.writer)?;
    Ok(())
}

/// 转换成发布到宿主的 JSON 值
///
/// 失败属于发布环节的错误，归为 [`SetupError::Host`]，不算配置格式错误
fn to_published<T: Serialize>(value: &T) -> Result<Value, SetupError> {
    serde_json::to_value(value).map_err(|e| SetupError::Host(e.into()))
}
