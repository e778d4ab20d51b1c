use crate::error::SetupError;
use crate::host::Host;
use crate::log::assembly::default_logger;
use crate::log::config::CONFIG_KEY;
use crate::log::log_record::MetadataValue;
use crate::log::Logger;
use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use std::sync::Arc;

/// 全局 logger，只能安装一次
static GLOBAL_LOGGER: OnceCell<Arc<Logger>> = OnceCell::new();

/// 安装之前使用的默认 logger：debug 级别输出到终端
static DEFAULT_LOGGER: Lazy<Arc<Logger>> = Lazy::new(|| Arc::new(default_logger()));

fn current() -> &'static Arc<Logger> {
    GLOBAL_LOGGER.get().unwrap_or(&DEFAULT_LOGGER)
}

/// 安装全局 logger
///
/// 进程内只能成功调用一次，再次调用返回 [`SetupError::AlreadyInstalled`]
pub fn install(logger: Arc<Logger>) -> Result<(), SetupError> {
    GLOBAL_LOGGER
        .set(logger)
        .map_err(|_| SetupError::AlreadyInstalled)
}

/// 安装宿主中发布的 logger
pub fn install_from(host: &dyn Host) -> Result<(), SetupError> {
    let logger = host
        .logger(CONFIG_KEY)
        .ok_or_else(|| anyhow!("logger [{}] not found", CONFIG_KEY))?;
    install(logger)
}

pub fn is_installed() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// 获取当前 logger（未安装时返回默认 logger）
pub fn logger() -> Arc<Logger> {
    Arc::clone(current())
}

/// 记录 DEBUG 级别日志（全局）
#[track_caller]
pub fn debug(message: impl Into<String>) -> Result<()> {
    current().debug(message)
}

/// 记录 INFO 级别日志（全局）
#[track_caller]
pub fn info(message: impl Into<String>) -> Result<()> {
    current().info(message)
}

/// 记录 WARN 级别日志（全局）
#[track_caller]
pub fn warn(message: impl Into<String>) -> Result<()> {
    current().warn(message)
}

/// 记录 ERROR 级别日志（全局）
#[track_caller]
pub fn error(message: impl Into<String>) -> Result<()> {
    current().error(message)
}

/// 记录 PANIC 级别日志后 panic（全局）
#[track_caller]
pub fn panic(message: impl Into<String>) -> ! {
    current().panic(message)
}

/// 记录 FATAL 级别日志后退出进程（全局）
#[track_caller]
pub fn fatal(message: impl Into<String>) -> ! {
    current().fatal(message)
}

/// 记录 DEBUG 级别日志，带 metadata（全局）
#[track_caller]
pub fn debugm(
    message: impl Into<String>,
    metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
) -> Result<()> {
    current().debugm(message, metadata)
}

/// 记录 INFO 级别日志，带 metadata（全局）
#[track_caller]
pub fn infom(
    message: impl Into<String>,
    metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
) -> Result<()> {
    current().infom(message, metadata)
}

/// 记录 WARN 级别日志，带 metadata（全局）
#[track_caller]
pub fn warnm(
    message: impl Into<String>,
    metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
) -> Result<()> {
    current().warnm(message, metadata)
}

/// 记录 ERROR 级别日志，带 metadata（全局）
#[track_caller]
pub fn errorm(
    message: impl Into<String>,
    metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
) -> Result<()> {
    current().errorm(message, metadata)
}

/// 刷新全局 logger
pub fn sync() -> Result<()> {
    current().sync()
}
