//! 宿主接口
//!
//! 日志模块不直接依赖具体的应用框架，而是通过 [`Host`] 读取配置、发布组装好的
//! logger 和 writer、注册初始化任务。[`Registry`] 是一个内存实现，可以直接作为
//! 应用的组件容器使用。

mod registry;

pub use registry::Registry;

use crate::log::{LogAppender, Logger};
use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 宿主组件容器
pub trait Host: Send + Sync {
    /// 读取模块的原始配置，未配置时返回 None
    fn config_bytes(&self, key: &str) -> Option<Vec<u8>>;

    /// 发布规范化后的配置
    fn set_config(&self, key: &str, value: Value) -> Result<()>;

    /// 发布 logger
    fn set_logger(&self, key: &str, logger: Arc<Logger>) -> Result<()>;

    /// 发布原始字节写入器
    fn set_writer(&self, key: &str, writer: Arc<dyn LogAppender>) -> Result<()>;

    fn logger(&self, key: &str) -> Option<Arc<Logger>>;

    fn writer(&self, key: &str) -> Option<Arc<dyn LogAppender>>;

    /// 注册初始化任务，同名任务只能注册一次
    fn register(&self, task: Task) -> Result<()>;
}

/// 初始化任务的执行函数
pub type TaskFn = Box<dyn FnOnce(&dyn Host, &CancelSignal) -> Result<()> + Send>;

/// 初始化任务
///
/// `run_after` 中的任务全部完成后才会执行
pub struct Task {
    name: String,
    run_after: Vec<String>,
    run: TaskFn,
}

impl Task {
    pub fn new<F>(name: impl Into<String>, run_after: Vec<String>, run: F) -> Self
    where
        F: FnOnce(&dyn Host, &CancelSignal) -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            run_after,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_after(&self) -> &[String] {
        &self.run_after
    }

    pub fn run(self, host: &dyn Host, cancel: &CancelSignal) -> Result<()> {
        (self.run)(host, cancel)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("run_after", &self.run_after)
            .finish()
    }
}

/// 取消信号
///
/// 克隆的信号共享同一个状态，检查不会阻塞
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    canceled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}
