use crate::host::{CancelSignal, Host, Task};
use crate::log::{LogAppender, Logger};
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// 内存组件容器
///
/// 配置、logger、writer 按 key 存放，每个 key 只能写入一次；
/// 任务按依赖顺序执行，每个任务只执行一次
#[derive(Default)]
pub struct Registry {
    config_bytes: RwLock<HashMap<String, Vec<u8>>>,
    configs: RwLock<HashMap<String, Value>>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    writers: RwLock<HashMap<String, Arc<dyn LogAppender>>>,
    pending: Mutex<Vec<Task>>,
    registered: Mutex<HashSet<String>>,
    completed: Mutex<HashSet<String>>,
}

fn insert_once<V>(slots: &RwLock<HashMap<String, V>>, kind: &str, key: &str, value: V) -> Result<()> {
    let mut slots = slots
        .write()
        .map_err(|_| anyhow!("Failed to acquire write lock"))?;
    if slots.contains_key(key) {
        bail!("{} [{}] already exists", kind, key);
    }
    slots.insert(key.to_string(), value);
    Ok(())
}

fn get_cloned<V: Clone>(slots: &RwLock<HashMap<String, V>>, key: &str) -> Option<V> {
    slots.read().ok()?.get(key).cloned()
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级共享的容器
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    /// 写入模块的原始配置
    pub fn set_config_bytes(&self, key: &str, bytes: impl Into<Vec<u8>>) -> Result<()> {
        insert_once(&self.config_bytes, "config source", key, bytes.into())
    }

    /// 读取模块发布的规范化配置
    pub fn config(&self, key: &str) -> Option<Value> {
        get_cloned(&self.configs, key)
    }

    pub fn delete_logger(&self, key: &str) -> Option<Arc<Logger>> {
        self.loggers.write().ok()?.remove(key)
    }

    pub fn delete_writer(&self, key: &str) -> Option<Arc<dyn LogAppender>> {
        self.writers.write().ok()?.remove(key)
    }

    /// 待执行的任务名
    pub fn pending_tasks(&self) -> Vec<String> {
        match self.pending.lock() {
            Ok(pending) => pending.iter().map(|t| t.name().to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// 按依赖顺序执行所有待执行任务
    ///
    /// 依赖必须是已完成的任务或本轮待执行的任务；依赖不存在或存在环时不执行任何任务。
    /// 某个任务失败时立即返回，后续任务不再执行。
    pub fn run(&self, cancel: &CancelSignal) -> Result<()> {
        let tasks = std::mem::take(
            &mut *self
                .pending
                .lock()
                .map_err(|_| anyhow!("Failed to acquire task lock"))?,
        );
        let completed = self
            .completed
            .lock()
            .map_err(|_| anyhow!("Failed to acquire task lock"))?
            .clone();

        let ordered = order_tasks(tasks, &completed)?;
        for task in ordered {
            let name = task.name().to_string();
            task.run(self, cancel)
                .with_context(|| format!("task [{}] failed", name))?;
            self.completed
                .lock()
                .map_err(|_| anyhow!("Failed to acquire task lock"))?
                .insert(name);
        }
        Ok(())
    }
}

/// 拓扑排序，同一层内保持注册顺序
fn order_tasks(tasks: Vec<Task>, completed: &HashSet<String>) -> Result<Vec<Task>> {
    let names: HashSet<String> = tasks.iter().map(|t| t.name().to_string()).collect();

    let mut waiting = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let mut deps = HashSet::new();
        for dep in task.run_after() {
            if completed.contains(dep) {
                continue;
            }
            if !names.contains(dep) {
                bail!("task [{}] depends on unknown task [{}]", task.name(), dep);
            }
            deps.insert(dep.clone());
        }
        waiting.push(deps);
    }

    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    let mut ready: VecDeque<usize> = waiting
        .iter()
        .enumerate()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(i, _)| i)
        .collect();
    let mut ordered = Vec::with_capacity(slots.len());

    while let Some(i) = ready.pop_front() {
        let Some(task) = slots[i].take() else {
            continue;
        };
        for (j, deps) in waiting.iter_mut().enumerate() {
            if slots[j].is_some() && deps.remove(task.name()) && deps.is_empty() {
                ready.push_back(j);
            }
        }
        ordered.push(task);
    }

    let blocked: Vec<&str> = slots
        .iter()
        .flatten()
        .map(|t| t.name())
        .collect();
    if !blocked.is_empty() {
        bail!("tasks have cyclic dependencies: {}", blocked.join(", "));
    }
    Ok(ordered)
}

impl Host for Registry {
    fn config_bytes(&self, key: &str) -> Option<Vec<u8>> {
        get_cloned(&self.config_bytes, key)
    }

    fn set_config(&self, key: &str, value: Value) -> Result<()> {
        insert_once(&self.configs, "config", key, value)
    }

    fn set_logger(&self, key: &str, logger: Arc<Logger>) -> Result<()> {
        insert_once(&self.loggers, "logger", key, logger)
    }

    fn set_writer(&self, key: &str, writer: Arc<dyn LogAppender>) -> Result<()> {
        insert_once(&self.writers, "writer", key, writer)
    }

    fn logger(&self, key: &str) -> Option<Arc<Logger>> {
        get_cloned(&self.loggers, key)
    }

    fn writer(&self, key: &str) -> Option<Arc<dyn LogAppender>> {
        get_cloned(&self.writers, key)
    }

    fn register(&self, task: Task) -> Result<()> {
        let mut registered = self
            .registered
            .lock()
            .map_err(|_| anyhow!("Failed to acquire task lock"))?;
        if !registered.insert(task.name().to_string()) {
            bail!("task [{}] already registered", task.name());
        }
        self.pending
            .lock()
            .map_err(|_| anyhow!("Failed to acquire task lock"))?
            .push(task);
        Ok(())
    }
}
