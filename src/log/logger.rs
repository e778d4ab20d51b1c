use crate::log::{
    appender::LogAppender, caller, formatter::LogFormatter, level::LogLevel,
    log_record::LogRecord, log_record::MetadataValue,
};
use anyhow::{anyhow, Result};
use std::panic::Location;
use std::sync::Arc;

/// 一条输出管道：格式化器 + 输出器 + 最低级别
///
/// 创建后不可变，可以在线程间共享
#[derive(Clone)]
pub struct Stage {
    formatter: Arc<dyn LogFormatter>,
    appender: Arc<dyn LogAppender>,
    level: LogLevel,
}

impl Stage {
    pub fn new(
        formatter: Arc<dyn LogFormatter>,
        appender: Arc<dyn LogAppender>,
        level: LogLevel,
    ) -> Self {
        Self {
            formatter,
            appender,
            level,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn appender(&self) -> &Arc<dyn LogAppender> {
        &self.appender
    }

    /// 该级别的日志是否会经过本管道
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// 格式化并输出，级别不足时直接忽略
    pub fn deliver(&self, record: &LogRecord) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let formatted = self.formatter.format(record)?;
        self.appender.append(&formatted)
    }
}

/// 组合日志器
///
/// 每条日志分别投递到所有级别满足要求的管道，各管道独立格式化。
/// 某个管道失败不影响其他管道，失败在所有管道尝试之后一并返回。
///
/// `Panic` 级别的日志投递完成后触发 panic，`Fatal` 级别的日志投递并刷新后以状态码 1 退出进程。
pub struct Logger {
    stages: Vec<Stage>,
    call_depth: usize,
}

impl Logger {
    /// 创建组合日志器，`call_depth` 至少为 1
    pub fn new(stages: Vec<Stage>, call_depth: usize) -> Self {
        Self {
            stages,
            call_depth: call_depth.max(1),
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// 是否有任意管道接收该级别
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.stages.iter().any(|s| s.enabled(level))
    }

    /// 记录日志
    pub fn log(&self, record: LogRecord) -> Result<()> {
        let mut errors = Vec::new();
        for stage in &self.stages {
            if let Err(e) = stage.deliver(&record) {
                errors.push(e);
            }
        }

        match record.level {
            LogLevel::Panic => panic!("{}", record.message),
            LogLevel::Fatal => {
                let _ = self.sync();
                std::process::exit(1)
            }
            _ => {}
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            n => Err(anyhow!(
                "{} of {} log stages failed: {}",
                n,
                self.stages.len(),
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )),
        }
    }

    /// 记录带 metadata 的日志（通用方法）
    ///
    /// # 示例
    ///
    /// ```ignore
    /// logger.logm(
    ///     LogLevel::Info,
    ///     "user logged in",
    ///     vec![
    ///         ("user_id", 12345.into()),
    ///         ("username", "alice".into())
    ///     ]
    /// )?;
    /// ```
    #[track_caller]
    pub fn logm(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        let metadata = metadata.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.emit(level, message.into(), metadata)
    }

    /// 记录 DEBUG 级别日志
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.emit(LogLevel::Debug, message.into(), Vec::new())
    }

    /// 记录 INFO 级别日志
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.emit(LogLevel::Info, message.into(), Vec::new())
    }

    /// 记录 WARN 级别日志
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.emit(LogLevel::Warn, message.into(), Vec::new())
    }

    /// 记录 ERROR 级别日志
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.emit(LogLevel::Error, message.into(), Vec::new())
    }

    /// 记录 PANIC 级别日志，投递后 panic
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>) -> ! {
        let message = message.into();
        let _ = self.emit(LogLevel::Panic, message.clone(), Vec::new());
        panic!("{}", message)
    }

    /// 记录 FATAL 级别日志，投递并刷新后退出进程
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        let _ = self.emit(LogLevel::Fatal, message.into(), Vec::new());
        std::process::exit(1)
    }

    /// 记录 DEBUG 级别日志（带 metadata）
    #[track_caller]
    pub fn debugm(
        &self,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        self.logm(LogLevel::Debug, message, metadata)
    }

    /// 记录 INFO 级别日志（带 metadata）
    ///
    /// # 示例
    ///
    /// ```ignore
    /// logger.infom("request done", [("status", 200.into()), ("path", "/api".into())])?;
    /// ```
    #[track_caller]
    pub fn infom(
        &self,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        self.logm(LogLevel::Info, message, metadata)
    }

    /// 记录 WARN 级别日志（带 metadata）
    #[track_caller]
    pub fn warnm(
        &self,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        self.logm(LogLevel::Warn, message, metadata)
    }

    /// 记录 ERROR 级别日志（带 metadata）
    #[track_caller]
    pub fn errorm(
        &self,
        message: impl Into<String>,
        metadata: impl IntoIterator<Item = (impl Into<String>, MetadataValue)>,
    ) -> Result<()> {
        self.logm(LogLevel::Error, message, metadata)
    }

    /// 刷新所有管道的输出器
    pub fn sync(&self) -> Result<()> {
        let mut first_error = None;
        for stage in &self.stages {
            if let Err(e) = stage.appender.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    #[track_caller]
    fn emit(
        &self,
        level: LogLevel,
        message: String,
        metadata: Vec<(String, MetadataValue)>,
    ) -> Result<()> {
        // panic/fatal 即使没有管道接收也要继续执行
        if level < LogLevel::Panic && !self.enabled(level) {
            return Ok(());
        }

        let (file, line) = caller::resolve(Location::caller(), self.call_depth);
        let mut record = LogRecord::new(level, message).with_location(file, line);
        record.metadata = metadata;
        self.log(record)
    }
}
