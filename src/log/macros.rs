/// 日志宏模块
///
/// 提供自动捕获文件和行号的日志宏。宏直接构造记录，
/// 调用位置就是宏展开的位置，不受 `call_depth` 影响。
///
/// # 示例
///
/// ```ignore
/// use logtee::log_info;
///
/// fn main() -> anyhow::Result<()> {
///     let logger = logtee::global::logger();
///
///     // 简单日志
///     log_info!(logger, "application started")?;
///
///     // 带 metadata 的日志
///     log_info!(logger, "user logged in", "user_id" => 12345, "username" => "alice")?;
///
///     Ok(())
/// }
/// ```

/// 按指定级别记录日志
///
/// # 示例
///
/// ```ignore
/// log_at!(logger, LogLevel::Warn, "disk almost full", "free_mb" => 512);
/// ```
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $msg:expr) => {
        $logger.log(
            $crate::log::LogRecord::new($level, $msg.into())
                .with_location(file!().to_string(), line!())
        )
    };
    ($logger:expr, $level:expr, $msg:expr, $($key:expr => $value:expr),* $(,)?) => {
        $logger.log(
            $crate::log::LogRecord::new($level, $msg.into())
                .with_location(file!().to_string(), line!())
                $(.with_metadata($key, $value))*
        )
    };
}

/// 记录 DEBUG 级别日志
///
/// # 示例
///
/// ```ignore
/// log_debug!(logger, "processing request");
/// log_debug!(logger, "processing", "endpoint" => "/api/users", "method" => "GET");
/// ```
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Debug, $($arg)+)
    };
}

/// 记录 INFO 级别日志
///
/// # 示例
///
/// ```ignore
/// log_info!(logger, "user logged in");
/// log_info!(logger, "user action", "user_id" => 12345, "action" => "login");
/// ```
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Info, $($arg)+)
    };
}

/// 记录 WARN 级别日志
///
/// # 示例
///
/// ```ignore
/// log_warn!(logger, "high memory usage");
/// log_warn!(logger, "slow query", "duration_ms" => 1500, "threshold_ms" => 1000);
/// ```
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Warn, $($arg)+)
    };
}

/// 记录 ERROR 级别日志
///
/// # 示例
///
/// ```ignore
/// log_error!(logger, "database connection failed");
/// log_error!(logger, "request failed", "status" => 500, "error" => "timeout");
/// ```
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log_at!($logger, $crate::log::LogLevel::Error, $($arg)+)
    };
}
