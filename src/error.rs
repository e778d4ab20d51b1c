use thiserror::Error;

/// 日志初始化错误
///
/// 初始化只尝试一次，任何一种错误都会中止初始化并交给宿主处理
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("配置解析失败: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("config: log type invalid: {0}")]
    InvalidLogType(String),

    #[error("创建日志输出失败 [{path}]: {source}")]
    Writer {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}: context has been canceled")]
    Canceled(String),

    #[error("全局 logger 已经初始化")]
    AlreadyInstalled,

    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl SetupError {
    /// 是否为取消导致的错误
    pub fn is_canceled(&self) -> bool {
        matches!(self, SetupError::Canceled(_))
    }
}
