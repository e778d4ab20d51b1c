use crate::error::SetupError;
use crate::log::appender::{ConsoleAppender, LogAppender, MultiAppender, RollingFileAppender};
use crate::log::config::{LogKind, LoggingConfig, SinkDescriptor};
use crate::log::formatter::formatter_for;
use crate::log::level::LogLevel;
use crate::log::logger::{Logger, Stage};
use std::sync::Arc;

/// 组装结果：组合日志器 + 组合写入器
///
/// 写入器覆盖所有输出目标的原始字节流，供需要 `io::Write` 的第三方组件使用
#[derive(Clone)]
pub struct Assembly {
    pub logger: Arc<Logger>,
    pub writer: Arc<MultiAppender>,
}

/// 按配置组装日志器
///
/// 配置应当已经过 [`LoggingConfig::validated`]，每个输出目标对应一条管道，
/// 顺序固定为 console 在前、file 在后
pub fn assemble(config: &LoggingConfig) -> Result<Assembly, SetupError> {
    assemble_with(config, build_appender)
}

/// 使用自定义的输出器构造方法组装日志器
pub fn assemble_with<F>(config: &LoggingConfig, mut build: F) -> Result<Assembly, SetupError>
where
    F: FnMut(&SinkDescriptor) -> Result<Arc<dyn LogAppender>, SetupError>,
{
    let mut stages = Vec::new();
    let mut appenders = Vec::new();

    for sink in config.sinks()? {
        let appender = build(&sink)?;
        stages.push(Stage::new(formatter_for(sink.kind), appender.clone(), sink.level));
        appenders.push(appender);
    }

    Ok(Assembly {
        logger: Arc::new(Logger::new(stages, config.call_depth())),
        writer: Arc::new(MultiAppender::new(appenders)),
    })
}

/// 根据输出类型创建输出器：console 写标准输出，file 写滚动文件
pub fn build_appender(sink: &SinkDescriptor) -> Result<Arc<dyn LogAppender>, SetupError> {
    match sink.kind {
        LogKind::Console => Ok(Arc::new(ConsoleAppender::new())),
        LogKind::File => {
            let store = sink.store.clone().unwrap_or_default();
            let appender = RollingFileAppender::new(&store).map_err(|source| SetupError::Writer {
                path: store.path.clone(),
                source,
            })?;
            Ok(Arc::new(appender))
        }
    }
}

/// 默认日志器：debug 级别输出到终端
pub fn default_logger() -> Logger {
    Logger::new(
        vec![Stage::new(
            formatter_for(LogKind::Console),
            Arc::new(ConsoleAppender::new()),
            LogLevel::Debug,
        )],
        1,
    )
}
