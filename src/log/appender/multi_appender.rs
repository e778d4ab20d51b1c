use crate::log::appender::LogAppender;
use std::io;
use std::sync::Arc;

/// 组合输出器
///
/// 把同一份字节写入所有下游输出器。某个输出器失败不影响其他输出器，
/// 全部尝试之后返回遇到的第一个错误。
#[derive(Clone, Default)]
pub struct MultiAppender {
    appenders: Vec<Arc<dyn LogAppender>>,
}

impl MultiAppender {
    pub fn new(appenders: Vec<Arc<dyn LogAppender>>) -> Self {
        Self { appenders }
    }

    pub fn len(&self) -> usize {
        self.appenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appenders.is_empty()
    }
}

impl LogAppender for MultiAppender {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut first_error = None;
        for appender in &self.appenders {
            if let Err(e) = appender.write(buf) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&self) -> io::Result<()> {
        let mut first_error = None;
        for appender in &self.appenders {
            if let Err(e) = appender.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl io::Write for MultiAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogAppender::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogAppender::flush(self)
    }
}

impl io::Write for &MultiAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        LogAppender::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        LogAppender::flush(*self)
    }
}
