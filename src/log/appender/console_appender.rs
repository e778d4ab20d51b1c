use crate::log::appender::LogAppender;
use std::io::{self, Write};

/// 终端输出器
///
/// 每次写入都持有标准输出的锁，并发写入的日志行不会交错
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleAppender;

impl ConsoleAppender {
    pub fn new() -> Self {
        Self
    }
}

impl LogAppender for ConsoleAppender {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(buf)?;
        stdout.flush()?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().flush()
    }
}
