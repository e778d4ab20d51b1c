use anyhow::Result;
use std::io;

/// 日志输出器 trait
///
/// 负责将格式化后的日志写入目标介质。实现必须是内部同步的：
/// 同一个输出器会被多个线程并发调用，每次 `write` 的内容要么完整写入，要么返回错误。
pub trait LogAppender: Send + Sync {
    /// 写入原始字节
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// 输出一行日志（自动追加换行符）
    fn append(&self, formatted_message: &str) -> Result<()> {
        let mut line = String::with_capacity(formatted_message.len() + 1);
        line.push_str(formatted_message);
        line.push('\n');
        self.write(line.as_bytes())?;
        Ok(())
    }

    /// 刷新缓冲区（默认实现为空操作）
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
