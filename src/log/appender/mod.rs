mod console_appender;
mod multi_appender;
mod rolling_file_appender;
mod trait_;

pub use console_appender::ConsoleAppender;
pub use multi_appender::MultiAppender;
pub use rolling_file_appender::RollingFileAppender;
pub use trait_::LogAppender;

/// 测试用输出器
#[cfg(test)]
pub(crate) mod testing {
    use super::LogAppender;
    use std::io;
    use std::sync::Mutex;

    /// 写入内存的输出器
    #[derive(Default)]
    pub struct MemoryAppender {
        buf: Mutex<Vec<u8>>,
    }

    impl MemoryAppender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.buf.lock().unwrap()).to_string()
        }

        pub fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_string).collect()
        }
    }

    impl LogAppender for MemoryAppender {
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            self.buf.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    /// 总是失败的输出器
    pub struct FailingAppender;

    impl LogAppender for FailingAppender {
        fn write(&self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"))
        }

        fn flush(&self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "sink unavailable"))
        }
    }
}
