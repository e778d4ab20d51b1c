//! 调用位置解析
//!
//! 记录的调用位置由 `#[track_caller]` 传播得到：日志方法和全局门面函数都标注了
//! `#[track_caller]`，因此门面本身不会出现在调用位置中，这对应 `call_depth = 1`。
//! 当 `call_depth > 1` 时，业务代码自己还包了若干层封装，此时从捕获的调用栈中
//! 找到被追踪的调用点，再向外跳过 `call_depth - 1` 帧。无法获取调用栈时
//! （例如编译时去掉了调试信息）退回到被追踪的调用点。
//!
//! 开销：`call_depth > 1` 时每条通过级别过滤的记录都要完整捕获一次调用栈并做
//! 符号解析，耗时是普通记录的数十到上百倍。被过滤掉的记录不会触发捕获。
//! 热路径上的日志应使用默认的 `call_depth = 1` 或直接使用 `log_*!` 宏。

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;

/// 调用栈中的一帧源码位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub file: String,
    pub line: u32,
}

/// 根据调用深度解析调用位置，返回 (文件, 行号)
pub(crate) fn resolve(location: &'static Location<'static>, call_depth: usize) -> (String, u32) {
    let tracked = (location.file().to_string(), location.line());
    if call_depth <= 1 {
        return tracked;
    }

    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return tracked;
    }

    let frames = parse_frames(&backtrace.to_string());
    match skip_frames(&frames, location, call_depth - 1) {
        Some(frame) => (frame.file.clone(), frame.line),
        None => tracked,
    }
}

/// 从被追踪的调用点向外跳过 `skip` 帧
fn skip_frames<'a>(
    frames: &'a [Frame],
    location: &Location<'_>,
    skip: usize,
) -> Option<&'a Frame> {
    let start = frames
        .iter()
        .position(|f| f.line == location.line() && same_file(&f.file, location.file()))?;
    frames.get(start + skip)
}

fn same_file(frame_file: &str, location_file: &str) -> bool {
    let normalize = |s: &str| s.replace('\\', "/");
    let frame_file = normalize(frame_file);
    let location_file = normalize(location_file);
    frame_file == location_file || frame_file.ends_with(&format!("/{}", location_file))
}

/// 解析标准库调用栈的文本格式，只保留带源码位置的帧
///
/// ```text
///    3: app::handler::serve
///              at ./src/handler.rs:42:9
/// ```
pub(crate) fn parse_frames(text: &str) -> Vec<Frame> {
    text.lines()
        .filter_map(|line| line.trim_start().strip_prefix("at "))
        .filter_map(|location| {
            // path:line:column，路径本身可能含有冒号（Windows 盘符）
            let mut parts = location.rsplitn(3, ':');
            let _column = parts.next()?;
            let line = parts.next()?.parse().ok()?;
            let file = parts.next()?;
            Some(Frame {
                file: file.to_string(),
                line,
            })
        })
        .collect()
}
