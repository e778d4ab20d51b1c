mod core;
mod json_formatter;
mod selector;
mod text_formatter;

pub use core::LogFormatter;
pub use json_formatter::{JsonFormatter, JsonFormatterConfig};
pub use selector::formatter_for;
pub use text_formatter::{TextFormatter, TextFormatterConfig, CONSOLE_TIME_LAYOUT};
