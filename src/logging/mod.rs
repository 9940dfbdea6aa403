//! Severity-tagged logging to console and the detection log file.

mod format;
mod tail;

pub use format::StructuredLogger;
pub use tail::{tail_lines, DEFAULT_TAIL_LINES};
