//! Terminal logging with timestamps and colored module prefixes.
//!
//! ```text
//! 14:02:07 → [build] Build (12ms)
//! 14:02:07 → [serve] local: http://localhost:3000
//!            continuation lines line up with the message column
//! ```
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "page `{}` is missing frontmatter", path.display());
//! log_indented("filePath: public/foo.xyz");
//! log_error("Unhandled server error", &err);
//! ```

use chrono::Local;
use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::OnceLock,
    time::Instant,
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

// ============================================================================
// Layout Constants
// ============================================================================
//
// Line format: "14:02:07 → [module] message"
//               ^---------^ ^------^
//               timestamp   prefix

/// Width of the timestamp column: "HH:MM:SS → "
const TIMESTAMP_LEN: usize = 11;
/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Notice appended to errors that only reach the catch-all path.
const REPORT_NOTICE: &str = "Please report this error! It should be handled better than this.";

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a timestamp and a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to fit the terminal width.
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    let message = if message.contains('\n') {
        message
    } else {
        let max_msg_len = width.saturating_sub(TIMESTAMP_LEN + calc_prefix_len(module.len()));
        truncate_str(message, max_msg_len)
    };

    writeln!(stdout, "{}{prefix} {message}", timestamp()).ok();
    stdout.flush().ok();
}

/// Print a message aligned with the message column of [`log`], without
/// timestamp or prefix. Every line of a multi-line message is indented.
pub fn log_indented(message: &str) {
    let mut stdout = stdout().lock();
    writeln!(stdout, "{}", indent(message, TIMESTAMP_LEN)).ok();
    stdout.flush().ok();
}

/// Log an error that has no dedicated handling.
///
/// Prints the context line, the full error chain, and a notice asking
/// for the case to be reported.
pub fn log_error(context: &str, err: &dyn std::fmt::Display) {
    log("error", context);
    log_indented(&err.to_string());
    log_indented(&REPORT_NOTICE.red().to_string());
}

/// Elapsed time since `start`, formatted as a grey `(12ms)` tag.
pub fn duration(start: Instant) -> ColoredString {
    format!("({}ms)", start.elapsed().as_millis()).bright_black()
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Current local time as a grey `HH:MM:SS → ` column.
fn timestamp() -> ColoredString {
    format!("{} → ", Local::now().format("%H:%M:%S")).bright_black()
}

fn indent(message: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    message
        .split('\n')
        .map(|line| format!("{pad}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    // Find the last valid UTF-8 boundary within max_len
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        assert_eq!(calc_prefix_len(5), 8); // "[build] "
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_str_needs_truncation() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "你好" is 6 bytes; 4 falls inside the second character
        assert_eq!(truncate_str("你好", 4), "你");
        assert_eq!(truncate_str("a你b", 2), "a");
    }

    #[test]
    fn test_indent_every_line() {
        assert_eq!(indent("a\nb", 2), "  a\n  b");
        assert_eq!(indent("", 3), "   ");
    }

    #[test]
    fn test_timestamp_width_matches_column() {
        colored::control::set_override(false);
        let stamp = timestamp().to_string();
        assert_eq!(stamp.chars().count(), TIMESTAMP_LEN);
        assert!(stamp.ends_with(" → "));
    }

    #[test]
    fn test_duration_format() {
        colored::control::set_override(false);
        let tag = duration(Instant::now()).to_string();
        assert!(tag.starts_with('('));
        assert!(tag.ends_with("ms)"));
    }
}
