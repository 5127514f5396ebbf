//! Styled status lines.

use crossterm::style::Stylize;
use packup_core::LogSink;

/// Writes one styled line per message to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, message: &str) {
        println!("  {message}");
    }

    pub fn success(&self, message: &str) {
        println!("  {} {}", "✓".green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("  {} {}", "!".yellow(), message.to_string().yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("  {} {}", "✗".red(), message.to_string().red());
    }
}

// Engine progress lines already carry their own ✓/✗ markers, so the sink
// prints them unadorned.
impl LogSink for Output {
    fn append(&self, line: &str) {
        println!("  {line}");
    }
}
