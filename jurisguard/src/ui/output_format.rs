// jurisguard/src/ui/output_format.rs
//! Formatting of status messages written to stderr.
//!
//! Color is applied only when the target is a terminal.
//! License: MIT OR APACHE 2.0

use is_terminal::IsTerminal;
use owo_colors::{AnsiColors, OwoColorize};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warn,
    Error,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            MessageKind::Info => "[INFO]",
            MessageKind::Success => "[OK]",
            MessageKind::Warn => "[WARN]",
            MessageKind::Error => "[ERROR]",
        }
    }

    fn color(self) -> AnsiColors {
        match self {
            MessageKind::Info => AnsiColors::Cyan,
            MessageKind::Success => AnsiColors::Green,
            MessageKind::Warn => AnsiColors::Yellow,
            MessageKind::Error => AnsiColors::Red,
        }
    }
}

/// Writes `msg` with a kind prefix on its own line.
pub fn print_message<W: Write>(writer: &mut W, kind: MessageKind, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", kind.prefix().color(kind.color()).bold(), msg)
    } else {
        writeln!(writer, "{} {}", kind.prefix(), msg)
    }
}

fn to_stderr(kind: MessageKind, msg: &str) {
    let stderr = io::stderr();
    let supports_color = stderr.is_terminal();
    let _ = print_message(&mut stderr.lock(), kind, msg, supports_color);
}

pub fn info_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Info, msg.as_ref());
}

pub fn success_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Success, msg.as_ref());
}

pub fn warn_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Warn, msg.as_ref());
}

pub fn error_msg(msg: impl AsRef<str>) {
    to_stderr(MessageKind::Error, msg.as_ref());
}
