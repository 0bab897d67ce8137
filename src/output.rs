//! Terminal report output
//!
//! Colored headers, labeled items and status lines. Colors are plain ANSI
//! escapes and can be switched off.

use std::io::{self, Write};

pub const GREEN: &str = "\x1b[32m";
pub const CYAN: &str = "\x1b[36m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";

/// Report writer
pub struct Output<W: Write = io::Stdout> {
    out: W,
    no_color: bool,
}

impl Output<io::Stdout> {
    pub fn stdout(no_color: bool) -> Self {
        Self::new(io::stdout(), no_color)
    }
}

impl<W: Write> Output<W> {
    pub fn new(out: W, no_color: bool) -> Self {
        Self { out, no_color }
    }

    /// Wrap text in a color code unless colors are off
    pub fn paint(&self, code: &str, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, RESET)
        }
    }

    pub fn header(&mut self, text: &str) -> io::Result<()> {
        let line = self.paint(CYAN, text);
        writeln!(self.out, "{}", line)
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        let line = self.paint(GREEN, text);
        writeln!(self.out, "{}", line)
    }

    pub fn item(&mut self, label: &str, value: impl std::fmt::Display) -> io::Result<()> {
        let label = self.paint(YELLOW, &format!("{}:", label));
        writeln!(self.out, "{} {}", label, value)
    }

    pub fn line(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
