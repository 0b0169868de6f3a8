//! Terminal delivery channels for `watch`.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use courtside_core::notify::{ChannelError, SoundChannel, Toast, ToastChannel, ToastVariant};

/// Prints each toast as one timestamped line on stdout.
pub struct ConsoleToast {
    color: bool,
    quiet: bool,
}

impl ConsoleToast {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }
}

impl ToastChannel for ConsoleToast {
    fn show(&self, toast: &Toast) -> Result<(), ChannelError> {
        if self.quiet {
            return Ok(());
        }
        let stamp = chrono::Local::now().format("%H:%M:%S");
        let line = format_toast(toast, self.color);
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{stamp}  {line}").map_err(|e| ChannelError::new(e.to_string()))
    }
}

pub(crate) fn format_toast(toast: &Toast, color: bool) -> String {
    let title = match (color, toast.variant) {
        (false, _) => toast.title.clone(),
        (true, ToastVariant::Default) => toast.title.cyan().bold().to_string(),
        (true, ToastVariant::Destructive) => toast.title.red().bold().to_string(),
    };
    format!("{title}  {}", toast.message)
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl SoundChannel for TerminalBell {
    fn play(&self) -> Result<(), ChannelError> {
        let mut stderr = io::stderr().lock();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| ChannelError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toast(variant: ToastVariant) -> Toast {
        Toast {
            title: "Player Milestone".into(),
            message: "Jokic reached 30+ points (31)".into(),
            variant,
        }
    }

    #[test]
    fn plain_toast_is_title_then_message() {
        assert_eq!(
            format_toast(&toast(ToastVariant::Default), false),
            "Player Milestone  Jokic reached 30+ points (31)"
        );
    }

    #[test]
    fn colored_toast_keeps_text() {
        let line = format_toast(&toast(ToastVariant::Destructive), true);
        assert!(line.contains("Player Milestone"));
        assert!(line.contains('\u{1b}'));
        assert!(line.ends_with("Jokic reached 30+ points (31)"));
    }
}
