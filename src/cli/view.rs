use serde_json::json;

use crate::cli::OutputFormat;
use crate::monitor::view::format_countdown;
use crate::monitor::{Navigator, NoticeLevel, WarningView};

/// Renders monitor events on the terminal for `whodis monitor`
pub struct TerminalView {
    format: OutputFormat,
}

impl TerminalView {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn emit(&self, event: &str, text: String, remaining_seconds: Option<u32>) {
        match self.format {
            OutputFormat::Json => {
                let mut line = json!({ "event": event, "message": text });
                if let Some(remaining) = remaining_seconds {
                    line["remaining_seconds"] = json!(remaining);
                }
                println!("{}", line);
            }
            OutputFormat::Text => println!("{}", text),
        }
    }
}

impl WarningView for TerminalView {
    fn show_warning(&self, remaining_seconds: u32) {
        self.emit(
            "warning",
            format!(
                "⚠ Your session will expire in {}. Type 'c' to continue or 'q' to log out.",
                format_countdown(remaining_seconds)
            ),
            Some(remaining_seconds),
        );
    }

    fn update_countdown(&self, remaining_seconds: u32) {
        // Every second is too chatty on a terminal
        if remaining_seconds % 15 == 0 || remaining_seconds <= 10 {
            self.emit(
                "countdown",
                format!("  session expires in {}", format_countdown(remaining_seconds)),
                Some(remaining_seconds),
            );
        }
    }

    fn hide_warning(&self) {
        self.emit("warning_cleared", "Session active".to_string(), None);
    }

    fn notify(&self, level: NoticeLevel, message: &str) {
        let marker = match level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
        };
        self.emit("notice", format!("{} {}", marker, message), None);
    }
}

/// Prints the redirect target instead of navigating a browser
pub struct TerminalNavigator {
    base_url: String,
}

impl TerminalNavigator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for a redirect location such as `/login?reason=...`
    pub fn redirect_url(&self, location: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), location)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, location: &str) {
        println!("→ Redirecting to {}", self.redirect_url(location));
    }
}
