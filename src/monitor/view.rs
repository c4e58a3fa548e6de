use super::state::NoticeLevel;

/// The warning dialog and toast collaborators
pub trait WarningView: Send + Sync {
    fn show_warning(&self, remaining_seconds: u32);
    fn update_countdown(&self, remaining_seconds: u32);
    fn hide_warning(&self);
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Performs the final redirect to the login page
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Formats a countdown as `m:ss`
pub fn format_countdown(remaining_seconds: u32) -> String {
    format!("{}:{:02}", remaining_seconds / 60, remaining_seconds % 60)
}
