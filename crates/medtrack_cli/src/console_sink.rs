//! Terminal notification surface.

use medtrack_core::{NotificationPermission, NotificationSink};
use std::io::Write;

/// Prints reminders to stdout; "system" notifications and inline alerts differ
/// only in their prefix.
pub struct ConsoleSink {
    permission: NotificationPermission,
}

impl ConsoleSink {
    pub fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }
}

impl NotificationSink for ConsoleSink {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    // A terminal has no permission prompt; the configured state stands.
    fn request_permission(&self) -> NotificationPermission {
        self.permission
    }

    fn show_system(&self, title: &str, body: &str) {
        println!("[notification] {title} | {body}");
    }

    fn show_alert(&self, title: &str, body: &str) {
        println!("[alert] {title}\n{body}");
    }

    fn play_chime(&self) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}
