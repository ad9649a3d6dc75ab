//! Notification delivery boundary.
//!
//! # Responsibility
//! - Describe the external sink that shows reminders to the user.
//! - Choose between a system notification and the inline alert fallback.
//!
//! # Invariants
//! - Delivery is fire-and-forget: no acknowledgement, no retry.
//! - Without `Granted` permission the inline alert is used; delivery never fails.

use std::cell::{Cell, RefCell};

/// Tri-state notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not asked yet.
    Default,
}

impl NotificationPermission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Default => "default",
        }
    }
}

/// How a notification reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    System,
    Alert,
}

/// External side-effecting display surface.
pub trait NotificationSink {
    fn permission(&self) -> NotificationPermission;

    /// Asks the platform for permission and returns the resulting state.
    fn request_permission(&self) -> NotificationPermission;

    fn show_system(&self, title: &str, body: &str);

    /// Blocking inline alert used when system notifications are unavailable.
    fn show_alert(&self, title: &str, body: &str);

    fn play_chime(&self) {}
}

/// Shows `title`/`body` through the best channel the sink allows.
pub fn deliver(sink: &dyn NotificationSink, title: &str, body: &str) -> Delivery {
    if sink.permission() == NotificationPermission::Granted {
        sink.show_system(title, body);
        Delivery::System
    } else {
        sink.show_alert(title, body);
        Delivery::Alert
    }
}

/// One notification captured by `RecordingSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered {
    pub delivery: Delivery,
    pub title: String,
    pub body: String,
}

/// Sink that records deliveries in memory.
#[derive(Debug)]
pub struct RecordingSink {
    permission: Cell<NotificationPermission>,
    granted_on_request: bool,
    delivered: RefCell<Vec<Delivered>>,
    chimes: Cell<usize>,
}

impl RecordingSink {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission: Cell::new(permission),
            granted_on_request: true,
            delivered: RefCell::new(Vec::new()),
            chimes: Cell::new(0),
        }
    }

    /// Makes `request_permission` answer `Denied`.
    pub fn denying_requests(mut self) -> Self {
        self.granted_on_request = false;
        self
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.delivered.borrow().clone()
    }

    pub fn chimes(&self) -> usize {
        self.chimes.get()
    }
}

impl NotificationSink for RecordingSink {
    fn permission(&self) -> NotificationPermission {
        self.permission.get()
    }

    fn request_permission(&self) -> NotificationPermission {
        if self.permission.get() == NotificationPermission::Default {
            self.permission.set(if self.granted_on_request {
                NotificationPermission::Granted
            } else {
                NotificationPermission::Denied
            });
        }
        self.permission.get()
    }

    fn show_system(&self, title: &str, body: &str) {
        self.delivered.borrow_mut().push(Delivered {
            delivery: Delivery::System,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn show_alert(&self, title: &str, body: &str) {
        self.delivered.borrow_mut().push(Delivered {
            delivery: Delivery::Alert,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn play_chime(&self) {
        self.chimes.set(self.chimes.get() + 1);
    }
}
