//! Terminal implementations of the notification and navigation seams.

use crate::scan::orchestrator::{Navigator, Notification, NotificationSink, Route};
use console::{style, Term};
use std::sync::Mutex;

/// Prints failures to stderr.
#[derive(Debug)]
pub struct ConsoleNotifier {
    term: Term,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// One line: red mark, bold title, then the message.
fn notification_line(notification: &Notification) -> String {
    format!(
        "{} {}: {}",
        style("✗").red().bold(),
        style(&notification.title).bold(),
        notification.message
    )
}

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = notification_line(&notification);
        if let Err(e) = self.term.write_line(&line) {
            tracing::warn!(error = %e, "Failed to write notification");
        }
    }
}

/// Announces the results route and remembers the last one.
#[derive(Debug)]
pub struct ConsoleNavigator {
    term: Term,
    last: Mutex<Option<Route>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            last: Mutex::new(None),
        }
    }

    pub fn last_route(&self) -> Option<Route> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for ConsoleNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        let line = format!("{} {}", style("→").cyan().bold(), style(route.path()).underlined());
        if let Err(e) = self.term.write_line(&line) {
            tracing::warn!(error = %e, "Failed to write route");
        }
        *self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(route);
    }
}
