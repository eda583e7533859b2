//! Single-observer registry for organ notifications.

use crate::channel::Notification;

/// Observer informed of drained notifications on the control thread.
///
/// Every callback only says that something changed; re-read the state you
/// care about from the context.
pub trait OrganListener: Send {
    fn on_active_stops_changed(&mut self) {}

    /// Topology and initial wavetables are ready; UI may be built from here on.
    fn on_load_complete(&mut self) {}

    fn on_retuned(&mut self) {}
}

/// Holds at most one listener.
#[derive(Default)]
pub struct ListenerRegistry {
    updater: Option<Box<dyn OrganListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current listener. `None` unregisters; notifications drained
    /// while nothing is registered are discarded.
    pub fn set_updater(&mut self, updater: Option<Box<dyn OrganListener>>) {
        self.updater = updater;
    }

    pub fn has_updater(&self) -> bool {
        self.updater.is_some()
    }

    pub fn dispatch(&mut self, notification: Notification) {
        let Some(updater) = self.updater.as_deref_mut() else {
            return;
        };
        match notification {
            Notification::StopsUpdated => updater.on_active_stops_changed(),
            Notification::LoadComplete => updater.on_load_complete(),
            Notification::Retuned => updater.on_retuned(),
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("has_updater", &self.has_updater())
            .finish()
    }
}
