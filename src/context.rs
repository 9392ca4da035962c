//! Application-wide state handed to every screen.

use crate::router::Location;
use std::sync::Arc;

/// Snapshot of the shared state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSharedState {
    pub location: Location,
    pub logged: bool,
}

/// Owner of the shared state, constructed once at the application root.
///
/// [`AppContext::values`] returns the same `Arc` until the location or the
/// `logged` flag actually changes.
#[derive(Debug)]
pub struct AppContext {
    values: Arc<AppSharedState>,
}

impl AppContext {
    pub fn new(location: Location) -> Self {
        AppContext {
            values: Arc::new(AppSharedState {
                location,
                logged: false,
            }),
        }
    }

    pub fn values(&self) -> Arc<AppSharedState> {
        self.values.clone()
    }

    pub fn location(&self) -> &Location {
        &self.values.location
    }

    pub fn logged(&self) -> bool {
        self.values.logged
    }

    pub fn set_logged(&mut self, logged: bool) {
        if self.values.logged != logged {
            self.values = Arc::new(AppSharedState {
                location: self.values.location.clone(),
                logged,
            });
        }
    }

    /// Returns whether the location changed.
    pub fn set_location(&mut self, location: Location) -> bool {
        if self.values.location == location {
            return false;
        }
        self.values = Arc::new(AppSharedState {
            location,
            logged: self.values.logged,
        });
        true
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Location::default())
    }
}
