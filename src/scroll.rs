//! Scroll restoration policy applied on every location change.

use crate::platform::{HistoryAction, ScrollRestoration, Window};
use crate::router::Location;
use std::sync::{Arc, Weak};

/// Resets the viewport to the origin whenever the location changes and keeps
/// the browser from restoring old offsets on its own.
pub struct ScrollManager {
    window: Arc<dyn Window>,
    last: Option<Location>,
    pop_listener: bool,
    restoration_listener: bool,
    mounted: bool,
}

impl ScrollManager {
    pub fn new(window: Arc<dyn Window>) -> Self {
        ScrollManager {
            window,
            last: None,
            pop_listener: false,
            restoration_listener: false,
            mounted: true,
        }
    }

    /// Apply the policy for a navigation to `location`.
    ///
    /// The viewport is always reset; repeated calls for the same location are
    /// harmless. Unload listeners are registered at most once each.
    pub fn on_location_change(&mut self, location: &Location, action: HistoryAction) {
        if self.last.as_ref() != Some(location) {
            log::debug!("scroll reset for {}", location);
        }
        self.last = Some(location.clone());
        self.window.scroll_to(0, 0);

        if action == HistoryAction::Pop && !self.pop_listener {
            self.window.add_unload_listener(reset_on_unload(&self.window));
            self.pop_listener = true;
        }

        if let Some(mode) = self.window.scroll_restoration() {
            if mode == ScrollRestoration::Auto {
                self.window.set_scroll_restoration(ScrollRestoration::Manual);
            }
            if !self.restoration_listener {
                self.window.add_unload_listener(reset_on_unload(&self.window));
                self.restoration_listener = true;
            }
        }
    }

    /// Owner teardown: reset scroll one last time.
    pub fn unmount(&mut self) {
        if self.mounted {
            self.window.scroll_to(0, 0);
            self.mounted = false;
        }
    }
}

impl Drop for ScrollManager {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn reset_on_unload(window: &Arc<dyn Window>) -> Box<dyn Fn() + Send + Sync> {
    let weak: Weak<dyn Window> = Arc::downgrade(window);
    Box::new(move || {
        if let Some(w) = weak.upgrade() {
            w.scroll_to(0, 0);
        }
    })
}
