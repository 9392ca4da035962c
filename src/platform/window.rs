//! Viewport scroll and history scroll-restoration primitives

use std::sync::{Arc, Mutex};

/// How the last navigation was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryAction {
    #[default]
    Push,
    Replace,
    /// Back/forward traversal
    Pop,
}

/// The history's automatic scroll restoration mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRestoration {
    Auto,
    Manual,
}

pub type UnloadListener = Box<dyn Fn() + Send + Sync>;

pub trait Window: Send + Sync {
    fn scroll_to(&self, x: i32, y: i32);
    fn scroll_offset(&self) -> (i32, i32);
    /// `None` when the platform does not expose scroll restoration at all.
    fn scroll_restoration(&self) -> Option<ScrollRestoration>;
    fn set_scroll_restoration(&self, mode: ScrollRestoration);
    fn add_unload_listener(&self, listener: UnloadListener);
    fn unload_listener_count(&self) -> usize;
    /// Fire every registered unload listener.
    fn dispatch_unload(&self);
}

struct WindowState {
    offset: (i32, i32),
    restoration: Option<ScrollRestoration>,
}

/// In-memory window used by the headless platform and tests
pub struct HeadlessWindow {
    state: Mutex<WindowState>,
    listeners: Mutex<Vec<Arc<dyn Fn() + Send + Sync>>>,
}

impl HeadlessWindow {
    pub fn new() -> Self {
        Self::with_restoration(Some(ScrollRestoration::Auto))
    }

    pub fn with_restoration(restoration: Option<ScrollRestoration>) -> Self {
        HeadlessWindow {
            state: Mutex::new(WindowState {
                offset: (0, 0),
                restoration,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl Window for HeadlessWindow {
    fn scroll_to(&self, x: i32, y: i32) {
        self.state.lock().unwrap().offset = (x, y);
    }

    fn scroll_offset(&self) -> (i32, i32) {
        self.state.lock().unwrap().offset
    }

    fn scroll_restoration(&self) -> Option<ScrollRestoration> {
        self.state.lock().unwrap().restoration
    }

    fn set_scroll_restoration(&self, mode: ScrollRestoration) {
        let mut g = self.state.lock().unwrap();
        // Platforms without the API silently ignore the assignment.
        if g.restoration.is_some() {
            g.restoration = Some(mode);
        }
    }

    fn add_unload_listener(&self, listener: UnloadListener) {
        self.listeners.lock().unwrap().push(Arc::from(listener));
    }

    fn unload_listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    fn dispatch_unload(&self) {
        // Snapshot first so listeners may touch the window without deadlocking.
        let listeners = self.listeners.lock().unwrap().clone();
        for l in listeners {
            l();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_window_tracks_scroll_and_restoration() {
        let w = HeadlessWindow::new();
        w.scroll_to(10, 250);
        assert_eq!(w.scroll_offset(), (10, 250));
        assert_eq!(w.scroll_restoration(), Some(ScrollRestoration::Auto));
        w.set_scroll_restoration(ScrollRestoration::Manual);
        assert_eq!(w.scroll_restoration(), Some(ScrollRestoration::Manual));
    }

    #[test]
    fn missing_restoration_api_ignores_assignment() {
        let w = HeadlessWindow::with_restoration(None);
        w.set_scroll_restoration(ScrollRestoration::Manual);
        assert_eq!(w.scroll_restoration(), None);
    }

    #[test]
    fn unload_fires_listeners() {
        let w = Arc::new(HeadlessWindow::new());
        let weak = Arc::downgrade(&w);
        w.add_unload_listener(Box::new(move || {
            if let Some(w) = weak.upgrade() {
                w.scroll_to(0, 0);
            }
        }));
        w.scroll_to(3, 4);
        w.dispatch_unload();
        assert_eq!(w.scroll_offset(), (0, 0));
        assert_eq!(w.unload_listener_count(), 1);
    }
}
