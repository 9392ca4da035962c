//! Platform API surface: viewport scrolling, history scroll restoration,
//! unload listeners and client-side downloads.
//!
//! These are the browser collaborators the shell talks to. The headless
//! implementations are deterministic and inspectable so behaviour can be
//! asserted in tests.

pub mod download;
pub mod window;

pub use download::{Anchor, AnchorId, Downloads, HeadlessDownloads};
pub use window::{HeadlessWindow, HistoryAction, ScrollRestoration, UnloadListener, Window};

use std::path::PathBuf;
use std::sync::Arc;

/// A small composite trait that gives the shell typed access to its
/// platform collaborators.
pub trait PlatformApi: Send + Sync {
    fn window(&self) -> Arc<dyn Window>;
    fn downloads(&self) -> Arc<dyn Downloads>;
}

/// Headless platform backed by [`HeadlessWindow`] and [`HeadlessDownloads`].
pub struct HeadlessPlatform {
    window: Arc<HeadlessWindow>,
    downloads: Arc<HeadlessDownloads>,
}

impl HeadlessPlatform {
    pub fn new(download_dir: Option<PathBuf>) -> Self {
        Self::with_parts(
            HeadlessWindow::new(),
            HeadlessDownloads::new(download_dir),
        )
    }

    pub fn with_parts(window: HeadlessWindow, downloads: HeadlessDownloads) -> Self {
        HeadlessPlatform {
            window: Arc::new(window),
            downloads: Arc::new(downloads),
        }
    }

    /// Concrete window handle for inspection.
    pub fn headless_window(&self) -> Arc<HeadlessWindow> {
        self.window.clone()
    }

    /// Concrete downloads handle for inspection.
    pub fn headless_downloads(&self) -> Arc<HeadlessDownloads> {
        self.downloads.clone()
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PlatformApi for HeadlessPlatform {
    fn window(&self) -> Arc<dyn Window> {
        self.window.clone()
    }

    fn downloads(&self) -> Arc<dyn Downloads> {
        self.downloads.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_platform_shares_its_surfaces() {
        let p = HeadlessPlatform::default();
        p.window().scroll_to(5, 5);
        assert_eq!(p.headless_window().scroll_offset(), (5, 5));

        let d = p.downloads();
        assert!(d.supports_download_attribute());
        d.open("data:,x").unwrap();
        assert_eq!(p.headless_downloads().opened(), vec!["data:,x".to_string()]);
    }
}
