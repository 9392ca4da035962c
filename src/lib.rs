//! RFox Pages
//!
//! A headless single-page application shell: a static route table with
//! nested outlets, a shared layout, scroll restoration on navigation, and an
//! export feature that rasterizes a DOM subtree into a downloadable JPEG.
//!
//! # Features
//!
//! - **Router**: exact-path route table with a wildcard fallback and nested child outlets
//! - **Async images**: remote images are preloaded into same-origin data URLs
//! - **Export**: layout → paint → raster → JPEG data URL → download
//! - **Headless platform**: scroll, history and download APIs are traits with
//!   deterministic in-memory implementations
//!
//! # Example
//!
//! ```no_run
//! use rfpages::{AppConfig, HistoryAction};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig {
//!     download_dir: Some("out".into()),
//!     ..Default::default()
//! };
//!
//! let handle = rfpages::AppHandle::new(config).await?;
//! handle.navigate("/about", HistoryAction::Push).await?;
//! handle.set_title("Holiday").await?;
//! let capture = handle.export().await?;
//! println!("exported {}x{}", capture.width, capture.height);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

pub mod error;
pub use error::{Error, Result};

pub mod context;
pub mod dom;
pub mod export;
pub mod layout;
pub mod loader;
pub mod platform;
pub mod rendering;
pub mod router;
pub mod screens;
pub mod scroll;

// Async-friendly facade owning the app on a UI thread
#[cfg(feature = "http")]
pub mod async_api;

#[cfg(feature = "http")]
pub use async_api::AppHandle;

pub use context::{AppContext, AppSharedState};
pub use dom::{Element, Node};
pub use export::{CaptureOptions, DownloadOutcome, DOWNLOAD_FILENAME};
pub use layout::LayoutProps;
pub use loader::{ImageFetcher, ImageLoader, ImageSlot, LoadedImage};
pub use platform::{HeadlessPlatform, HistoryAction, PlatformApi};
pub use rendering::Capture;
pub use router::{Location, RouteEntry, RouteTable};
pub use screens::{PhotoItem, PhotoScreenConfig, Screen};

use screens::{render_screen, PhotoScreen, RenderContext, PRINT_REF};
use scroll::ScrollManager;

/// Configuration for the shell
///
/// The defaults match the interactive application: captures are upscaled
/// four times and written as high-quality JPEG.
///
/// # Examples
///
/// ```
/// let cfg = rfpages::AppConfig::default();
/// assert_eq!(cfg.capture_scale, 4.0);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// User agent string sent with image requests
    pub user_agent: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Timeout for image fetches in milliseconds
    pub timeout_ms: u64,
    /// Extra HTTP headers sent with image requests
    pub headers: HashMap<String, String>,
    /// Document origin; images from it never taint a capture
    pub origin: String,
    /// Width of the capture layout in CSS pixels
    pub capture_width: u32,
    /// Upscaling factor for exported images
    pub capture_scale: f32,
    /// JPEG quality (1..=100)
    pub jpeg_quality: u8,
    /// Canvas background (CSS color)
    pub background: String,
    /// Where headless downloads are written; `None` discards them
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) RFOX-Pages/0.1".to_string(),
            viewport: Viewport::default(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            origin: "http://localhost".to_string(),
            capture_width: 640,
            capture_scale: 4.0,
            jpeg_quality: 90,
            background: "#ffffff".to_string(),
            download_dir: None,
        }
    }
}

impl AppConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let cfg: AppConfig = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.capture_scale > 0.0) || !self.capture_scale.is_finite() {
            return Err(Error::Config(format!(
                "capture_scale must be positive, got {}",
                self.capture_scale
            )));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::Config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.capture_width == 0 {
            return Err(Error::Config("capture_width must be non-zero".into()));
        }
        let scaled_width = self.capture_width as f64 * self.capture_scale as f64;
        if scaled_width > rendering::raster::MAX_BITMAP_SIDE as f64 {
            return Err(Error::Config(format!(
                "capture_width {} at scale {} exceeds the {}px bitmap limit",
                self.capture_width,
                self.capture_scale,
                rendering::raster::MAX_BITMAP_SIDE
            )));
        }
        self.background_rgba()?;
        self.origin_url()?;
        Ok(())
    }

    fn background_rgba(&self) -> Result<rendering::paint::Rgba> {
        rendering::paint::parse_color(&self.background)
            .ok_or_else(|| Error::Config(format!("unknown background color {}", self.background)))
    }

    fn origin_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.origin)
            .map_err(|e| Error::Config(format!("bad origin {}: {}", self.origin, e)))
    }

    /// Capture options for exports under this configuration.
    pub fn capture_options(&self, scale: f32) -> Result<CaptureOptions> {
        Ok(CaptureOptions {
            scale,
            use_cors: true,
            width: self.capture_width,
            quality: self.jpeg_quality,
            background: self.background_rgba()?,
            origin: Some(self.origin_url()?),
        })
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// The application root: route table, shared state, scroll policy and the
/// mounted screen's resources.
pub struct App {
    config: AppConfig,
    routes: RouteTable,
    context: AppContext,
    scroll: ScrollManager,
    platform: Arc<dyn PlatformApi>,
    loader: ImageLoader,
    layout: LayoutProps,
    photos: Option<PhotoScreen>,
}

impl App {
    /// Build the app at `/`. Image loads are spawned on `runtime`.
    pub fn new(
        config: AppConfig,
        platform: Arc<dyn PlatformApi>,
        fetcher: Arc<dyn ImageFetcher>,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self> {
        config.validate()?;
        let mut app = App {
            scroll: ScrollManager::new(platform.window()),
            routes: router::app_routes()?,
            context: AppContext::default(),
            loader: ImageLoader::new(fetcher, runtime),
            layout: LayoutProps::default(),
            photos: None,
            platform,
            config,
        };
        app.navigate("/", HistoryAction::Push);
        Ok(app)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn location(&self) -> &Location {
        self.context.location()
    }

    /// Shared state snapshot; stable until location or `logged` changes.
    pub fn shared_state(&self) -> Arc<AppSharedState> {
        self.context.values()
    }

    pub fn set_logged(&mut self, logged: bool) {
        self.context.set_logged(logged);
    }

    pub fn set_layout(&mut self, props: LayoutProps) {
        self.layout = props;
    }

    /// Navigate to `path`, applying the scroll policy and (un)mounting the
    /// photo screen as the matched routes change.
    pub fn navigate(&mut self, path: &str, action: HistoryAction) {
        let location = Location::parse(path);
        if self.context.set_location(location.clone()) {
            log::debug!("navigated to {} ({:?})", location, action);
        }
        self.scroll.on_location_change(&location, action);

        let wants_photos = self
            .routes
            .resolve(&location)
            .iter()
            .any(|e| e.element == Screen::About);
        match (wants_photos, self.photos.is_some()) {
            (true, false) => {
                let cfg = PhotoScreenConfig {
                    scale: self.config.capture_scale,
                    ..Default::default()
                };
                self.photos = Some(PhotoScreen::mount(cfg, &self.loader));
            }
            (false, true) => {
                if let Some(p) = self.photos.take() {
                    p.unmount();
                }
            }
            _ => {}
        }
    }

    /// Bind the title input of the photo screen.
    pub fn set_title(&mut self, title: &str) -> Result<()> {
        let photos = self
            .photos
            .as_mut()
            .ok_or_else(|| Error::Render(format!("{} has no title input", self.context.location())))?;
        photos.set_title(title);
        Ok(())
    }

    /// Image slots of the mounted screen.
    pub fn image_slots(&self) -> Vec<ImageSlot> {
        self.photos.as_ref().map(PhotoScreen::slots).unwrap_or_default()
    }

    /// Render the current location.
    pub fn render(&self) -> Node {
        let state = self.context.values();
        let ctx = RenderContext {
            routes: &self.routes,
            state: &state,
            photos: self.photos.as_ref(),
            layout: &self.layout,
        };
        self.routes
            .compose(&state.location, |entry, outlet| render_screen(&entry.element, &ctx, outlet))
    }

    pub fn render_html(&self) -> String {
        self.render().to_html()
    }

    /// The current screen's `data-ref="print"` subtree.
    pub fn capture_target(&self) -> Result<Node> {
        self.render()
            .find_by_ref(PRINT_REF)
            .cloned()
            .ok_or_else(|| Error::Render(format!("{} has nothing to export", self.context.location())))
    }

    fn capture_options(&self) -> Result<CaptureOptions> {
        let scale = self
            .photos
            .as_ref()
            .map(|p| p.config.scale)
            .unwrap_or(self.config.capture_scale);
        self.config.capture_options(scale)
    }

    /// Capture and download the current screen as it is rendered now.
    ///
    /// Images that have not resolved yet are left blank; see
    /// [`App::export_when_ready`].
    pub fn export(&self) -> Result<Capture> {
        let node = self.capture_target()?;
        export::export(&node, &self.capture_options()?, self.platform.downloads().as_ref())
    }

    /// Wait for every image of the current screen, then export.
    pub async fn export_when_ready(&self) -> Result<Capture> {
        let opts = self.capture_options()?;
        let downloads = self.platform.downloads();
        export::export_when_ready(
            &self.image_slots(),
            || self.capture_target(),
            &opts,
            downloads.as_ref(),
        )
        .await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(p) = self.photos.take() {
            p.unmount();
        }
    }
}

/// Build an app on the headless platform with HTTP image fetching.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "http")]
pub fn new_app(config: AppConfig) -> Result<App> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| Error::Config(format!("no tokio runtime: {}", e)))?;
    let fetcher = Arc::new(loader::HttpFetcher::new(&config)?);
    let platform = Arc::new(HeadlessPlatform::new(config.download_dir.clone()));
    App::new(config, platform, fetcher, runtime)
}
