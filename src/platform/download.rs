//! Client-side download primitives: anchor links and new browsing contexts

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A synthesized `<a href download>` element
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub href: String,
    pub download: String,
}

/// Handle to an anchor appended to the document body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorId(pub usize);

pub trait Downloads: Send + Sync {
    /// Whether anchors honour the `download` attribute.
    fn supports_download_attribute(&self) -> bool;
    fn append_anchor(&self, anchor: Anchor) -> AnchorId;
    fn click(&self, id: AnchorId) -> Result<()>;
    fn remove_anchor(&self, id: AnchorId);
    /// Open `url` in a new browsing context.
    fn open(&self, url: &str) -> Result<()>;
}

#[derive(Default)]
struct DownloadState {
    next_anchor: usize,
    body: HashMap<usize, Anchor>,
    saved: Vec<PathBuf>,
    opened: Vec<String>,
}

/// Headless downloads: clicking an anchor writes the decoded `href` into a
/// directory under the anchor's `download` name; `open` records the URL.
pub struct HeadlessDownloads {
    dir: Option<PathBuf>,
    download_attribute: bool,
    state: Mutex<DownloadState>,
}

impl HeadlessDownloads {
    pub fn new(dir: Option<PathBuf>) -> Self {
        HeadlessDownloads {
            dir,
            download_attribute: true,
            state: Mutex::new(DownloadState::default()),
        }
    }

    /// A platform whose anchors ignore the `download` attribute.
    pub fn without_download_attribute(dir: Option<PathBuf>) -> Self {
        HeadlessDownloads {
            download_attribute: false,
            ..Self::new(dir)
        }
    }

    pub fn saved(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().saved.clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    /// Anchors still attached to the body.
    pub fn attached_anchors(&self) -> usize {
        self.state.lock().unwrap().body.len()
    }

    /// Forget the recorded downloads and opened URLs.
    pub fn clear_history(&self) {
        let mut g = self.state.lock().unwrap();
        g.saved.clear();
        g.opened.clear();
    }

    fn save(&self, dir: &Path, anchor: &Anchor) -> Result<PathBuf> {
        let (_, bytes) = crate::loader::decode_data_url(&anchor.href)?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&anchor.download);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl Downloads for HeadlessDownloads {
    fn supports_download_attribute(&self) -> bool {
        self.download_attribute
    }

    fn append_anchor(&self, anchor: Anchor) -> AnchorId {
        let mut g = self.state.lock().unwrap();
        let id = g.next_anchor;
        g.next_anchor += 1;
        g.body.insert(id, anchor);
        AnchorId(id)
    }

    fn click(&self, id: AnchorId) -> Result<()> {
        let anchor = self
            .state
            .lock()
            .unwrap()
            .body
            .get(&id.0)
            .cloned()
            .ok_or_else(|| Error::Other(format!("anchor {} is not attached", id.0)))?;
        let Some(dir) = &self.dir else {
            log::debug!("no download directory; dropping {}", anchor.download);
            return Ok(());
        };
        let path = self.save(dir, &anchor)?;
        log::info!("downloaded {}", path.display());
        self.state.lock().unwrap().saved.push(path);
        Ok(())
    }

    fn remove_anchor(&self, id: AnchorId) {
        self.state.lock().unwrap().body.remove(&id.0);
    }

    fn open(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().opened.push(url.to_string());
        Ok(())
    }
}
