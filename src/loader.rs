//! Asynchronous image preloading into same-origin data URLs.
//!
//! Remote images drawn into a capture would taint it, so screens fetch them
//! up front and embed the bytes as `data:` URLs. Each consumer owns an
//! [`ImageSlot`]; only the most recent request of a mounted slot may commit.

use crate::dom::{Element, Node};
use crate::{Error, Result};
use base64::Engine as _;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Raw response of an image fetch
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Source of image bytes. The HTTP implementation lives behind the `http`
/// feature; tests plug in in-memory fetchers.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage>>;
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::{FetchedImage, ImageFetcher};
    use crate::{AppConfig, Error, Result};
    use futures::future::BoxFuture;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
    use std::time::Duration;

    /// Plain HTTP GET fetcher; no authentication headers are added.
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl HttpFetcher {
        pub fn new(config: &AppConfig) -> Result<Self> {
            let mut headers = HeaderMap::new();
            for (k, v) in &config.headers {
                let name = HeaderName::from_bytes(k.as_bytes())
                    .map_err(|e| Error::Config(format!("bad header name {}: {}", k, e)))?;
                let value = HeaderValue::from_str(v)
                    .map_err(|e| Error::Config(format!("bad header value for {}: {}", k, e)))?;
                headers.insert(name, value);
            }
            let client = reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_millis(config.timeout_ms))
                .default_headers(headers)
                .build()
                .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
            Ok(Self { client })
        }
    }

    impl ImageFetcher for HttpFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<FetchedImage>> {
            Box::pin(async move {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| Error::Network(format!("GET {} failed: {}", url, e)))?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(Error::Network(format!("GET {} returned {}", url, status)));
                }
                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = resp
                    .bytes()
                    .await
                    .map_err(|e| Error::Decode(format!("reading body of {}: {}", url, e)))?;
                Ok(FetchedImage {
                    content_type,
                    bytes: bytes.to_vec(),
                })
            })
        }
    }
}

/// Build `data:<mime>;base64,<payload>` for a fetched body.
///
/// The MIME type is the response's content type without parameters, or the
/// sniffed image format, or `application/octet-stream`.
pub fn to_data_url(fetched: &FetchedImage) -> Result<String> {
    if fetched.bytes.is_empty() {
        return Err(Error::Decode("empty response body".into()));
    }
    let declared = fetched
        .content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());
    let mime = match declared {
        Some(m) => m,
        None => image::guess_format(&fetched.bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "application/octet-stream".to_string()),
    };
    let payload = base64::engine::general_purpose::STANDARD.encode(&fetched.bytes);
    Ok(format!("data:{};base64,{}", mime, payload))
}

/// Split a data URL into its MIME type and decoded bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| Error::Decode("not a data URL".into()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::Decode("data URL has no payload separator".into()))?;
    let (mime, is_base64) = match meta.strip_suffix(";base64") {
        Some(m) => (m, true),
        None => (meta, false),
    };
    let mime = if mime.is_empty() { "text/plain" } else { mime };
    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))?
    } else {
        payload.as_bytes().to_vec()
    };
    Ok((mime.to_string(), bytes))
}

pub fn is_data_url(src: &str) -> bool {
    src.starts_with("data:")
}

/// Fetch `url` and convert the body into a data URL.
pub async fn fetch_data_url(fetcher: &dyn ImageFetcher, url: &str) -> Result<String> {
    let image = fetcher.fetch(url).await?;
    to_data_url(&image)
}

/// An image resolved to a data URL
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub src: String,
    pub data_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Idle,
    Loading { generation: u64, src: String },
    Loaded(LoadedImage),
    /// Fetch or decode failed; renders like `Idle`.
    Failed { src: String },
}

impl SlotState {
    fn src(&self) -> Option<&str> {
        match self {
            SlotState::Idle => None,
            SlotState::Loading { src, .. } | SlotState::Failed { src } => Some(src.as_str()),
            SlotState::Loaded(img) => Some(img.src.as_str()),
        }
    }
}

/// Shared fetcher + runtime used to create slots
#[derive(Clone)]
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    runtime: Handle,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, runtime: Handle) -> Self {
        ImageLoader { fetcher, runtime }
    }

    pub fn slot(&self) -> ImageSlot {
        let (state, _) = watch::channel(SlotState::Idle);
        ImageSlot {
            loader: self.clone(),
            inner: Arc::new(SlotInner {
                next_generation: AtomicU64::new(1),
                mounted: AtomicBool::new(true),
                state,
            }),
        }
    }
}

struct SlotInner {
    next_generation: AtomicU64,
    mounted: AtomicBool,
    state: watch::Sender<SlotState>,
}

impl SlotInner {
    /// Commit a finished load if it is still the one the consumer wants.
    fn settle(&self, generation: u64, src: &str, res: Result<String>) -> bool {
        let mounted = &self.mounted;
        self.state.send_if_modified(|state| {
            let current = matches!(state, SlotState::Loading { generation: g, .. } if *g == generation);
            if !current || !mounted.load(Ordering::SeqCst) {
                log::debug!("dropping stale image load of {}", src);
                return false;
            }
            *state = match res {
                Ok(data_url) => {
                    log::debug!("image {} loaded", src);
                    SlotState::Loaded(LoadedImage {
                        src: src.to_string(),
                        data_url,
                    })
                }
                Err(e) => {
                    log::debug!("image {} failed to load: {}", src, e);
                    SlotState::Failed { src: src.to_string() }
                }
            };
            true
        })
    }
}

/// One consumer's view of an asynchronously loaded image.
#[derive(Clone)]
pub struct ImageSlot {
    loader: ImageLoader,
    inner: Arc<SlotInner>,
}

impl ImageSlot {
    /// Request `url`. Any earlier request of this slot loses the right to
    /// commit. Requesting the current source again is a no-op.
    pub fn load(&self, url: &str) {
        if !self.inner.mounted.load(Ordering::SeqCst) {
            return;
        }
        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst);
        let changed = self.inner.state.send_if_modified(|state| {
            if state.src() == Some(url) && !matches!(state, SlotState::Failed { .. }) {
                return false;
            }
            *state = SlotState::Loading {
                generation,
                src: url.to_string(),
            };
            true
        });
        if !changed {
            return;
        }

        log::debug!("loading image {} (generation {})", url, generation);
        let fetcher = self.loader.fetcher.clone();
        let inner = self.inner.clone();
        let url = url.to_string();
        self.loader.runtime.spawn(async move {
            let res = fetch_data_url(fetcher.as_ref(), &url).await;
            inner.settle(generation, &url, res);
        });
    }

    /// Drop interest in every pending load; later completions are ignored.
    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.state.send_replace(SlotState::Idle);
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SlotState {
        self.inner.state.borrow().clone()
    }

    pub fn current(&self) -> Option<LoadedImage> {
        match &*self.inner.state.borrow() {
            SlotState::Loaded(img) => Some(img.clone()),
            _ => None,
        }
    }

    /// Resolve once no load is pending (loaded, failed, idle or unmounted).
    pub async fn wait_ready(&self) {
        let mut rx = self.inner.state.subscribe();
        let _ = rx
            .wait_for(|s| !matches!(s, SlotState::Loading { .. }))
            .await;
    }

    /// Nothing until loaded, then `<img class="img">` with the data URL.
    pub fn render(&self, alt: &str) -> Node {
        match self.current() {
            Some(img) => Element::new("img")
                .attr("src", img.data_url)
                .attr("alt", alt)
                .class("img")
                .into(),
            None => Node::empty(),
        }
    }
}
