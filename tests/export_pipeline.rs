//! End-to-end export: route → capture target → JPEG → download

use futures::future::BoxFuture;
use rfpages::dom::Element;
use rfpages::export::{self, CaptureOptions};
use rfpages::loader::FetchedImage;
use rfpages::platform::{HeadlessDownloads, HeadlessPlatform, HeadlessWindow};
use rfpages::{App, AppConfig, Error, HistoryAction, ImageFetcher, Node, DOWNLOAD_FILENAME};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves a solid PNG for every URL and counts requests
struct SolidFetcher {
    hits: AtomicUsize,
}

impl ImageFetcher for SolidFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, rfpages::Result<FetchedImage>> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(FetchedImage {
                content_type: Some("image/png".into()),
                bytes: png(20, 30, [10, 120, 200, 255]),
            })
        })
    }
}

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn fetcher() -> Arc<SolidFetcher> {
    Arc::new(SolidFetcher { hits: AtomicUsize::new(0) })
}

fn small_config() -> AppConfig {
    AppConfig {
        capture_scale: 1.0,
        capture_width: 320,
        ..Default::default()
    }
}

fn is_jpeg(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xD8]) && bytes.ends_with(&[0xFF, 0xD9])
}

#[tokio::test(flavor = "multi_thread")]
async fn about_screen_exports_image_jpg() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(HeadlessPlatform::new(Some(dir.path().to_path_buf())));
    let fetcher = fetcher();
    let mut app = App::new(
        small_config(),
        platform.clone(),
        fetcher.clone(),
        tokio::runtime::Handle::current(),
    )
    .unwrap();

    app.navigate("/about", HistoryAction::Push);
    app.set_title("Holiday").unwrap();

    let capture = app.export_when_ready().await.unwrap();
    assert_eq!(fetcher.hits.load(Ordering::SeqCst), 2);
    assert!(capture.data_url().starts_with("data:image/jpeg;base64,"));
    assert!(capture.width > 0 && capture.height > 0);

    let saved = platform.headless_downloads().saved();
    assert_eq!(saved, vec![dir.path().join(DOWNLOAD_FILENAME)]);
    let bytes = std::fs::read(&saved[0]).unwrap();
    assert!(is_jpeg(&bytes));
    assert_eq!(bytes, capture.jpeg_data);

    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (capture.width, capture.height));

    // Anchor is removed after the click.
    assert_eq!(platform.headless_downloads().attached_anchors(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn loaded_images_are_embedded_before_capture() {
    let platform = Arc::new(HeadlessPlatform::default());
    let mut app = App::new(small_config(), platform, fetcher(), tokio::runtime::Handle::current()).unwrap();
    app.navigate("/about", HistoryAction::Push);

    let before = app.capture_target().unwrap();
    assert_eq!(before.images().iter().filter(|i| is_data(i)).count(), 0);

    export::wait_for_images(&app.image_slots()).await;
    let after = app.capture_target().unwrap();
    let embedded: Vec<_> = after.images().into_iter().filter(|i| is_data(i)).collect();
    assert_eq!(embedded.len(), 2);
    assert!(embedded.iter().all(|i| i.has_class("img")));
}

fn is_data(img: &Element) -> bool {
    img.get_attr("src").map_or(false, |s| s.starts_with("data:"))
}

#[tokio::test(flavor = "multi_thread")]
async fn export_now_leaves_pending_images_blank() {
    let platform = Arc::new(HeadlessPlatform::default());
    let mut app = App::new(small_config(), platform, fetcher(), tokio::runtime::Handle::current()).unwrap();
    app.navigate("/about", HistoryAction::Push);
    let capture = app.export().unwrap();
    assert!(is_jpeg(&capture.jpeg_data));
}

#[tokio::test]
async fn screens_without_capture_target_refuse_export() {
    let platform = Arc::new(HeadlessPlatform::default());
    let app = App::new(small_config(), platform.clone(), fetcher(), tokio::runtime::Handle::current()).unwrap();
    assert!(matches!(app.export(), Err(Error::Render(_))));
    assert!(platform.headless_downloads().saved().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn falls_back_to_new_context_without_download_attribute() {
    let platform = Arc::new(HeadlessPlatform::with_parts(
        HeadlessWindow::new(),
        HeadlessDownloads::without_download_attribute(None),
    ));
    let mut app = App::new(small_config(), platform.clone(), fetcher(), tokio::runtime::Handle::current()).unwrap();
    app.navigate("/about", HistoryAction::Push);
    let capture = app.export_when_ready().await.unwrap();

    let downloads = platform.headless_downloads();
    assert_eq!(downloads.opened(), vec![capture.data_url()]);
    assert!(downloads.saved().is_empty());
    assert_eq!(downloads.attached_anchors(), 0);
}

fn remote_image_tree() -> Node {
    Element::new("div")
        .child(Element::new("h1").text("Remote"))
        .child(
            Element::new("img")
                .attr("src", "https://picsum.photos/id/238/200/300")
                .attr("width", "40")
                .attr("height", "60"),
        )
        .into()
}

#[test]
fn cross_origin_image_without_cors_fails() {
    let opts = CaptureOptions {
        origin: Some(url::Url::parse("http://localhost").unwrap()),
        ..Default::default()
    };
    let err = export::capture(&remote_image_tree(), &opts).unwrap_err();
    assert!(matches!(err, Error::Rasterization(_)), "{:?}", err);
}

#[test]
fn cross_origin_image_with_cors_stays_blank() {
    let opts = CaptureOptions {
        use_cors: true,
        origin: Some(url::Url::parse("http://localhost").unwrap()),
        ..Default::default()
    };
    let capture = export::capture(&remote_image_tree(), &opts).unwrap();
    assert!(is_jpeg(&capture.jpeg_data));
}

#[test]
fn same_origin_unresolved_image_does_not_taint() {
    let tree: Node = Element::new("div")
        .child(Element::new("img").attr("src", "/local.png").attr("width", "10").attr("height", "10"))
        .into();
    let opts = CaptureOptions {
        origin: Some(url::Url::parse("http://localhost").unwrap()),
        ..Default::default()
    };
    assert!(export::capture(&tree, &opts).is_ok());
}

#[test]
fn scale_multiplies_bitmap_size() {
    let tree = Node::parse_html("<div><h1>Scaled</h1><p>two lines of text</p></div>");
    let one = export::capture(&tree, &CaptureOptions::default()).unwrap();
    let four = export::capture(&tree, &CaptureOptions { scale: 4.0, ..Default::default() }).unwrap();
    assert_eq!(four.width, one.width * 4);
    assert_eq!(four.height, one.height * 4);

    let zero = export::capture(&tree, &CaptureOptions { scale: 0.0, ..Default::default() });
    assert!(matches!(zero, Err(Error::Rasterization(_))));
}

#[test]
fn oversized_scale_is_refused_not_allocated() {
    let tree = Node::parse_html("<div><h1>x</h1></div>");
    let opts = CaptureOptions { scale: 200.0, width: 640, ..Default::default() };
    let res = export::capture(&tree, &opts);
    assert!(matches!(res, Err(Error::Rasterization(_))), "{:?}", res.map(|c| c.width));

    let cfg = AppConfig { capture_scale: 200.0, ..Default::default() };
    assert!(matches!(cfg.validate(), Err(Error::Config(_))));
}

#[test]
fn huge_image_attributes_still_capture() {
    let tree = Node::parse_html(
        r#"<div><img src="https://example.com/a.png" width="20000000" height="20000000"></div>"#,
    );
    let opts = CaptureOptions { use_cors: true, ..Default::default() };
    let capture = export::capture(&tree, &opts).unwrap();
    // Shrunk to the 624px content column, keeping the square aspect.
    assert_eq!(capture.width, 640);
    assert_eq!(capture.height, 624 + 16);
}
