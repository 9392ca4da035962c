//! The async facade driving an app on its UI thread

use futures::future::BoxFuture;
use rfpages::loader::FetchedImage;
use rfpages::platform::HeadlessPlatform;
use rfpages::{AppConfig, AppHandle, Error, HistoryAction, ImageFetcher};
use std::io::Cursor;
use std::sync::Arc;

struct StaticFetcher(Vec<u8>);

impl ImageFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, rfpages::Result<FetchedImage>> {
        Box::pin(async move {
            Ok(FetchedImage {
                content_type: None,
                bytes: self.0.clone(),
            })
        })
    }
}

fn fetcher() -> Arc<StaticFetcher> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 200, 0, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    Arc::new(StaticFetcher(out.into_inner()))
}

fn config() -> AppConfig {
    AppConfig {
        capture_scale: 1.0,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn navigate_render_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Arc::new(HeadlessPlatform::new(Some(dir.path().to_path_buf())));
    let handle = AppHandle::with_parts(config(), platform.clone(), fetcher())
        .await
        .expect("handle");

    assert!(handle.render_html().await.unwrap().contains("<h1>Home</h1>"));

    handle.navigate("/about", HistoryAction::Push).await.unwrap();
    handle.set_title("Trip").await.unwrap();
    let html = handle.render_html().await.unwrap();
    assert!(html.contains("Component name: Trip"));

    let capture = handle.export().await.unwrap();
    assert!(dir.path().join("image.jpg").exists());
    assert_eq!(platform.headless_downloads().saved().len(), 1);
    assert!(capture.jpeg_data.len() > 2);

    // Images were embedded once the export had waited for them.
    assert!(handle.render_html().await.unwrap().contains("src=\"data:image/png;base64,"));

    handle.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn shared_state_is_reported() {
    let handle = AppHandle::with_parts(config(), Arc::new(HeadlessPlatform::default()), fetcher())
        .await
        .unwrap();
    handle.set_logged(true).await.unwrap();
    handle.navigate("/messages?x=1", HistoryAction::Push).await.unwrap();
    let state = handle.shared_state().await.unwrap();
    assert!(state.logged);
    assert_eq!(state.location.pathname, "/messages");
    assert_eq!(state.location.search, "?x=1");
    handle.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn errors_cross_the_thread_boundary() {
    let handle = AppHandle::with_parts(config(), Arc::new(HeadlessPlatform::default()), fetcher())
        .await
        .unwrap();
    assert!(matches!(handle.set_title("x").await, Err(Error::Render(_))));
    assert!(matches!(handle.export_now().await, Err(Error::Render(_))));
    handle.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_fails_initialisation() {
    let bad = AppConfig {
        jpeg_quality: 0,
        ..Default::default()
    };
    let res = AppHandle::with_parts(bad, Arc::new(HeadlessPlatform::default()), fetcher()).await;
    assert!(matches!(res, Err(Error::Config(_))));
}
