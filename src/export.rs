//! DOM subtree to downloadable JPEG.
//!
//! `capture` lays the subtree out, rasterizes it at the requested scale and
//! encodes the bitmap; `download` hands the data URL to the platform either
//! through a synthesized `<a download>` or by opening a new context.

use crate::dom::Node;
use crate::loader::ImageSlot;
use crate::platform::{Anchor, Downloads};
use crate::rendering::layout::layout_tree;
use crate::rendering::paint::{build_display_list, Rgba, WHITE};
use crate::rendering::raster::{rasterize, RasterOptions};
use crate::rendering::Capture;
use crate::Result;

/// File name given to every exported image
pub const DOWNLOAD_FILENAME: &str = "image.jpg";

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Upscaling factor applied to the CSS-pixel layout
    pub scale: f32,
    /// Request cross-origin-safe rendering instead of tainting the canvas
    pub use_cors: bool,
    /// Layout width in CSS pixels
    pub width: u32,
    /// JPEG quality, 1..=100
    pub quality: u8,
    pub background: Rgba,
    pub origin: Option<url::Url>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            scale: 1.0,
            use_cors: false,
            width: 640,
            quality: 90,
            background: WHITE,
            origin: None,
        }
    }
}

/// Rasterize `node` and encode it as JPEG.
pub fn capture(node: &Node, opts: &CaptureOptions) -> Result<Capture> {
    let tree = layout_tree(node, opts.width);
    let cmds = build_display_list(&tree);
    let raster = RasterOptions {
        scale: opts.scale,
        use_cors: opts.use_cors,
        background: opts.background,
        origin: opts.origin.clone(),
    };
    let pixmap = rasterize(&cmds, tree.width, tree.height, &raster)?;
    let jpeg_data = pixmap.encode_jpeg(opts.quality)?;
    Ok(Capture {
        width: pixmap.width(),
        height: pixmap.height(),
        jpeg_data,
        digest: pixmap.digest(),
    })
}

/// How a download was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A hidden anchor with the `download` attribute was clicked
    Anchor,
    /// The platform lacks the attribute; the data URL was opened instead
    NewContext,
}

/// Trigger a client-side download of `data_url` as [`DOWNLOAD_FILENAME`].
pub fn download(downloads: &dyn Downloads, data_url: &str) -> Result<DownloadOutcome> {
    if !downloads.supports_download_attribute() {
        downloads.open(data_url)?;
        return Ok(DownloadOutcome::NewContext);
    }
    let id = downloads.append_anchor(Anchor {
        href: data_url.to_string(),
        download: DOWNLOAD_FILENAME.to_string(),
    });
    let clicked = downloads.click(id);
    downloads.remove_anchor(id);
    clicked?;
    Ok(DownloadOutcome::Anchor)
}

/// Capture `node` and download the result.
pub fn export(node: &Node, opts: &CaptureOptions, downloads: &dyn Downloads) -> Result<Capture> {
    let capture = capture(node, opts)?;
    let outcome = download(downloads, &capture.data_url())?;
    log::info!(
        "exported {}x{} capture ({} bytes) via {:?}",
        capture.width,
        capture.height,
        capture.jpeg_data.len(),
        outcome
    );
    Ok(capture)
}

/// Resolve once every slot has settled. Slots load in parallel.
pub async fn wait_for_images(slots: &[ImageSlot]) {
    futures::future::join_all(slots.iter().map(|s| s.wait_ready())).await;
}

/// Await all image slots, then render and export.
///
/// `render` runs after the images settled so loaded data URLs are part of
/// the captured tree.
pub async fn export_when_ready<F>(
    slots: &[ImageSlot],
    render: F,
    opts: &CaptureOptions,
    downloads: &dyn Downloads,
) -> Result<Capture>
where
    F: FnOnce() -> Result<Node>,
{
    wait_for_images(slots).await;
    let node = render()?;
    export(&node, opts, downloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;
    use crate::platform::HeadlessDownloads;

    fn tiny_png_data_url() -> String {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        crate::loader::to_data_url(&crate::loader::FetchedImage {
            content_type: Some("image/png".into()),
            bytes,
        })
        .unwrap()
    }

    #[test]
    fn capture_of_same_origin_images_produces_jpeg_data_url() {
        let node: Node = Element::new("div")
            .child(Element::new("h1").text("Title"))
            .child(Element::new("img").attr("src", tiny_png_data_url()))
            .into();
        let cap = capture(&node, &CaptureOptions { width: 64, scale: 2.0, ..Default::default() }).unwrap();
        assert_eq!(cap.width, 128);
        let url = cap.data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.len() > "data:image/jpeg;base64,".len());
    }

    #[test]
    fn download_prefers_anchor_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let d = HeadlessDownloads::new(Some(dir.path().to_path_buf()));
        let outcome = download(&d, "data:image/jpeg;base64,/9j/").unwrap();
        assert_eq!(outcome, DownloadOutcome::Anchor);
        assert_eq!(d.attached_anchors(), 0);
        assert_eq!(d.saved(), vec![dir.path().join(DOWNLOAD_FILENAME)]);
    }

    #[test]
    fn download_falls_back_to_new_context() {
        let d = HeadlessDownloads::without_download_attribute(None);
        let outcome = download(&d, "data:image/jpeg;base64,/9j/").unwrap();
        assert_eq!(outcome, DownloadOutcome::NewContext);
        assert_eq!(d.opened(), vec!["data:image/jpeg;base64,/9j/".to_string()]);
        assert!(d.saved().is_empty());
    }
}
