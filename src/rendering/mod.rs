//! Rendering pipeline used by captures: layout, paint, raster.

pub mod layout;
pub mod paint;
pub mod raster;

use base64::Engine as _;

/// MIME type of encoded captures
pub const CAPTURE_MIME: &str = "image/jpeg";

/// A rasterized and JPEG-encoded DOM subtree
#[derive(Debug, Clone)]
pub struct Capture {
    /// Bitmap width in device pixels
    pub width: u32,
    /// Bitmap height in device pixels
    pub height: u32,
    pub jpeg_data: Vec<u8>,
    /// Digest of the raw bitmap before encoding
    pub digest: String,
}

impl Capture {
    /// `data:image/jpeg;base64,...`
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            CAPTURE_MIME,
            base64::engine::general_purpose::STANDARD.encode(&self.jpeg_data)
        )
    }
}
