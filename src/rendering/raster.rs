//! Rasterizer: display list to an RGBA bitmap, plus JPEG encoding

use crate::loader::{decode_data_url, is_data_url};
use crate::rendering::paint::{PaintCommand, Rgba};
use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba as Px, RgbaImage};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel
    pub scale: f32,
    /// Cross-origin images are requested with CORS instead of tainting the canvas
    pub use_cors: bool,
    pub background: Rgba,
    /// Document origin; images from it never taint
    pub origin: Option<url::Url>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        RasterOptions {
            scale: 1.0,
            use_cors: true,
            background: crate::rendering::paint::WHITE,
            origin: None,
        }
    }
}

/// An RGBA bitmap
#[derive(Debug, Clone)]
pub struct Pixmap {
    image: RgbaImage,
}

impl Pixmap {
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        let (r, g, b, a) = background;
        Pixmap {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), Px([r, g, b, a])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let p = self.image.get_pixel(x, y).0;
        (p[0], p[1], p[2], p[3])
    }

    /// Hex SHA-256 of the raw pixels; stable across runs.
    pub fn digest(&self) -> String {
        let mut h = Sha256::new();
        h.update(self.width().to_le_bytes());
        h.update(self.height().to_le_bytes());
        h.update(self.image.as_raw());
        hex::encode(h.finalize())
    }

    fn fill(&mut self, x: i64, y: i64, w: i64, h: i64, rgba: Rgba) {
        let x0 = x.clamp(0, self.width() as i64) as u32;
        let y0 = y.clamp(0, self.height() as i64) as u32;
        let x1 = (x + w).clamp(0, self.width() as i64) as u32;
        let y1 = (y + h).clamp(0, self.height() as i64) as u32;
        let (r, g, b, a) = rgba;
        for yy in y0..y1 {
            for xx in x0..x1 {
                self.image.put_pixel(xx, yy, Px([r, g, b, a]));
            }
        }
    }

    /// Encode as baseline JPEG. Alpha is dropped.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|e| Error::Rasterization(format!("JPEG encoding failed: {}", e)))?;
        Ok(out)
    }
}

/// Largest bitmap side the JPEG encoder can write.
pub const MAX_BITMAP_SIDE: u32 = 65535;
/// Upper bound on the RGBA buffer of one capture.
pub const MAX_BITMAP_BYTES: u64 = 512 * 1024 * 1024;

fn scaled(v: i64, scale: f32) -> i64 {
    (v as f32 * scale).round() as i64
}

/// Device-pixel size of a `width`×`height` canvas, refusing bitmaps that
/// could not be encoded or would not fit the memory budget.
pub fn bitmap_size(width: u32, height: u32, scale: f32) -> Result<(u32, u32)> {
    let side = |v: u32| -> Result<u32> {
        let px = (v as f64 * scale as f64).round().max(1.0);
        if px > MAX_BITMAP_SIDE as f64 {
            return Err(Error::Rasterization(format!(
                "{}px at scale {} exceeds the {}px bitmap limit",
                v, scale, MAX_BITMAP_SIDE
            )));
        }
        Ok(px as u32)
    };
    let (pw, ph) = (side(width)?, side(height)?);
    let bytes = (pw as u64)
        .checked_mul(ph as u64)
        .and_then(|n| n.checked_mul(4))
        .filter(|n| *n <= MAX_BITMAP_BYTES)
        .ok_or_else(|| {
            Error::Rasterization(format!("{}x{} bitmap exceeds the memory budget", pw, ph))
        })?;
    log::debug!("allocating {}x{} bitmap ({} bytes)", pw, ph, bytes);
    Ok((pw, ph))
}

/// Rasterize `commands` onto a `width`×`height` CSS-pixel canvas at `opts.scale`.
///
/// A cross-origin image without CORS taints the canvas and fails the whole
/// rasterization; with CORS an image that was never resolved stays blank.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, opts: &RasterOptions) -> Result<Pixmap> {
    if !(opts.scale > 0.0) || !opts.scale.is_finite() {
        return Err(Error::Rasterization(format!("invalid scale {}", opts.scale)));
    }
    let s = opts.scale;
    let (pw, ph) = bitmap_size(width, height, s)?;
    let mut pix = Pixmap::new(pw, ph, opts.background);

    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                pix.fill(
                    scaled(*x as i64, s),
                    scaled(*y as i64, s),
                    scaled(*width as i64, s).max(1),
                    scaled(*height as i64, s).max(1),
                    *rgba,
                );
            }
            PaintCommand::Text { x, y, text, font_size, rgba } => {
                draw_text(&mut pix, *x, *y, text, *font_size, *rgba, s);
            }
            PaintCommand::Image { x, y, width, height, src } => {
                draw_image(&mut pix, *x, *y, *width, *height, src, opts)?;
            }
        }
    }
    Ok(pix)
}

// Glyphs are drawn as solid cells on a fixed advance of half the font size.
fn draw_text(pix: &mut Pixmap, x: i32, y: i32, text: &str, font_size: u32, rgba: Rgba, s: f32) {
    let advance = (font_size / 2).max(1) as f32;
    let cap_top = font_size as f32 * 0.25;
    let cap_h = font_size as f32 * 0.75;
    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let gx = x as f32 + i as f32 * advance + advance * 0.1;
        let gy = y as f32 + cap_top;
        pix.fill(
            (gx * s).round() as i64,
            (gy * s).round() as i64,
            ((advance * 0.8) * s).round().max(1.0) as i64,
            (cap_h * s).round().max(1.0) as i64,
            rgba,
        );
    }
}

fn draw_image(pix: &mut Pixmap, x: i32, y: i32, w: u32, h: u32, src: &str, opts: &RasterOptions) -> Result<()> {
    if !is_data_url(src) {
        if is_cross_origin(src, opts.origin.as_ref()) && !opts.use_cors {
            return Err(Error::Rasterization(format!(
                "canvas tainted by cross-origin image {}",
                src
            )));
        }
        log::warn!("image {} was not resolved before capture; leaving it blank", src);
        return Ok(());
    }

    let decoded = decode_data_url(src)
        .and_then(|(_, bytes)| image::load_from_memory(&bytes).map_err(Error::from));
    let img = match decoded {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::warn!("skipping undecodable image: {}", e);
            return Ok(());
        }
    };
    let tw = scaled(w as i64, opts.scale).max(1) as u32;
    let th = scaled(h as i64, opts.scale).max(1) as u32;
    let resized = if img.dimensions() == (tw, th) {
        img
    } else {
        imageops::resize(&img, tw, th, FilterType::Triangle)
    };
    imageops::overlay(
        &mut pix.image,
        &resized,
        scaled(x as i64, opts.scale),
        scaled(y as i64, opts.scale),
    );
    Ok(())
}

fn is_cross_origin(src: &str, origin: Option<&url::Url>) -> bool {
    let Some(origin) = origin else {
        return true;
    };
    match origin.join(src) {
        Ok(u) => u.origin() != origin.origin(),
        Err(_) => true,
    }
}
