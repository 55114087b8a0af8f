//! Cursor sprite upload and readback.

use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{TexcompError, TexcompResult},
    format::pixel_format::PixelFormat,
    gpu::backend::{GpuBackend, Texture},
};

/// Native-endian premultiplied ARGB32, the layout of decoded cursor theme images.
#[cfg(target_endian = "little")]
pub const CURSOR_UPLOAD_FORMAT: PixelFormat = PixelFormat::Bgra8888Pre;
#[cfg(target_endian = "big")]
pub const CURSOR_UPLOAD_FORMAT: PixelFormat = PixelFormat::Argb8888Pre;

/// One frame of a cursor theme entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XcursorImage {
    pub width: u32,
    pub height: u32,
    /// Nominal size the theme designed this frame for.
    pub size: u32,
    pub xhot: u32,
    pub yhot: u32,
    /// `0xAARRGGBB` words, row-major, premultiplied.
    pub pixels: Vec<u32>,
}

/// Cursor pixels read back for screen-cast metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CursorBitmap {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    /// Always [`PixelFormat::Rgba8888Pre`].
    pub data: Vec<u8>,
}

#[tracing::instrument(skip(backend, image), fields(width = image.width, height = image.height))]
pub fn upload_cursor_image(
    backend: &mut dyn GpuBackend,
    image: &XcursorImage,
) -> TexcompResult<Texture> {
    let expected = image.width as usize * image.height as usize;
    if image.pixels.len() != expected {
        return Err(TexcompError::validation(format!(
            "cursor image {}x{} has {} pixels, expected {expected}",
            image.width,
            image.height,
            image.pixels.len()
        )));
    }
    let bytes: Vec<u8> = image.pixels.iter().flat_map(|p| p.to_ne_bytes()).collect();
    backend
        .texture_new_from_data(
            image.width,
            image.height,
            CURSOR_UPLOAD_FORMAT,
            image.width as usize * 4,
            &bytes,
        )
        .inspect_err(|err| tracing::warn!(%err, "failed to allocate cursor texture"))
}

pub fn read_cursor_bitmap(
    backend: &mut dyn GpuBackend,
    texture: &Texture,
) -> TexcompResult<CursorBitmap> {
    let stride = texture.width() as usize * 4;
    let mut data = vec![0u8; stride * texture.height() as usize];
    backend.texture_get_data(texture, PixelFormat::Rgba8888Pre, stride, &mut data)?;
    Ok(CursorBitmap {
        width: texture.width(),
        height: texture.height(),
        stride,
        data,
    })
}

/// Size a theme image is shown at when the configured cursor size is `theme_size`.
///
/// Both dimensions derive from the image width, so non-square frames come out square.
pub fn xcursor_scaled_image_size(image: &XcursorImage, theme_size: u32) -> (i32, i32) {
    let image_size = if image.size == 0 { theme_size } else { image.size };
    let scale = theme_size as f32 / image_size.max(1) as f32;
    let width = (image.width as f32 * scale).ceil() as i32;
    let height = (image.width as f32 * scale).ceil() as i32;
    (width, height)
}

/// Hotspot snapped to whole logical pixels at `theme_scale`.
pub fn scaled_hotspot(image: &XcursorImage, theme_scale: u32) -> (i32, i32) {
    let scale = theme_scale.max(1) as f32;
    let snap = |v: u32| (v as f32 / scale).round() as i32 * theme_scale.max(1) as i32;
    (snap(image.xhot), snap(image.yhot))
}

#[cfg(test)]
#[path = "../tests/unit/cursor.rs"]
mod tests;
