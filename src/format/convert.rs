use crate::{
    foundation::{
        error::{TexcompError, TexcompResult},
        math::{mul_div255_u8, unpremul_u8},
    },
    format::pixel_format::PixelFormat,
};

/// Byte offsets of the R, G, B and A components inside one 32-bit 8888 pixel.
pub fn rgba8888_positions(format: PixelFormat) -> Option<[usize; 4]> {
    match format {
        PixelFormat::Rgba8888 | PixelFormat::Rgba8888Pre => Some([0, 1, 2, 3]),
        PixelFormat::Bgra8888 | PixelFormat::Bgra8888Pre => Some([2, 1, 0, 3]),
        PixelFormat::Argb8888 | PixelFormat::Argb8888Pre => Some([1, 2, 3, 0]),
        PixelFormat::Abgr8888 | PixelFormat::Abgr8888Pre => Some([3, 2, 1, 0]),
        _ => None,
    }
}

/// Size in bytes of a `height`-row image whose last row holds `row_bytes`.
pub fn required_len(stride: usize, row_bytes: usize, height: u32) -> usize {
    match height {
        0 => 0,
        h => stride * (h as usize - 1) + row_bytes,
    }
}

/// Converts a `width` x `height` image between pixel formats.
///
/// Identical formats copy rows. Any pair of 32-bit 8888 layouts converts by swizzling, adding or
/// removing premultiplication as needed. Everything else is rejected.
#[allow(clippy::too_many_arguments)]
pub fn convert_pixels(
    src_format: PixelFormat,
    src: &[u8],
    src_stride: usize,
    dst_format: PixelFormat,
    dst: &mut [u8],
    dst_stride: usize,
    width: u32,
    height: u32,
) -> TexcompResult<()> {
    if src_format.n_planes() != 1 || dst_format.n_planes() != 1 {
        return Err(TexcompError::unsupported(format!(
            "cannot convert multi-plane formats ({src_format} -> {dst_format})"
        )));
    }

    let src_row = width as usize * src_format.bytes_per_pixel_plane0();
    let dst_row = width as usize * dst_format.bytes_per_pixel_plane0();
    if src.len() < required_len(src_stride, src_row, height) {
        return Err(TexcompError::validation(format!(
            "source buffer too small: {} bytes for {width}x{height} {src_format} (stride {src_stride})",
            src.len()
        )));
    }
    if dst.len() < required_len(dst_stride, dst_row, height) {
        return Err(TexcompError::validation(format!(
            "destination buffer too small: {} bytes for {width}x{height} {dst_format} (stride {dst_stride})",
            dst.len()
        )));
    }

    if src_format == dst_format {
        for y in 0..height as usize {
            let s = &src[y * src_stride..y * src_stride + src_row];
            dst[y * dst_stride..y * dst_stride + dst_row].copy_from_slice(s);
        }
        return Ok(());
    }

    let (Some(sp), Some(dp)) = (
        rgba8888_positions(src_format),
        rgba8888_positions(dst_format),
    ) else {
        return Err(TexcompError::unsupported(format!(
            "no conversion from {src_format} to {dst_format}"
        )));
    };

    let premultiply = !src_format.is_premultiplied() && dst_format.is_premultiplied();
    let unpremultiply = src_format.is_premultiplied() && !dst_format.is_premultiplied();

    for y in 0..height as usize {
        for x in 0..width as usize {
            let s = &src[y * src_stride + x * 4..y * src_stride + x * 4 + 4];
            let mut rgba = [s[sp[0]], s[sp[1]], s[sp[2]], s[sp[3]]];
            let a = rgba[3];
            if premultiply {
                for c in &mut rgba[..3] {
                    *c = mul_div255_u8(*c, a);
                }
            } else if unpremultiply {
                for c in &mut rgba[..3] {
                    *c = unpremul_u8(*c, a);
                }
            }
            let d = &mut dst[y * dst_stride + x * 4..y * dst_stride + x * 4 + 4];
            for (i, v) in rgba.into_iter().enumerate() {
                d[dp[i]] = v;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/format/convert.rs"]
mod tests;
