use crate::{
    compositor::shaped_texture::{PaintContext, ShapedTexture},
    foundation::{
        error::TexcompResult, geometry::IntRect, math::mul_div255_u8,
        transform::MonitorTransform,
    },
    format::{convert::rgba8888_positions, pixel_format::PixelFormat},
    gpu::backend::{GpuBackend, Texture},
};

/// Premultiplied ARGB32 as laid out in memory on this machine.
#[cfg(target_endian = "little")]
pub const CAPTURE_FORMAT: PixelFormat = PixelFormat::Bgra8888Pre;
#[cfg(target_endian = "big")]
pub const CAPTURE_FORMAT: PixelFormat = PixelFormat::Argb8888Pre;

/// Surface pixels read back into CPU memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl CapturedImage {
    fn zeroed(width: u32, height: u32) -> Self {
        let stride = width as usize * 4;
        Self {
            width,
            height,
            stride,
            format: CAPTURE_FORMAT,
            data: vec![0; stride * height as usize],
        }
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`, still premultiplied.
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let positions = rgba8888_positions(self.format)?;
        let at = y as usize * self.stride + x as usize * 4;
        let px = self.data.get(at..at + 4)?;
        Some(positions.map(|p| px[p]))
    }
}

impl ShapedTexture {
    /// Reads back `clip` of the surface (destination coordinates), or all of it.
    ///
    /// Returns `Ok(None)` without a texture or when `clip` misses the surface. Surfaces that cannot
    /// be read straight from their texture are first painted into a temporary offscreen target.
    #[tracing::instrument(skip(self, backend))]
    pub fn get_image(
        &mut self,
        backend: &mut dyn GpuBackend,
        clip: Option<IntRect>,
    ) -> TexcompResult<Option<CapturedImage>> {
        let Some(texture) = self.texture().cloned() else {
            return Ok(None);
        };
        let (dst_w, dst_h) = self.dst_size();
        let bounds = IntRect::from_size(dst_w, dst_h);
        let clip = match clip {
            Some(clip) => clip.intersect(bounds),
            None => Some(bounds),
        };
        let Some(clip) = clip.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let needs_offscreen = !texture.is_simple()
            || self.has_viewport()
            || self.transform() != MonitorTransform::Normal
            || self.buffer_scale() != 1
            || rgba8888_positions(texture.plane(0).format()).is_none();
        if needs_offscreen {
            return self.capture_offscreen(backend, clip).map(Some);
        }

        let plane = texture.plane(0);
        let full_stride = plane.width() as usize * 4;
        let mut full = vec![0u8; full_stride * plane.height() as usize];
        backend.texture_get_data(plane, CAPTURE_FORMAT, full_stride, &mut full)?;

        let mut image = CapturedImage::zeroed(clip.width as u32, clip.height as u32);
        for row in 0..clip.height as usize {
            let src = (clip.y as usize + row) * full_stride + clip.x as usize * 4;
            let dst = row * image.stride;
            image.data[dst..dst + image.stride].copy_from_slice(&full[src..src + image.stride]);
        }

        if let Some(mask) = self.mask_texture().cloned() {
            apply_mask(backend, &mask, clip, &mut image)?;
        }
        Ok(Some(image))
    }

    fn capture_offscreen(
        &mut self,
        backend: &mut dyn GpuBackend,
        clip: IntRect,
    ) -> TexcompResult<CapturedImage> {
        let (dst_w, dst_h) = self.dst_size();
        let target = backend.texture_new_with_size(
            dst_w as u32,
            dst_h as u32,
            PixelFormat::Rgba8888Pre,
        )?;
        let framebuffer = backend.offscreen_new(&target)?;
        backend.clear(&framebuffer, [0.0; 4]);

        let saved_clip = self.clip_region().cloned();
        self.set_clip_region(None);
        let report = self.paint(&mut PaintContext::new(&mut *backend, &framebuffer));
        self.set_clip_region(saved_clip);
        tracing::debug!(?report, "painted surface for capture");

        let mut image = CapturedImage::zeroed(clip.width as u32, clip.height as u32);
        backend.read_pixels(
            &framebuffer,
            clip,
            CAPTURE_FORMAT,
            image.stride,
            &mut image.data,
        )?;
        Ok(image)
    }
}

/// Scales every pixel by the mask's coverage at the same destination position.
fn apply_mask(
    backend: &mut dyn GpuBackend,
    mask: &Texture,
    clip: IntRect,
    image: &mut CapturedImage,
) -> TexcompResult<()> {
    let stride = mask.width() as usize;
    let mut coverage = vec![0u8; stride * mask.height() as usize];
    backend.texture_get_data(mask, PixelFormat::A8, stride, &mut coverage)?;

    for row in 0..image.height as usize {
        for col in 0..image.width as usize {
            let (mx, my) = (clip.x as usize + col, clip.y as usize + row);
            let a = if mx < stride && my < mask.height() as usize {
                coverage[my * stride + mx]
            } else {
                0
            };
            let at = row * image.stride + col * 4;
            for c in &mut image.data[at..at + 4] {
                *c = mul_div255_u8(*c, a);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/capture.rs"]
mod tests;
