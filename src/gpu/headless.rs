use std::collections::HashMap;

use kurbo::{Affine, Point};
use serde::Serialize;

use crate::{
    foundation::{
        error::{TexcompError, TexcompResult},
        geometry::IntRect,
    },
    format::{
        convert::{convert_pixels, required_len, rgba8888_positions},
        pixel_format::PixelFormat,
    },
    gpu::backend::{
        BlendMode, CombineFunc, DrawParams, Filter, Framebuffer, GpuBackend, Pipeline,
        PipelineDesc, Texture, TexturedRect, WeakTexture, serialize_affine,
    },
};

/// One recorded backend call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        framebuffer: u64,
        color: [f32; 4],
    },
    Draw {
        framebuffer: u64,
        pipeline: u64,
        pipeline_name: &'static str,
        textures: Vec<u64>,
        filters: Vec<(Filter, Filter)>,
        color: [f32; 4],
        #[serde(serialize_with = "serialize_affine")]
        transform: Affine,
        rect: TexturedRect,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HeadlessStats {
    pub textures_allocated: u64,
    pub offscreens_allocated: u64,
    pub pipelines_created: u64,
    pub draws: u64,
    pub clears: u64,
    pub failed_allocations: u64,
    pub textures_released: u64,
}

struct StoredTexture {
    handle: WeakTexture,
    width: u32,
    height: u32,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl StoredTexture {
    fn zeroed(texture: &Texture) -> Self {
        let (width, height, format) = (texture.width(), texture.height(), texture.format());
        let stride = width as usize * format.bytes_per_pixel_plane0();
        Self {
            handle: texture.downgrade(),
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let bpp = self.format.bytes_per_pixel_plane0();
        let at = y as usize * self.stride + x as usize * bpp;
        let px = &self.data[at..at + bpp];
        let rgba: [u8; 4] = match self.format {
            PixelFormat::A8 => [0, 0, 0, px[0]],
            PixelFormat::G8 => [px[0], px[0], px[0], 255],
            PixelFormat::Rg88 => [px[0], px[1], 0, 255],
            PixelFormat::Rgb888 => [px[0], px[1], px[2], 255],
            PixelFormat::Bgr888 => [px[2], px[1], px[0], 255],
            f if rgba8888_positions(f).is_some() => {
                let mut out = [0u8; 4];
                match convert_pixels(f, px, 4, PixelFormat::Rgba8888Pre, &mut out, 4, 1, 1) {
                    Ok(()) => out,
                    Err(_) => [0; 4],
                }
            }
            _ => [0; 4],
        };
        rgba.map(|c| f32::from(c) / 255.0)
    }

    fn write_texel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if rgba8888_positions(self.format).is_none() {
            return;
        }
        let src = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let at = y as usize * self.stride + x as usize * 4;
        let dst = &mut self.data[at..at + 4];
        let converted =
            convert_pixels(PixelFormat::Rgba8888Pre, &src, 4, self.format, dst, 4, 1, 1);
        debug_assert!(converted.is_ok(), "8888 texel conversion failed");
    }
}

/// Backend that records every command and keeps texture contents in CPU memory.
///
/// Draws are also rasterized with nearest sampling for 8-bit single-plane layouts so readback
/// reflects what was painted. Shader snippets are recorded but not evaluated.
#[derive(Default)]
pub struct HeadlessBackend {
    textures: HashMap<u64, StoredTexture>,
    commands: Vec<DrawCommand>,
    stats: HeadlessStats,
    fail_allocations: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following texture and framebuffer allocation fail until reset.
    pub fn set_fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    pub fn stats(&self) -> HeadlessStats {
        self.stats.clone()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw commands that targeted `framebuffer`.
    pub fn draws_to(&self, framebuffer: &Framebuffer) -> Vec<&DrawCommand> {
        self.commands
            .iter()
            .filter(|c| {
                matches!(c, DrawCommand::Draw { framebuffer: id, .. } if *id == framebuffer.id())
            })
            .collect()
    }

    /// Allocates a premultiplied RGBA render target standing in for an output.
    pub fn onscreen_new(&mut self, width: u32, height: u32) -> TexcompResult<Framebuffer> {
        let texture = self.texture_new_with_size(width, height, PixelFormat::Rgba8888Pre)?;
        self.offscreen_new(&texture)
    }

    /// Number of textures whose storage is still held.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Frees the storage of textures no handle refers to anymore.
    pub fn release_dropped(&mut self) {
        let before = self.textures.len();
        self.textures.retain(|_, t| t.handle.is_alive());
        let released = (before - self.textures.len()) as u64;
        if released > 0 {
            self.stats.textures_released = self.stats.textures_released.saturating_add(released);
            tracing::debug!(released, "released dropped headless textures");
        }
    }

    /// Raw stored bytes of a texture, tightly packed in its own format.
    pub fn texture_bytes(&self, texture: &Texture) -> Option<&[u8]> {
        self.textures.get(&texture.id()).map(|t| t.data.as_slice())
    }

    fn check_allocation(&mut self, what: &str) -> TexcompResult<()> {
        if self.fail_allocations {
            self.stats.failed_allocations = self.stats.failed_allocations.saturating_add(1);
            tracing::debug!(what, "headless allocation failure injected");
            return Err(TexcompError::allocation(format!("failed to allocate {what}")));
        }
        Ok(())
    }

    fn store(&mut self, texture: &Texture) -> TexcompResult<&StoredTexture> {
        self.textures
            .get(&texture.id())
            .ok_or_else(|| TexcompError::validation(format!("unknown texture {}", texture.id())))
    }

    fn rasterize(
        &mut self,
        framebuffer: &Framebuffer,
        desc: &PipelineDesc,
        params: &DrawParams,
        rect: TexturedRect,
    ) {
        let Some(target_id) = framebuffer.color_texture().map(Texture::id) else {
            return;
        };
        let geometry = rect.rect.abs();
        if geometry.width() <= 0.0 || geometry.height() <= 0.0 {
            return;
        }
        let inverse = params.transform.inverse();
        let Some(target) = self.textures.get(&target_id) else {
            return;
        };
        let bounds = params.transform.transform_rect_bbox(geometry);
        let x0 = bounds.x0.floor().max(0.0) as u32;
        let y0 = bounds.y0.floor().max(0.0) as u32;
        let x1 = (bounds.x1.ceil().max(0.0) as u32).min(target.width);
        let y1 = (bounds.y1.ceil().max(0.0) as u32).min(target.height);

        let mut writes = Vec::new();
        for y in y0..y1 {
            for x in x0..x1 {
                let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if !geometry.contains(local) {
                    continue;
                }
                let u = (local.x - rect.rect.x0) / rect.rect.width();
                let v = (local.y - rect.rect.y0) / rect.rect.height();
                let tc = rect.tex_coords;
                let st = Point::new(tc.x0 + u * (tc.x1 - tc.x0), tc.y0 + v * (tc.y1 - tc.y0));
                let color = self.shade(desc, params, st);
                writes.push((x, y, color));
            }
        }

        let Some(target) = self.textures.get_mut(&target_id) else {
            return;
        };
        for (x, y, src) in writes {
            let out = match desc.blend {
                BlendMode::Replace => src,
                BlendMode::Over => {
                    let dst = target.texel(x, y);
                    [0, 1, 2, 3].map(|i| src[i] + dst[i] * (1.0 - src[3]))
                }
                BlendMode::DestIn => {
                    let dst = target.texel(x, y);
                    dst.map(|c| c * src[3])
                }
            };
            target.write_texel(x, y, out);
        }
    }

    fn shade(&self, desc: &PipelineDesc, params: &DrawParams, st: Point) -> [f32; 4] {
        let mut color = params.color;
        for (i, layer) in desc.layers.iter().enumerate() {
            let texel = params
                .layers
                .get(i)
                .and_then(|binding| self.textures.get(&binding.texture.id()))
                .map(|store| {
                    let p = layer.matrix * st;
                    let tx = (p.x * f64::from(store.width)).floor();
                    let ty = (p.y * f64::from(store.height)).floor();
                    let tx = tx.clamp(0.0, f64::from(store.width.saturating_sub(1))) as u32;
                    let ty = ty.clamp(0.0, f64::from(store.height.saturating_sub(1))) as u32;
                    store.texel(tx, ty)
                });
            color = match (layer.combine, texel) {
                (CombineFunc::ReplacePrevious, _) | (_, None) => color,
                (CombineFunc::Replace, Some(t)) => t,
                (CombineFunc::Modulate, Some(t)) => [0, 1, 2, 3].map(|c| color[c] * t[c]),
                (CombineFunc::ModulateAlpha, Some(t)) => color.map(|c| c * t[3]),
            };
        }
        color
    }
}

impl GpuBackend for HeadlessBackend {
    fn texture_new_with_size(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> TexcompResult<Texture> {
        self.release_dropped();
        self.check_allocation("texture")?;
        if format.n_planes() != 1 {
            return Err(TexcompError::unsupported(format!(
                "texture storage for multi-plane format {format}"
            )));
        }
        let texture = Texture::new(width, height, format);
        self.textures
            .insert(texture.id(), StoredTexture::zeroed(&texture));
        self.stats.textures_allocated = self.stats.textures_allocated.saturating_add(1);
        Ok(texture)
    }

    fn texture_new_from_data(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: &[u8],
    ) -> TexcompResult<Texture> {
        let row = width as usize * format.bytes_per_pixel_plane0();
        if data.len() < required_len(stride, row, height) {
            return Err(TexcompError::validation(format!(
                "{} bytes is too short for a {width}x{height} {format} texture (stride {stride})",
                data.len()
            )));
        }
        let texture = self.texture_new_with_size(width, height, format)?;
        if let Some(store) = self.textures.get_mut(&texture.id()) {
            for y in 0..height as usize {
                store.data[y * store.stride..y * store.stride + row]
                    .copy_from_slice(&data[y * stride..y * stride + row]);
            }
        }
        Ok(texture)
    }

    fn texture_get_data(
        &mut self,
        texture: &Texture,
        format: PixelFormat,
        stride: usize,
        out: &mut [u8],
    ) -> TexcompResult<()> {
        let store = self.store(texture)?;
        convert_pixels(
            store.format,
            &store.data,
            store.stride,
            format,
            out,
            stride,
            store.width,
            store.height,
        )
    }

    fn offscreen_new(&mut self, texture: &Texture) -> TexcompResult<Framebuffer> {
        self.check_allocation("offscreen framebuffer")?;
        self.store(texture)?;
        self.stats.offscreens_allocated = self.stats.offscreens_allocated.saturating_add(1);
        Ok(Framebuffer::new(
            texture.width(),
            texture.height(),
            Some(texture.clone()),
        ))
    }

    fn pipeline_new(&mut self, desc: PipelineDesc) -> Pipeline {
        self.stats.pipelines_created = self.stats.pipelines_created.saturating_add(1);
        Pipeline::new(desc)
    }

    fn clear(&mut self, framebuffer: &Framebuffer, color: [f32; 4]) {
        self.stats.clears = self.stats.clears.saturating_add(1);
        self.commands.push(DrawCommand::Clear {
            framebuffer: framebuffer.id(),
            color,
        });
        if let Some(store) = framebuffer
            .color_texture()
            .and_then(|t| self.textures.get_mut(&t.id()))
        {
            for y in 0..store.height {
                for x in 0..store.width {
                    store.write_texel(x, y, color);
                }
            }
        }
    }

    fn draw_textured_rectangle(
        &mut self,
        framebuffer: &Framebuffer,
        pipeline: &Pipeline,
        params: &DrawParams,
        rect: TexturedRect,
    ) {
        self.stats.draws = self.stats.draws.saturating_add(1);
        self.commands.push(DrawCommand::Draw {
            framebuffer: framebuffer.id(),
            pipeline: pipeline.id(),
            pipeline_name: pipeline.desc().name,
            textures: params.layers.iter().map(|l| l.texture.id()).collect(),
            filters: params
                .layers
                .iter()
                .map(|l| (l.min_filter, l.mag_filter))
                .collect(),
            color: params.color,
            transform: params.transform,
            rect,
        });
        self.rasterize(framebuffer, pipeline.desc(), params, rect);
    }

    fn read_pixels(
        &mut self,
        framebuffer: &Framebuffer,
        rect: IntRect,
        format: PixelFormat,
        stride: usize,
        out: &mut [u8],
    ) -> TexcompResult<()> {
        let texture = framebuffer
            .color_texture()
            .ok_or_else(|| TexcompError::unsupported("framebuffer has no color buffer"))?
            .clone();
        let store = self.store(&texture)?;
        let bounds = IntRect::from_size(store.width as i32, store.height as i32);
        if rect.is_empty() || !bounds.contains_rect(rect) {
            return Err(TexcompError::validation(format!(
                "read rectangle {rect} outside framebuffer {bounds}"
            )));
        }
        let bpp = store.format.bytes_per_pixel_plane0();
        let start = rect.y as usize * store.stride + rect.x as usize * bpp;
        convert_pixels(
            store.format,
            &store.data[start..],
            store.stride,
            format,
            out,
            stride,
            rect.width as u32,
            rect.height as u32,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gpu/headless.rs"]
mod tests;
