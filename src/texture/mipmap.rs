use kurbo::Rect;

use crate::{
    format::{
        multi_texture_format::{AlphaMode, Coefficients, snippet},
        pixel_format::PixelFormat,
    },
    gpu::backend::{
        BlendMode, CombineFunc, DrawParams, Filter, Framebuffer, GpuBackend, LayerBinding,
        LayerDesc, Pipeline, PipelineDesc, TexturedRect,
    },
    texture::multi_texture::MultiTexture,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MipmapStats {
    /// Offscreen targets allocated.
    pub allocations: u64,
    /// Times the derived level was redrawn.
    pub renders: u64,
    pub failures: u64,
}

/// Half-resolution copy of a [`MultiTexture`], rendered on demand.
///
/// The derived level is a single premultiplied RGBA texture: the base texture's conversion
/// snippet runs while drawing it, so sampling the level needs no format handling.
#[derive(Debug, Default)]
pub struct TextureMipmap {
    base: Option<MultiTexture>,
    mipmap: Option<MultiTexture>,
    framebuffer: Option<Framebuffer>,
    pipeline: Option<Pipeline>,
    invalid: bool,
    coefficients: Coefficients,
    alpha_mode: AlphaMode,
    stats: MipmapStats,
}

impl TextureMipmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_texture(&self) -> Option<&MultiTexture> {
        self.base.as_ref()
    }

    /// Replaces the source. Passing the current base again does nothing.
    pub fn set_base_texture(&mut self, texture: Option<MultiTexture>) {
        let same = match (&self.base, &texture) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        let format_changed = self.base.as_ref().map(MultiTexture::format)
            != texture.as_ref().map(MultiTexture::format);
        if format_changed {
            self.pipeline = None;
        }
        self.base = texture;
        self.free_mipmaps();
        self.invalid = true;
    }

    /// Marks the derived level stale; it is redrawn on the next [`TextureMipmap::get_paint_texture`].
    pub fn invalidate(&mut self) {
        self.invalid = true;
    }

    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn set_color_representation(&mut self, coefficients: Coefficients, alpha_mode: AlphaMode) {
        if self.coefficients == coefficients && self.alpha_mode == alpha_mode {
            return;
        }
        self.coefficients = coefficients;
        self.alpha_mode = alpha_mode;
        self.pipeline = None;
        self.invalid = true;
    }

    pub fn stats(&self) -> MipmapStats {
        self.stats.clone()
    }

    /// Size of the derived level for the current base.
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.base
            .as_ref()
            .map(|b| ((b.width() / 2).max(1), (b.height() / 2).max(1)))
    }

    fn free_mipmaps(&mut self) {
        self.mipmap = None;
        self.framebuffer = None;
    }

    /// Returns the half-size level, rendering it first when stale.
    ///
    /// `None` without a base texture or when the offscreen target cannot be allocated; callers
    /// then sample the base texture directly.
    pub fn get_paint_texture(&mut self, backend: &mut dyn GpuBackend) -> Option<MultiTexture> {
        let base = self.base.clone()?;
        let (width, height) = self.target_size()?;

        if self
            .mipmap
            .as_ref()
            .is_some_and(|m| m.width() != width || m.height() != height)
        {
            self.free_mipmaps();
        }

        if self.mipmap.is_none() {
            let texture = match backend.texture_new_with_size(width, height, PixelFormat::Rgba8888Pre)
            {
                Ok(t) => t,
                Err(err) => {
                    tracing::warn!(%err, width, height, "failed to allocate mipmap texture");
                    self.stats.failures = self.stats.failures.saturating_add(1);
                    return None;
                }
            };
            let framebuffer = match backend.offscreen_new(&texture) {
                Ok(fb) => fb,
                Err(err) => {
                    tracing::warn!(%err, width, height, "failed to allocate mipmap framebuffer");
                    self.stats.failures = self.stats.failures.saturating_add(1);
                    return None;
                }
            };
            self.mipmap = Some(MultiTexture::new_simple(texture));
            self.framebuffer = Some(framebuffer);
            self.invalid = true;
            self.stats.allocations = self.stats.allocations.saturating_add(1);
        }

        if self.invalid {
            let pipeline = self.pipeline(backend, &base);
            let framebuffer = self.framebuffer.as_ref()?;
            let params = DrawParams {
                layers: base
                    .planes()
                    .iter()
                    .map(|t| LayerBinding::new(t.clone(), Filter::Linear, Filter::Linear))
                    .collect(),
                ..DrawParams::default()
            };
            backend.clear(framebuffer, [0.0; 4]);
            backend.draw_textured_rectangle(
                framebuffer,
                &pipeline,
                &params,
                TexturedRect::full(Rect::new(0.0, 0.0, f64::from(width), f64::from(height))),
            );
            self.invalid = false;
            self.stats.renders = self.stats.renders.saturating_add(1);
            tracing::debug!(width, height, format = %base.format(), "rendered mipmap level");
        }

        self.mipmap.clone()
    }

    fn pipeline(&mut self, backend: &mut dyn GpuBackend, base: &MultiTexture) -> Pipeline {
        if let Some(p) = &self.pipeline {
            return p.clone();
        }
        let n_planes = base.n_planes();
        let mut layers: Vec<LayerDesc> = (0..n_planes)
            .map(|_| LayerDesc::new(CombineFunc::Replace))
            .collect();
        if let Some(s) = snippet(base.format(), self.coefficients, self.alpha_mode)
            && let Some(last) = layers.last_mut()
        {
            last.snippets.push(s);
        }
        let pipeline = backend.pipeline_new(PipelineDesc {
            name: "texture-mipmap",
            layers,
            fragment_snippets: Vec::new(),
            blend: BlendMode::Replace,
        });
        self.pipeline = Some(pipeline.clone());
        pipeline
    }
}

#[cfg(test)]
#[path = "../../tests/unit/texture/mipmap.rs"]
mod tests;
