use std::time::{Duration, Instant};

use kurbo::{Affine, Rect};
use serde::Serialize;

use crate::{
    color::{color_state::ColorState, snippet::Snippet},
    compositor::pipeline_cache::{PipelineCache, PipelineKey, PipelineSlot},
    foundation::{
        error::{TexcompError, TexcompResult},
        geometry::{IntRect, RoundingStrategy},
        math::{approx_eq, is_integral},
        region::Region,
        transform::MonitorTransform,
    },
    format::multi_texture_format::{AlphaMode, Coefficients, MultiTextureFormat, snippet},
    gpu::backend::{
        BlendMode, CombineFunc, DrawParams, Filter, Framebuffer, GpuBackend, LayerBinding,
        LayerDesc, Pipeline, PipelineDesc, Texture, TexturedRect, WrapMode,
    },
    settings::CompositorSettings,
    texture::{mipmap::TextureMipmap, multi_texture::MultiTexture},
};

type SizeListener = Box<dyn FnMut(i32, i32)>;
type Clock = Box<dyn Fn() -> Instant>;

/// Where and how one paint lands.
pub struct PaintContext<'a> {
    pub backend: &'a mut dyn GpuBackend,
    pub framebuffer: &'a Framebuffer,
    pub target_color_state: ColorState,
    /// Maps allocation coordinates into framebuffer pixels.
    pub transform: Affine,
    /// Area the surface occupies; `None` uses its destination size at the origin.
    pub allocation: Option<Rect>,
    pub opacity: u8,
}

impl<'a> PaintContext<'a> {
    pub fn new(backend: &'a mut dyn GpuBackend, framebuffer: &'a Framebuffer) -> Self {
        Self {
            backend,
            framebuffer,
            target_color_state: ColorState::SRGB,
            transform: Affine::IDENTITY,
            allocation: None,
            opacity: 255,
        }
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_allocation(mut self, allocation: Rect) -> Self {
        self.allocation = Some(allocation);
        self
    }

    pub fn with_target_color_state(mut self, target: ColorState) -> Self {
        self.target_color_state = target;
        self
    }
}

/// What a paint emitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PaintReport {
    pub painted: bool,
    pub opaque_rects: usize,
    pub blended_rects: usize,
    /// The blended pass drew the whole allocation in one rectangle.
    pub full_paint: bool,
    /// The blended region had too many rectangles and splitting was abandoned.
    pub split_fallback: bool,
    pub used_mipmap: bool,
    pub filter: Option<Filter>,
    pub pipelines_built: u64,
}

struct PipelineInputs<'a> {
    slot: PipelineSlot,
    format: MultiTextureFormat,
    n_planes: usize,
    matrix: Affine,
    snippet: Option<&'a Snippet>,
    coefficients: Coefficients,
    alpha_mode: AlphaMode,
    source: ColorState,
    target: ColorState,
}

impl PipelineInputs<'_> {
    fn desc(&self) -> PipelineDesc {
        let tower = self.slot.is_tower();
        let mut layers: Vec<LayerDesc> = (0..self.n_planes)
            .map(|i| LayerDesc {
                combine: if i == 0 {
                    CombineFunc::Modulate
                } else {
                    CombineFunc::ReplacePrevious
                },
                wrap: WrapMode::ClampToEdge,
                matrix: self.matrix,
                snippets: Vec::new(),
            })
            .collect();

        // The mipmap level is already converted RGBA and never carries the surface snippet.
        if !tower && let Some(last) = layers.last_mut() {
            if let Some(s) = snippet(self.format, self.coefficients, self.alpha_mode) {
                last.snippets.push(s);
            }
            if let Some(s) = self.snippet {
                last.snippets.push(s.clone());
            }
        }

        if self.slot.is_masked() {
            layers.push(LayerDesc {
                combine: CombineFunc::ModulateAlpha,
                wrap: WrapMode::ClampToEdge,
                matrix: self.matrix,
                snippets: Vec::new(),
            });
        }

        PipelineDesc {
            name: self.slot.name(),
            layers,
            fragment_snippets: self.source.transform_snippet(&self.target).into_iter().collect(),
            blend: if self.slot.is_unblended() {
                BlendMode::Replace
            } else {
                BlendMode::Over
            },
        }
    }
}

fn ceil_div(v: i32, by: i32) -> i32 {
    (v + by - 1) / by
}

/// A client surface's content, cropped, scaled and transformed into its destination rectangle.
///
/// Geometry and pipeline state are invalidated through two generation counters; the derived
/// destination size and the pipeline cache catch up lazily on the next query or paint.
pub struct ShapedTexture {
    settings: CompositorSettings,
    texture: Option<MultiTexture>,
    mask_texture: Option<Texture>,
    mipmap: TextureMipmap,
    create_mipmaps: bool,

    tex_width: i32,
    tex_height: i32,
    fallback_width: i32,
    fallback_height: i32,
    transform: MonitorTransform,
    viewport_src_rect: Option<Rect>,
    viewport_dst_size: Option<(i32, i32)>,
    buffer_scale: i32,
    is_y_inverted: bool,

    snippet: Option<Snippet>,
    color_state: ColorState,
    coefficients: Coefficients,
    alpha_mode: AlphaMode,

    opaque_region: Option<Region>,
    clip_region: Option<Region>,
    unobscured_region: Option<Region>,

    dst_width: i32,
    dst_height: i32,
    geometry_generation: u64,
    size_generation: u64,
    pipeline_generation: u64,
    cache_generation: u64,
    pipelines: PipelineCache,

    size_listeners: Vec<SizeListener>,
    layout_invalid: bool,

    clock: Clock,
    last_invalidation: Option<Instant>,
    fast_updates: u32,
    earliest_remipmap: Option<Instant>,
}

impl Default for ShapedTexture {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapedTexture {
    pub fn new() -> Self {
        Self::with_settings(CompositorSettings::default())
    }

    pub fn with_settings(settings: CompositorSettings) -> Self {
        Self {
            create_mipmaps: settings.create_mipmaps,
            settings,
            texture: None,
            mask_texture: None,
            mipmap: TextureMipmap::new(),
            tex_width: 0,
            tex_height: 0,
            fallback_width: 0,
            fallback_height: 0,
            transform: MonitorTransform::Normal,
            viewport_src_rect: None,
            viewport_dst_size: None,
            buffer_scale: 1,
            is_y_inverted: true,
            snippet: None,
            color_state: ColorState::SRGB,
            coefficients: Coefficients::None,
            alpha_mode: AlphaMode::None,
            opaque_region: None,
            clip_region: None,
            unobscured_region: None,
            dst_width: 0,
            dst_height: 0,
            geometry_generation: 1,
            size_generation: 0,
            pipeline_generation: 0,
            cache_generation: 0,
            pipelines: PipelineCache::new(),
            size_listeners: Vec::new(),
            layout_invalid: false,
            clock: Box::new(Instant::now),
            last_invalidation: None,
            fast_updates: 0,
            earliest_remipmap: None,
        }
    }

    /// Replaces the monotonic time source used by the mipmap age heuristic.
    pub fn set_clock(&mut self, clock: impl Fn() -> Instant + 'static) {
        self.clock = Box::new(clock);
    }

    pub fn settings(&self) -> &CompositorSettings {
        &self.settings
    }

    fn invalidate_size(&mut self) {
        self.geometry_generation = self.geometry_generation.wrapping_add(1);
    }

    fn reset_pipelines(&mut self) {
        self.pipeline_generation = self.pipeline_generation.wrapping_add(1);
    }

    pub fn texture(&self) -> Option<&MultiTexture> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Option<MultiTexture>) {
        let old_format = self.texture.as_ref().map(MultiTexture::format);
        let new_format = texture.as_ref().map(MultiTexture::format);
        let (width, height) = texture
            .as_ref()
            .map_or((0, 0), |t| (t.width() as i32, t.height() as i32));

        self.texture = texture;
        if old_format != new_format {
            self.reset_pipelines();
        }
        if (self.tex_width, self.tex_height) != (width, height) {
            self.tex_width = width;
            self.tex_height = height;
            self.invalidate_size();
            if self.viewport_src_rect.is_some() {
                self.reset_pipelines();
            }
        }
        if self.create_mipmaps {
            self.mipmap.set_base_texture(self.texture.clone());
        }
    }

    pub fn mask_texture(&self) -> Option<&Texture> {
        self.mask_texture.as_ref()
    }

    pub fn set_mask_texture(&mut self, mask: Option<Texture>) {
        self.mask_texture = mask;
    }

    pub fn transform(&self) -> MonitorTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: MonitorTransform) {
        if self.transform == transform {
            return;
        }
        self.transform = transform;
        self.invalidate_size();
        self.reset_pipelines();
    }

    pub fn viewport_src_rect(&self) -> Option<Rect> {
        self.viewport_src_rect
    }

    /// Crops the content to `rect`, given in the transformed, buffer-scale-divided space.
    pub fn set_viewport_src_rect(&mut self, rect: Rect) -> TexcompResult<()> {
        if !(rect.width() > 0.0 && rect.height() > 0.0 && rect.x0 >= 0.0 && rect.y0 >= 0.0) {
            return Err(TexcompError::validation(format!(
                "invalid viewport source rectangle {rect:?}"
            )));
        }
        if self.viewport_src_rect == Some(rect) {
            return Ok(());
        }
        self.viewport_src_rect = Some(rect);
        self.invalidate_size();
        self.reset_pipelines();
        Ok(())
    }

    pub fn reset_viewport_src_rect(&mut self) {
        if self.viewport_src_rect.take().is_some() {
            self.invalidate_size();
            self.reset_pipelines();
        }
    }

    pub fn viewport_dst_size(&self) -> Option<(i32, i32)> {
        self.viewport_dst_size
    }

    pub fn set_viewport_dst_size(&mut self, width: i32, height: i32) -> TexcompResult<()> {
        if width <= 0 || height <= 0 {
            return Err(TexcompError::validation(format!(
                "invalid viewport destination size {width}x{height}"
            )));
        }
        if self.viewport_dst_size != Some((width, height)) {
            self.viewport_dst_size = Some((width, height));
            self.invalidate_size();
        }
        Ok(())
    }

    pub fn reset_viewport_dst_size(&mut self) {
        if self.viewport_dst_size.take().is_some() {
            self.invalidate_size();
        }
    }

    pub fn has_viewport(&self) -> bool {
        self.viewport_src_rect.is_some() || self.viewport_dst_size.is_some()
    }

    pub fn buffer_scale(&self) -> i32 {
        self.buffer_scale
    }

    /// # Panics
    ///
    /// If `scale` is below 1.
    pub fn set_buffer_scale(&mut self, scale: i32) {
        assert!(scale >= 1, "buffer scale must be at least 1, got {scale}");
        if self.buffer_scale == scale {
            return;
        }
        self.buffer_scale = scale;
        self.invalidate_size();
        self.reset_pipelines();
    }

    /// Logical size used while no texture is attached.
    pub fn set_fallback_size(&mut self, width: i32, height: i32) {
        self.fallback_width = width;
        self.fallback_height = height;
        self.invalidate_size();
    }

    pub fn is_y_inverted(&self) -> bool {
        self.is_y_inverted
    }

    pub fn set_is_y_inverted(&mut self, is_y_inverted: bool) {
        if self.is_y_inverted == is_y_inverted {
            return;
        }
        self.is_y_inverted = is_y_inverted;
        self.reset_pipelines();
    }

    /// Per-surface layer snippet, applied after format conversion on full-resolution paints.
    pub fn set_snippet(&mut self, snippet: Option<Snippet>) {
        if self.snippet == snippet {
            return;
        }
        self.snippet = snippet;
        self.reset_pipelines();
    }

    pub fn color_state(&self) -> ColorState {
        self.color_state
    }

    pub fn set_color_state(&mut self, color_state: ColorState) {
        if self.color_state == color_state {
            return;
        }
        self.color_state = color_state;
        self.reset_pipelines();
    }

    pub fn set_color_representation(&mut self, coefficients: Coefficients, alpha_mode: AlphaMode) {
        if (self.coefficients, self.alpha_mode) == (coefficients, alpha_mode) {
            return;
        }
        self.coefficients = coefficients;
        self.alpha_mode = alpha_mode;
        self.mipmap.set_color_representation(coefficients, alpha_mode);
        self.reset_pipelines();
    }

    pub fn create_mipmaps(&self) -> bool {
        self.create_mipmaps
    }

    pub fn set_create_mipmaps(&mut self, create_mipmaps: bool) {
        if self.create_mipmaps == create_mipmaps {
            return;
        }
        self.create_mipmaps = create_mipmaps;
        let base = if create_mipmaps {
            self.texture.clone()
        } else {
            None
        };
        self.mipmap.set_base_texture(base);
    }

    pub fn mipmap(&self) -> &TextureMipmap {
        &self.mipmap
    }

    pub fn opaque_region(&self) -> Option<&Region> {
        self.opaque_region.as_ref()
    }

    /// Part of the destination rectangle known to be fully opaque.
    pub fn set_opaque_region(&mut self, region: Option<Region>) {
        self.opaque_region = region;
    }

    pub fn clip_region(&self) -> Option<&Region> {
        self.clip_region.as_ref()
    }

    pub fn set_clip_region(&mut self, region: Option<Region>) {
        self.clip_region = region;
    }

    pub fn unobscured_region(&self) -> Option<&Region> {
        self.unobscured_region.as_ref()
    }

    /// Stores the visible part of the surface, clamped to its destination rectangle.
    pub fn set_unobscured_region(&mut self, region: Option<Region>) {
        self.unobscured_region = region.map(|r| {
            let (w, h) = self.dst_size();
            r.intersect_rect(IntRect::from_size(w, h))
        });
    }

    /// Records the regions left visible above this surface and removes what it covers from them.
    pub fn cull_out(
        &mut self,
        unobscured: Option<&mut Region>,
        clip: Option<&mut Region>,
        opacity: u8,
    ) {
        self.set_unobscured_region(unobscured.as_deref().cloned());
        self.set_clip_region(clip.as_deref().cloned());

        if opacity == 255
            && let Some(opaque) = &self.opaque_region
        {
            if let Some(u) = unobscured {
                *u = u.subtract(opaque);
            }
            if let Some(c) = clip {
                *c = c.subtract(opaque);
            }
        }
    }

    pub fn reset_culling(&mut self) {
        self.clip_region = None;
    }

    pub fn is_obscured(&self) -> bool {
        self.unobscured_region.as_ref().is_some_and(Region::is_empty)
    }

    /// Registers a callback run with the new destination size whenever it changes.
    pub fn connect_size_changed(&mut self, listener: impl FnMut(i32, i32) + 'static) {
        self.size_listeners.push(Box::new(listener));
    }

    /// Whether the destination size changed since the last call.
    pub fn take_layout_invalidation(&mut self) -> bool {
        std::mem::take(&mut self.layout_invalid)
    }

    fn compute_dst_size(&self) -> (i32, i32) {
        if let Some(size) = self.viewport_dst_size {
            return size;
        }
        if let Some(src) = self.viewport_src_rect {
            return (src.width().ceil() as i32, src.height().ceil() as i32);
        }
        if self.texture.is_some() {
            let (w, h) = self
                .transform
                .transformed_size(self.tex_width, self.tex_height);
            (ceil_div(w, self.buffer_scale), ceil_div(h, self.buffer_scale))
        } else {
            self.transform
                .transformed_size(self.fallback_width, self.fallback_height)
        }
    }

    fn ensure_size_valid(&mut self) {
        if self.size_generation == self.geometry_generation {
            return;
        }
        self.size_generation = self.geometry_generation;

        let (width, height) = self.compute_dst_size();
        if (width, height) != (self.dst_width, self.dst_height) {
            self.dst_width = width;
            self.dst_height = height;
            self.mask_texture = None;
            self.layout_invalid = true;
            tracing::debug!(width, height, "shaped texture size changed");
            for listener in &mut self.size_listeners {
                listener(width, height);
            }
        }
    }

    /// Destination size, recomputed if any geometry input changed.
    pub fn dst_size(&mut self) -> (i32, i32) {
        self.ensure_size_valid();
        (self.dst_width, self.dst_height)
    }

    pub fn width(&mut self) -> i32 {
        self.dst_size().0
    }

    pub fn height(&mut self) -> i32 {
        self.dst_size().1
    }

    fn sync_pipelines(&mut self) {
        if self.cache_generation != self.pipeline_generation {
            self.cache_generation = self.pipeline_generation;
            self.pipelines.reset();
        }
    }

    pub fn pipeline_cache(&mut self) -> &PipelineCache {
        self.sync_pipelines();
        &self.pipelines
    }

    /// Size of the content after the buffer transform and scale, before any viewport.
    fn logical_size(&self) -> (f64, f64) {
        let scale = f64::from(self.buffer_scale);
        self.transform.transformed_size(
            f64::from(self.tex_width) / scale,
            f64::from(self.tex_height) / scale,
        )
    }

    /// Maps destination-normalized coordinates to texture-normalized coordinates.
    pub fn texture_matrix(&self) -> Affine {
        let crop = match self.viewport_src_rect {
            Some(src) => {
                let (w, h) = self.logical_size();
                if w > 0.0 && h > 0.0 {
                    Affine::new([
                        src.width() / w,
                        0.0,
                        0.0,
                        src.height() / h,
                        src.x0 / w,
                        src.y0 / h,
                    ])
                } else {
                    Affine::IDENTITY
                }
            }
            None => Affine::IDENTITY,
        };
        let flip = if self.is_y_inverted {
            Affine::IDENTITY
        } else {
            Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, 1.0])
        };
        flip * self.transform.unit_affine() * crop
    }

    /// Marks `area` (buffer pixels) as changed and returns the destination rectangle to redraw.
    ///
    /// `None` when there is no texture, the area misses the buffer, or nothing of it is visible.
    pub fn update_area(&mut self, area: IntRect) -> Option<IntRect> {
        let now = (self.clock)();
        self.texture.as_ref()?;
        self.ensure_size_valid();
        self.mipmap.invalidate();
        self.track_update(now);

        // Linear filtering reads one texel beyond the damaged area.
        let buffer = IntRect::from_size(self.tex_width, self.tex_height);
        let mut clip = area.pad(1).intersect(buffer)?;

        let scale = self.buffer_scale;
        let logical_w = ceil_div(self.tex_width, scale);
        let logical_h = ceil_div(self.tex_height, scale);
        clip = clip.scale_double(1.0 / f64::from(scale), RoundingStrategy::Grow);
        clip = clip.transform(self.transform.invert(), logical_w, logical_h);

        if self.has_viewport() {
            let (rot_w, rot_h) = self
                .transform
                .transformed_size(f64::from(logical_w), f64::from(logical_h));
            let viewport = self
                .viewport_src_rect
                .unwrap_or_else(|| Rect::new(0.0, 0.0, rot_w, rot_h));
            let (dst_w, dst_h) = self
                .viewport_dst_size
                .map_or((viewport.width(), viewport.height()), |(w, h)| {
                    (f64::from(w), f64::from(h))
                });
            let inverted = Rect::from_origin_size(
                (
                    -(viewport.x0 * dst_w / viewport.width()),
                    -(viewport.y0 * dst_h / viewport.height()),
                ),
                (dst_w, dst_h),
            );
            clip = clip.crop_and_scale(
                inverted,
                viewport.width().ceil() as i32,
                viewport.height().ceil() as i32,
            );
        }

        match &self.unobscured_region {
            Some(unobscured) => {
                let visible = unobscured.intersect_rect(clip);
                (!visible.is_empty()).then(|| visible.extents())
            }
            None => Some(clip),
        }
    }

    fn min_mipmap_age(&self) -> Duration {
        self.settings.min_update_interval()
    }

    fn track_update(&mut self, now: Instant) {
        if let Some(prev) = self.last_invalidation.replace(now) {
            let fast = now.saturating_duration_since(prev) < self.min_mipmap_age();
            if !fast {
                self.fast_updates = 0;
            } else if self.fast_updates < self.settings.min_fast_updates_before_unmipmap {
                self.fast_updates += 1;
            }
        }
    }

    /// When a surface that stopped mipmapping because of rapid updates may mipmap again.
    pub fn remipmap_deadline(&self) -> Option<Instant> {
        self.earliest_remipmap
    }

    fn mipmap_allowed(&mut self, now: Instant) -> bool {
        let min_age = self.min_mipmap_age();
        let settled = self
            .last_invalidation
            .is_none_or(|t| now.saturating_duration_since(t) >= min_age);
        if settled || self.fast_updates < self.settings.min_fast_updates_before_unmipmap {
            self.earliest_remipmap = None;
            return true;
        }
        self.earliest_remipmap = Some(now + min_age.saturating_sub(Duration::from_millis(1)));
        false
    }

    /// Source dimensions sampled for the destination rectangle, in buffer pixels.
    fn sample_size(&self) -> (f64, f64) {
        match self.viewport_src_rect {
            Some(src) => {
                let scale = f64::from(self.buffer_scale);
                (src.width() * scale, src.height() * scale)
            }
            None => {
                let (w, h) = self
                    .transform
                    .transformed_size(self.tex_width, self.tex_height);
                (f64::from(w), f64::from(h))
            }
        }
    }

    /// Picks the sampling filter and whether the mipmap level should replace the texture.
    fn select_filter(&self, transform: Affine, allocation: Rect) -> (Filter, bool) {
        let (dst_w, dst_h) = (f64::from(self.dst_width), f64::from(self.dst_height));
        let to_framebuffer = transform
            * Affine::translate((allocation.x0, allocation.y0))
            * Affine::scale_non_uniform(allocation.width() / dst_w, allocation.height() / dst_h);
        let [a, b, c, d, e, f] = to_framebuffer.as_coeffs();
        let (sample_w, sample_h) = self.sample_size();

        let untransformed = approx_eq(a, 1.0)
            && approx_eq(d, 1.0)
            && approx_eq(b, 0.0)
            && approx_eq(c, 0.0)
            && is_integral(e)
            && is_integral(f)
            && approx_eq(sample_w, dst_w)
            && approx_eq(sample_h, dst_h);
        if untransformed {
            return (Filter::Nearest, false);
        }

        let painted = to_framebuffer.transform_rect_bbox(Rect::new(0.0, 0.0, dst_w, dst_h));
        let threshold = self.settings.mipmap_downscale_threshold;
        let min_size = i64::from(self.settings.min_mipmap_size);
        let downscaled = painted.width() > 0.0
            && painted.height() > 0.0
            && sample_w / painted.width() > threshold
            && sample_h / painted.height() > threshold;
        let large_enough =
            i64::from(self.tex_width) >= min_size && i64::from(self.tex_height) >= min_size;
        (
            Filter::Linear,
            self.create_mipmaps && downscaled && large_enough,
        )
    }

    /// Paints the surface into `ctx.framebuffer`.
    ///
    /// A no-op without texture, with an empty clip region or a zero destination size.
    #[tracing::instrument(skip_all, fields(opacity = ctx.opacity))]
    pub fn paint(&mut self, ctx: &mut PaintContext<'_>) -> PaintReport {
        let Some(texture) = self.texture.clone() else {
            return PaintReport::default();
        };
        if self.clip_region.as_ref().is_some_and(Region::is_empty) {
            return PaintReport::default();
        }
        self.ensure_size_valid();
        if self.dst_width == 0 || self.dst_height == 0 {
            return PaintReport::default();
        }

        let allocation = self.allocation(ctx);
        let (filter, wants_mipmap) = self.select_filter(ctx.transform, allocation);

        let mut paint_texture = texture;
        let mut tower = false;
        let now = (self.clock)();
        if wants_mipmap && self.mipmap_allowed(now) {
            match self.mipmap.get_paint_texture(&mut *ctx.backend) {
                Some(level) => {
                    paint_texture = level;
                    tower = true;
                }
                None => tracing::warn!("mipmap unavailable, painting full resolution"),
            }
        }
        if paint_texture.width() == 0 || paint_texture.height() == 0 {
            return PaintReport::default();
        }

        let filter = if tower {
            Filter::LinearMipmapNearest
        } else {
            filter
        };
        let clip = self.clip_region.clone();
        let mut report = self.paint_texture(ctx, &paint_texture, tower, filter, clip.as_ref());
        report.used_mipmap = tower;
        report
    }

    fn allocation(&self, ctx: &PaintContext<'_>) -> Rect {
        ctx.allocation.unwrap_or_else(|| {
            Rect::new(
                0.0,
                0.0,
                f64::from(self.dst_width),
                f64::from(self.dst_height),
            )
        })
    }

    /// Splits the paint into an unblended pass over the opaque region and a blended pass over
    /// the rest, falling back to one blended paint when the split gets too fragmented.
    fn paint_texture(
        &mut self,
        ctx: &mut PaintContext<'_>,
        paint_texture: &MultiTexture,
        tower: bool,
        filter: Filter,
        clip: Option<&Region>,
    ) -> PaintReport {
        self.sync_pipelines();
        let builds_before = self.pipelines.stats().builds;
        let tex_rect = IntRect::from_size(self.dst_width, self.dst_height);
        let mut report = PaintReport {
            painted: true,
            filter: Some(filter),
            ..PaintReport::default()
        };

        // Clients may declare opaque areas beyond the buffer.
        let opaque = self
            .opaque_region
            .as_ref()
            .filter(|_| ctx.opacity == 255)
            .map(|r| r.intersect_rect(tex_rect));
        let mut blended = match (&opaque, clip) {
            (Some(opaque), Some(clip)) => Some(clip.subtract(opaque)),
            (Some(opaque), None) => Some(Region::from_rect(tex_rect).subtract(opaque)),
            (None, clip) => clip.cloned(),
        };
        let mut use_opaque_region = opaque.is_some();
        if blended
            .as_ref()
            .is_some_and(|r| r.num_rectangles() > self.settings.max_blend_rects)
        {
            tracing::debug!(
                max = self.settings.max_blend_rects,
                "blended region too fragmented, painting unsplit"
            );
            use_opaque_region = false;
            blended = None;
            report.split_fallback = true;
        }

        let bindings: Vec<LayerBinding> = paint_texture
            .planes()
            .iter()
            .map(|t| LayerBinding::new(t.clone(), filter, filter))
            .collect();

        if use_opaque_region && let Some(opaque) = &opaque {
            let region = match clip {
                Some(clip) => clip.intersect(opaque),
                None => opaque.clone(),
            };
            if !region.is_empty() {
                let pipeline = self.pipeline(ctx, PipelineSlot::unblended(tower), paint_texture);
                let params = DrawParams {
                    layers: bindings.clone(),
                    color: [1.0; 4],
                    transform: ctx.transform,
                };
                for rect in region.rects() {
                    self.paint_clipped_rectangle(ctx, &pipeline, &params, *rect);
                    report.opaque_rects += 1;
                }
            }
        }

        if blended.as_ref().is_none_or(|r| !r.is_empty()) {
            let masked = self.mask_texture.is_some();
            let pipeline = self.pipeline(ctx, PipelineSlot::blended(masked, tower), paint_texture);
            let mut layers = bindings;
            if let Some(mask) = &self.mask_texture {
                layers.push(LayerBinding::new(mask.clone(), filter, filter));
            }
            let o = f32::from(ctx.opacity) / 255.0;
            let params = DrawParams {
                layers,
                color: [o; 4],
                transform: ctx.transform,
            };
            match &blended {
                Some(region) => {
                    for rect in region.rects() {
                        let Some(rect) = rect.intersect(tex_rect) else {
                            continue;
                        };
                        self.paint_clipped_rectangle(ctx, &pipeline, &params, rect);
                        report.blended_rects += 1;
                    }
                }
                None => {
                    let allocation = self.allocation(ctx);
                    ctx.backend.draw_textured_rectangle(
                        ctx.framebuffer,
                        &pipeline,
                        &params,
                        TexturedRect::full(allocation),
                    );
                    report.full_paint = true;
                }
            }
        }

        report.pipelines_built = self.pipelines.stats().builds - builds_before;
        report
    }

    fn pipeline(
        &mut self,
        ctx: &mut PaintContext<'_>,
        slot: PipelineSlot,
        paint_texture: &MultiTexture,
    ) -> Pipeline {
        let key = PipelineKey::new(slot, self.color_state, ctx.target_color_state);
        let inputs = PipelineInputs {
            slot,
            format: paint_texture.format(),
            n_planes: paint_texture.n_planes(),
            matrix: self.texture_matrix(),
            snippet: self.snippet.as_ref(),
            coefficients: self.coefficients,
            alpha_mode: self.alpha_mode,
            source: self.color_state,
            target: ctx.target_color_state,
        };
        let backend = &mut *ctx.backend;
        self.pipelines
            .get_or_build(key, || backend.pipeline_new(inputs.desc()))
    }

    fn paint_clipped_rectangle(
        &self,
        ctx: &mut PaintContext<'_>,
        pipeline: &Pipeline,
        params: &DrawParams,
        rect: IntRect,
    ) {
        let allocation = self.allocation(ctx);
        let (dst_w, dst_h) = (f64::from(self.dst_width), f64::from(self.dst_height));
        let sx = allocation.width() / dst_w;
        let sy = allocation.height() / dst_h;
        let r = rect.to_kurbo();
        let geometry = Rect::new(
            allocation.x0 + r.x0 * sx,
            allocation.y0 + r.y0 * sy,
            allocation.x0 + r.x1 * sx,
            allocation.y0 + r.y1 * sy,
        );
        let tex_coords = Rect::new(r.x0 / dst_w, r.y0 / dst_h, r.x1 / dst_w, r.y1 / dst_h);
        ctx.backend.draw_textured_rectangle(
            ctx.framebuffer,
            pipeline,
            params,
            TexturedRect::new(geometry, tex_coords),
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/shaped_texture.rs"]
mod tests;
