use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use kurbo::{Affine, Rect};
use serde::Serialize;

use crate::{
    color::snippet::Snippet,
    foundation::{error::TexcompResult, geometry::IntRect},
    format::pixel_format::PixelFormat,
};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
struct TextureInner {
    id: u64,
    width: u32,
    height: u32,
    format: PixelFormat,
}

/// Shared handle to a 2D GPU texture. Clones refer to the same texture; equality is identity.
#[derive(Clone, Debug)]
pub struct Texture(Arc<TextureInner>);

impl Texture {
    /// Creates a handle with a fresh id. Backends call this when allocating storage.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self(Arc::new(TextureInner {
            id: next_id(),
            width,
            height,
            format,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn format(&self) -> PixelFormat {
        self.0.format
    }

    pub fn ptr_eq(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Non-owning reference backends keep next to texture storage.
    pub fn downgrade(&self) -> WeakTexture {
        WeakTexture(Arc::downgrade(&self.0))
    }
}

/// Tells a backend whether any [`Texture`] handle to its storage is still alive.
#[derive(Clone, Debug)]
pub struct WeakTexture(Weak<TextureInner>);

impl WeakTexture {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Texture {}

#[derive(Debug)]
struct FramebufferInner {
    id: u64,
    width: u32,
    height: u32,
    color_texture: Option<Texture>,
}

/// Render target. Offscreen framebuffers render into their color texture.
#[derive(Clone, Debug)]
pub struct Framebuffer(Arc<FramebufferInner>);

impl Framebuffer {
    pub fn new(width: u32, height: u32, color_texture: Option<Texture>) -> Self {
        Self(Arc::new(FramebufferInner {
            id: next_id(),
            width,
            height,
            color_texture,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn color_texture(&self) -> Option<&Texture> {
        self.0.color_texture.as_ref()
    }

    pub fn ptr_eq(&self, other: &Framebuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Framebuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Framebuffer {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Nearest,
    #[default]
    Linear,
    /// Linear within the nearest mipmap level.
    LinearMipmapNearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// How a layer combines with the result of the previous layer (or the flat color for layer 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineFunc {
    /// `RGBA = MODULATE (PREVIOUS, TEXTURE)`
    #[default]
    Modulate,
    /// `RGBA = REPLACE (TEXTURE)`
    Replace,
    /// `RGBA = REPLACE (PREVIOUS)`
    ReplacePrevious,
    /// `RGBA = MODULATE (PREVIOUS, TEXTURE[A])`
    ModulateAlpha,
}

impl CombineFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modulate => "RGBA = MODULATE (PREVIOUS, TEXTURE)",
            Self::Replace => "RGBA = REPLACE (TEXTURE)",
            Self::ReplacePrevious => "RGBA = REPLACE (PREVIOUS)",
            Self::ModulateAlpha => "RGBA = MODULATE (PREVIOUS, TEXTURE[A])",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Premultiplied source-over.
    #[default]
    Over,
    /// No blending; the source replaces the destination.
    Replace,
    /// Destination scaled by source alpha.
    DestIn,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LayerDesc {
    pub combine: CombineFunc,
    pub wrap: WrapMode,
    /// Maps the layer's texture coordinates before sampling.
    #[serde(serialize_with = "serialize_affine")]
    pub matrix: Affine,
    pub snippets: Vec<Snippet>,
}

impl Default for LayerDesc {
    fn default() -> Self {
        Self {
            combine: CombineFunc::default(),
            wrap: WrapMode::default(),
            matrix: Affine::IDENTITY,
            snippets: Vec::new(),
        }
    }
}

impl LayerDesc {
    pub fn new(combine: CombineFunc) -> Self {
        Self {
            combine,
            ..Self::default()
        }
    }
}

/// Immutable description a [`Pipeline`] is built from.
#[derive(Clone, Debug, PartialEq, Default, Serialize)]
pub struct PipelineDesc {
    pub name: &'static str,
    pub layers: Vec<LayerDesc>,
    pub fragment_snippets: Vec<Snippet>,
    pub blend: BlendMode,
}

#[derive(Debug)]
struct PipelineInner {
    id: u64,
    desc: PipelineDesc,
}

#[derive(Clone, Debug)]
pub struct Pipeline(Arc<PipelineInner>);

impl Pipeline {
    pub fn new(desc: PipelineDesc) -> Self {
        Self(Arc::new(PipelineInner {
            id: next_id(),
            desc,
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn desc(&self) -> &PipelineDesc {
        &self.0.desc
    }

    pub fn ptr_eq(&self, other: &Pipeline) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Pipeline {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Pipeline {}

/// Texture and sampling state bound to one pipeline layer for a single draw.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBinding {
    pub texture: Texture,
    pub min_filter: Filter,
    pub mag_filter: Filter,
}

impl LayerBinding {
    pub fn new(texture: Texture, min_filter: Filter, mag_filter: Filter) -> Self {
        Self {
            texture,
            min_filter,
            mag_filter,
        }
    }
}

/// Per-draw state: layer bindings, flat color and modelview transform.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawParams {
    pub layers: Vec<LayerBinding>,
    /// Premultiplied flat color fed into the first layer's combine.
    pub color: [f32; 4],
    /// Maps rectangle coordinates into framebuffer pixels.
    pub transform: Affine,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            color: [1.0; 4],
            transform: Affine::IDENTITY,
        }
    }
}

/// Rectangle plus the normalized texture coordinates at its corners (`x0,y0` to `x1,y1`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TexturedRect {
    #[serde(serialize_with = "serialize_rect")]
    pub rect: Rect,
    #[serde(serialize_with = "serialize_rect")]
    pub tex_coords: Rect,
}

impl TexturedRect {
    pub fn new(rect: Rect, tex_coords: Rect) -> Self {
        Self { rect, tex_coords }
    }

    /// Whole texture stretched over `rect`.
    pub fn full(rect: Rect) -> Self {
        Self::new(rect, Rect::new(0.0, 0.0, 1.0, 1.0))
    }
}

pub(crate) fn serialize_affine<S: serde::Serializer>(
    affine: &Affine,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    affine.as_coeffs().serialize(serializer)
}

pub(crate) fn serialize_rect<S: serde::Serializer>(
    rect: &Rect,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    [rect.x0, rect.y0, rect.x1, rect.y1].serialize(serializer)
}

/// GPU capabilities the compositing code consumes.
///
/// Allocation failures surface as [`crate::TexcompError::Allocation`]; callers log and degrade.
pub trait GpuBackend {
    fn texture_new_with_size(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> TexcompResult<Texture>;

    /// Uploads `data` laid out with `stride` bytes per row in `format`.
    fn texture_new_from_data(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        stride: usize,
        data: &[u8],
    ) -> TexcompResult<Texture>;

    /// Reads the texture back converted to `format`.
    fn texture_get_data(
        &mut self,
        texture: &Texture,
        format: PixelFormat,
        stride: usize,
        out: &mut [u8],
    ) -> TexcompResult<()>;

    fn offscreen_new(&mut self, texture: &Texture) -> TexcompResult<Framebuffer>;

    fn pipeline_new(&mut self, desc: PipelineDesc) -> Pipeline;

    fn clear(&mut self, framebuffer: &Framebuffer, color: [f32; 4]);

    fn draw_textured_rectangle(
        &mut self,
        framebuffer: &Framebuffer,
        pipeline: &Pipeline,
        params: &DrawParams,
        rect: TexturedRect,
    );

    /// Reads `rect` of the framebuffer converted to `format`, rows `stride` bytes apart.
    fn read_pixels(
        &mut self,
        framebuffer: &Framebuffer,
        rect: IntRect,
        format: PixelFormat,
        stride: usize,
        out: &mut [u8],
    ) -> TexcompResult<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Recording backend with CPU texture storage.
    #[default]
    Headless,
}

/// Create a GPU backend implementation.
pub fn create_backend(kind: BackendKind) -> Box<dyn GpuBackend> {
    match kind {
        BackendKind::Headless => Box::new(crate::gpu::headless::HeadlessBackend::new()),
    }
}
