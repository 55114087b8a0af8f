//! Texture compositing core for a display server.
//!
//! - [`PixelFormat`] and [`MultiTextureFormat`] describe client buffer layouts and how their
//!   planes combine into RGBA.
//! - [`MultiTexture`] bundles the per-plane GPU textures of one buffer.
//! - [`ShapedTexture`] paints a surface's content through its buffer transform, viewport and
//!   opaque/clip regions, with a [`TextureMipmap`] for heavily downscaled paints.
#![forbid(unsafe_code)]

pub mod color;
pub mod compositor;
pub mod cursor;
pub mod format;
pub mod foundation;
pub mod gpu;
pub mod settings;
pub mod texture;

pub use color::color_state::{ColorState, Colorspace, TransferFunction};
pub use color::snippet::{OpSnippet, Snippet, SnippetHook};
pub use compositor::capture::{CAPTURE_FORMAT, CapturedImage};
pub use compositor::shaped_texture::{PaintContext, PaintReport, ShapedTexture};
pub use format::drm::DrmFormatInfo;
pub use format::multi_texture_format::{AlphaMode, Coefficients, MultiTextureFormat};
pub use format::pixel_format::PixelFormat;
pub use foundation::error::{TexcompError, TexcompResult};
pub use foundation::geometry::{IntRect, RoundingStrategy};
pub use foundation::region::Region;
pub use foundation::transform::MonitorTransform;
pub use gpu::backend::{
    BackendKind, Filter, Framebuffer, GpuBackend, Pipeline, PipelineDesc, Texture, create_backend,
};
pub use gpu::headless::HeadlessBackend;
pub use settings::CompositorSettings;
pub use texture::mipmap::TextureMipmap;
pub use texture::multi_texture::MultiTexture;
