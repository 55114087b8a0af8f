pub mod convert;
pub mod drm;
pub mod multi_texture_format;
pub mod pixel_format;
