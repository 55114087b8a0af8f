pub mod mipmap;
pub mod multi_texture;
