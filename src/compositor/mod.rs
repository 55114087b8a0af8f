pub mod capture;
pub mod pipeline_cache;
pub mod shaped_texture;
