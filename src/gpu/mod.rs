pub mod backend;
pub mod headless;
