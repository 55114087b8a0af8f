pub mod error;
pub mod geometry;
pub(crate) mod math;
pub mod region;
pub mod transform;
