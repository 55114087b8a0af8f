pub mod color_state;
pub mod snippet;
