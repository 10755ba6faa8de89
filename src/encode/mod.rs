//! CPU-side buffers and the texture layout shared with GPU evaluators.

pub(crate) mod buffer;
pub(crate) mod light_path;
pub(crate) mod texture;
