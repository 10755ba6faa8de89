//! The refractive path tracer: intersection kernel, optics and the bounce loop.

pub(crate) mod geometry;
/// Reflection and refraction primitives.
pub mod optics;
pub(crate) mod tracer;
