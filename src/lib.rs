//! Refrakt traces a viewer-controlled ray through a set of closed 2D polygons and splits it
//! into two refracted branches, producing the dispersed light path used for rendering.
//!
//! # Pipeline overview
//!
//! 1. **Load**: shape description JSON -> validated [`ShapeSet`]
//! 2. **Trace**: [`RayState`] + shapes -> [`RefractionPath`] via [`trace_refractions`]
//! 3. **Encode**: shapes -> [`FlattenedShapeBuffer`] -> [`ShapeTextures`], the binary contract
//!    a GPU evaluator reads to reproduce the same math per pixel
//! 4. **Preview**: shapes + path -> [`FrameRGBA`] on the CPU, or GPU upload with feature `gpu`
//!
//! Tracing is pure and single-threaded; each call re-derives everything from its inputs.
#![forbid(unsafe_code)]

mod encode;
mod foundation;
mod preview;
mod shape;
mod trace;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use encode::buffer::{
    DUPLICATE_PENALTY, FlattenedShapeBuffer, MAX_SHAPE_VERTICES, VertexTransform, encode_shapes,
};
pub use encode::light_path::{LightPathTexture, evaluate_light_path_texel, render_light_path};
pub use encode::texture::{
    AddressMode, Filter, SHAPE_TEXTURE_LAYOUT_VERSION, ShapeTextures, Texel, TexelFormat,
    TextureDesc, TextureImage,
};
pub use foundation::core::{
    Affine, BezPath, Canvas, Point, RayState, Rect, Rgba8, Vec2, parse_point,
};
pub use foundation::error::{RefraktError, RefraktResult};
pub use preview::cpu::{FrameRGBA, PreviewSettings, render_preview};
pub use preview::session::PreviewSession;
pub use shape::load::{ShapeDescription, ShapeRecord};
pub use shape::model::{Shape, ShapeSet};
pub use trace::geometry::{EdgeSource, Hit, PARALLEL_EPSILON, intersect, intersect_ray_segment};
pub use trace::optics;
pub use trace::tracer::{
    BouncePair, CPU_MAX_BOUNCES, DEFAULT_ETA, GPU_MAX_BOUNCES, NormalPolicy, RefractionPath,
    TracerConfig, trace_refractions,
};
