use crate::{
    foundation::{
        core::{Point, RayState},
        error::RefraktResult,
    },
    preview::cpu::{FrameRGBA, PreviewSettings, render_preview},
    shape::model::ShapeSet,
    trace::tracer::{RefractionPath, TracerConfig, trace_refractions},
};

/// Frame-loop state for the preview: the shape set plus a private memo of the last ray.
///
/// The caller passes one pointer snapshot per frame; the path is only re-traced when the
/// derived ray differs from the previous one.
pub struct PreviewSession {
    shapes: ShapeSet,
    config: TracerConfig,
    last_ray: Option<RayState>,
    path: Option<RefractionPath>,
}

impl PreviewSession {
    pub fn new(shapes: ShapeSet, config: TracerConfig) -> RefraktResult<Self> {
        config.validate()?;
        Ok(Self {
            shapes,
            config,
            last_ray: None,
            path: None,
        })
    }

    pub fn shapes(&self) -> &ShapeSet {
        &self.shapes
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Latest traced path, if any frame has run yet.
    pub fn path(&self) -> Option<&RefractionPath> {
        self.path.as_ref()
    }

    /// Trace for `ray` unless it equals the last processed ray. Returns whether it re-traced.
    pub fn update(&mut self, ray: RayState) -> bool {
        if self.last_ray == Some(ray) {
            tracing::debug!("ray unchanged; reusing cached path");
            return false;
        }
        self.path = Some(trace_refractions(ray, &self.shapes, &self.config));
        self.last_ray = Some(ray);
        true
    }

    /// One preview frame for a pointer position given in shape space.
    pub fn frame(&mut self, pointer: Point, settings: &PreviewSettings) -> RefraktResult<FrameRGBA> {
        let ray = RayState::from_pointer(settings.emitter, pointer)?;
        self.update(ray);
        render_preview(&self.shapes, self.path.as_ref(), settings)
    }
}
