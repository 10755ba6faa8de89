use crate::{
    foundation::{
        core::{Affine, BezPath, Canvas, Point, Rgba8, Vec2},
        error::{RefraktError, RefraktResult},
    },
    shape::model::ShapeSet,
    trace::tracer::RefractionPath,
};

/// Rendered preview pixels, premultiplied RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub canvas: Canvas,
    /// Pixels per shape-space unit.
    pub scale: f64,
    /// Pixel offset applied after scaling.
    pub translate: Vec2,
    /// Ray source in shape space.
    pub emitter: Point,
    pub clear: Rgba8,
    pub shape_fill: Rgba8,
    pub shape_stroke: Rgba8,
    pub shape_stroke_width: f64,
    pub ray_color: Rgba8,
    pub branch_colors: [Rgba8; 2],
    pub path_width: f64,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 960,
                height: 480,
            },
            scale: 500.0,
            translate: Vec2::ZERO,
            emitter: Point::new(0.0, 0.48),
            clear: Rgba8::opaque(18, 20, 28),
            shape_fill: Rgba8::new(120, 160, 220, 96),
            shape_stroke: Rgba8::opaque(200, 215, 240),
            shape_stroke_width: 1.0,
            ray_color: Rgba8::opaque(255, 255, 255),
            branch_colors: [Rgba8::opaque(255, 90, 60), Rgba8::opaque(70, 140, 255)],
            path_width: 1.5,
        }
    }
}

impl PreviewSettings {
    pub fn validate(&self) -> RefraktResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(RefraktError::validation("preview scale must be finite and > 0"));
        }
        if [self.shape_stroke_width, self.path_width]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(RefraktError::validation("stroke widths must be >= 0"));
        }
        Ok(())
    }

    pub fn world_to_pixel(&self) -> Affine {
        Affine::translate(self.translate) * Affine::scale(self.scale)
    }

    /// Map a pixel position (e.g. a pointer) back into shape space.
    pub fn pixel_to_world(&self, p: Point) -> Point {
        self.world_to_pixel().inverse() * p
    }
}

/// Draw the shapes (even-odd fill, closed outline) and, when the ray entered a shape, the
/// incident segment plus each branch as a connected polyline.
#[tracing::instrument(skip_all, fields(shapes = shapes.len(), bounces = path.map(|p| p.bounces.len())))]
pub fn render_preview(
    shapes: &ShapeSet,
    path: Option<&RefractionPath>,
    settings: &PreviewSettings,
) -> RefraktResult<FrameRGBA> {
    settings.validate()?;
    let width: u16 = settings
        .canvas
        .width
        .try_into()
        .map_err(|_| RefraktError::render("preview width exceeds u16"))?;
    let height: u16 = settings
        .canvas
        .height
        .try_into()
        .map_err(|_| RefraktError::render("preview height exceeds u16"))?;

    let to_px = settings.world_to_pixel();
    let mut ctx = vello_cpu::RenderContext::new(width, height);

    ctx.set_paint(color_to_cpu(settings.clear));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(width),
        f64::from(height),
    ));

    let mut outline = BezPath::new();
    for shape in shapes {
        outline.extend(shape.to_bezpath().elements().iter().copied());
    }
    let outline = bezpath_to_cpu(&(to_px * outline));

    ctx.set_fill_rule(vello_cpu::peniko::Fill::EvenOdd);
    ctx.set_paint(color_to_cpu(settings.shape_fill));
    ctx.fill_path(&outline);
    if settings.shape_stroke_width > 0.0 {
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(settings.shape_stroke_width));
        ctx.set_paint(color_to_cpu(settings.shape_stroke));
        ctx.stroke_path(&outline);
    }

    if let Some(path) = path
        && let Some(entry) = path.entry
        && settings.path_width > 0.0
    {
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(settings.path_width));

        let incident = polyline(&[path.origin, entry.point]);
        ctx.set_paint(color_to_cpu(settings.ray_color));
        ctx.stroke_path(&bezpath_to_cpu(&(to_px * incident)));

        for (branch, color) in settings.branch_colors.iter().enumerate() {
            let points = path.branch_points(branch);
            if points.len() < 2 {
                continue;
            }
            ctx.set_paint(color_to_cpu(*color));
            ctx.stroke_path(&bezpath_to_cpu(&(to_px * polyline(&points))));
        }
    }

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: u32::from(width),
        height: u32::from(height),
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut iter = points.iter();
    if let Some(&first) = iter.next() {
        path.move_to(first);
        for &p in iter {
            path.line_to(p);
        }
    }
    path
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
