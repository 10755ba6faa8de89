use crate::{
    foundation::{
        core::Point,
        error::{RefraktError, RefraktResult},
    },
    shape::model::Shape,
    trace::geometry::EdgeSource,
};

/// Largest per-shape vertex count the 8-bit count texel can carry.
pub const MAX_SHAPE_VERTICES: usize = u8::MAX as usize;

/// Amount a shape's count drops for every skipped duplicate vertex.
///
/// One per skipped point keeps `counts` in lockstep with `vertices`.
pub const DUPLICATE_PENALTY: usize = 1;

/// Coordinate mapping applied while flattening, chosen by the consumer's render origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum VertexTransform {
    #[default]
    Identity,
    /// `y -> extent - y`, for bottom-left-origin targets.
    FlipY { extent: f32 },
}

impl VertexTransform {
    pub fn apply(self, p: Point) -> [f32; 2] {
        let (x, y) = (p.x as f32, p.y as f32);
        match self {
            Self::Identity => [x, y],
            Self::FlipY { extent } => [x, extent - y],
        }
    }
}

/// Shapes flattened into the buffer pair shared with the GPU evaluator.
///
/// `counts[i]` vertices of shape `i` sit contiguously in `vertices` as interleaved x, y
/// scalars, in shape order. `sum(counts) * 2 == vertices.len()` always holds.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlattenedShapeBuffer {
    pub counts: Vec<u8>,
    pub vertices: Vec<f32>,
}

impl FlattenedShapeBuffer {
    pub fn validate(&self) -> RefraktResult<()> {
        let expected: usize = self.counts.iter().map(|&c| usize::from(c) * 2).sum();
        if expected != self.vertices.len() {
            return Err(RefraktError::encode(format!(
                "counts describe {expected} scalars but vertices holds {}",
                self.vertices.len()
            )));
        }
        if self.counts.iter().any(|&c| c < 2) {
            return Err(RefraktError::encode("every encoded shape needs >= 2 vertices"));
        }
        Ok(())
    }

    pub fn shape_count(&self) -> usize {
        self.counts.len()
    }

    pub fn point_count(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Per-shape vertex runs, walking `counts` sequentially over `vertices`.
    pub fn runs(&self) -> impl Iterator<Item = &[f32]> + '_ {
        let mut offset = 0usize;
        self.counts.iter().map(move |&c| {
            let len = usize::from(c) * 2;
            let end = (offset + len).min(self.vertices.len());
            let run = &self.vertices[offset.min(end)..end];
            offset = end;
            run
        })
    }

    /// Rebuild per-shape point lists in encoded coordinates.
    pub fn to_point_lists(&self) -> Vec<Vec<[f32; 2]>> {
        self.runs()
            .map(|run| run.chunks_exact(2).map(|xy| [xy[0], xy[1]]).collect())
            .collect()
    }
}

impl EdgeSource for FlattenedShapeBuffer {
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point)) {
        for run in self.runs() {
            for_each_run_edge(run, visit);
        }
    }
}

/// Visit the closed-polygon edges of one interleaved x, y run.
pub(crate) fn for_each_run_edge(run: &[f32], visit: &mut dyn FnMut(Point, Point)) {
    let n = run.len() / 2;
    let at = |i: usize| Point::new(f64::from(run[2 * i]), f64::from(run[2 * i + 1]));
    for i in 0..n {
        visit(at(i), at((i + 1) % n));
    }
}

/// Flatten `shapes` into count and vertex buffers.
///
/// Each shape is walked with its last point as the initial "previous" point, so a closing
/// duplicate is caught first; points equal to the previous retained point (compared after
/// `transform` and f32 rounding) are skipped. Shapes left with fewer than two vertices are
/// excluded entirely. A shape with more than [`MAX_SHAPE_VERTICES`] retained vertices is an
/// error.
#[tracing::instrument(skip(shapes), fields(shapes = shapes.len()))]
pub fn encode_shapes(
    shapes: &[Shape],
    transform: VertexTransform,
) -> RefraktResult<FlattenedShapeBuffer> {
    let mut out = FlattenedShapeBuffer::default();

    for (index, shape) in shapes.iter().enumerate() {
        let points = shape.points();
        let Some(&last) = points.last() else {
            continue;
        };

        let start = out.vertices.len();
        let mut count = points.len();
        let mut prev = transform.apply(last);
        for &p in points {
            let xy = transform.apply(p);
            if xy == prev {
                count = count.saturating_sub(DUPLICATE_PENALTY);
                tracing::debug!(index, x = xy[0], y = xy[1], "skipping duplicate vertex");
                continue;
            }
            out.vertices.extend_from_slice(&xy);
            prev = xy;
        }

        if count < 2 {
            out.vertices.truncate(start);
            tracing::warn!(index, count, "excluding shape with fewer than 2 vertices");
            continue;
        }
        let count_u8 = u8::try_from(count).map_err(|_| {
            RefraktError::encode(format!(
                "shape {index} has {count} vertices; the count texel holds at most {MAX_SHAPE_VERTICES}"
            ))
        })?;
        out.counts.push(count_u8);
    }

    out.validate()?;
    tracing::debug!(
        shapes = out.shape_count(),
        points = out.point_count(),
        "shape buffers encoded"
    );
    Ok(out)
}
