use std::{fs::File, io::BufReader, path::Path};

use crate::{
    foundation::{
        core::Point,
        error::{RefraktError, RefraktResult},
    },
    shape::model::{Shape, ShapeSet},
};

/// On-disk shape description: `{"shapes": [{"points": [[x, y], ...]}, ...]}`.
///
/// Unknown fields are ignored so exported logo files with extra metadata still load.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShapeDescription {
    pub shapes: Vec<ShapeRecord>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ShapeRecord {
    pub points: Vec<[f64; 2]>,
}

impl ShapeSet {
    /// Build validated shapes from a parsed description.
    ///
    /// Non-finite coordinates abort construction. Shapes that collapse below two distinct
    /// points are dropped with a warning; they never reach the tracer or the encoder.
    #[tracing::instrument(skip(desc), fields(records = desc.shapes.len()))]
    pub fn from_description(desc: &ShapeDescription) -> RefraktResult<Self> {
        let mut shapes = Vec::with_capacity(desc.shapes.len());
        for (index, record) in desc.shapes.iter().enumerate() {
            if let Some([x, y]) = record
                .points
                .iter()
                .find(|[x, y]| !(x.is_finite() && y.is_finite()))
            {
                return Err(RefraktError::validation(format!(
                    "shape {index} has non-finite point ({x}, {y})"
                )));
            }

            let points = record.points.iter().map(|&[x, y]| Point::new(x, y));
            match Shape::new(points) {
                Ok(shape) => shapes.push(shape),
                Err(err) => {
                    tracing::warn!(index, %err, "dropping degenerate shape");
                }
            }
        }
        tracing::debug!(kept = shapes.len(), "shape set built");
        Ok(Self::new(shapes))
    }

    pub fn from_json_str(s: &str) -> RefraktResult<Self> {
        let desc: ShapeDescription = serde_json::from_str(s)?;
        Self::from_description(&desc)
    }

    pub fn from_reader(r: impl std::io::Read) -> RefraktResult<Self> {
        let desc: ShapeDescription = serde_json::from_reader(r)?;
        Self::from_description(&desc)
    }

    pub fn load(path: &Path) -> RefraktResult<Self> {
        let f = File::open(path).map_err(|e| {
            RefraktError::Other(
                anyhow::Error::new(e).context(format!("open shapes '{}'", path.display())),
            )
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Inverse of [`ShapeSet::from_description`] for the retained shapes.
    pub fn to_description(&self) -> ShapeDescription {
        ShapeDescription {
            shapes: self
                .iter()
                .map(|s| ShapeRecord {
                    points: s.points().iter().map(|p| [p.x, p.y]).collect(),
                })
                .collect(),
        }
    }
}
