//! Pixel-addressable view of [`FlattenedShapeBuffer`] for a per-pixel GPU evaluator.
//!
//! Layout (version [`SHAPE_TEXTURE_LAYOUT_VERSION`]):
//!
//! | texture    | size   | format     | texel `i`            |
//! |------------|--------|------------|----------------------|
//! | `counts`   | N x 1  | `R8Unorm`  | vertex count shape i |
//! | `vertices` | M x 1  | `R32Float` | scalar i (x, y, ...) |
//!
//! Both use nearest filtering and clamp-to-edge addressing so a shader can fetch exact
//! values by integer texel offset. Any change to this table must bump the version.

use crate::{
    encode::buffer::{FlattenedShapeBuffer, for_each_run_edge},
    foundation::{
        core::Point,
        error::{RefraktError, RefraktResult},
    },
    trace::geometry::EdgeSource,
};

/// Compatibility marker consumed by GPU evaluators.
pub const SHAPE_TEXTURE_LAYOUT_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TexelFormat {
    /// One unsigned byte per texel.
    R8Unorm,
    /// One 32-bit float per texel.
    R32Float,
    /// Four 32-bit floats per texel.
    Rgba32Float,
}

impl TexelFormat {
    pub fn bytes_per_texel(self) -> usize {
        match self {
            Self::R8Unorm => 1,
            Self::R32Float => 4,
            Self::Rgba32Float => 16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Filter {
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AddressMode {
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub filter: Filter,
    pub address: AddressMode,
}

impl TextureDesc {
    fn row(label: &'static str, width: usize, format: TexelFormat) -> RefraktResult<Self> {
        let width = u32::try_from(width)
            .map_err(|_| RefraktError::encode(format!("{label} texture width overflows u32")))?;
        Ok(Self {
            label,
            width,
            height: 1,
            format,
            filter: Filter::Nearest,
            address: AddressMode::ClampToEdge,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }
}

/// Element types a single-row texture can hold.
pub trait Texel: Copy + Default {
    const FORMAT: TexelFormat;
    fn write_le(self, out: &mut Vec<u8>);
}

impl Texel for u8 {
    const FORMAT: TexelFormat = TexelFormat::R8Unorm;
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl Texel for f32 {
    const FORMAT: TexelFormat = TexelFormat::R32Float;
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Texel for [f32; 4] {
    const FORMAT: TexelFormat = TexelFormat::Rgba32Float;
    fn write_le(self, out: &mut Vec<u8>) {
        for c in self {
            out.extend_from_slice(&c.to_le_bytes());
        }
    }
}

/// A `width x 1` image of `T` texels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage<T: Texel> {
    pub desc: TextureDesc,
    pub texels: Vec<T>,
}

impl<T: Texel> TextureImage<T> {
    pub fn from_texels(label: &'static str, texels: Vec<T>) -> RefraktResult<Self> {
        Ok(Self {
            desc: TextureDesc::row(label, texels.len(), T::FORMAT)?,
            texels,
        })
    }

    pub fn width(&self) -> usize {
        self.texels.len()
    }

    /// Integer texel fetch with clamp-to-edge addressing; an empty image reads as zero.
    pub fn fetch(&self, x: i64) -> T {
        if self.texels.is_empty() {
            return T::default();
        }
        let last = self.texels.len() as i64 - 1;
        self.texels[x.clamp(0, last) as usize]
    }

    /// Little-endian bytes, tightly packed, as uploaded to the GPU.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.desc.byte_len());
        for &t in &self.texels {
            t.write_le(&mut out);
        }
        out
    }
}

/// The two shape textures plus the layout version they were built against.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeTextures {
    pub version: u32,
    pub counts: TextureImage<u8>,
    pub vertices: TextureImage<f32>,
}

impl ShapeTextures {
    #[tracing::instrument(skip(buffer), fields(shapes = buffer.shape_count()))]
    pub fn from_buffer(buffer: &FlattenedShapeBuffer) -> RefraktResult<Self> {
        buffer.validate()?;
        Ok(Self {
            version: SHAPE_TEXTURE_LAYOUT_VERSION,
            counts: TextureImage::from_texels("refrakt_shape_counts", buffer.counts.clone())?,
            vertices: TextureImage::from_texels(
                "refrakt_shape_vertices",
                buffer.vertices.clone(),
            )?,
        })
    }

    pub fn ensure_compatible(&self, version: u32) -> RefraktResult<()> {
        if self.version != version {
            return Err(RefraktError::encode(format!(
                "shape texture layout v{} does not match evaluator v{version}",
                self.version
            )));
        }
        Ok(())
    }

    /// Read the buffers back out of texel space.
    pub fn to_buffer(&self) -> FlattenedShapeBuffer {
        FlattenedShapeBuffer {
            counts: self.counts.texels.clone(),
            vertices: self.vertices.texels.clone(),
        }
    }
}

impl EdgeSource for ShapeTextures {
    /// Walk shapes purely through texel fetches, the way the shader does.
    fn for_each_edge(&self, visit: &mut dyn FnMut(Point, Point)) {
        let mut offset = 0i64;
        let mut run = Vec::new();
        for i in 0..self.counts.width() as i64 {
            let n = i64::from(self.counts.fetch(i));
            run.clear();
            run.extend((0..n * 2).map(|j| self.vertices.fetch(offset + j)));
            for_each_run_edge(&run, visit);
            offset += n * 2;
        }
    }
}
