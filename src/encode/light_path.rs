use crate::{
    encode::texture::{SHAPE_TEXTURE_LAYOUT_VERSION, ShapeTextures, TextureImage},
    foundation::{core::RayState, error::RefraktResult},
    trace::tracer::{RefractionPath, TracerConfig, trace_refractions},
};

/// Output of the preprocess pass: one RGBA32F texel per bounce, `(x1, y1, x2, y2)`.
///
/// Texels at or past `len` are zero.
#[derive(Clone, Debug, PartialEq)]
pub struct LightPathTexture {
    pub image: TextureImage<[f32; 4]>,
    pub len: usize,
}

impl LightPathTexture {
    /// Pack an already traced path into a texture `width` texels wide.
    pub fn from_path(path: &RefractionPath, width: usize) -> RefraktResult<Self> {
        let mut texels = vec![[0.0f32; 4]; width];
        for (texel, pair) in texels.iter_mut().zip(&path.bounces) {
            *texel = pack_pair(pair.first.x, pair.first.y, pair.second.x, pair.second.y);
        }
        Ok(Self {
            len: path.bounces.len().min(width),
            image: TextureImage::from_texels("refrakt_light_path", texels)?,
        })
    }
}

fn pack_pair(x1: f64, y1: f64, x2: f64, y2: f64) -> [f32; 4] {
    [x1 as f32, y1 as f32, x2 as f32, y2 as f32]
}

/// What a single fragment at column `x` of the light-path target computes.
///
/// The whole path is re-traced against the shape textures (no shared state between texels)
/// and only bounce `x` is kept; `None` when the path is shorter than `x + 1`.
pub fn evaluate_light_path_texel(
    textures: &ShapeTextures,
    ray: RayState,
    config: &TracerConfig,
    x: usize,
) -> Option<[f32; 4]> {
    let path = trace_refractions(ray, textures, config);
    path.bounces
        .get(x)
        .map(|b| pack_pair(b.first.x, b.first.y, b.second.x, b.second.y))
}

/// Fill a light-path texture `config.max_bounces` wide, one independent evaluation per texel.
#[tracing::instrument(skip(textures, config), fields(width = config.max_bounces))]
pub fn render_light_path(
    textures: &ShapeTextures,
    ray: RayState,
    config: &TracerConfig,
) -> RefraktResult<LightPathTexture> {
    textures.ensure_compatible(SHAPE_TEXTURE_LAYOUT_VERSION)?;
    let evaluated: Vec<Option<[f32; 4]>> = (0..config.max_bounces)
        .map(|x| evaluate_light_path_texel(textures, ray, config, x))
        .collect();
    let len = evaluated.iter().take_while(|t| t.is_some()).count();
    let texels = evaluated.into_iter().map(Option::unwrap_or_default).collect();
    Ok(LightPathTexture {
        len,
        image: TextureImage::from_texels("refrakt_light_path", texels)?,
    })
}
