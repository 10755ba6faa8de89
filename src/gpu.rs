//! Upload of [`ShapeTextures`] to wgpu, honoring the texture layout contract.

use crate::{
    encode::texture::{ShapeTextures, TexelFormat, TextureDesc, TextureImage, Texel},
    foundation::error::{RefraktError, RefraktResult},
};

/// Headless device/queue pair.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub fn new_headless() -> RefraktResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| match e {
            wgpu::RequestAdapterError::NotFound { .. } => {
                RefraktError::render("no gpu adapter available")
            }
            other => RefraktError::render(format!("wgpu request_adapter failed: {other:?}")),
        })?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("refrakt_device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| RefraktError::render(format!("wgpu request_device failed: {e:?}")))?;

        Ok(Self { device, queue })
    }
}

/// GPU-resident shape textures plus the shared nearest/clamp sampler.
pub struct GpuShapeTextures {
    pub version: u32,
    pub counts: wgpu::Texture,
    pub counts_view: wgpu::TextureView,
    pub vertices: wgpu::Texture,
    pub vertices_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuShapeTextures {
    /// Upload both textures once; they are read-only afterwards.
    #[tracing::instrument(skip_all, fields(version = textures.version))]
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        textures: &ShapeTextures,
    ) -> RefraktResult<Self> {
        let max_width = device.limits().max_texture_dimension_2d;
        let counts = upload_row(device, queue, &textures.counts, max_width)?;
        let vertices = upload_row(device, queue, &textures.vertices, max_width)?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("refrakt_shape_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            version: textures.version,
            counts_view: counts.create_view(&wgpu::TextureViewDescriptor::default()),
            counts,
            vertices_view: vertices.create_view(&wgpu::TextureViewDescriptor::default()),
            vertices,
            sampler,
        })
    }
}

fn wgpu_format(format: TexelFormat) -> wgpu::TextureFormat {
    match format {
        TexelFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        TexelFormat::R32Float => wgpu::TextureFormat::R32Float,
        TexelFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
    }
}

fn upload_row<T: Texel>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &TextureImage<T>,
    max_width: u32,
) -> RefraktResult<wgpu::Texture> {
    let TextureDesc {
        label,
        width,
        height,
        format,
        ..
    } = image.desc;
    // Zero-sized textures are invalid; an empty buffer still binds a 1x1 texel.
    let alloc_width = width.max(1);
    if alloc_width > max_width {
        return Err(RefraktError::render(format!(
            "{label} needs {width} texels but the device allows {max_width}"
        )));
    }

    let size = wgpu::Extent3d {
        width: alloc_width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu_format(format),
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let mut bytes = image.to_le_bytes();
    if bytes.is_empty() {
        bytes = vec![0u8; format.bytes_per_texel()];
    }
    let bytes_per_row = u32::try_from(bytes.len())
        .map_err(|_| RefraktError::render(format!("{label} row exceeds u32 bytes")))?;
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &bytes,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row),
            rows_per_image: Some(height),
        },
        size,
    );
    Ok(texture)
}
