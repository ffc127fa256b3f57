//! Textures: decoded images owned by the scene and their GPU counterparts.
//!
//! [`Texture`] is what a material references. It keeps the decoded RGBA8 pixels and
//! uploads them on first use through [`Texture::upload`]. [`GpuTexture`] wraps the
//! wgpu texture, view and sampler and also provides the depth attachment helper.

use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Context as _;
use image::{ImageFormat, RgbaImage};

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl GpuTexture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Upload an RGBA8 image. `srgb` selects between colour data (true) and linear data.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        srgb: bool,
    ) -> Self {
        let dimensions = rgba.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_default_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// A 1x1 texture of a single colour, bound when a material has no texture of its own.
    pub fn create_solid(device: &wgpu::Device, queue: &wgpu::Queue, rgba: [u8; 4], label: &str) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_rgba(device, queue, &image, Some(label), true)
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

/// A decoded image referenced by materials.
#[derive(Debug)]
pub struct Texture {
    pub label: String,
    pub image: RgbaImage,
    pub srgb: bool,
    gpu: OnceLock<GpuTexture>,
    disposed: AtomicBool,
}

impl Texture {
    pub fn new(label: impl Into<String>, image: RgbaImage, srgb: bool) -> Self {
        Self {
            label: label.into(),
            image,
            srgb,
            gpu: OnceLock::new(),
            disposed: AtomicBool::new(false),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...). `mime_type` is used as a format hint
    /// when present, otherwise the format is guessed from the bytes.
    pub fn decode(label: &str, bytes: &[u8], mime_type: Option<&str>, srgb: bool) -> anyhow::Result<Self> {
        let img = match mime_type.and_then(ImageFormat::from_mime_type) {
            Some(format) => image::load_from_memory_with_format(bytes, format),
            None => image::load_from_memory(bytes),
        }
        .with_context(|| format!("Could not decode image {label}"))?;
        Ok(Self::new(label, img.to_rgba8(), srgb))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Returns the GPU texture, uploading it on first call. Disposed textures are never uploaded.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Option<&GpuTexture> {
        if self.is_disposed() {
            return None;
        }
        Some(self.gpu.get_or_init(|| {
            GpuTexture::from_rgba(device, queue, &self.image, Some(&self.label), self.srgb)
        }))
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// Releases the GPU memory. Returns `true` only for the call that performed the disposal.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(gpu) = self.gpu.get() {
            gpu.texture.destroy();
        }
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
