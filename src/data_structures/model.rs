//! Meshes, geometry and materials.
//!
//! Geometry, materials and textures are shared between primitives through `Arc`
//! and follow the same lifecycle: CPU data is created by the loader, GPU objects
//! are created lazily by the renderer and `dispose` frees them for good.

use std::sync::{
    Arc, OnceLock,
    atomic::{AtomicBool, Ordering},
};

use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::texture::{GpuTexture, Texture};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct GeometryBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Indexed triangle list.
#[derive(Debug)]
pub struct Geometry {
    pub label: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    gpu: OnceLock<GeometryBuffers>,
    disposed: AtomicBool,
}

impl Geometry {
    pub fn new(label: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            vertices,
            indices,
            gpu: OnceLock::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the vertex and index buffers, creating them on first call.
    /// Disposed or empty geometry yields `None`.
    pub fn upload(&self, device: &wgpu::Device) -> Option<&GeometryBuffers> {
        if self.is_disposed() || self.indices.is_empty() {
            return None;
        }
        Some(self.gpu.get_or_init(|| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", self.label)),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", self.label)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            GeometryBuffers {
                vertex_buffer,
                index_buffer,
                num_elements: self.indices.len() as u32,
            }
        }))
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// Releases the GPU buffers. Returns `true` only for the call that performed the disposal.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(gpu) = self.gpu.get() {
            gpu.vertex_buffer.destroy();
            gpu.index_buffer.destroy();
        }
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// Fills in smooth per-vertex normals by accumulating the face normals of every
/// triangle a vertex belongs to.
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut accumulated = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks_exact(3) {
        let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }
        let pos0: cgmath::Vector3<_> = vertices[i0].position.into();
        let pos1: cgmath::Vector3<_> = vertices[i1].position.into();
        let pos2: cgmath::Vector3<_> = vertices[i2].position.into();
        // Not normalized so larger faces weigh more.
        let face = (pos1 - pos0).cross(pos2 - pos0);
        accumulated[i0] += face;
        accumulated[i1] += face;
        accumulated[i2] += face;
    }
    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if normal.magnitude2() > 0.0 {
            normal.normalize().into()
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_color: [f32; 4],
}

#[derive(Debug)]
pub struct MaterialBinding {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Lit surface description: a base colour factor, optionally modulated by a texture.
#[derive(Debug)]
pub struct Material {
    pub name: String,
    /// Linear RGBA.
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<Arc<Texture>>,
    pub double_sided: bool,
    gpu: OnceLock<MaterialBinding>,
    disposed: AtomicBool,
}

impl Material {
    pub fn new(name: impl Into<String>, base_color_factor: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color_factor,
            base_color_texture: None,
            double_sided: false,
            gpu: OnceLock::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }

    /// All textures this material samples from.
    pub fn textures(&self) -> impl Iterator<Item = &Arc<Texture>> {
        self.base_color_texture.iter()
    }

    /// Returns the bind group for group 0 of the mesh pipeline, creating it on first call.
    /// `fallback` is bound when the material has no texture or its texture was disposed.
    pub fn bind(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        fallback: &GpuTexture,
        default_sampler: &wgpu::Sampler,
    ) -> Option<&MaterialBinding> {
        if self.is_disposed() {
            return None;
        }
        Some(self.gpu.get_or_init(|| {
            let texture = self
                .base_color_texture
                .as_ref()
                .and_then(|texture| texture.upload(device, queue))
                .unwrap_or(fallback);
            let sampler = texture.sampler.as_ref().unwrap_or(default_sampler);
            let uniform = MaterialUniform {
                base_color: self.base_color_factor,
            };
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Material Buffer", self.name)),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
                label: Some(&self.name),
            });
            MaterialBinding {
                uniform_buffer,
                bind_group,
            }
        }))
    }

    /// Releases the material's own GPU objects. Textures are disposed separately.
    pub fn dispose(&self) -> bool {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(gpu) = self.gpu.get() {
            gpu.uniform_buffer.destroy();
        }
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// One draw call: geometry rendered with a material.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

pub trait DrawPrimitive {
    fn draw_primitive(
        &mut self,
        geometry: &GeometryBuffers,
        material: &MaterialBinding,
        instance: u32,
    );
}

impl DrawPrimitive for wgpu::RenderPass<'_> {
    fn draw_primitive(
        &mut self,
        geometry: &GeometryBuffers,
        material: &MaterialBinding,
        instance: u32,
    ) {
        self.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
        self.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.draw_indexed(0..geometry.num_elements, 0, instance..instance + 1);
    }
}
