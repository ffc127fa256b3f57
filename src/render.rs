//! Scene rendering.
//!
//! [`Renderer`] owns everything the mesh pipelines need besides the scene itself:
//! bind group layouts, the camera and light uniforms, a white fallback texture and
//! the per-draw instance buffer. Each call to [`Renderer::draw`] walks the scene once,
//! uploads resources that have not reached the GPU yet, and records a single render pass.
//!
//! Disposed geometry and materials are skipped.

use std::iter;

use anyhow::Context as _;

use crate::{
    camera::{CameraResources, PerspectiveCamera},
    data_structures::{
        light::LightUniform,
        model::{DrawPrimitive, GeometryBuffers, MaterialBinding},
        scene_graph::{NodeKind, Scene},
        texture::{self, GpuTexture},
        transform::InstanceRaw,
    },
    pipelines::{
        basic::{self, MeshPipelines},
        light::LightResources,
    },
};

const INITIAL_INSTANCE_CAPACITY: usize = 16;

/// One primitive resolved to GPU objects for the current frame.
struct Draw<'a> {
    geometry: &'a GeometryBuffers,
    material: &'a MaterialBinding,
    double_sided: bool,
    instance: u32,
}

#[derive(Debug)]
pub struct Renderer {
    pipelines: MeshPipelines,
    material_layout: wgpu::BindGroupLayout,
    pub camera: CameraResources,
    pub light: LightResources,
    fallback_texture: GpuTexture,
    default_sampler: wgpu::Sampler,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    light_overflow_reported: bool,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let material_layout = basic::material_layout(device);
        let camera = CameraResources::new(device);
        let light = LightResources::new(device);
        let pipelines = basic::mk_mesh_pipelines(
            device,
            color_format,
            &material_layout,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );
        let fallback_texture = GpuTexture::create_solid(device, queue, [255, 255, 255, 255], "white_texture");
        let default_sampler = texture::create_default_sampler(device);

        Self {
            pipelines,
            material_layout,
            camera,
            light,
            fallback_texture,
            default_sampler,
            instance_buffer: mk_instance_buffer(device, INITIAL_INSTANCE_CAPACITY),
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            light_overflow_reported: false,
        }
    }

    /// Renders `scene` as seen from `camera` into `target`. Returns the number of
    /// primitives drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        depth: &GpuTexture,
        scene: &Scene,
        camera: &PerspectiveCamera,
        clear_colour: wgpu::Color,
    ) -> usize {
        let mut lights = LightUniform::new();
        let mut light_overflow = false;
        let mut draws = Vec::new();
        let mut instances = Vec::new();

        let material_layout = &self.material_layout;
        let fallback = &self.fallback_texture;
        let sampler = &self.default_sampler;
        scene.visit_world(&mut |node, world| match &node.kind {
            NodeKind::AmbientLight(light) => lights.add_ambient(light),
            NodeKind::DirectionalLight(light) => {
                if !lights.add_directional(light, world.w.truncate()) {
                    light_overflow = true;
                }
            }
            NodeKind::Mesh(mesh) => {
                for primitive in &mesh.primitives {
                    let Some(geometry) = primitive.geometry.upload(device) else {
                        continue;
                    };
                    let Some(material) =
                        primitive.material.bind(device, queue, material_layout, fallback, sampler)
                    else {
                        continue;
                    };
                    draws.push(Draw {
                        geometry,
                        material,
                        double_sided: primitive.material.double_sided,
                        instance: instances.len() as u32,
                    });
                    instances.push(InstanceRaw::from_matrix(world));
                }
            }
            NodeKind::Group => {}
        });

        if light_overflow && !self.light_overflow_reported {
            log::warn!(
                "Scene has more directional lights than the shader supports, only the first {} are used",
                crate::data_structures::light::MAX_DIRECTIONAL_LIGHTS
            );
            self.light_overflow_reported = true;
        }

        self.camera.write(queue, camera);
        self.light.write(queue, lights);
        self.write_instances(device, queue, &instances);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                multiview_mask: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(1, &self.camera.bind_group, &[]);
            render_pass.set_bind_group(2, &self.light.bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for draw in &draws {
                render_pass.set_pipeline(self.pipelines.select(draw.double_sided));
                render_pass.draw_primitive(draw.geometry, draw.material, draw.instance);
            }
        }
        queue.submit(iter::once(encoder.finish()));

        draws.len()
    }

    fn write_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[InstanceRaw]) {
        if instances.len() > self.instance_capacity {
            let capacity = instances.len().next_power_of_two();
            log::debug!("Growing instance buffer to {capacity} entries");
            self.instance_buffer = mk_instance_buffer(device, capacity);
            self.instance_capacity = capacity;
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }
}

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Colour format of [`render_to_image`] targets. Use it when creating the [`Renderer`].
pub const SNAPSHOT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Renders one frame into an offscreen texture and reads it back as an RGBA image.
/// `renderer` must have been created with [`SNAPSHOT_FORMAT`].
#[allow(clippy::too_many_arguments)]
pub async fn render_to_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    renderer: &mut Renderer,
    scene: &Scene,
    camera: &PerspectiveCamera,
    clear_colour: wgpu::Color,
    width: u32,
    height: u32,
) -> anyhow::Result<image::RgbaImage> {
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Snapshot Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SNAPSHOT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let depth = GpuTexture::create_depth_texture(device, [width, height], "snapshot_depth_texture");

    renderer.draw(device, queue, &view, &depth, scene, camera, clear_colour);

    // Rows of a texture to buffer copy have to be aligned to 256 bytes.
    let unpadded_bytes_per_row = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Snapshot Buffer"),
        size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Snapshot Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    queue.submit(iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only goes away if the caller stopped waiting.
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .map_err(|e| anyhow::anyhow!("Waiting for the GPU failed: {e}"))?;
    rx.receive()
        .await
        .context("Snapshot buffer mapping was cancelled")?
        .context("Could not map the snapshot buffer")?;

    let pixels = {
        let data = buffer_slice.get_mapped_range();
        data.chunks(padded_bytes_per_row as usize)
            .flat_map(|row| &row[..unpadded_bytes_per_row as usize])
            .copied()
            .collect::<Vec<u8>>()
    };
    output_buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels).context("Snapshot has an unexpected size")
}
