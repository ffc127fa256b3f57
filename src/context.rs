use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::{
    camera::PerspectiveCamera,
    config::ViewerConfig,
    data_structures::{scene_graph::Scene, texture::GpuTexture},
    render::Renderer,
    viewer::SceneRenderer,
};

/// Window plus everything wgpu needs to present into it.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: GpuTexture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer_config: &ViewerConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter found")?;
        log::debug!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("Could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader outputs linear colour, so prefer an sRGB surface for the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface is not supported by the adapter")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            GpuTexture::create_depth_texture(&device, [config.width, config.height], "depth_texture");
        let renderer = Renderer::new(&device, &queue, config.format);

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            renderer,
            clear_colour: viewer_config.clear_colour,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigures the surface and depth buffer. Zero sized windows are skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = GpuTexture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    /// Configures the surface again with its current size, after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }
}

impl SceneRenderer for Context {
    type Error = wgpu::SurfaceError;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.draw(
            &self.device,
            &self.queue,
            &view,
            &self.depth_texture,
            scene,
            camera,
            self.clear_colour,
        );
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
