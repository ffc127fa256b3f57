//! Window and event loop.
//!
//! [`App`] implements winit's [`ApplicationHandler`]. It creates the window and the
//! GPU [`Context`] when the application is resumed, starts the asset load in the
//! background and then renders continuously: every `RedrawRequested` runs one
//! [`Viewer::frame`] and immediately requests the next redraw.
//!
//! The asset load runs on a tokio task natively and on `spawn_local` in the browser.
//! In both cases the result comes back as a [`ViewerEvent`] through the event loop
//! proxy, so the scene is only ever touched on the event loop thread.
//!
//! Resources are released when the window is closed or the loop exits, never at
//! startup.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::scene_graph::Node,
    resources,
    viewer::Viewer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[derive(Debug)]
pub(crate) enum ViewerEvent {
    /// The GPU context finished initializing (the browser cannot block on it).
    #[cfg(target_arch = "wasm32")]
    Initialized(Context),
    AssetLoaded(anyhow::Result<Node>),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    viewer: Viewer,
    ctx: Option<Context>,
    load_started: bool,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let viewer = Viewer::new(config.clone(), config.window.width, config.window.height);
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            viewer,
            ctx: None,
            load_started: false,
        })
    }

    fn start_asset_load(&mut self) {
        if self.load_started {
            return;
        }
        self.load_started = true;

        let source = self.config.asset.clone();
        let proxy = self.proxy.clone();
        log::info!("Loading {source:?}");
        let load = async move {
            let result = resources::load_asset(&source).await;
            if proxy.send_event(ViewerEvent::AssetLoaded(result)).is_err() {
                log::warn!("Event loop closed before the model finished loading");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);
    }

    fn attach_context(&mut self, mut ctx: Context) {
        let size = ctx.window.inner_size();
        ctx.resize(size.width, size.height);
        self.viewer.resize(size.width, size.height);
        ctx.window.request_redraw();
        self.ctx = Some(ctx);
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create the window: {e}");
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let ctx = self.async_runtime.block_on(Context::new(window, &self.config));
            match ctx {
                Ok(ctx) => self.attach_context(ctx),
                Err(e) => {
                    log::error!("Could not initialize the renderer: {e:#}");
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, &config).await {
                    Ok(ctx) => {
                        if proxy.send_event(ViewerEvent::Initialized(ctx)).is_err() {
                            log::warn!("Event loop closed before the renderer was ready");
                        }
                    }
                    Err(e) => log::error!("Could not initialize the renderer: {e:#}"),
                }
            });
        }

        self.start_asset_load();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            #[cfg(target_arch = "wasm32")]
            ViewerEvent::Initialized(ctx) => self.attach_context(ctx),
            ViewerEvent::AssetLoaded(result) => {
                self.viewer.on_asset_loaded(result);
                if let Some(ctx) = &self.ctx {
                    ctx.window.request_redraw();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(ctx) = &mut self.ctx else {
            return;
        };

        if self.viewer.handle_window_event(&event) {
            ctx.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                self.viewer.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                ctx.resize(size.width, size.height);
                self.viewer.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                match self.viewer.frame(ctx) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => ctx.reconfigure(),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory, exiting");
                        self.viewer.shutdown();
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::warn!("Skipping frame: {e}"),
                }
                ctx.window.request_redraw();
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.viewer.shutdown();
    }
}

/// Opens the viewer window and runs until it is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Browser entry point: shows the default model on the `canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
