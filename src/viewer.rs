//! The viewer's state and lifecycle, independent of any window or GPU.
//!
//! [`Viewer`] owns the scene, the camera and the orbit controls. The event loop in
//! [`crate::app`] feeds it input, hands it the loaded model and drives
//! [`Viewer::frame`] through a [`SceneRenderer`], which is the only place the GPU
//! is involved. Keeping that seam narrow lets the whole lifecycle (startup scene,
//! load success or failure, per-frame update order and shutdown) run headless.

use winit::event::WindowEvent;

use crate::{
    camera::PerspectiveCamera,
    config::{ViewerConfig, hex_to_linear_rgb},
    controls::OrbitControls,
    data_structures::{
        light::{AmbientLight, DirectionalLight},
        scene_graph::{DisposalReport, Node, NodeKind, Scene},
        transform::Transform,
    },
};

/// Draws a scene. Implemented by the windowed GPU context and by test doubles.
pub trait SceneRenderer {
    type Error;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error>;
}

/// Progress of the single model the viewer shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetState {
    /// Load requested, no result yet.
    Pending,
    Loaded,
    /// The load failed; the scene keeps rendering its lights only.
    Failed(String),
    /// The viewer was shut down and its resources released.
    Unloaded,
}

const FPS_REPORT_INTERVAL_SECS: f32 = 5.0;

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    asset_state: AssetState,
    frames: u64,
    frames_since_report: u32,
    last_report: instant::Instant,
    shut_down: bool,
}

impl Viewer {
    /// Builds the startup scene (ambient plus directional light), the camera and the
    /// controls for a viewport of `width` x `height` pixels. The controls orient the
    /// camera towards their target right away.
    pub fn new(config: ViewerConfig, width: u32, height: u32) -> Self {
        let mut scene = Scene::new();
        scene.add(
            Node::new(NodeKind::AmbientLight(AmbientLight {
                color: hex_to_linear_rgb(config.ambient_light.color),
                intensity: config.ambient_light.intensity,
            }))
            .with_name("Ambient light"),
        );
        scene.add(
            Node::new(NodeKind::DirectionalLight(DirectionalLight {
                color: hex_to_linear_rgb(config.directional_light.color),
                intensity: config.directional_light.intensity,
            }))
            .with_name("Directional light")
            .with_transform(Transform::from_position(config.directional_light.direction.into())),
        );

        let mut camera = PerspectiveCamera::new(&config.camera, width, height);
        let controls = OrbitControls::new(config.controls.clone(), &mut camera, width, height);

        Self {
            config,
            scene,
            camera,
            controls,
            asset_state: AssetState::Pending,
            frames: 0,
            frames_since_report: 0,
            last_report: instant::Instant::now(),
            shut_down: false,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn asset_state(&self) -> &AssetState {
        &self.asset_state
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Receives the outcome of the asset load. A model arriving after shutdown is
    /// released immediately instead of being attached.
    pub fn on_asset_loaded(&mut self, result: anyhow::Result<Node>) {
        if self.shut_down {
            match result {
                Ok(node) => {
                    let report = node.dispose_resources();
                    log::debug!("Model finished loading after shutdown, released {report:?}");
                }
                Err(e) => log::warn!("Model failed to load after shutdown: {e:#}"),
            }
            return;
        }
        match result {
            Ok(node) => {
                log::info!(
                    "Model {} added to the scene ({} nodes)",
                    node.name.as_deref().unwrap_or("<unnamed>"),
                    node.count()
                );
                self.scene.add(node);
                self.asset_state = AssetState::Loaded;
            }
            Err(e) => {
                log::error!("An error happened while loading the model: {e:#}");
                self.asset_state = AssetState::Failed(format!("{e:#}"));
            }
        }
    }

    /// Advances one frame: exactly one controls update followed by exactly one render.
    pub fn frame<R: SceneRenderer>(&mut self, renderer: &mut R) -> Result<(), R::Error> {
        self.controls.update(&mut self.camera);
        let result = renderer.render(&self.scene, &self.camera);
        self.frames += 1;
        self.report_fps();
        result
    }

    fn report_fps(&mut self) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed().as_secs_f32();
        if elapsed >= FPS_REPORT_INTERVAL_SECS {
            log::debug!("{:.1} fps", self.frames_since_report as f32 / elapsed);
            self.frames_since_report = 0;
            self.last_report = instant::Instant::now();
        }
    }

    /// Follows a viewport resize. Zero sized viewports (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect(width, height);
        self.controls.set_viewport(width, height);
    }

    /// Forwards pointer and touch input to the orbit controls. Returns whether the
    /// event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.controls.handle_window_event(event, &self.camera)
    }

    /// Disposes every geometry, material and texture in the scene and then removes
    /// all nodes. Only the first call does anything; later calls return `None`.
    pub fn shutdown(&mut self) -> Option<DisposalReport> {
        if self.shut_down {
            return None;
        }
        self.shut_down = true;
        let report = self.scene.dispose_resources();
        let removed = self.scene.remove_objects();
        self.asset_state = AssetState::Unloaded;
        log::info!(
            "Viewer shut down: removed {removed} nodes, disposed {} geometries, {} materials and {} textures",
            report.geometries,
            report.materials,
            report.textures
        );
        Some(report)
    }
}
