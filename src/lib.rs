//! glb-viewer
//!
//! A small wgpu viewer that shows one static glTF/GLB model (or a built-in
//! procedural crown) lit by an ambient and a directional light, with orbit camera
//! controls. Runs natively and in the browser.
//!
//! High-level modules
//! - `app`: winit event loop, window creation and the background asset load
//! - `camera`: perspective camera and its uniform
//! - `cli`: command line arguments of the binary
//! - `config`: typed startup parameters with the stock defaults
//! - `context`: window, surface, device and queue
//! - `controls`: orbit controls mapping pointer and touch input to camera motion
//! - `data_structures`: scene graph, meshes, materials, textures and lights
//! - `pipelines`: the lit mesh pipelines and shared bind group layouts
//! - `render`: walks the scene and records the render pass
//! - `resources`: glTF import, file loading and the procedural crown
//! - `viewer`: the window independent lifecycle (startup, frame, shutdown)
//!

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

pub use app::run;
pub use config::{AssetSource, ViewerConfig};
pub use viewer::{AssetState, SceneRenderer, Viewer};
