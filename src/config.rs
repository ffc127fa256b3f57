//! Viewer configuration.
//!
//! Every constant the viewer uses at startup lives here as a typed parameter.
//! The [`Default`] implementations reproduce the stock setup: a 75° camera at
//! `(0, 1, 5)`, a dim ambient fill plus one white directional light and damped
//! orbit controls that cannot tilt below the horizon.

use std::path::PathBuf;

/// Top-level configuration handed to [`crate::app::run`] or [`crate::viewer::Viewer::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub ambient_light: AmbientLightConfig,
    pub directional_light: DirectionalLightConfig,
    pub controls: ControlsConfig,
    pub asset: AssetSource,
    pub clear_colour: wgpu::Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            ambient_light: AmbientLightConfig::default(),
            directional_light: DirectionalLightConfig::default(),
            controls: ControlsConfig::default(),
            asset: AssetSource::default(),
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

impl ViewerConfig {
    pub fn with_asset(mut self, asset: AssetSource) -> Self {
        self.asset = asset;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glb-viewer".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Perspective camera parameters. The aspect ratio is not configured: it always
/// follows the viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 1.0, 5.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLightConfig {
    /// sRGB colour as `0xRRGGBB`.
    pub color: u32,
    pub intensity: f32,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            color: 0x404040,
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLightConfig {
    /// sRGB colour as `0xRRGGBB`.
    pub color: u32,
    pub intensity: f32,
    /// Position of the light relative to the origin it shines at. Normalized on use.
    pub direction: [f32; 3],
}

impl Default for DirectionalLightConfig {
    fn default() -> Self {
        Self {
            color: 0xffffff,
            intensity: 1.0,
            direction: [1.0, 1.0, 1.0],
        }
    }
}

/// Orbit controls tuning.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlsConfig {
    pub target: [f32; 3],
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub screen_space_panning: bool,
    /// Polar angle limits in radians, measured from the up axis.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            enable_damping: true,
            damping_factor: 0.25,
            screen_space_panning: false,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::FRAC_PI_2,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Where the single model comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetSource {
    /// A `.glb`/`.gltf` file. Relative paths resolve against the working directory
    /// (or the page origin on the web).
    File(PathBuf),
    /// The built-in crown made of a hollow cylinder and a cross.
    ProceduralCrown,
}

impl Default for AssetSource {
    fn default() -> Self {
        Self::File(PathBuf::from("crown.glb"))
    }
}

/// Converts an sRGB `0xRRGGBB` colour into linear RGB components.
pub fn hex_to_linear_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}
