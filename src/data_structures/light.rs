//! Light sources and the light uniform consumed by the mesh shader.

use cgmath::{InnerSpace, Vector3, Zero};

/// Non-directional fill light that lights every surface equally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB.
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Parallel light shining from the node's position towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB.
    pub color: [f32; 3],
    pub intensity: f32,
}

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Unit vector pointing from the surface towards the light.
    direction: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    color: [f32; 3],
    _padding2: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 3],
    directional_count: u32,
    directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
}

impl LightUniform {
    pub fn new() -> Self {
        Self {
            ambient: [0.0; 3],
            directional_count: 0,
            directional: [DirectionalLightRaw::default(); MAX_DIRECTIONAL_LIGHTS],
        }
    }

    pub fn add_ambient(&mut self, light: &AmbientLight) {
        for (sum, c) in self.ambient.iter_mut().zip(light.color) {
            *sum += c * light.intensity;
        }
    }

    /// Adds a directional light whose world position is `position`. Returns `false`
    /// when the uniform is already full.
    pub fn add_directional(&mut self, light: &DirectionalLight, position: Vector3<f32>) -> bool {
        let index = self.directional_count as usize;
        if index >= MAX_DIRECTIONAL_LIGHTS {
            return false;
        }
        let direction = if position.is_zero() {
            Vector3::unit_y()
        } else {
            position.normalize()
        };
        self.directional[index] = DirectionalLightRaw {
            direction: direction.into(),
            _padding: 0,
            color: light.color.map(|c| c * light.intensity),
            _padding2: 0,
        };
        self.directional_count += 1;
        true
    }

    pub fn directional_count(&self) -> u32 {
        self.directional_count
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.ambient
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new()
    }
}
