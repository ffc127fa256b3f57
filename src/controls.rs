//! Orbit camera controls.
//!
//! [`OrbitControls`] turns pointer, wheel and touch input into orbiting, dollying
//! and panning around a target point. Input handlers only accumulate deltas; the
//! camera is moved in [`OrbitControls::update`], which the render loop calls once
//! per frame. With damping enabled each update applies a fraction of the pending
//! delta and decays the remainder, which gives the camera its inertia.

use std::collections::HashMap;
use std::f32::consts::PI;

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3, Vector3, Zero};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    keyboard::ModifiersState,
};

use crate::{camera::PerspectiveCamera, config::ControlsConfig};

const EPS: f32 = 0.000001;

/// Spherical coordinates around the up (y) axis. `phi` is the polar angle from +y,
/// `theta` the azimuth around y measured from +z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_vector(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_vector(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keeps `phi` away from the poles where the look-at basis degenerates.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlState {
    None,
    Rotate,
    Dolly,
    Pan,
    TouchRotate,
    TouchDollyPan,
}

pub struct OrbitControls {
    pub target: Point3<f32>,
    pub config: ControlsConfig,
    state: ControlState,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    viewport: (u32, u32),
    pointer: Option<PhysicalPosition<f64>>,
    modifiers: ModifiersState,
    touches: HashMap<u64, PhysicalPosition<f64>>,
    touch_distance: f32,
    touch_center: PhysicalPosition<f64>,
}

impl OrbitControls {
    /// Creates controls and immediately orients `camera` towards the configured target.
    pub fn new(config: ControlsConfig, camera: &mut PerspectiveCamera, width: u32, height: u32) -> Self {
        let mut controls = Self {
            target: config.target.into(),
            config,
            state: ControlState::None,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::zero(),
            viewport: (width.max(1), height.max(1)),
            pointer: None,
            modifiers: ModifiersState::empty(),
            touches: HashMap::new(),
            touch_distance: 0.0,
            touch_center: PhysicalPosition::new(0.0, 0.0),
        };
        controls.update(camera);
        controls
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = (width, height);
        }
    }

    pub fn polar_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_vector(camera.position - self.target).phi
    }

    pub fn azimuthal_angle(&self, camera: &PerspectiveCamera) -> f32 {
        Spherical::from_vector(camera.position - self.target).theta
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Scales the distance to the target by `dolly_scale` on the next update (< 1 moves closer).
    pub fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    pub fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.config.zoom_speed)
    }

    /// Pans by a screen space delta in physical pixels.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        // Half of the fov is center to top of screen.
        let half_fov = cgmath::Rad::from(camera.fovy).0 / 2.0;
        let target_distance = offset.magnitude() * half_fov.tan();
        let height = self.viewport.1 as f32;
        self.pan_left(2.0 * delta_x * target_distance / height, camera);
        self.pan_up(2.0 * delta_y * target_distance / height, camera);
    }

    fn pan_left(&mut self, distance: f32, camera: &PerspectiveCamera) {
        self.pan_offset += camera.right() * -distance;
    }

    fn pan_up(&mut self, distance: f32, camera: &PerspectiveCamera) {
        let v = if self.config.screen_space_panning {
            camera.local_up()
        } else {
            // Move along the ground plane, keeping the target's height.
            camera.up.cross(camera.right())
        };
        self.pan_offset += v * distance;
    }

    /// Applies pending deltas to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_vector(camera.position - self.target);

        if self.config.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.config.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.config.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        // Inverted or NaN limits are tolerated, the minimum takes precedence.
        spherical.phi = spherical
            .phi
            .min(self.config.max_polar_angle)
            .max(self.config.min_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale)
            .min(self.config.max_distance)
            .max(self.config.min_distance)
            .max(EPS);

        if self.config.enable_damping {
            self.target += self.pan_offset * self.config.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_vector();
        camera.look_at(self.target);

        if self.config.enable_damping {
            let decay = 1.0 - self.config.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        before.distance2(camera.position) > EPS
    }

    /// Feeds a window event into the controls. Returns `true` when the event was used.
    pub fn handle_window_event(&mut self, event: &WindowEvent, camera: &PerspectiveCamera) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                false
            }
            WindowEvent::MouseInput { state, button, .. } => self.on_mouse_button(*state, *button),
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(*position, camera),
            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => self.on_mouse_wheel(delta),
            WindowEvent::Touch(touch) => self.on_touch(touch, camera),
            _ => false,
        }
    }

    fn on_mouse_button(&mut self, state: ElementState, button: MouseButton) -> bool {
        if !state.is_pressed() {
            let was_active = self.state != ControlState::None;
            self.state = ControlState::None;
            return was_active;
        }
        let pan_modifier =
            self.modifiers.control_key() || self.modifiers.shift_key() || self.modifiers.super_key();
        self.state = match button {
            MouseButton::Left if pan_modifier && self.config.enable_pan => ControlState::Pan,
            MouseButton::Left if !pan_modifier && self.config.enable_rotate => ControlState::Rotate,
            MouseButton::Middle if self.config.enable_zoom => ControlState::Dolly,
            MouseButton::Right if self.config.enable_pan => ControlState::Pan,
            _ => ControlState::None,
        };
        self.state != ControlState::None
    }

    fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>, camera: &PerspectiveCamera) -> bool {
        let previous = self.pointer.replace(position);
        let Some(previous) = previous else {
            return false;
        };
        let dx = (position.x - previous.x) as f32;
        let dy = (position.y - previous.y) as f32;
        match self.state {
            ControlState::Rotate => {
                self.rotate_by_pixels(dx, dy);
                true
            }
            ControlState::Dolly => {
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
                true
            }
            ControlState::Pan => {
                self.pan(dx * self.config.pan_speed, dy * self.config.pan_speed, camera);
                true
            }
            _ => false,
        }
    }

    fn rotate_by_pixels(&mut self, dx: f32, dy: f32) {
        let height = self.viewport.1 as f32;
        let speed = self.config.rotate_speed;
        self.rotate_left(2.0 * PI * dx * speed / height);
        self.rotate_up(2.0 * PI * dy * speed / height);
    }

    fn on_mouse_wheel(&mut self, delta: &MouseScrollDelta) -> bool {
        if !self.config.enable_zoom {
            return false;
        }
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32,
        };
        if amount > 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if amount < 0.0 {
            self.dolly_out(self.zoom_scale());
        }
        amount != 0.0
    }

    fn on_touch(&mut self, touch: &Touch, camera: &PerspectiveCamera) -> bool {
        match touch.phase {
            TouchPhase::Started => {
                self.touches.insert(touch.id, touch.location);
                self.begin_touch_gesture();
                self.state != ControlState::None
            }
            TouchPhase::Moved => {
                let Some(previous) = self.touches.insert(touch.id, touch.location) else {
                    return false;
                };
                match self.state {
                    ControlState::TouchRotate => {
                        let dx = (touch.location.x - previous.x) as f32;
                        let dy = (touch.location.y - previous.y) as f32;
                        self.rotate_by_pixels(dx, dy);
                        true
                    }
                    ControlState::TouchDollyPan => {
                        self.continue_dolly_pan(camera);
                        true
                    }
                    _ => false,
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.remove(&touch.id);
                self.begin_touch_gesture();
                true
            }
        }
    }

    fn begin_touch_gesture(&mut self) {
        self.state = match self.touches.len() {
            1 if self.config.enable_rotate => ControlState::TouchRotate,
            2 if self.config.enable_zoom || self.config.enable_pan => {
                let (distance, center) = self.touch_metrics();
                self.touch_distance = distance;
                self.touch_center = center;
                ControlState::TouchDollyPan
            }
            _ => ControlState::None,
        };
    }

    fn touch_metrics(&self) -> (f32, PhysicalPosition<f64>) {
        let mut points = self.touches.values();
        match (points.next(), points.next()) {
            (Some(a), Some(b)) => {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let center = PhysicalPosition::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
                ((dx * dx + dy * dy).sqrt() as f32, center)
            }
            _ => (0.0, self.touch_center),
        }
    }

    fn continue_dolly_pan(&mut self, camera: &PerspectiveCamera) {
        let (distance, center) = self.touch_metrics();
        if self.config.enable_zoom && self.touch_distance > 0.0 && distance > 0.0 {
            let ratio = (distance / self.touch_distance).powf(self.config.zoom_speed);
            self.dolly_out(ratio);
        }
        if self.config.enable_pan {
            let dx = (center.x - self.touch_center.x) as f32 * self.config.pan_speed;
            let dy = (center.y - self.touch_center.y) as f32 * self.config.pan_speed;
            self.pan(dx, dy, camera);
        }
        self.touch_distance = distance;
        self.touch_center = center;
    }
}

impl std::fmt::Debug for OrbitControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrbitControls")
            .field("target", &self.target.to_vec())
            .field("state", &self.state)
            .field("scale", &self.scale)
            .finish()
    }
}
