use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace, Point3};
use glb_viewer::{
    camera::PerspectiveCamera,
    config::{CameraConfig, ControlsConfig},
    controls::{ControlState, OrbitControls, Spherical},
};
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceId, ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent},
    keyboard::ModifiersState,
};

use crate::common::test_utils::assert_close;

mod common;

fn setup(config: ControlsConfig) -> (PerspectiveCamera, OrbitControls) {
    let mut camera = PerspectiveCamera::new(&CameraConfig::default(), 800, 600);
    let controls = OrbitControls::new(config, &mut camera, 800, 600);
    (camera, controls)
}

fn undamped() -> ControlsConfig {
    ControlsConfig {
        enable_damping: false,
        ..Default::default()
    }
}

#[test]
fn spherical_round_trips_through_a_vector() {
    let v = cgmath::Vector3::new(0.0, 1.0, 5.0);
    let spherical = Spherical::from_vector(v);
    assert_close(spherical.radius, v.magnitude());
    assert_close(spherical.theta, 0.0);
    let back = spherical.to_vector();
    assert_close(back.y, 1.0);
    assert_close(back.z, 5.0);
}

#[test]
fn update_without_pending_input_keeps_the_camera_still() {
    let (mut camera, mut controls) = setup(ControlsConfig::default());
    let before = camera.position;
    assert!(!controls.update(&mut camera));
    assert_eq!(camera.position, before);
}

#[test]
fn damping_spreads_a_rotation_over_several_frames() {
    let (mut camera, mut controls) = setup(ControlsConfig::default());
    controls.rotate_left(-0.4);

    assert!(controls.update(&mut camera));
    assert_close(controls.azimuthal_angle(&camera), 0.1);
    assert!(controls.update(&mut camera));
    assert_close(controls.azimuthal_angle(&camera), 0.1 + 0.075);

    // The remainder keeps decaying towards the full rotation.
    for _ in 0..200 {
        controls.update(&mut camera);
    }
    assert_close(controls.azimuthal_angle(&camera), 0.4);
    assert!(!controls.update(&mut camera));
}

#[test]
fn without_damping_the_whole_delta_is_applied_at_once() {
    let (mut camera, mut controls) = setup(undamped());
    controls.rotate_left(-0.4);
    controls.update(&mut camera);
    assert_close(controls.azimuthal_angle(&camera), 0.4);
    assert!(!controls.update(&mut camera));
}

#[test]
fn polar_angle_never_passes_the_horizon() {
    let (mut camera, mut controls) = setup(undamped());
    // Rotating "up" by a negative angle tilts the camera down towards and below the ground.
    controls.rotate_up(-PI);
    controls.update(&mut camera);

    assert_close(controls.polar_angle(&camera), FRAC_PI_2);
    assert!(camera.position.y >= -1e-4);
}

#[test]
fn polar_angle_stays_off_the_pole() {
    let (mut camera, mut controls) = setup(undamped());
    controls.rotate_up(PI);
    controls.update(&mut camera);

    // The camera ends up (almost) straight above the target but keeps its distance.
    assert!(controls.polar_angle(&camera) < 1e-3);
    assert_close(camera.position.y, (1.0f32 + 25.0).sqrt());
}

#[test]
fn panning_moves_the_target_in_the_ground_plane() {
    let (mut camera, mut controls) = setup(undamped());
    controls.pan(120.0, 80.0, &camera);
    controls.update(&mut camera);

    assert_close(controls.target.y, 0.0);
    assert!(controls.target.to_vec().magnitude() > 0.1);
    // The camera keeps its offset from the target.
    let offset = camera.position - controls.target;
    assert_close(offset.magnitude(), (1.0f32 + 25.0).sqrt());
    assert_eq!(camera.target, controls.target);
}

#[test]
fn screen_space_panning_moves_the_target_up() {
    let (mut camera, mut controls) = setup(ControlsConfig {
        screen_space_panning: true,
        ..undamped()
    });
    controls.pan(0.0, 100.0, &camera);
    controls.update(&mut camera);
    assert!(controls.target.y > 0.1);
}

#[test]
fn dolly_is_clamped_to_the_distance_limits() {
    let (mut camera, mut controls) = setup(ControlsConfig {
        min_distance: 2.0,
        max_distance: 8.0,
        ..undamped()
    });

    controls.dolly_in(0.01);
    controls.update(&mut camera);
    assert_close(camera.position.distance(Point3::origin()), 2.0);

    controls.dolly_out(0.01);
    controls.update(&mut camera);
    assert_close(camera.position.distance(Point3::origin()), 8.0);
}

#[test]
fn left_drag_rotates_and_release_ends_the_gesture() {
    let (mut camera, mut controls) = setup(undamped());
    let device_id = unsafe { DeviceId::dummy() };
    let cursor = |x: f64, y: f64| WindowEvent::CursorMoved {
        device_id,
        position: PhysicalPosition::new(x, y),
    };

    controls.handle_window_event(&cursor(100.0, 100.0), &camera);
    assert!(controls.handle_window_event(
        &WindowEvent::MouseInput {
            device_id,
            state: ElementState::Pressed,
            button: MouseButton::Left,
        },
        &camera,
    ));
    assert_eq!(controls.state(), ControlState::Rotate);

    controls.handle_window_event(&cursor(160.0, 100.0), &camera);
    controls.update(&mut camera);
    // Dragging right by 60 of 600 pixels rotates by 2 * pi * 60 / 600 to the left.
    assert_close(controls.azimuthal_angle(&camera), -2.0 * PI * 60.0 / 600.0);

    controls.handle_window_event(
        &WindowEvent::MouseInput {
            device_id,
            state: ElementState::Released,
            button: MouseButton::Left,
        },
        &camera,
    );
    assert_eq!(controls.state(), ControlState::None);
}

#[test]
fn wheel_up_moves_the_camera_closer() {
    let (mut camera, mut controls) = setup(undamped());
    let before = camera.position.distance(Point3::origin());
    controls.handle_window_event(
        &WindowEvent::MouseWheel {
            device_id: unsafe { DeviceId::dummy() },
            delta: MouseScrollDelta::LineDelta(0.0, 1.0),
            phase: TouchPhase::Moved,
        },
        &camera,
    );
    controls.update(&mut camera);
    assert!(camera.position.distance(Point3::origin()) < before);
}

#[test]
fn inverted_limits_do_not_panic() {
    let (camera, controls) = setup(ControlsConfig {
        min_polar_angle: 1.0,
        max_polar_angle: 0.5,
        min_distance: 10.0,
        max_distance: 2.0,
        ..undamped()
    });
    // The lower limits win when the configuration contradicts itself.
    assert_close(controls.polar_angle(&camera), 1.0);
    assert_close(camera.position.distance(Point3::origin()), 10.0);
}

#[test]
fn nan_limits_do_not_panic() {
    let (mut camera, mut controls) = setup(ControlsConfig {
        max_polar_angle: f32::NAN,
        min_distance: f32::NAN,
        ..undamped()
    });
    controls.rotate_left(0.3);
    controls.update(&mut camera);
    assert!(camera.position.x.is_finite());
    assert_close(camera.position.distance(Point3::origin()), (1.0f32 + 25.0).sqrt());
}

fn device_id() -> DeviceId {
    unsafe { DeviceId::dummy() }
}

fn cursor(x: f64, y: f64) -> WindowEvent {
    WindowEvent::CursorMoved {
        device_id: device_id(),
        position: PhysicalPosition::new(x, y),
    }
}

fn button(state: ElementState, button: MouseButton) -> WindowEvent {
    WindowEvent::MouseInput {
        device_id: device_id(),
        state,
        button,
    }
}

fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> WindowEvent {
    WindowEvent::Touch(Touch {
        device_id: device_id(),
        phase,
        location: PhysicalPosition::new(x, y),
        force: None,
        id,
    })
}

fn distance_to_target(camera: &PerspectiveCamera, controls: &OrbitControls) -> f32 {
    camera.position.distance(controls.target)
}

/// Presses `pressed`, drags the cursor from (100, 100) to `to` and updates once.
fn drag(
    camera: &mut PerspectiveCamera,
    controls: &mut OrbitControls,
    pressed: MouseButton,
    to: (f64, f64),
) -> ControlState {
    controls.handle_window_event(&cursor(100.0, 100.0), camera);
    controls.handle_window_event(&button(ElementState::Pressed, pressed), camera);
    let state = controls.state();
    controls.handle_window_event(&cursor(to.0, to.1), camera);
    controls.update(camera);
    controls.handle_window_event(&button(ElementState::Released, pressed), camera);
    state
}

#[test]
fn right_drag_pans_along_the_ground() {
    let (mut camera, mut controls) = setup(undamped());
    let state = drag(&mut camera, &mut controls, MouseButton::Right, (160.0, 100.0));

    assert_eq!(state, ControlState::Pan);
    // Dragging right drags the scene along, so the target moves to the left.
    assert!(controls.target.x < -0.1);
    assert_close(controls.target.y, 0.0);
    assert_close(distance_to_target(&camera, &controls), (1.0f32 + 25.0).sqrt());
    assert_eq!(controls.state(), ControlState::None);
}

#[test]
fn modifier_left_drag_pans_instead_of_rotating() {
    for modifier in [ModifiersState::SHIFT, ModifiersState::CONTROL, ModifiersState::SUPER] {
        let (mut camera, mut controls) = setup(undamped());
        let azimuth = controls.azimuthal_angle(&camera);
        controls.handle_window_event(&WindowEvent::ModifiersChanged(modifier.into()), &camera);

        let state = drag(&mut camera, &mut controls, MouseButton::Left, (160.0, 100.0));

        assert_eq!(state, ControlState::Pan, "{modifier:?}");
        assert!(controls.target.x < -0.1);
        assert_close(controls.azimuthal_angle(&camera), azimuth);
    }
}

#[test]
fn middle_drag_dollies() {
    let (mut camera, mut controls) = setup(undamped());
    let start = distance_to_target(&camera, &controls);

    let state = drag(&mut camera, &mut controls, MouseButton::Middle, (100.0, 140.0));
    assert_eq!(state, ControlState::Dolly);
    // Dragging down moves away by one zoom step.
    let after_down = distance_to_target(&camera, &controls);
    assert_close(after_down, start / 0.95);

    drag(&mut camera, &mut controls, MouseButton::Middle, (100.0, 60.0));
    assert_close(distance_to_target(&camera, &controls), start);
    assert_eq!(controls.target, Point3::origin());
}

#[test]
fn disabled_inputs_are_ignored() {
    let (mut camera, mut controls) = setup(ControlsConfig {
        enable_pan: false,
        enable_zoom: false,
        ..undamped()
    });
    assert_eq!(drag(&mut camera, &mut controls, MouseButton::Right, (160.0, 100.0)), ControlState::None);
    assert_eq!(drag(&mut camera, &mut controls, MouseButton::Middle, (100.0, 160.0)), ControlState::None);
    assert_eq!(controls.target, Point3::origin());
    assert_close(distance_to_target(&camera, &controls), (1.0f32 + 25.0).sqrt());
}

#[test]
fn one_finger_rotates() {
    let (mut camera, mut controls) = setup(undamped());
    assert!(controls.handle_window_event(&touch(7, TouchPhase::Started, 100.0, 100.0), &camera));
    assert_eq!(controls.state(), ControlState::TouchRotate);

    controls.handle_window_event(&touch(7, TouchPhase::Moved, 160.0, 100.0), &camera);
    controls.update(&mut camera);
    assert_close(controls.azimuthal_angle(&camera), -2.0 * PI * 60.0 / 600.0);
    assert_eq!(controls.target, Point3::origin());

    controls.handle_window_event(&touch(7, TouchPhase::Ended, 160.0, 100.0), &camera);
    assert_eq!(controls.state(), ControlState::None);
}

#[test]
fn two_finger_spread_moves_closer() {
    let (mut camera, mut controls) = setup(undamped());
    let start = distance_to_target(&camera, &controls);
    controls.handle_window_event(&touch(0, TouchPhase::Started, 100.0, 300.0), &camera);
    controls.handle_window_event(&touch(1, TouchPhase::Started, 300.0, 300.0), &camera);
    assert_eq!(controls.state(), ControlState::TouchDollyPan);

    // Spread symmetrically so the centre stays put: 200 px apart becomes 400 px.
    controls.handle_window_event(&touch(0, TouchPhase::Moved, 0.0, 300.0), &camera);
    controls.handle_window_event(&touch(1, TouchPhase::Moved, 400.0, 300.0), &camera);
    controls.update(&mut camera);

    assert_close(distance_to_target(&camera, &controls), start / 2.0);
    assert_close(controls.target.x, 0.0);
    assert_close(controls.target.z, 0.0);
}

#[test]
fn two_finger_drag_pans_without_zooming() {
    let (mut camera, mut controls) = setup(undamped());
    let start = distance_to_target(&camera, &controls);
    controls.handle_window_event(&touch(0, TouchPhase::Started, 100.0, 300.0), &camera);
    controls.handle_window_event(&touch(1, TouchPhase::Started, 300.0, 300.0), &camera);

    // Both fingers move 50 px to the right, one after the other.
    controls.handle_window_event(&touch(0, TouchPhase::Moved, 150.0, 300.0), &camera);
    controls.handle_window_event(&touch(1, TouchPhase::Moved, 350.0, 300.0), &camera);
    controls.update(&mut camera);

    assert_close(distance_to_target(&camera, &controls), start);
    assert!(controls.target.x < -0.1);
    assert_close(controls.target.y, 0.0);

    // Lifting one finger falls back to rotating with the other.
    controls.handle_window_event(&touch(1, TouchPhase::Ended, 350.0, 300.0), &camera);
    assert_eq!(controls.state(), ControlState::TouchRotate);
    controls.handle_window_event(&touch(0, TouchPhase::Cancelled, 150.0, 300.0), &camera);
    assert_eq!(controls.state(), ControlState::None);
}
