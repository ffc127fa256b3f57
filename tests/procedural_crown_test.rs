use cgmath::InnerSpace;
use glb_viewer::{
    data_structures::scene_graph::NodeKind,
    resources::procedural::{
        self, CROSS_HEIGHT, CROWN_HEIGHT, CROWN_INNER_RADIUS, CROWN_OUTER_RADIUS, CROWN_SECTORS,
    },
};

use crate::common::test_utils::assert_close;

mod common;

fn radius(position: [f32; 3]) -> f32 {
    (position[0] * position[0] + position[2] * position[2]).sqrt()
}

#[test]
fn hollow_cylinder_has_walls_and_rings() {
    let cylinder = procedural::hollow_cylinder(CROWN_OUTER_RADIUS, CROWN_INNER_RADIUS, CROWN_HEIGHT, CROWN_SECTORS);

    // Outer wall plus two rings, each 2 * (sectors + 1) vertices and 2 * sectors triangles.
    assert_eq!(cylinder.shell.vertices.len(), 222);
    assert_eq!(cylinder.shell.triangle_count(), 216);
    assert_eq!(cylinder.lining.vertices.len(), 74);
    assert_eq!(cylinder.lining.triangle_count(), 72);

    for vertex in cylinder.shell.vertices.iter().chain(&cylinder.lining.vertices) {
        let r = radius(vertex.position);
        assert!(r > CROWN_INNER_RADIUS - 1e-4 && r < CROWN_OUTER_RADIUS + 1e-4, "radius {r}");
        assert!(vertex.position[1].abs() <= CROWN_HEIGHT / 2.0 + 1e-4);
    }
    for vertex in &cylinder.lining.vertices {
        assert_close(radius(vertex.position), CROWN_INNER_RADIUS);
    }
}

#[test]
fn cylinder_triangles_face_along_their_normals() {
    let cylinder = procedural::hollow_cylinder(CROWN_OUTER_RADIUS, CROWN_INNER_RADIUS, CROWN_HEIGHT, CROWN_SECTORS);
    for geometry in [&cylinder.shell, &cylinder.lining] {
        for triangle in geometry.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| {
                let p = geometry.vertices[triangle[i] as usize].position;
                cgmath::Vector3::new(p[0], p[1], p[2])
            });
            let face = (b - a).cross(c - a);
            let n = geometry.vertices[triangle[0] as usize].normal;
            let normal = cgmath::Vector3::new(n[0], n[1], n[2]);
            assert!(face.dot(normal) > 0.0, "{} has a back facing triangle", geometry.label);
        }
    }
}

#[test]
fn degenerate_sector_counts_are_raised_to_a_triangle() {
    let cylinder = procedural::hollow_cylinder(1.0, 0.5, 1.0, 1);
    assert_eq!(cylinder.lining.triangle_count(), 6);
}

#[test]
fn cross_is_two_flat_bars() {
    let cross = procedural::cross(0.4, 0.7, 0.1);
    assert_eq!(cross.vertices.len(), 8);
    assert_eq!(cross.triangle_count(), 4);
    for vertex in &cross.vertices {
        assert_eq!(vertex.position[2], 0.0);
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
    }

    let ys: Vec<f32> = cross.vertices.iter().map(|v| v.position[1]).collect();
    let xs: Vec<f32> = cross.vertices.iter().map(|v| v.position[0]).collect();
    let fold = |values: &[f32], f: fn(f32, f32) -> f32, init: f32| values.iter().copied().fold(init, f);
    assert_close(fold(&ys, f32::min, f32::MAX), -0.45);
    assert_close(fold(&ys, f32::max, f32::MIN), 0.25);
    assert_close(fold(&xs, f32::min, f32::MAX), -0.2);
    assert_close(fold(&xs, f32::max, f32::MIN), 0.2);
}

#[test]
fn crown_groups_band_and_cross() {
    let crown = procedural::crown();
    assert!(matches!(crown.kind, NodeKind::Group));
    assert_eq!(crown.name.as_deref(), Some("Crown"));
    assert_eq!(crown.children.len(), 2);

    let band = crown.children[0].mesh().expect("band is a mesh");
    assert_eq!(band.primitives.len(), 2);
    assert_eq!(band.primitives[0].material.name, "Gold");
    assert_eq!(band.primitives[1].material.name, "Velvet");
    assert!(band.primitives.iter().all(|p| !p.material.double_sided));

    let cross_node = &crown.children[1];
    assert_eq!(cross_node.name.as_deref(), Some("Cross"));
    let position = cross_node.transform.position;
    assert_close(position.x, 0.0);
    assert_close(position.y, CROWN_HEIGHT / 2.0 + CROSS_HEIGHT / 2.0 + 0.55);
    assert_close(position.z, 1.8);
    assert!(position.magnitude() > CROWN_OUTER_RADIUS);

    let cross = &cross_node.mesh().expect("cross is a mesh").primitives[0];
    // A flat cross must be visible from behind too.
    assert!(cross.material.double_sided);
    assert_eq!(cross.material.base_color_factor, band.primitives[0].material.base_color_factor);
}

#[test]
fn every_crown_resource_is_released_once() {
    let crown = procedural::crown();
    let report = crown.dispose_resources();
    assert_eq!(report.geometries, 3);
    assert_eq!(report.materials, 3);
    assert_eq!(report.textures, 0);
    assert_eq!(crown.dispose_resources().geometries, 0);
}
