//! Procedurally generated crown, used when no model file should be loaded.
//!
//! The crown is a hollow cylinder (gold shell, red lining) with a flat cross
//! standing in front of it.

use std::{f32::consts::TAU, sync::Arc};

use cgmath::Vector3;

use crate::data_structures::{
    model::{Geometry, Material, Mesh, ModelVertex, Primitive},
    scene_graph::{Node, NodeKind},
    transform::Transform,
};

pub const CROWN_OUTER_RADIUS: f32 = 1.2;
pub const CROWN_INNER_RADIUS: f32 = 1.1;
pub const CROWN_HEIGHT: f32 = 1.2;
pub const CROWN_SECTORS: u32 = 36;
pub const CROSS_WIDTH: f32 = 0.4;
pub const CROSS_HEIGHT: f32 = 0.7;
pub const CROSS_THICKNESS: f32 = 0.1;

/// Linear RGB of polished gold.
const GOLD: [f32; 4] = [1.0, 0.766, 0.336, 1.0];
const VELVET: [f32; 4] = [0.45, 0.02, 0.03, 1.0];

/// Geometry of a hollow cylinder centred on the origin along the y axis.
#[derive(Debug)]
pub struct HollowCylinder {
    /// Outer wall plus the top and bottom rings.
    pub shell: Geometry,
    /// Inner wall, facing the axis.
    pub lining: Geometry,
}

/// Appends one band of quads between two rings. `ring` maps the cosine and sine of
/// a sector angle to the (first, second) positions plus the normal. Quads are wound
/// counter-clockwise when seen from the side the normal points to.
fn push_band(
    vertices: &mut Vec<ModelVertex>,
    indices: &mut Vec<u32>,
    sectors: u32,
    ring: impl Fn(f32, f32) -> ([f32; 3], [f32; 3], [f32; 3]),
    v: (f32, f32),
) {
    let base = vertices.len() as u32;
    for i in 0..=sectors {
        let u = i as f32 / sectors as f32;
        let angle = u * TAU;
        let (first, second, normal) = ring(angle.cos(), angle.sin());
        vertices.push(ModelVertex {
            position: first,
            tex_coords: [u, v.0],
            normal,
        });
        vertices.push(ModelVertex {
            position: second,
            tex_coords: [u, v.1],
            normal,
        });
    }
    for i in 0..sectors {
        let current = base + i * 2;
        let next = current + 2;
        indices.extend_from_slice(&[current, next, current + 1, next, next + 1, current + 1]);
    }
}

pub fn hollow_cylinder(outer_radius: f32, inner_radius: f32, height: f32, sectors: u32) -> HollowCylinder {
    let sectors = sectors.max(3);
    let half = height / 2.0;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    // Outer wall: top ring first so the winding faces outwards.
    push_band(
        &mut vertices,
        &mut indices,
        sectors,
        |c, s| {
            (
                [outer_radius * c, half, outer_radius * s],
                [outer_radius * c, -half, outer_radius * s],
                [c, 0.0, s],
            )
        },
        (0.0, 1.0),
    );
    // Top ring.
    push_band(
        &mut vertices,
        &mut indices,
        sectors,
        |c, s| {
            (
                [inner_radius * c, half, inner_radius * s],
                [outer_radius * c, half, outer_radius * s],
                [0.0, 1.0, 0.0],
            )
        },
        (0.0, 1.0),
    );
    // Bottom ring.
    push_band(
        &mut vertices,
        &mut indices,
        sectors,
        |c, s| {
            (
                [outer_radius * c, -half, outer_radius * s],
                [inner_radius * c, -half, inner_radius * s],
                [0.0, -1.0, 0.0],
            )
        },
        (0.0, 1.0),
    );
    let shell = Geometry::new("Crown shell", vertices, indices);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    push_band(
        &mut vertices,
        &mut indices,
        sectors,
        |c, s| {
            (
                [inner_radius * c, -half, inner_radius * s],
                [inner_radius * c, half, inner_radius * s],
                [-c, 0.0, -s],
            )
        },
        (1.0, 0.0),
    );
    let lining = Geometry::new("Crown lining", vertices, indices);

    HollowCylinder { shell, lining }
}

/// A flat cross in the xy plane facing +z. Both bars are `thickness` wide, the
/// vertical one is `height` tall and sits 0.1 below the origin so the crossing lies
/// in its upper half.
pub fn cross(width: f32, height: f32, thickness: f32) -> Geometry {
    let half_width = width / 2.0;
    let half_height = height / 2.0;
    let half_thickness = thickness / 2.0;

    let quad = |x0: f32, y0: f32, x1: f32, y1: f32| {
        [
            ([x0, y0], [0.0, 1.0]),
            ([x1, y0], [1.0, 1.0]),
            ([x1, y1], [1.0, 0.0]),
            ([x0, y1], [0.0, 0.0]),
        ]
    };
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for corners in [
        quad(-half_thickness, -half_height - 0.1, half_thickness, half_height - 0.1),
        quad(-half_width, -half_thickness, half_width, half_thickness),
    ] {
        let base = vertices.len() as u32;
        vertices.extend(corners.iter().map(|&([x, y], tex_coords)| ModelVertex {
            position: [x, y, 0.0],
            tex_coords,
            normal: [0.0, 0.0, 1.0],
        }));
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    Geometry::new("Cross", vertices, indices)
}

/// The complete crown as a single group node.
pub fn crown() -> Node {
    let gold = Arc::new(Material::new("Gold", GOLD));
    let velvet = Arc::new(Material::new("Velvet", VELVET));
    let cross_gold = Arc::new(Material::new("Gold (double sided)", GOLD).with_double_sided(true));

    let cylinder = hollow_cylinder(CROWN_OUTER_RADIUS, CROWN_INNER_RADIUS, CROWN_HEIGHT, CROWN_SECTORS);
    let band = Node::new(NodeKind::Mesh(Mesh {
        name: "Band".to_string(),
        primitives: vec![
            Primitive {
                geometry: Arc::new(cylinder.shell),
                material: gold,
            },
            Primitive {
                geometry: Arc::new(cylinder.lining),
                material: velvet,
            },
        ],
    }))
    .with_name("Band");

    let cross_position = Vector3::new(0.0, CROWN_HEIGHT / 2.0 + CROSS_HEIGHT / 2.0 + 0.55, 1.8);
    let cross_node = Node::new(NodeKind::Mesh(Mesh {
        name: "Cross".to_string(),
        primitives: vec![Primitive {
            geometry: Arc::new(cross(CROSS_WIDTH, CROSS_HEIGHT, CROSS_THICKNESS)),
            material: cross_gold,
        }],
    }))
    .with_name("Cross")
    .with_transform(Transform::from_position(cross_position));

    let mut root = Node::group().with_name("Crown");
    root.add_child(band);
    root.add_child(cross_node);
    root
}
