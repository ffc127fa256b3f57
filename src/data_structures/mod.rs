//! Viewer data structures: scene graph, meshes, materials, textures and lights.
//!
//! - `scene_graph` holds the node hierarchy and the disposal traversal
//! - `model` contains geometry, material and mesh definitions
//! - `texture` wraps decoded images and their GPU textures
//! - `light` defines the ambient and directional lights and their uniform
//! - `transform` holds local TRS transforms and per-draw instance data

pub mod light;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
