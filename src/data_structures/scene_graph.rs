//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] is an ordered list of root [`Node`]s. Each node carries a local
//! [`Transform`], an optional payload (mesh or light) and its children. World
//! transforms are not cached: [`Scene::visit_world`] accumulates them while walking
//! the tree, which is all a static viewer needs.

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{
    light::{AmbientLight, DirectionalLight},
    model::Mesh,
    transform::Transform,
};

#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    AmbientLight(AmbientLight),
    DirectionalLight(DirectionalLight),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            kind,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn traverse<'a>(&'a self, visitor: &mut dyn FnMut(&'a Node)) {
        visitor(self);
        for child in &self.children {
            child.traverse(visitor);
        }
    }

    fn visit_world<'a>(&'a self, parent: &Matrix4<f32>, visitor: &mut dyn FnMut(&'a Node, Matrix4<f32>)) {
        let world = parent * self.transform.to_matrix();
        visitor(self, world);
        for child in &self.children {
            child.visit_world(&world, visitor);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Disposes every geometry, material and texture referenced by this subtree.
    pub fn dispose_resources(&self) -> DisposalReport {
        let mut report = DisposalReport::default();
        self.traverse(&mut |node| {
            if let Some(mesh) = node.mesh() {
                for primitive in &mesh.primitives {
                    report.geometries += primitive.geometry.dispose() as usize;
                    for texture in primitive.material.textures() {
                        report.textures += texture.dispose() as usize;
                    }
                    report.materials += primitive.material.dispose() as usize;
                }
            }
        });
        report
    }
}

/// How many resources a disposal pass released. Shared resources count once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisposalReport {
    pub geometries: usize,
    pub materials: usize,
    pub textures: usize,
}

impl std::ops::AddAssign for DisposalReport {
    fn add_assign(&mut self, rhs: Self) {
        self.geometries += rhs.geometries;
        self.materials += rhs.materials;
        self.textures += rhs.textures;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    children: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` as a root and returns its index.
    pub fn add(&mut self, node: Node) -> usize {
        self.children.push(node);
        self.children.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Node> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn traverse<'a>(&'a self, visitor: &mut dyn FnMut(&'a Node)) {
        for child in &self.children {
            child.traverse(visitor);
        }
    }

    /// Pre-order walk passing each node's world matrix.
    pub fn visit_world<'a>(&'a self, visitor: &mut dyn FnMut(&'a Node, Matrix4<f32>)) {
        let identity = Matrix4::identity();
        for child in &self.children {
            child.visit_world(&identity, visitor);
        }
    }

    /// Disposes the GPU resources of every node in the scene. Nodes stay in place.
    pub fn dispose_resources(&self) -> DisposalReport {
        let mut report = DisposalReport::default();
        for child in &self.children {
            report += child.dispose_resources();
        }
        report
    }

    /// Detaches every root node. Returns how many were removed.
    pub fn remove_objects(&mut self) -> usize {
        let mut removed = 0;
        while self.remove(0).is_some() {
            removed += 1;
        }
        removed
    }
}
