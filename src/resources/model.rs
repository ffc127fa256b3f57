//! glTF 2.0 import.
//!
//! Both `.gltf` (JSON with external buffers and images) and `.glb` (binary container)
//! files are supported. The file's default scene, or its first scene when none is
//! marked as default, becomes a single root group whose children mirror the glTF
//! node hierarchy. Meshes, materials and images referenced more than once share the
//! same `Arc` resource.

use std::{
    collections::HashMap,
    path::Path,
    sync::Arc,
};

use anyhow::Context as _;

use crate::{
    data_structures::{
        model::{Geometry, Material, Mesh, ModelVertex, Primitive, compute_normals},
        scene_graph::{Node, NodeKind},
        texture::Texture,
    },
    resources::{decode_data_uri, load_binary, load_uri},
};

/// Loads a `.gltf` or `.glb` file together with the buffers and images it references.
pub async fn load_model_gltf(path: &Path) -> anyhow::Result<Node> {
    let bytes = load_binary(path).await?;
    let gltf = gltf::Gltf::from_slice(&bytes)
        .with_context(|| format!("Could not parse {}", path.display()))?;
    let base = path.parent();

    let blob = gltf.blob.as_deref();
    let buffers = futures::future::try_join_all(gltf.buffers().map(|buffer| async move {
        match buffer.source() {
            gltf::buffer::Source::Bin => Ok(glb_blob(blob)?.to_vec()),
            gltf::buffer::Source::Uri(uri) => load_uri(base, uri)
                .await
                .with_context(|| format!("Buffer {} of {}", buffer.index(), path.display())),
        }
    }))
    .await?;

    // A missing or broken image only costs the material its texture.
    let uri_images: HashMap<usize, Vec<u8>> =
        futures::future::join_all(gltf.images().filter_map(|image| match image.source() {
            gltf::image::Source::Uri { uri, .. } => Some(async move {
                match load_uri(base, uri).await {
                    Ok(data) => Some((image.index(), data)),
                    Err(e) => {
                        log::warn!("Skipping image {} of {}: {e:#}", image.index(), path.display());
                        None
                    }
                }
            }),
            gltf::image::Source::View { .. } => None,
        }))
        .await
        .into_iter()
        .flatten()
        .collect();

    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let root = Importer::new(&gltf.document, &buffers, &uri_images, &label).import()?;
    log::info!("Loaded {} ({} nodes)", path.display(), root.count());
    Ok(root)
}

/// Converts a self-contained glTF held in memory: a binary GLB, or JSON whose buffers
/// and images are all embedded as data URIs.
pub fn parse_glb(bytes: &[u8]) -> anyhow::Result<Node> {
    let gltf = gltf::Gltf::from_slice(bytes).context("Could not parse GLB data")?;
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => buffers.push(glb_blob(gltf.blob.as_deref())?.to_vec()),
            gltf::buffer::Source::Uri(uri) => match decode_data_uri(uri) {
                Some(data) => buffers.push(data.with_context(|| format!("Buffer {}", buffer.index()))?),
                None => anyhow::bail!(
                    "Buffer {} references {uri}, external files can only be resolved when loading from a path",
                    buffer.index()
                ),
            },
        }
    }

    let mut embedded_images = HashMap::new();
    for image in gltf.images() {
        let gltf::image::Source::Uri { uri, .. } = image.source() else {
            continue;
        };
        match decode_data_uri(uri) {
            Some(Ok(data)) => {
                embedded_images.insert(image.index(), data);
            }
            Some(Err(e)) => log::warn!("Skipping image {}: {e:#}", image.index()),
            None => log::warn!("Skipping image {}, {uri} needs a path to resolve against", image.index()),
        }
    }
    Importer::new(&gltf.document, &buffers, &embedded_images, "glb").import()
}

fn glb_blob(blob: Option<&[u8]>) -> anyhow::Result<&[u8]> {
    blob.context("Buffer refers to the GLB binary chunk but the file has none")
}

/// Walks a parsed document and builds scene nodes, caching shared resources by index.
struct Importer<'a> {
    document: &'a gltf::Document,
    buffers: &'a [Vec<u8>],
    uri_images: &'a HashMap<usize, Vec<u8>>,
    label: &'a str,
    textures: HashMap<usize, Option<Arc<Texture>>>,
    materials: HashMap<Option<usize>, Arc<Material>>,
    meshes: HashMap<usize, Mesh>,
}

impl<'a> Importer<'a> {
    fn new(
        document: &'a gltf::Document,
        buffers: &'a [Vec<u8>],
        uri_images: &'a HashMap<usize, Vec<u8>>,
        label: &'a str,
    ) -> Self {
        Self {
            document,
            buffers,
            uri_images,
            label,
            textures: HashMap::new(),
            materials: HashMap::new(),
            meshes: HashMap::new(),
        }
    }

    fn import(mut self) -> anyhow::Result<Node> {
        let scene = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())
            .context("glTF file contains no scene")?;

        let mut root = Node::group().with_name(scene.name().unwrap_or(self.label));
        for node in scene.nodes() {
            let child = self.node(node);
            root.add_child(child);
        }
        Ok(root)
    }

    fn node(&mut self, node: gltf::Node) -> Node {
        let kind = match node.mesh() {
            Some(mesh) => NodeKind::Mesh(self.mesh(mesh)),
            None => NodeKind::Group,
        };
        let mut result = Node::new(kind).with_transform(node.transform().into());
        result.name = node.name().map(str::to_owned);
        for child in node.children() {
            let child = self.node(child);
            result.add_child(child);
        }
        result
    }

    fn mesh(&mut self, mesh: gltf::Mesh) -> Mesh {
        if let Some(cached) = self.meshes.get(&mesh.index()) {
            return cached.clone();
        }
        let name = mesh
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{} mesh {}", self.label, mesh.index()));
        let primitives = mesh
            .primitives()
            .filter_map(|primitive| self.primitive(&name, primitive))
            .collect();
        let result = Mesh { name, primitives };
        self.meshes.insert(mesh.index(), result.clone());
        result
    }

    fn primitive(&mut self, mesh_name: &str, primitive: gltf::Primitive) -> Option<Primitive> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping primitive {} of {mesh_name}: mode {:?} is not a triangle list",
                primitive.index(),
                primitive.mode()
            );
            return None;
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
        let Some(positions) = reader.read_positions() else {
            log::warn!("Skipping primitive {} of {mesh_name}: no positions", primitive.index());
            return None;
        };
        let mut vertices: Vec<ModelVertex> = positions
            .map(|position| ModelVertex {
                position,
                ..Default::default()
            })
            .collect();
        if let Some(tex_coords) = reader.read_tex_coords(0) {
            for (vertex, uv) in vertices.iter_mut().zip(tex_coords.into_f32()) {
                vertex.tex_coords = uv;
            }
        }
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        match reader.read_normals() {
            Some(normals) => {
                for (vertex, normal) in vertices.iter_mut().zip(normals) {
                    vertex.normal = normal;
                }
            }
            None => compute_normals(&mut vertices, &indices),
        }

        let label = format!("{mesh_name} primitive {}", primitive.index());
        let geometry = Arc::new(Geometry::new(label, vertices, indices));
        let material = self.material(primitive.material());
        Some(Primitive { geometry, material })
    }

    fn material(&mut self, material: gltf::Material) -> Arc<Material> {
        if let Some(cached) = self.materials.get(&material.index()) {
            return cached.clone();
        }
        let name = match (material.name(), material.index()) {
            (Some(name), _) => name.to_owned(),
            (None, Some(index)) => format!("{} material {index}", self.label),
            (None, None) => "default material".to_owned(),
        };
        let pbr = material.pbr_metallic_roughness();
        let mut result = Material::new(name, pbr.base_color_factor()).with_double_sided(material.double_sided());
        if let Some(info) = pbr.base_color_texture() {
            if info.tex_coord() != 0 {
                log::warn!("{}: only TEXCOORD_0 is supported, texture set {} is sampled with it", result.name, info.tex_coord());
            }
            if let Some(texture) = self.texture(info.texture().source()) {
                result = result.with_texture(texture);
            }
        }
        let result = Arc::new(result);
        self.materials.insert(material.index(), result.clone());
        result
    }

    fn texture(&mut self, image: gltf::Image) -> Option<Arc<Texture>> {
        if let Some(cached) = self.textures.get(&image.index()) {
            return cached.clone();
        }
        let label = image
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{} image {}", self.label, image.index()));
        let (bytes, mime_type) = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let bytes = self
                    .buffers
                    .get(view.buffer().index())
                    .and_then(|buffer| buffer.get(start..start + view.length()));
                (bytes, Some(mime_type))
            }
            gltf::image::Source::Uri { mime_type, .. } => (
                self.uri_images.get(&image.index()).map(Vec::as_slice),
                mime_type,
            ),
        };
        // Base colour textures hold sRGB data.
        let texture = match bytes {
            Some(bytes) => match Texture::decode(&label, bytes, mime_type, true) {
                Ok(texture) => Some(Arc::new(texture)),
                Err(e) => {
                    log::warn!("{e:#}");
                    None
                }
            },
            None => {
                log::warn!("Image data for {label} is not available");
                None
            }
        };
        self.textures.insert(image.index(), texture.clone());
        texture
    }
}
