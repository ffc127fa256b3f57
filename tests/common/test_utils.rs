use std::{io::Cursor, sync::Mutex};

use glb_viewer::{
    SceneRenderer,
    camera::PerspectiveCamera,
    data_structures::scene_graph::{NodeKind, Scene},
};

/// Logger that keeps every record so tests can assert on what was reported.
struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

pub fn init_logger() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

/// Whether a record at `level` containing `needle` was logged by any test in this binary.
pub fn logged(level: log::Level, needle: &str) -> bool {
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .any(|(l, message)| *l == level && message.contains(needle))
}

/// What a [`CountingRenderer`] saw in one render call.
#[derive(Clone, Debug)]
pub struct RenderCall {
    pub root_nodes: usize,
    pub meshes: usize,
    pub camera: PerspectiveCamera,
}

/// Renderer double that records every call instead of touching the GPU.
#[derive(Default)]
pub struct CountingRenderer {
    pub calls: Vec<RenderCall>,
}

impl SceneRenderer for CountingRenderer {
    type Error = std::convert::Infallible;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<(), Self::Error> {
        let mut meshes = 0;
        scene.traverse(&mut |node| {
            if matches!(node.kind, NodeKind::Mesh(_)) {
                meshes += 1;
            }
        });
        self.calls.push(RenderCall {
            root_nodes: scene.children().len(),
            meshes,
            camera: camera.clone(),
        });
        Ok(())
    }
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

/// A 1x1 PNG of a single colour.
pub fn png_pixel(rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub const TRIANGLE_PIXEL: [u8; 4] = [0, 255, 0, 255];

/// JSON and binary parts of a small glTF asset.
///
/// The scene has two roots: `Parent` (translated by (1, 2, 3)) holding `Child`
/// (scaled by 2), and `Twin`. Both `Child` and `Twin` reference the same triangle
/// mesh, which has positions, texture coordinates and indices but no normals. Its
/// material is red, double sided and textured with a green pixel.
pub struct TriangleAsset {
    pub json: String,
    pub bin: Vec<u8>,
    pub png: Vec<u8>,
}

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

/// Builds the triangle asset. `buffer_uri` and `image_uri` make the buffer or the
/// image external; otherwise they refer to the GLB binary chunk.
pub fn triangle_asset(buffer_uri: Option<&str>, image_uri: Option<&str>) -> TriangleAsset {
    let png = png_pixel(TRIANGLE_PIXEL);

    let mut bin = Vec::new();
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    for value in [0.0f32, 1.0, 1.0, 1.0, 0.0, 0.0] {
        bin.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bin.extend_from_slice(&index.to_le_bytes());
    }
    pad_to_four(&mut bin, 0);
    let image_offset = bin.len();
    if image_uri.is_none() {
        bin.extend_from_slice(&png);
        pad_to_four(&mut bin, 0);
    }

    let buffer = match buffer_uri {
        Some(uri) => format!(r#"{{"byteLength":{},"uri":"{uri}"}}"#, bin.len()),
        None => format!(r#"{{"byteLength":{}}}"#, bin.len()),
    };
    let (image_view, image) = match image_uri {
        Some(uri) => (String::new(), format!(r#"{{"uri":"{uri}","mimeType":"image/png"}}"#)),
        None => (
            format!(
                r#",{{"buffer":0,"byteOffset":{image_offset},"byteLength":{}}}"#,
                png.len()
            ),
            r#"{"bufferView":3,"mimeType":"image/png"}"#.to_string(),
        ),
    };

    let json = format!(
        r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"name": "Scene", "nodes": [0, 2]}}],
  "nodes": [
    {{"name": "Parent", "translation": [1.0, 2.0, 3.0], "children": [1]}},
    {{"name": "Child", "mesh": 0, "scale": [2.0, 2.0, 2.0]}},
    {{"name": "Twin", "mesh": 0}}
  ],
  "meshes": [{{"name": "Triangle", "primitives": [{{"attributes": {{"POSITION": 0, "TEXCOORD_0": 1}}, "indices": 2, "material": 0}}]}}],
  "materials": [{{"name": "Red", "doubleSided": true, "pbrMetallicRoughness": {{"baseColorFactor": [1.0, 0.0, 0.0, 1.0], "baseColorTexture": {{"index": 0}}}}}}],
  "textures": [{{"source": 0}}],
  "images": [{image}],
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}},
    {{"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2"}},
    {{"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}}
  ],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 24, "target": 34962}},
    {{"buffer": 0, "byteOffset": 60, "byteLength": 6, "target": 34963}}{image_view}
  ],
  "buffers": [{buffer}]
}}"#
    );

    TriangleAsset { json, bin, png }
}

/// Packs JSON and binary chunk into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    pad_to_four(&mut json, b' ');
    let mut bin = bin.to_vec();
    pad_to_four(&mut bin, 0);

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}

/// The triangle asset as a self-contained GLB.
pub fn triangle_glb() -> Vec<u8> {
    let asset = triangle_asset(None, None);
    glb(&asset.json, &asset.bin)
}

/// The triangle asset as a single `.gltf` document with its buffer and image
/// embedded as base64 data URIs.
pub fn inline_triangle_gltf() -> String {
    use base64::Engine as _;

    let engine = base64::engine::general_purpose::STANDARD;
    let asset = triangle_asset(Some("triangle.bin"), Some("pixel.png"));
    asset
        .json
        .replace(
            "\"triangle.bin\"",
            &format!("\"data:application/octet-stream;base64,{}\"", engine.encode(&asset.bin)),
        )
        .replace("\"pixel.png\"", &format!("\"data:image/png;base64,{}\"", engine.encode(&asset.png)))
}
