//! Asset loading.
//!
//! Everything here produces CPU-side scene nodes. Nothing touches the GPU: buffers
//! and textures are uploaded by the renderer the first time they are drawn, which
//! lets loading run on a background task.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use base64::Engine as _;

use crate::{config::AssetSource, data_structures::scene_graph::Node};

pub mod model;
pub mod procedural;

pub use model::{load_model_gltf, parse_glb};

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("No window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("Could not read the page origin"))?;
    let base = reqwest::Url::parse(&format!("{origin}/"))?;
    Ok(base.join(file_name)?)
}

/// Reads a whole file. On the web `path` is resolved against the page origin and fetched.
pub async fn load_binary(path: &Path) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(&path.to_string_lossy())?;
        reqwest::get(url.clone())
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("Could not fetch {url}"))?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;

    Ok(data)
}

/// Loads the bytes behind a URI found inside a glTF file. `data:` URIs are decoded in
/// place, anything else is a path relative to the file's directory.
pub(crate) async fn load_uri(base: Option<&Path>, uri: &str) -> anyhow::Result<Vec<u8>> {
    if let Some(data) = decode_data_uri(uri) {
        return data;
    }
    let path = match base {
        Some(base) => base.join(uri),
        None => PathBuf::from(uri),
    };
    load_binary(&path).await
}

/// Decodes a `data:[<media type>][;base64],<payload>` URI, or returns `None` when
/// `uri` is not a data URI.
pub fn decode_data_uri(uri: &str) -> Option<anyhow::Result<Vec<u8>>> {
    let rest = uri.strip_prefix("data:")?;
    let Some((header, payload)) = rest.split_once(',') else {
        return Some(Err(anyhow::anyhow!("Data URI has no payload")));
    };
    Some(if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .with_context(|| format!("Malformed base64 payload in data URI of type {header}"))
    } else {
        Ok(payload.as_bytes().to_vec())
    })
}

/// Produces the root node for `source`.
pub async fn load_asset(source: &AssetSource) -> anyhow::Result<Node> {
    match source {
        AssetSource::File(path) => load_model_gltf(path).await,
        AssetSource::ProceduralCrown => Ok(procedural::crown()),
    }
}

