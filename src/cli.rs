//! Command line arguments of the `glb-viewer` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AssetSource;

/// View a single glTF/GLB model with an orbit camera.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Model to open, `crown.glb` in the working directory when omitted.
    pub path: Option<PathBuf>,

    /// Show the built-in crown instead of loading a file.
    #[arg(long, conflicts_with = "path")]
    pub crown: bool,
}

impl Args {
    pub fn asset(&self) -> AssetSource {
        match (&self.path, self.crown) {
            (_, true) => AssetSource::ProceduralCrown,
            (Some(path), false) => AssetSource::File(path.clone()),
            (None, false) => AssetSource::default(),
        }
    }
}
