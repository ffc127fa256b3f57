use std::path::PathBuf;

use clap::Parser;
use glb_viewer::{AssetSource, cli::Args};

fn asset(args: &[&str]) -> AssetSource {
    Args::try_parse_from(args.iter().copied()).expect("arguments parse").asset()
}

#[test]
fn no_arguments_open_the_default_model() {
    assert_eq!(asset(&["glb-viewer"]), AssetSource::File(PathBuf::from("crown.glb")));
}

#[test]
fn a_path_opens_that_file() {
    assert_eq!(
        asset(&["glb-viewer", "models/helmet.gltf"]),
        AssetSource::File(PathBuf::from("models/helmet.gltf"))
    );
}

#[test]
fn crown_flag_shows_the_procedural_crown() {
    assert_eq!(asset(&["glb-viewer", "--crown"]), AssetSource::ProceduralCrown);
}

#[test]
fn path_and_crown_conflict() {
    let err = Args::try_parse_from(["glb-viewer", "--crown", "crown.glb"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
}

#[test]
fn extra_positionals_are_rejected() {
    assert!(Args::try_parse_from(["glb-viewer", "a.glb", "b.glb"]).is_err());
}

#[test]
fn help_is_generated() {
    let err = Args::try_parse_from(["glb-viewer", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    assert!(err.to_string().contains("--crown"));
}
