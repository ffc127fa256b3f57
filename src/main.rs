use clap::Parser;
use glb_viewer::{ViewerConfig, cli::Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    glb_viewer::run(ViewerConfig::default().with_asset(args.asset()))
}
