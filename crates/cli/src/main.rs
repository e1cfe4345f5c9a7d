use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;

mod args;
mod images;
mod inspect;
mod segment;

use args::{Args, Commands};

/// Reads an uploaded archive. Only `.zip` files are accepted.
fn read_archive(path: &Path) -> anyhow::Result<Vec<u8>> {
    let is_zip = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !is_zip {
        bail!(
            "{} is not a .zip file; please select a .zip file containing .stl files",
            path.display()
        );
    }
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Inspect(args) => inspect::inspect_command(args),
        Commands::Segment(args) => segment::segment_command(args),
        Commands::Images(args) => images::images_command(args),
        Commands::Results(args) => images::results_command(args),
    }
}
