use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// ZIP archive holding the scans.
    pub archive: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct SegmentArgs {
    /// ZIP archive holding the scans.
    pub archive: PathBuf,

    /// Output path for the segmented STL file.
    #[arg(short, long, default_value = "segmented.stl")]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ImagesArgs {
    /// ZIP archive holding the scans.
    pub archive: PathBuf,

    /// Directory the photographs are written to.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ResultsArgs {
    /// Directory holding segmentation result images.
    pub dir: PathBuf,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Pair and decode the scans of an archive and report what was found.
    Inspect(InspectArgs),
    /// Merge the first two meshes of an archive into one STL file.
    Segment(SegmentArgs),
    /// Extract the reference photographs of an archive.
    Images(ImagesArgs),
    /// List the images in a segmentation results directory.
    Results(ResultsArgs),
}
