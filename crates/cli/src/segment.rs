use std::{fs::File, io::BufWriter, io::Write};

use anyhow::Context;
use dentscan::{segment_archive, ConcatSegmenter, StlDecoder};

use crate::args;

pub fn segment_command(args: args::SegmentArgs) -> anyhow::Result<()> {
    let bytes = crate::read_archive(&args.archive)?;
    let mesh = segment_archive(&bytes, &StlDecoder, &ConcatSegmenter)
        .context("error during segmentation")?;

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut w = BufWriter::new(file);
    dentscan_stl::write_stl(&mesh, &mut w)?;
    w.flush()?;

    log::info!("wrote {}", args.output.display());
    println!("Segmentation completed successfully.");
    Ok(())
}
