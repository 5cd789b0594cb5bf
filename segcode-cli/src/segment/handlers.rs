use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use segcode::core::models::AnalysisContext;
use segcode::core::utils::is_gzipped;
use segcode::io::BedWrite;
use segcode::segment::CodeAssigner;

use crate::run::handlers::load_config;
use crate::segment::cli::DEFAULT_OUT;

pub fn run_segment(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let default_out = DEFAULT_OUT.to_string();
    let output = matches.get_one::<String>("output").unwrap_or(&default_out);

    let mut ctx = AnalysisContext::try_from(&config).context("Failed to load analysis inputs")?;
    let summary = CodeAssigner::segment_context(&mut ctx)?;
    log::info!(
        "{} segments ({} long) on {} chromosomes",
        summary.segments,
        summary.long_segments,
        summary.chromosomes
    );

    let set = ctx
        .segments
        .as_ref()
        .context("Segmentation produced no segment set")?;
    let path = Path::new(output);
    if is_gzipped(path) {
        set.write_bed_gz(path)?;
    } else {
        set.write_bed(path)?;
    }
    Ok(())
}
