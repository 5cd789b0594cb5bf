use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use segcode::seq::{FastaIndex, fai_path};

pub fn run_fai(matches: &ArgMatches) -> Result<()> {
    let fasta = matches
        .get_one::<String>("fasta")
        .context("A path to a FASTA file is required.")?;
    let fasta = Path::new(fasta);

    let index = FastaIndex::build(fasta)
        .with_context(|| format!("Failed to index {}", fasta.display()))?;
    let out = fai_path(fasta);
    index.write(&out)?;
    log::info!("Wrote {} sequences to {}", index.len(), out.display());
    Ok(())
}
