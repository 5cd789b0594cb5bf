use std::fs::File;
use std::io::{BufWriter, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;

use segcode::core::config::AnalysisConfig;
use segcode::core::models::AnalysisContext;
use segcode::engine::{Engine, Request};
use segcode::io::{JsonLinesSink, ResultPublisher};
use segcode::stats::FateOfCodeParameter;

/// Apply command line overrides on top of the configuration file.
pub fn load_config(matches: &ArgMatches) -> Result<AnalysisConfig> {
    let path = matches
        .get_one::<String>("config")
        .context("A path to an analysis configuration is required.")?;

    let mut config = AnalysisConfig::try_from(Path::new(path))
        .with_context(|| format!("Failed to read configuration {}", path))?;

    if let Some(threads) = matches.try_get_one::<usize>("threads").ok().flatten() {
        config.threads = Some(*threads);
    }
    if let Some(length) = matches.try_get_one::<u32>("min-length").ok().flatten() {
        config.min_segment_length = *length;
    }
    Ok(config)
}

fn read_fate(path: &str) -> Result<FateOfCodeParameter> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Invalid fate-of-code parameters in {}", path))
}

pub fn run_analysis(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;
    let fate = matches
        .get_one::<String>("fate")
        .map(|p| read_fate(p))
        .transpose()?;

    let publisher = match matches.get_one::<String>("output") {
        Some(output) => {
            let file = File::create(output)
                .with_context(|| format!("Failed to create {}", output))?;
            ResultPublisher::new(JsonLinesSink::new(BufWriter::new(file)))
        }
        None => ResultPublisher::new(JsonLinesSink::new(stdout())),
    };

    let ctx = AnalysisContext::try_from(&config).context("Failed to load analysis inputs")?;
    let mut engine = Engine::new(ctx, publisher)?.with_progress(matches.get_flag("progress"));

    engine.handle(Request::All)?;

    if let Some(param) = fate {
        engine.handle(Request::FateOfCode(param))?;
    }

    if let Some(path) = matches.get_one::<String>("export") {
        engine.handle(Request::Export {
            path: PathBuf::from(path),
        })?;
    }

    Ok(())
}
