mod fai;
mod run;
mod segment;

use anyhow::Result;
use clap::{ArgAction, ArgMatches, Command, arg};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "segcode";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Combinatorial segmentation of genomic peak sets, with feature scoring and segment statistics.")
        .subcommand_required(true)
        .arg(
            arg!(-v --verbose "Log more; repeat for debug and trace output")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(run::cli::create_run_cli())
        .subcommand(segment::cli::create_segment_cli())
        .subcommand(fai::cli::create_fai_cli())
}

fn init_logging(matches: &ArgMatches) {
    let level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_logging(&matches);

    match matches.subcommand() {
        //
        // FULL ANALYSIS
        //
        Some((run::cli::RUN_CMD, matches)) => {
            run::handlers::run_analysis(matches)?;
        }

        //
        // SEGMENTATION ONLY
        //
        Some((segment::cli::SEGMENT_CMD, matches)) => {
            segment::handlers::run_segment(matches)?;
        }

        //
        // FASTA INDEX
        //
        Some((fai::cli::FAI_CMD, matches)) => {
            fai::handlers::run_fai(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
