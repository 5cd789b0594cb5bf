use clap::{ArgAction, Command, arg};

pub const RUN_CMD: &str = "run";

pub fn create_run_cli() -> Command {
    Command::new(RUN_CMD)
        .about("Segment, score and compute every statistic for an analysis configuration.")
        .arg(arg!(--config <config> "Analysis configuration (.toml or .yaml)").required(true))
        .arg(arg!(--output <output> "Write results as JSON lines here instead of stdout"))
        .arg(
            arg!(--threads <threads> "Worker threads")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"min-length" <length> "Override the minimum segment length")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(arg!(--export <path> "Also write the segment table (.gz compresses)"))
        .arg(arg!(--fate <path> "JSON fate-of-code parameters to evaluate after scoring"))
        .arg(
            arg!(--progress "Show scoring progress")
                .action(ArgAction::SetTrue),
        )
}
