use clap::{Command, arg};

pub const SEGMENT_CMD: &str = "segment";
pub const DEFAULT_OUT: &str = "segments.bed";

pub fn create_segment_cli() -> Command {
    Command::new(SEGMENT_CMD)
        .about("Segment the reference datasets and write the segments as BED (chr, start, end, code).")
        .arg(arg!(--config <config> "Analysis configuration (.toml or .yaml)").required(true))
        .arg(arg!(--output <output> "Output BED file; .gz compresses"))
        .arg(
            arg!(--"min-length" <length> "Override the minimum segment length")
                .value_parser(clap::value_parser!(u32)),
        )
}
