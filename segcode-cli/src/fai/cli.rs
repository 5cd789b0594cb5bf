use clap::{Command, arg};

pub const FAI_CMD: &str = "fai";

pub fn create_fai_cli() -> Command {
    Command::new(FAI_CMD)
        .about("Write the samtools .fai index next to a FASTA file.")
        .arg(arg!(--fasta <fasta> "Uncompressed FASTA file").required(true))
}
