use std::{env, path::PathBuf};

use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, Command,
};

use utils::{init_log, LogLevel};

use crate::config::{Config, SeqSource};

/// Default genome FASTA location under the home directory
const DEFAULT_FASTA: &str = "research/common/data/genomes/hg19/sequence/hg19.fa";

/// Set up definition of command options for clap
fn cli_model() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("warn")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("chr_dir")
                .short('c')
                .long("chr-dir")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .conflicts_with("fasta_file")
                .help("Directory of chromosome FASTA files named after the first BED column"),
        )
        .arg(
            Arg::new("fasta_file")
                .short('f')
                .long("fasta")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Genome FASTA file [default: $HOME/research/common/data/genomes/hg19/sequence/hg19.fa]"),
        )
        .arg(
            Arg::new("bed_file")
                .value_parser(value_parser!(PathBuf))
                .value_name("BED_FILE")
                .required(true)
                .help("Input BED file with intervals to extract"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let bed_file = m
        .get_one::<PathBuf>("bed_file")
        .expect("Missing BED file")
        .clone();

    let source = if let Some(d) = m.get_one::<PathBuf>("chr_dir") {
        SeqSource::ChrDir(d.clone())
    } else if let Some(f) = m.get_one::<PathBuf>("fasta_file") {
        SeqSource::Fasta(f.clone())
    } else {
        let home = env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("No FASTA source given and HOME is not set"))?;
        SeqSource::Fasta(home.join(DEFAULT_FASTA))
    };

    Ok(Config::new(bed_file, source))
}
