use std::{env, path::PathBuf};

use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, Command,
};

use utils::{init_log, LogLevel};

use crate::config::Config;

/// Name of the RepeatMasker GFF expected under the MASK directory
const MASK_GFF: &str = "hg19.fa.out.tp.gff";

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
            Arg::new("gene_key")
                .short('k')
                .long("gene-key")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("gene_id")
                .help("Set attribute key identifying the gene"),
        )
        .arg(
            Arg::new("nt")
                .short('n')
                .long("nt")
                .action(ArgAction::SetTrue)
                .help("Accumulate nucleotide overlap totals instead of presence sets"),
        )
        .arg(
            Arg::new("stranded")
                .short('s')
                .long("stranded")
                .action(ArgAction::SetTrue)
                .conflicts_with("nt")
                .help("Record relative orientation of gene and repeat"),
        )
        .arg(
            Arg::new("no_star")
                .long("no-star")
                .action(ArgAction::SetTrue)
                .help("Suppress the aggregate * entries per family and overall"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output-file")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Set output file [default: <stdout>]"),
        )
        .arg(
            Arg::new("gtf_file")
                .value_parser(value_parser!(PathBuf))
                .value_name("GTF_FILE")
                .required(true)
                .help("Input GTF file with gene annotations"),
        )
        .arg(
            Arg::new("repeats_gff")
                .value_parser(value_parser!(PathBuf))
                .value_name("REPEATS_GFF")
                .help("Input GFF file with repeat annotations [default: $MASK/hg19.fa.out.tp.gff]"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let gtf_file = m
        .get_one::<PathBuf>("gtf_file")
        .expect("Missing GTF file")
        .clone();

    let repeats_gff = match m.get_one::<PathBuf>("repeats_gff") {
        Some(p) => p.clone(),
        None => env::var_os("MASK")
            .map(|d| PathBuf::from(d).join(MASK_GFF))
            .ok_or_else(|| {
                anyhow!("No repeats GFF given and the MASK environment variable is not set")
            })?,
    };
    debug!("Using repeat annotations from {}", repeats_gff.display());

    let gene_key = m
        .get_one::<String>("gene_key")
        .expect("Missing default gene key")
        .clone();

    let output = m.get_one::<PathBuf>("output").map(|s| s.to_owned());

    Ok(Config::new(
        gtf_file,
        repeats_gff,
        gene_key,
        m.get_flag("nt"),
        m.get_flag("stranded"),
        !m.get_flag("no_star"),
        output,
    ))
}
