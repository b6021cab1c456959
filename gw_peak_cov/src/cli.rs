use std::{num::NonZeroUsize, path::PathBuf};

use clap::{
    crate_description, crate_name, crate_version, value_parser, Arg, ArgAction, Command,
};

use utils::{init_log, LogLevel};

use crate::config::Config;

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
            Arg::new("individual_plots")
                .short('i')
                .long("individual-plots")
                .action(ArgAction::SetTrue)
                .help("Write a coverage profile for every individual peak"),
        )
        .arg(
            Arg::new("out_prefix")
                .short('o')
                .long("out-prefix")
                .value_parser(value_parser!(String))
                .value_name("STRING")
                .default_value("peak_cov")
                .help("Set prefix for output file names"),
        )
        .arg(
            Arg::new("properly_paired")
                .short('p')
                .long("properly-paired")
                .action(ArgAction::SetTrue)
                .help("Count fragments only for properly paired reads"),
        )
        .arg(
            Arg::new("range")
                .short('u')
                .long("range")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .default_value("300")
                .help("Set range around peak middle"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_parser(value_parser!(NonZeroUsize))
                .value_name("INT")
                .help("Set number of BAM decompression threads [default: available cores]"),
        )
        .arg(
            Arg::new("peaks_gff")
                .value_parser(value_parser!(PathBuf))
                .value_name("GFF_FILE")
                .required(true)
                .help("Input GFF file with peak intervals"),
        )
        .arg(
            Arg::new("bam_file")
                .value_parser(value_parser!(PathBuf))
                .value_name("BAM_FILE")
                .required(true)
                .help("Input BAM file with aligned reads"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let peaks_gff = m
        .get_one::<PathBuf>("peaks_gff")
        .expect("Missing peaks GFF file")
        .clone();

    let bam_file = m
        .get_one::<PathBuf>("bam_file")
        .expect("Missing BAM file")
        .clone();

    let out_prefix = m
        .get_one::<String>("out_prefix")
        .expect("Missing default output prefix")
        .clone();

    let range = *m.get_one::<usize>("range").expect("Missing default range");

    // Set up threads
    let threads = m
        .get_one::<NonZeroUsize>("threads")
        .map(|x| usize::from(*x))
        .unwrap_or_else(num_cpus::get);

    Ok(Config::new(
        peaks_gff,
        bam_file,
        out_prefix,
        range,
        m.get_flag("individual_plots"),
        m.get_flag("properly_paired"),
        threads,
    ))
}
