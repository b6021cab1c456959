use std::path::PathBuf;

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
            Arg::new("diff_file")
                .short('d')
                .long("diff")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("Limit to significantly differentially expressed genes"),
        )
        .arg(
            Arg::new("gtf_file")
                .short('g')
                .long("gtf")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .help("GTF file of genes to display"),
        )
        .arg(
            Arg::new("min_fpkm")
                .short('m')
                .long("min-fpkm")
                .value_parser(value_parser!(f64))
                .value_name("FLOAT")
                .default_value("0.125")
                .help("Set minimum FPKM (pseudocount for logs)"),
        )
        .arg(
            Arg::new("out_pdf")
                .short('o')
                .long("out-pdf")
                .value_parser(value_parser!(PathBuf))
                .value_name("PATH")
                .default_value("expr_heat.pdf")
                .help("Set output PDF file"),
        )
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .value_parser(value_parser!(usize))
                .value_name("INT")
                .default_value("1000")
                .help("Sample genes rather than use all"),
        )
        .arg(
            Arg::new("fpkm_tracking")
                .value_parser(value_parser!(PathBuf))
                .value_name("FPKM_TRACKING")
                .required(true)
                .help("Input Cufflinks fpkm_tracking file"),
        )
}

/// Handle command line options.  Set up Config structure
pub fn handle_cli() -> anyhow::Result<Config> {
    // Get matches from command line
    let m = cli_model().get_matches();

    // Setup logging
    init_log(&m);

    debug!("Processing command line options");

    let fpkm_tracking = m
        .get_one::<PathBuf>("fpkm_tracking")
        .expect("Missing fpkm tracking file")
        .clone();

    let out_pdf = m
        .get_one::<PathBuf>("out_pdf")
        .expect("Missing default output PDF")
        .clone();

    let min_fpkm = *m
        .get_one::<f64>("min_fpkm")
        .expect("Missing default minimum FPKM");

    let sample = *m
        .get_one::<usize>("sample")
        .expect("Missing default sample size");

    Ok(Config::new(
        fpkm_tracking,
        m.get_one::<PathBuf>("diff_file").cloned(),
        m.get_one::<PathBuf>("gtf_file").cloned(),
        min_fpkm,
        out_pdf,
        sample,
    ))
}
