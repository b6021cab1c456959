mod bam;
mod cli;
mod config;
mod coverage;
mod output;
mod peaks;
mod process;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let cfg = cli::handle_cli().with_context(|| "Error processing command line arguments")?;
    process::process_peaks(&cfg)
}
