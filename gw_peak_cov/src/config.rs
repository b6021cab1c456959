use std::path::{Path, PathBuf};

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
pub struct Config {
    peaks_gff: PathBuf,
    bam_file: PathBuf,
    out_prefix: String,
    range: usize,
    individual_plots: bool,
    properly_paired: bool,
    threads: usize,
}

impl Config {
    pub fn new(
        peaks_gff: PathBuf,
        bam_file: PathBuf,
        out_prefix: String,
        range: usize,
        individual_plots: bool,
        properly_paired: bool,
        threads: usize,
    ) -> Self {
        Self {
            peaks_gff,
            bam_file,
            out_prefix,
            range,
            individual_plots,
            properly_paired,
            threads,
        }
    }

    pub fn peaks_gff(&self) -> &Path {
        &self.peaks_gff
    }

    pub fn bam_file(&self) -> &Path {
        &self.bam_file
    }

    pub fn out_prefix(&self) -> &str {
        &self.out_prefix
    }

    pub fn range(&self) -> usize {
        self.range
    }

    pub fn individual_plots(&self) -> bool {
        self.individual_plots
    }

    pub fn properly_paired(&self) -> bool {
        self.properly_paired
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}
