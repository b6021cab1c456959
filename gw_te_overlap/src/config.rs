use std::path::{Path, PathBuf};

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
pub struct Config {
    gtf_file: PathBuf,
    repeats_gff: PathBuf,
    gene_key: String,
    nt_mode: bool,
    stranded: bool,
    star: bool,
    output_file: Option<PathBuf>,
}

impl Config {
    pub fn new(
        gtf_file: PathBuf,
        repeats_gff: PathBuf,
        gene_key: String,
        nt_mode: bool,
        stranded: bool,
        star: bool,
        output_file: Option<PathBuf>,
    ) -> Self {
        Self {
            gtf_file,
            repeats_gff,
            gene_key,
            nt_mode,
            stranded,
            star,
            output_file,
        }
    }

    pub fn gtf_file(&self) -> &Path {
        &self.gtf_file
    }

    pub fn repeats_gff(&self) -> &Path {
        &self.repeats_gff
    }

    pub fn gene_key(&self) -> &str {
        &self.gene_key
    }

    pub fn nt_mode(&self) -> bool {
        self.nt_mode
    }

    pub fn stranded(&self) -> bool {
        self.stranded
    }

    pub fn star(&self) -> bool {
        self.star
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }
}
