use std::path::{Path, PathBuf};

/// Where the reference sequence comes from: a single (possibly gzipped)
/// genome FASTA, or a directory of per chromosome files
pub enum SeqSource {
    Fasta(PathBuf),
    ChrDir(PathBuf),
}

/// Config
///
/// Configuration info for the program
/// This is generated from the command line arguments
/// Once set it is read only
///
pub struct Config {
    bed_file: PathBuf,
    source: SeqSource,
}

impl Config {
    pub fn new(bed_file: PathBuf, source: SeqSource) -> Self {
        Self { bed_file, source }
    }

    pub fn bed_file(&self) -> &Path {
        &self.bed_file
    }

    pub fn source(&self) -> &SeqSource {
        &self.source
    }
}
