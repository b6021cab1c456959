use std::{
    collections::HashMap,
    io::{self, BufRead, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::dna::revcomp;

use crate::{
    bed::{self, BedFeature},
    config::{Config, SeqSource},
};

/// Output sequence lines are wrapped at this width
const WRAP: usize = 60;

/// Strategy
///
/// Load the BED features once and group them by chromosome, then stream
/// each FASTA file one sequence at a time, emitting the features of a
/// chromosome as soon as its sequence is complete.  At most one sequence is
/// held in memory.
pub fn process_features(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    let features = bed::read_bed_file(cfg.bed_file())?;
    let mut by_chrom: HashMap<&str, Vec<&BedFeature>> = HashMap::new();
    for f in features.iter() {
        by_chrom.entry(f.chrom.as_str()).or_default().push(f);
    }

    let fasta_files = match cfg.source() {
        SeqSource::Fasta(p) => vec![p.clone()],
        SeqSource::ChrDir(d) => chr_dir_files(d, &by_chrom)?,
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for fname in fasta_files.iter() {
        debug!("Reading sequence from {}", fname.display());
        let mut rdr = CompressIo::new()
            .path(fname)
            .bufreader()
            .with_context(|| format!("Error opening FASTA file {}", fname.display()))?;
        emit_file(&mut rdr, &by_chrom, &mut out)
            .with_context(|| format!("Error processing FASTA file {}", fname.display()))?;
    }
    out.flush().with_context(|| "Error writing FASTA output")
}

/// FASTA files matching the BED chromosomes under the chromosome directory
fn chr_dir_files(
    dir: &Path,
    by_chrom: &HashMap<&str, Vec<&BedFeature>>,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut chroms: Vec<&str> = by_chrom.keys().copied().collect();
    chroms.sort_unstable();

    let mut files = Vec::new();
    for chrom in chroms {
        let pattern = format!("{}/{}*", dir.display(), chrom);
        for entry in
            glob::glob(&pattern).with_context(|| format!("Bad glob pattern {}", pattern))?
        {
            let path = entry.with_context(|| {
                format!("Error reading chromosome directory {}", dir.display())
            })?;
            trace!("Found chromosome file {}", path.display());
            files.push(path);
        }
    }
    if files.is_empty() {
        Err(anyhow!(
            "No chromosome FASTA files found in {}",
            dir.display()
        ))
    } else {
        Ok(files)
    }
}

/// Stream one FASTA file, emitting features for each sequence as it
/// completes
fn emit_file<R: BufRead, W: Write>(
    rdr: &mut R,
    by_chrom: &HashMap<&str, Vec<&BedFeature>>,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut buf = String::new();
    let mut header: Option<String> = None;
    let mut seq = String::new();

    loop {
        buf.clear();
        if rdr.read_line(&mut buf)? == 0 {
            break;
        }
        let line = buf.trim_end();
        if let Some(h) = line.strip_prefix('>') {
            if let Some(name) = header.take() {
                emit_features(&name, &seq, by_chrom, out)?;
            }
            // Header is truncated at the first whitespace
            header = Some(h.split_whitespace().next().unwrap_or("").to_owned());
            seq.clear();
        } else if header.is_some() {
            seq.push_str(line.trim());
        }
    }
    if let Some(name) = header {
        emit_features(&name, &seq, by_chrom, out)?;
    }
    Ok(())
}

/// Write the FASTA records for all features on one chromosome
fn emit_features<W: Write>(
    chrom: &str,
    seq: &str,
    by_chrom: &HashMap<&str, Vec<&BedFeature>>,
    out: &mut W,
) -> anyhow::Result<()> {
    if let Some(feats) = by_chrom.get(chrom) {
        for f in feats.iter() {
            // Intervals running past the end of the sequence are clipped
            let end = f.end.min(seq.len());
            let start = f.start.min(end);
            let sub = &seq[start..end];
            writeln!(out, ">{}", f.fasta_header())?;
            if f.strand == '-' {
                write_wrapped(out, &revcomp(sub))?;
            } else {
                write_wrapped(out, sub)?;
            }
        }
    }
    Ok(())
}

/// Wrap sequence output at a fixed column width
fn write_wrapped<W: Write>(out: &mut W, seq: &str) -> anyhow::Result<()> {
    let b = seq.as_bytes();
    let mut i = 0;
    while i < b.len() {
        let j = (i + WRAP).min(b.len());
        out.write_all(&b[i..j])?;
        out.write_all(b"\n")?;
        i = j;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn feature(chrom: &str, start: usize, end: usize, name: Option<&str>, strand: char) -> BedFeature {
        BedFeature {
            chrom: chrom.to_owned(),
            start,
            end,
            name: name.map(|s| s.to_owned()),
            strand,
        }
    }

    fn run(fasta: &str, features: &[BedFeature]) -> String {
        let mut by_chrom: HashMap<&str, Vec<&BedFeature>> = HashMap::new();
        for f in features.iter() {
            by_chrom.entry(f.chrom.as_str()).or_default().push(f);
        }
        let mut out = Vec::new();
        emit_file(&mut Cursor::new(fasta), &by_chrom, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn extracts_forward_feature() {
        let fasta = ">chr1 test assembly\nACGTACGTAC\nGTACGTACGT\n";
        let feats = [feature("chr1", 2, 6, Some("f1"), '+')];
        assert_eq!(run(fasta, &feats), ">f1:chr1:2-6:+\nGTAC\n");
    }

    #[test]
    fn extracts_minus_strand_revcomp() {
        let fasta = ">chr1\nAAAACCCC\n";
        let feats = [feature("chr1", 0, 8, None, '-')];
        assert_eq!(run(fasta, &feats), ">chr1:0-8:-\nGGGGTTTT\n");
    }

    #[test]
    fn feature_spanning_line_break() {
        let fasta = ">chr1\nACGTACGTAC\nGTACGTACGT\n";
        let feats = [feature("chr1", 8, 12, None, '+')];
        assert_eq!(run(fasta, &feats), ">chr1:8-12:+\nACGT\n");
    }

    #[test]
    fn clips_interval_past_sequence_end() {
        let fasta = ">chr1\nACGT\n";
        let feats = [
            feature("chr1", 2, 100, None, '+'),
            feature("chr1", 50, 60, None, '+'),
        ];
        // The second feature lies wholly beyond the sequence and yields an
        // empty record
        assert_eq!(run(fasta, &feats), ">chr1:2-100:+\nGT\n>chr1:50-60:+\n");
    }

    #[test]
    fn other_chromosomes_ignored() {
        let fasta = ">chr2\nACGT\n";
        let feats = [feature("chr1", 0, 4, None, '+')];
        assert_eq!(run(fasta, &feats), "");
    }

    #[test]
    fn wraps_long_sequences() {
        let fasta = format!(">chr1\n{}\n", "A".repeat(130));
        let feats = [feature("chr1", 0, 130, None, '+')];
        let text = run(&fasta, &feats);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[2].len(), 60);
        assert_eq!(lines[3].len(), 10);
    }
}
