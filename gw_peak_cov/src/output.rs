use std::{
    collections::HashMap,
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::Context;

/// Peaks need more reads than this to get an individual profile
const MIN_PEAK_READS: usize = 150;

const PLOT_R: &str = r#"library(ggplot2)
args <- commandArgs(trailingOnly = TRUE)
df <- read.table(args[1], col.names = c("peak_i", "cov"))
gp <- ggplot(df, aes(x = peak_i, y = cov)) +
    geom_point() +
    scale_x_continuous("Peak index") +
    scale_y_continuous("Coverage")
ggsave(args[2], gp)
"#;

/// Write the raw (offset, coverage) table for one coverage array.  Offsets
/// run from -range/2 so the peak midpoint sits at offset 0.
pub fn write_raw(cov: &[f64], out_prefix: &str, range: usize) -> anyhow::Result<PathBuf> {
    let path = PathBuf::from(format!("{}_raw.txt", out_prefix));
    let mut wrt = BufWriter::new(
        fs::File::create(&path)
            .with_context(|| format!("Error creating raw output file {}", path.display()))?,
    );
    let half = (range / 2) as i64;
    for (i, x) in cov.iter().enumerate() {
        writeln!(wrt, "{}\t{:.6e}", i as i64 - half, x)
            .with_context(|| format!("Error writing to {}", path.display()))?;
    }
    Ok(path)
}

/// Render the coverage plot from the raw table via Rscript
pub fn render_plot(raw: &Path, out_prefix: &str) -> anyhow::Result<()> {
    let pdf = format!("{}.pdf", out_prefix);

    let mut script = tempfile::Builder::new()
        .prefix("peak_cov_")
        .suffix(".r")
        .tempfile()
        .with_context(|| "Error creating temporary plot script")?;
    script
        .write_all(PLOT_R.as_bytes())
        .and_then(|_| script.flush())
        .with_context(|| "Error writing temporary plot script")?;

    debug!("Rendering {} from {}", pdf, raw.display());
    let status = Command::new("Rscript")
        .arg(script.path())
        .arg(raw)
        .arg(&pdf)
        .status()
        .with_context(|| "Could not run Rscript - is R installed and on PATH?")?;
    if !status.success() {
        Err(anyhow!(
            "Rscript exited with status {} while rendering {}",
            status,
            pdf
        ))
    } else {
        Ok(())
    }
}

/// Raw table plus rendered plot for one coverage array
pub fn make_output(cov: &[f64], out_prefix: &str, range: usize) -> anyhow::Result<()> {
    let raw = write_raw(cov, out_prefix, range)?;
    render_plot(&raw, out_prefix)
}

/// Print read counts per peak to stdout, sorted by peak id
pub fn write_peak_reads(peak_reads: &HashMap<String, usize>) -> anyhow::Result<()> {
    let mut ids: Vec<_> = peak_reads.keys().collect();
    ids.sort();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for id in ids {
        writeln!(out, "{} {}", id, peak_reads[id])
            .with_context(|| "Error writing peak read counts")?;
    }
    Ok(())
}

/// Per-peak outputs for peaks with enough reads.  The output directory is
/// recreated on each run.
pub fn write_individuals(
    individual: &HashMap<String, Vec<f64>>,
    peak_reads: &HashMap<String, usize>,
    out_prefix: &str,
    range: usize,
) -> anyhow::Result<()> {
    let dir = PathBuf::from(format!("{}_individuals", out_prefix));
    if dir.is_dir() {
        fs::remove_dir_all(&dir)
            .with_context(|| format!("Error removing old output directory {}", dir.display()))?;
    }
    fs::create_dir(&dir)
        .with_context(|| format!("Error creating output directory {}", dir.display()))?;

    let mut ids: Vec<_> = individual.keys().collect();
    ids.sort();
    let mut n_written = 0;
    for id in ids {
        if peak_reads.get(id).copied().unwrap_or(0) > MIN_PEAK_READS {
            make_output(&individual[id], &format!("{}/{}", dir.display(), id), range)?;
            n_written += 1;
        }
    }
    debug!(
        "Wrote individual profiles for {} of {} peaks",
        n_written,
        individual.len()
    );
    Ok(())
}
