use std::{
    collections::HashSet,
    io::{BufWriter, Write},
};

use anyhow::Context;
use compress_io::compress::CompressIo;
use rand::seq::SliceRandom;

use crate::{config::Config, io, plot, tracking::FpkmTracking};

/// Strategy
///
/// Load the expression table, restrict the gene set by the optional GTF and
/// differential-expression filters, sample the display set, then write the
/// long format log2 FPKM table to a run-scoped temporary file and hand it to
/// the external plotting script.
pub fn process_expression(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    let cuff = FpkmTracking::from_path(cfg.fpkm_tracking())?;
    info!(
        "Loaded expression for {} genes over {} experiments",
        cuff.n_genes(),
        cuff.experiments().len()
    );

    // Determine genes to display
    let mut genes: HashSet<String> = match cfg.gtf_file() {
        Some(p) => {
            let mut rdr = CompressIo::new()
                .path(p)
                .bufreader()
                .with_context(|| format!("Error opening GTF file {}", p.display()))?;
            io::gtf_genes(&mut rdr)
                .with_context(|| format!("Error reading GTF file {}", p.display()))?
        }
        None => cuff.gene_ids().map(|s| s.to_owned()).collect(),
    };

    // Limit to differentially expressed genes
    if let Some(p) = cfg.diff_file() {
        let mut rdr = CompressIo::new()
            .path(p)
            .bufreader()
            .with_context(|| format!("Error opening diff file {}", p.display()))?;
        let diff = io::diff_genes(&mut rdr)
            .with_context(|| format!("Error reading diff file {}", p.display()))?;
        genes.retain(|g| diff.contains(g));
        debug!("{} genes after differential filter", genes.len());
    }

    // Sample genes to display
    let mut ids: Vec<String> = genes.into_iter().collect();
    ids.sort_unstable();
    let display = if ids.len() <= cfg.sample() {
        ids
    } else {
        let mut rng = rand::thread_rng();
        ids.choose_multiple(&mut rng, cfg.sample()).cloned().collect()
    };

    // Build the long format table
    let mut table = tempfile::Builder::new()
        .prefix("expr_heat_")
        .suffix(".txt")
        .tempfile()
        .with_context(|| "Error creating temporary table file")?;
    let mut n_rows = 0;
    {
        let mut wrt = BufWriter::new(table.as_file_mut());
        for gene in display.iter() {
            if let Some(ge) = cuff.gene_expr(gene) {
                // A gene that failed quantification in the first experiment
                // is dropped entirely
                if ge[0].is_nan() {
                    continue;
                }
                for (exp, fpkm) in cuff.experiments().iter().zip(ge.iter()) {
                    writeln!(
                        wrt,
                        "{}\t{}\t{}",
                        gene,
                        exp,
                        (fpkm + cfg.min_fpkm()).log2()
                    )
                    .with_context(|| "Error writing table row")?;
                    n_rows += 1;
                }
            }
        }
        wrt.flush().with_context(|| "Error writing table file")?;
    }
    debug!("Wrote {} table rows for {} display genes", n_rows, display.len());

    plot::render(table.path(), cfg.out_pdf())
}
