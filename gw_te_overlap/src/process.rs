use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::{
    get_next_line,
    gff::{gtf_kv, GffLine},
    intersect::IntersectBed,
};

use crate::{
    config::Config,
    overlap::{OverlapTable, RepeatOverlap},
};

/// Strategy
///
/// Seed the hash with every gene named in the GTF so genes without repeat
/// overlaps still appear, then stream the intersectBed overlap lines into
/// the hash and write the table once the stream is exhausted.
pub fn process_overlaps(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    let mut table = OverlapTable::new(cfg.nt_mode(), cfg.stranded(), cfg.star());

    if !cfg.nt_mode() {
        seed_genes(cfg, &mut table)?;
        debug!("Seeded {} genes from {}", table.n_genes(), cfg.gtf_file().display());
    }

    // Stream overlaps between genes and repeats
    let mut ix = IntersectBed::features(cfg.gtf_file(), cfg.repeats_gff()).spawn()?;
    let mut buf = String::new();
    let mut line = 0;
    while let Some(fields) = get_next_line(ix.reader(), &mut buf)
        .with_context(|| format!("Error after reading {} lines from intersectBed", line))?
    {
        line += 1;
        if fields.len() >= 19 {
            let ov = RepeatOverlap::parse(&fields, cfg.gene_key())
                .with_context(|| format!("Malformed overlap record at line {}", line))?;
            table.add(&ov);
        }
    }
    ix.finish()?;
    debug!("Processed {} overlap records for {} genes", line, table.n_genes());

    // Write out results
    let mut wrt = CompressIo::new()
        .opt_path(cfg.output_file())
        .bufwriter()
        .with_context(|| "Failed to open output file")?;
    table.write(&mut wrt)
}

/// Read the gene identifiers from the GTF attribute column
fn seed_genes(cfg: &Config, table: &mut OverlapTable) -> anyhow::Result<()> {
    let fname = cfg.gtf_file();
    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("Error opening GTF file {}", fname.display()))?;

    let mut buf = String::new();
    let mut line = 0;
    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.display()
        )
    })? {
        line += 1;
        // Skip comments and short lines
        if fields.first().map(|s| s.starts_with('#')).unwrap_or(true) {
            continue;
        }
        let gl = match GffLine::from_fields(fields) {
            Ok(gl) => gl,
            Err(_) => continue,
        };
        let gene = gtf_kv(gl.attributes())
            .get(cfg.gene_key())
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "{}:{} Missing {} attribute",
                    fname.display(),
                    line,
                    cfg.gene_key()
                )
            })?;
        table.ensure_gene(gene);
    }
    Ok(())
}
