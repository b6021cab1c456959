use std::io::{BufWriter, Write};

use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::{get_next_line, intersect::IntersectBed};

use crate::{
    bam,
    config::Config,
    coverage::{CoverageAccumulator, OverlapRecord},
    output, peaks,
};

/// Strategy
///
/// Filter the BAM on mapping quality into a run-scoped temporary file, then
/// make one pass over it to count fragments and collect multi-mapper
/// weights.  Expand each peak to a window around its midpoint, hand reads
/// and windows to intersectBed, and fold the resulting overlap stream into
/// the coverage accumulator.  Reporting happens only once the stream is
/// exhausted.  Both temporary files are deleted on all exit paths.
pub fn process_peaks(cfg: &Config) -> anyhow::Result<()> {
    debug!("Starting processing");

    // Filter BAM for mapping quality
    let bam_mapq = tempfile::Builder::new()
        .prefix("peak_cov_")
        .suffix(".bam")
        .tempfile()
        .with_context(|| "Error creating temporary BAM file")?;
    bam::write_mapq_filtered(cfg.bam_file(), bam_mapq.path(), cfg.threads())?;

    // Count fragments and hash multi-mappers
    let scan = bam::scan_fragments(bam_mapq.path(), cfg.properly_paired(), cfg.threads())?;
    info!("Counted {:.2} fragments", scan.num_fragments());
    let weights = scan.into_weights();
    debug!("{} multi-mapping read names hashed", weights.len());

    // Expand peaks to windows around their midpoints
    let mut peaks_range = tempfile::Builder::new()
        .prefix("peak_cov_")
        .suffix(".gff")
        .tempfile()
        .with_context(|| "Error creating temporary peaks file")?;
    let n_peaks = {
        let mut rdr = CompressIo::new()
            .path(cfg.peaks_gff())
            .bufreader()
            .with_context(|| format!("Error opening peaks file {}", cfg.peaks_gff().display()))?;
        let mut wrt = BufWriter::new(peaks_range.as_file_mut());
        let n = peaks::write_expanded_peaks(&mut rdr, &mut wrt, cfg.range() as i64)
            .with_context(|| format!("Error expanding peaks from {}", cfg.peaks_gff().display()))?;
        wrt.flush()
            .with_context(|| "Error writing expanded peaks file")?;
        n
    };
    debug!("Expanded {} peaks to range {}", n_peaks, cfg.range());

    // Count reads over the overlap stream
    let mut acc = CoverageAccumulator::new(cfg.range(), cfg.individual_plots());
    let mut ix = IntersectBed::bam_features(bam_mapq.path(), peaks_range.path()).spawn()?;
    let mut buf = String::new();
    let mut line = 0;
    while let Some(fields) = get_next_line(ix.reader(), &mut buf)
        .with_context(|| format!("Error after reading {} lines from intersectBed", line))?
    {
        line += 1;
        if fields.len() >= 15 {
            let rec = OverlapRecord::parse(&fields)
                .with_context(|| format!("Malformed overlap record at line {}", line))?;
            acc.add(&rec, &weights);
        }
    }
    ix.finish()?;
    debug!("Processed {} overlap records", line);

    // Report
    output::write_peak_reads(acc.peak_reads())?;
    output::make_output(acc.global(), cfg.out_prefix(), cfg.range())?;
    if let Some(individual) = acc.individual() {
        output::write_individuals(individual, acc.peak_reads(), cfg.out_prefix(), cfg.range())?;
    }

    Ok(())
}
