use std::{collections::HashMap, path::Path};

use anyhow::Context;
use rust_htslib::bam::{self, record::Aux, Read};

/// Mapping from read name to multiplicity (number of reported alignment
/// locations), restricted to multi-mapping reads.  Absence of a name implies
/// a unique mapping.
pub type WeightTable = HashMap<String, usize>;

/// Multiplicity of an alignment record from its NH aux tag.
/// Records without the tag count as uniquely mapped.
fn multiplicity(rec: &bam::Record) -> usize {
    let nh = match rec.aux(b"NH") {
        Ok(Aux::U8(x)) => x as usize,
        Ok(Aux::U16(x)) => x as usize,
        Ok(Aux::U32(x)) => x as usize,
        Ok(Aux::I8(x)) => x.max(0) as usize,
        Ok(Aux::I16(x)) => x.max(0) as usize,
        Ok(Aux::I32(x)) => x.max(0) as usize,
        _ => 1,
    };
    nh.max(1)
}

/// Copy records with mapping quality > 0 to a new BAM file
pub fn write_mapq_filtered(bam_file: &Path, out: &Path, threads: usize) -> anyhow::Result<()> {
    debug!(
        "Filtering {} on mapping quality; writing to {}",
        bam_file.display(),
        out.display()
    );

    let mut rdr = bam::Reader::from_path(bam_file)
        .with_context(|| format!("Failed to open input BAM file {}", bam_file.display()))?;
    if threads > 1 {
        rdr.set_threads(threads)?;
    }

    let header = bam::Header::from_template(rdr.header());
    let mut wrt = bam::Writer::from_path(out, &header, bam::Format::Bam)
        .with_context(|| format!("Failed to create filtered BAM file {}", out.display()))?;

    let mut n_in: usize = 0;
    let mut n_out: usize = 0;
    let mut rec = bam::Record::new();
    while let Some(r) = rdr.read(&mut rec) {
        r.with_context(|| format!("Error reading record from {}", bam_file.display()))?;
        n_in += 1;
        if rec.mapq() > 0 {
            wrt.write(&rec)
                .with_context(|| format!("Error writing record to {}", out.display()))?;
            n_out += 1;
        }
    }

    debug!("Kept {} of {} records after mapping quality filter", n_out, n_in);
    Ok(())
}

/// Fragment totals and the multi-mapper weight table collected in one pass
/// over the filtered alignment stream
pub struct FragmentScan {
    properly_paired_only: bool,
    num_fragments: f64,
    weights: WeightTable,
}

impl FragmentScan {
    pub fn new(properly_paired_only: bool) -> Self {
        Self {
            properly_paired_only,
            num_fragments: 0.0,
            weights: WeightTable::new(),
        }
    }

    /// Account for one retained read.  Each fragment contributes total
    /// weight 1.0 across all of its reported locations; read pairs split
    /// that between their two mates.
    pub fn add(&mut self, name: &str, nh: usize, paired: bool, properly_paired: bool) {
        let nh = nh.max(1);
        let m = nh as f64;
        if self.properly_paired_only {
            if properly_paired {
                self.num_fragments += 0.5 / m;
            }
        } else if paired {
            self.num_fragments += 0.5 / m;
        } else {
            self.num_fragments += 1.0 / m;
        }

        // Last value wins if a name recurs with a different multiplicity
        if nh > 1 {
            self.weights.insert(name.to_owned(), nh);
        }
    }

    pub fn num_fragments(&self) -> f64 {
        self.num_fragments
    }

    pub fn into_weights(self) -> WeightTable {
        self.weights
    }
}

/// Count fragments and collect the weight table from a (filtered) BAM file
pub fn scan_fragments(
    bam_file: &Path,
    properly_paired_only: bool,
    threads: usize,
) -> anyhow::Result<FragmentScan> {
    debug!("Counting fragments from {}", bam_file.display());

    let mut rdr = bam::Reader::from_path(bam_file)
        .with_context(|| format!("Failed to open filtered BAM file {}", bam_file.display()))?;
    if threads > 1 {
        rdr.set_threads(threads)?;
    }

    let mut scan = FragmentScan::new(properly_paired_only);
    let mut rec = bam::Record::new();
    while let Some(r) = rdr.read(&mut rec) {
        r.with_context(|| format!("Error reading record from {}", bam_file.display()))?;
        let name = String::from_utf8_lossy(rec.qname());
        scan.add(
            &name,
            multiplicity(&rec),
            rec.is_paired(),
            rec.is_proper_pair(),
        );
    }

    Ok(scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpaired_unique_counts_whole_fragment() {
        let mut scan = FragmentScan::new(false);
        scan.add("r1", 1, false, false);
        assert_eq!(scan.num_fragments(), 1.0);
        assert!(scan.into_weights().is_empty());
    }

    #[test]
    fn paired_reads_count_half_each() {
        let mut scan = FragmentScan::new(false);
        scan.add("r1", 1, true, true);
        scan.add("r1", 1, true, true);
        assert_eq!(scan.num_fragments(), 1.0);
    }

    #[test]
    fn multi_mappers_down_weighted() {
        let mut scan = FragmentScan::new(false);
        scan.add("r1", 4, false, false);
        assert_eq!(scan.num_fragments(), 0.25);
        assert_eq!(scan.into_weights().get("r1"), Some(&4));
    }

    #[test]
    fn properly_paired_only_skips_others() {
        let mut scan = FragmentScan::new(true);
        scan.add("r1", 1, true, false);
        scan.add("r2", 1, false, false);
        assert_eq!(scan.num_fragments(), 0.0);
        scan.add("r3", 2, true, true);
        assert_eq!(scan.num_fragments(), 0.25);
        let w = scan.into_weights();
        assert_eq!(w.len(), 1);
        assert_eq!(w.get("r3"), Some(&2));
    }

    #[test]
    fn weight_table_last_value_wins() {
        let mut scan = FragmentScan::new(false);
        scan.add("r1", 2, true, true);
        scan.add("r1", 3, true, true);
        assert_eq!(scan.into_weights().get("r1"), Some(&3));
    }

    #[test]
    fn missing_multiplicity_treated_as_unique() {
        let mut scan = FragmentScan::new(false);
        scan.add("r1", 0, false, false);
        assert_eq!(scan.num_fragments(), 1.0);
        assert!(scan.into_weights().is_empty());
    }
}
