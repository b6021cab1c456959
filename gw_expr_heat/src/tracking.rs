use std::{collections::HashMap, io::BufRead, path::Path};

use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::get_next_line;

/// Expression values from a Cufflinks fpkm_tracking file.  Experiment names
/// are the prefixes of the header columns ending in _FPKM; per gene FPKM
/// vectors follow the same column order.
pub struct FpkmTracking {
    experiments: Vec<String>,
    genes: HashMap<String, Vec<f64>>,
}

impl FpkmTracking {
    pub fn from_path(p: &Path) -> anyhow::Result<Self> {
        let mut rdr = CompressIo::new()
            .path(p)
            .bufreader()
            .with_context(|| format!("Error opening fpkm tracking file {}", p.display()))?;
        Self::from_reader(&mut rdr)
            .with_context(|| format!("Error reading fpkm tracking file {}", p.display()))
    }

    pub fn from_reader<R: BufRead>(rdr: &mut R) -> anyhow::Result<Self> {
        let mut buf = String::new();

        let header = get_next_line(rdr, &mut buf)?
            .ok_or_else(|| anyhow!("Empty fpkm tracking file"))?;
        let mut experiments = Vec::new();
        let mut cols = Vec::new();
        for (i, name) in header.iter().enumerate() {
            if let Some(exp) = name.strip_suffix("_FPKM") {
                experiments.push(exp.to_owned());
                cols.push(i);
            }
        }
        if experiments.is_empty() {
            return Err(anyhow!("No FPKM columns found in header"));
        }
        let min_fields = *cols.last().unwrap() + 1;

        let mut genes = HashMap::new();
        let mut line = 1;
        while let Some(fields) = get_next_line(rdr, &mut buf)
            .with_context(|| format!("Error after reading {} lines", line))?
        {
            line += 1;
            // Skip short lines; unparseable values become NaN
            if fields.len() >= min_fields {
                let fpkm: Vec<f64> = cols
                    .iter()
                    .map(|&i| fields[i].parse::<f64>().unwrap_or(f64::NAN))
                    .collect();
                genes.insert(fields[0].to_owned(), fpkm);
            }
        }

        Ok(Self { experiments, genes })
    }

    pub fn experiments(&self) -> &[String] {
        &self.experiments
    }

    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn gene_ids(&self) -> impl Iterator<Item = &str> {
        self.genes.keys().map(|s| s.as_str())
    }

    pub fn gene_expr(&self, id: &str) -> Option<&[f64]> {
        self.genes.get(id).map(|v| v.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRACKING: &str = "tracking_id\tclass_code\tnearest_ref_id\tgene_id\tgene_short_name\ttss_id\tlocus\tlength\tcoverage\tq1_FPKM\tq1_conf_lo\tq1_conf_hi\tq1_FPKM_status\tq2_FPKM\tq2_conf_lo\tq2_conf_hi\tq2_FPKM_status\n\
        G1\t-\t-\tG1\tGene1\t-\tchr1:1-100\t100\t5.0\t1.5\t1.0\t2.0\tOK\t3.0\t2.5\t3.5\tOK\n\
        G2\t-\t-\tG2\tGene2\t-\tchr1:200-300\t100\t0.0\txx\t0\t0\tFAIL\t0.5\t0.4\t0.6\tOK\n";

    #[test]
    fn header_experiments() {
        let t = FpkmTracking::from_reader(&mut Cursor::new(TRACKING)).unwrap();
        assert_eq!(t.experiments(), ["q1", "q2"]);
        assert_eq!(t.n_genes(), 2);
    }

    #[test]
    fn gene_expression_vectors() {
        let t = FpkmTracking::from_reader(&mut Cursor::new(TRACKING)).unwrap();
        assert_eq!(t.gene_expr("G1"), Some(&[1.5, 3.0][..]));
        assert!(t.gene_expr("G3").is_none());
    }

    #[test]
    fn unparseable_fpkm_is_nan() {
        let t = FpkmTracking::from_reader(&mut Cursor::new(TRACKING)).unwrap();
        let g2 = t.gene_expr("G2").unwrap();
        assert!(g2[0].is_nan());
        assert_eq!(g2[1], 0.5);
    }

    #[test]
    fn no_fpkm_columns_is_error() {
        assert!(FpkmTracking::from_reader(&mut Cursor::new("a\tb\tc\n")).is_err());
    }
}
