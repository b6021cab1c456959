use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Formatter},
    io::Write,
};

use anyhow::Context;

use utils::gff::gtf_kv;

/// Key identifying one repeat annotation within a gene's overlap hash.
/// The `*` entries aggregate over all repeats of a family and over all
/// families.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RepeatKey {
    pub repeat: String,
    pub family: String,
    pub orient: Option<char>,
}

impl RepeatKey {
    fn new(repeat: &str, family: &str, orient: Option<char>) -> Self {
        Self {
            repeat: repeat.to_owned(),
            family: family.to_owned(),
            orient,
        }
    }
}

impl fmt::Display for RepeatKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.repeat, self.family)?;
        if let Some(o) = self.orient {
            write!(f, "\t{}", o)?;
        }
        Ok(())
    }
}

/// One line of intersectBed -wo output between a gene GTF and a repeat GFF.
/// Gene columns 0-8, repeat columns 9-17, overlap length column 18.
#[derive(Debug)]
pub struct RepeatOverlap<'a> {
    pub gene_id: &'a str,
    pub repeat: &'a str,
    pub family: &'a str,
    pub gene_strand: &'a str,
    pub te_strand: &'a str,
    pub nt: u64,
}

impl<'a> RepeatOverlap<'a> {
    pub fn parse(fields: &[&'a str], gene_key: &str) -> anyhow::Result<Self> {
        if fields.len() < 19 {
            return Err(anyhow!(
                "Expected at least 19 fields in overlap record, found {}",
                fields.len()
            ));
        }
        let gene_id = gtf_kv(fields[8])
            .get(gene_key)
            .copied()
            .ok_or_else(|| anyhow!("Missing {} attribute in gene annotation", gene_key))?;
        let rep_kv = gtf_kv(fields[17]);
        let repeat = rep_kv
            .get("repeat")
            .copied()
            .ok_or_else(|| anyhow!("Missing repeat attribute in repeat annotation"))?;
        let family = rep_kv
            .get("family")
            .copied()
            .ok_or_else(|| anyhow!("Missing family attribute in repeat annotation"))?;
        let nt = fields[18]
            .parse::<u64>()
            .with_context(|| "Error reading overlap length")?;

        Ok(Self {
            gene_id,
            repeat,
            family,
            gene_strand: fields[6],
            te_strand: fields[15],
            nt,
        })
    }
}

enum GeneRepeats {
    Sets(BTreeMap<String, BTreeSet<RepeatKey>>),
    Nt(BTreeMap<String, BTreeMap<RepeatKey, u64>>),
}

/// Gene -> repeat overlap hash, in presence-set or nucleotide-total form.
/// Sorted maps so output order is stable across runs.
pub struct OverlapTable {
    hash: GeneRepeats,
    stranded: bool,
    star: bool,
}

impl OverlapTable {
    pub fn new(nt_mode: bool, stranded: bool, star: bool) -> Self {
        let hash = if nt_mode {
            GeneRepeats::Nt(BTreeMap::new())
        } else {
            GeneRepeats::Sets(BTreeMap::new())
        };
        Self {
            hash,
            // Orientation only applies to presence sets
            stranded: stranded && !nt_mode,
            star,
        }
    }

    /// Genes named in the GTF appear in set mode output even when no repeat
    /// overlaps them
    pub fn ensure_gene(&mut self, gene_id: &str) {
        if let GeneRepeats::Sets(h) = &mut self.hash {
            if !h.contains_key(gene_id) {
                h.insert(gene_id.to_owned(), BTreeSet::new());
            }
        }
    }

    pub fn add(&mut self, ov: &RepeatOverlap) {
        let orient = if self.stranded {
            Some(if ov.gene_strand == ov.te_strand {
                '+'
            } else {
                '-'
            })
        } else {
            None
        };

        let mut keys = vec![RepeatKey::new(ov.repeat, ov.family, orient)];
        if self.star {
            keys.push(RepeatKey::new("*", ov.family, orient));
            keys.push(RepeatKey::new("*", "*", orient));
        }

        match &mut self.hash {
            GeneRepeats::Sets(h) => {
                let set = h.entry(ov.gene_id.to_owned()).or_default();
                for k in keys {
                    set.insert(k);
                }
            }
            GeneRepeats::Nt(h) => {
                let counts = h.entry(ov.gene_id.to_owned()).or_default();
                for k in keys {
                    *counts.entry(k).or_insert(0) += ov.nt;
                }
            }
        }
    }

    /// Number of genes in the hash
    pub fn n_genes(&self) -> usize {
        match &self.hash {
            GeneRepeats::Sets(h) => h.len(),
            GeneRepeats::Nt(h) => h.len(),
        }
    }

    pub fn write<W: Write>(&self, wrt: &mut W) -> anyhow::Result<()> {
        match &self.hash {
            GeneRepeats::Sets(h) => {
                for (gene, set) in h.iter() {
                    for k in set.iter() {
                        writeln!(wrt, "{}\t{}", gene, k)
                            .with_context(|| "Error writing overlap table")?;
                    }
                }
            }
            GeneRepeats::Nt(h) => {
                for (gene, counts) in h.iter() {
                    for (k, nt) in counts.iter() {
                        writeln!(wrt, "{}\t{}\t{}", gene, k, nt)
                            .with_context(|| "Error writing overlap table")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap<'a>(gene: &'a str, repeat: &'a str, family: &'a str) -> RepeatOverlap<'a> {
        RepeatOverlap {
            gene_id: gene,
            repeat,
            family,
            gene_strand: "+",
            te_strand: "-",
            nt: 25,
        }
    }

    fn table_text(table: &OverlapTable) -> String {
        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_overlap_line() {
        let line = "chr1\tcuff\texon\t100\t500\t.\t+\t.\tgene_id \"G1\";\t\
                    chr1\trmsk\tsimilarity\t400\t600\t.\t-\t.\trepeat \"AluY\"; family \"SINE/Alu\";\t\
                    100";
        let fields: Vec<&str> = line.split('\t').collect();
        let ov = RepeatOverlap::parse(&fields, "gene_id").unwrap();
        assert_eq!(ov.gene_id, "G1");
        assert_eq!(ov.repeat, "AluY");
        assert_eq!(ov.family, "SINE/Alu");
        assert_eq!(ov.gene_strand, "+");
        assert_eq!(ov.te_strand, "-");
        assert_eq!(ov.nt, 100);
    }

    #[test]
    fn set_mode_with_star_entries() {
        let mut table = OverlapTable::new(false, false, true);
        table.add(&overlap("G1", "AluY", "SINE/Alu"));
        table.add(&overlap("G1", "AluY", "SINE/Alu"));
        let text = table_text(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "G1\t*\t*",
                "G1\t*\tSINE/Alu",
                "G1\tAluY\tSINE/Alu",
            ]
        );
    }

    #[test]
    fn set_mode_without_star() {
        let mut table = OverlapTable::new(false, false, false);
        table.add(&overlap("G1", "L1PA2", "LINE/L1"));
        assert_eq!(table_text(&table), "G1\tL1PA2\tLINE/L1\n");
    }

    #[test]
    fn stranded_records_orientation() {
        let mut table = OverlapTable::new(false, true, false);
        table.add(&overlap("G1", "AluY", "SINE/Alu"));
        let mut same = overlap("G2", "AluY", "SINE/Alu");
        same.te_strand = "+";
        table.add(&same);
        let text = table_text(&table);
        assert!(text.contains("G1\tAluY\tSINE/Alu\t-"));
        assert!(text.contains("G2\tAluY\tSINE/Alu\t+"));
    }

    #[test]
    fn nt_mode_accumulates_totals() {
        let mut table = OverlapTable::new(true, false, true);
        table.add(&overlap("G1", "AluY", "SINE/Alu"));
        table.add(&overlap("G1", "AluSx", "SINE/Alu"));
        let text = table_text(&table);
        assert!(text.contains("G1\tAluY\tSINE/Alu\t25"));
        assert!(text.contains("G1\tAluSx\tSINE/Alu\t25"));
        assert!(text.contains("G1\t*\tSINE/Alu\t50"));
        assert!(text.contains("G1\t*\t*\t50"));
    }

    #[test]
    fn ensure_gene_keeps_overlap_free_genes() {
        let mut table = OverlapTable::new(false, false, true);
        table.ensure_gene("G0");
        table.add(&overlap("G1", "AluY", "SINE/Alu"));
        assert_eq!(table.n_genes(), 2);
        // G0 contributes no rows but is present in the hash
        assert!(!table_text(&table).contains("G0"));
    }
}
