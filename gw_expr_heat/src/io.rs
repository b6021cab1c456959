use std::{collections::HashSet, io::BufRead};

use anyhow::Context;

use utils::{
    get_next_line,
    gff::{gtf_kv, GffLine},
};

/// Genes flagged as significantly differential in a cuffdiff gene_exp.diff
/// file (last column is the word yes)
pub fn diff_genes<R: BufRead>(rdr: &mut R) -> anyhow::Result<HashSet<String>> {
    let mut genes = HashSet::new();
    let mut buf = String::new();
    let mut line = 0;

    // Skip the header line
    get_next_line(rdr, &mut buf)?;

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from diff file", line))?
    {
        line += 1;
        if fields.len() >= 2 && fields[fields.len() - 1] == "yes" {
            genes.insert(fields[0].to_owned());
        }
    }
    Ok(genes)
}

/// Gene identifiers named in the gene_id attribute of a GTF file
pub fn gtf_genes<R: BufRead>(rdr: &mut R) -> anyhow::Result<HashSet<String>> {
    let mut genes = HashSet::new();
    let mut buf = String::new();
    let mut line = 0;

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from GTF file", line))?
    {
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
            .get("gene_id")
            .copied()
            .ok_or_else(|| anyhow!("line {}: Missing gene_id attribute", line))?;
        genes.insert(gene.to_owned());
    }
    Ok(genes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn diff_keeps_significant_genes() {
        let diff = "test_id\tgene_id\tgene\tlocus\tsample_1\tsample_2\tstatus\tvalue_1\tvalue_2\tlog2(fold_change)\ttest_stat\tp_value\tq_value\tsignificant\n\
            G1\tG1\tGene1\tchr1:1-100\tq1\tq2\tOK\t1\t8\t3\t2.5\t0.001\t0.01\tyes\n\
            G2\tG2\tGene2\tchr1:200-300\tq1\tq2\tOK\t1\t1.2\t0.26\t0.3\t0.5\t0.8\tno\n";
        let genes = diff_genes(&mut Cursor::new(diff)).unwrap();
        assert_eq!(genes.len(), 1);
        assert!(genes.contains("G1"));
    }

    #[test]
    fn gtf_gene_set() {
        let gtf = "# comment\n\
            chr1\tcuff\texon\t1\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
            chr1\tcuff\texon\t150\t200\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";\n\
            chr2\tcuff\texon\t1\t50\t.\t-\t.\tgene_id \"G2\"; transcript_id \"T3\";\n";
        let genes = gtf_genes(&mut Cursor::new(gtf)).unwrap();
        assert_eq!(genes.len(), 2);
        assert!(genes.contains("G1") && genes.contains("G2"));
    }
}
