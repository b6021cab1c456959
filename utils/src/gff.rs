use std::collections::HashMap;

use anyhow::Context;

/// Parse a GTF style attribute column (semicolon separated `key "value"`
/// pairs) into a key -> value map.  Values may be unquoted; malformed
/// fragments are skipped rather than reported.
pub fn gtf_kv(attrs: &str) -> HashMap<&str, &str> {
    let mut kv = HashMap::new();
    for item in attrs.split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if let Some((k, v)) = item.split_once(char::is_whitespace) {
            kv.insert(k, v.trim().trim_matches('"'));
        }
    }
    kv
}

/// Borrowed view of one tab separated GFF/GTF line
pub struct GffLine<'a> {
    fields: Vec<&'a str>,
}

impl<'a> GffLine<'a> {
    pub fn parse(line: &'a str) -> anyhow::Result<Self> {
        Self::from_fields(line.trim_end().split('\t').collect())
    }

    pub fn from_fields(fields: Vec<&'a str>) -> anyhow::Result<Self> {
        if fields.len() < 9 {
            Err(anyhow!(
                "Expected at least 9 tab separated fields, found {}",
                fields.len()
            ))
        } else {
            Ok(Self { fields })
        }
    }

    pub fn seqname(&self) -> &'a str {
        self.fields[0]
    }

    pub fn feature(&self) -> &'a str {
        self.fields[2]
    }

    pub fn start(&self) -> anyhow::Result<i64> {
        self.fields[3]
            .parse::<i64>()
            .with_context(|| format!("Error parsing start coordinate {}", self.fields[3]))
    }

    pub fn end(&self) -> anyhow::Result<i64> {
        self.fields[4]
            .parse::<i64>()
            .with_context(|| format!("Error parsing end coordinate {}", self.fields[4]))
    }

    pub fn strand(&self) -> &'a str {
        self.fields[6]
    }

    pub fn attributes(&self) -> &'a str {
        self.fields[8]
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_quoted() {
        let kv = gtf_kv(r#"gene_id "GENE1"; transcript_id "T1";"#);
        assert_eq!(kv.get("gene_id"), Some(&"GENE1"));
        assert_eq!(kv.get("transcript_id"), Some(&"T1"));
    }

    #[test]
    fn kv_unquoted_and_sloppy() {
        let kv = gtf_kv("id PEAK_7 ;  repeat AluY; family SINE/Alu");
        assert_eq!(kv.get("id"), Some(&"PEAK_7"));
        assert_eq!(kv.get("repeat"), Some(&"AluY"));
        assert_eq!(kv.get("family"), Some(&"SINE/Alu"));
    }

    #[test]
    fn kv_malformed_skipped() {
        let kv = gtf_kv("lonely; gene_id \"G\"");
        assert_eq!(kv.len(), 1);
        assert_eq!(kv.get("gene_id"), Some(&"G"));
    }

    #[test]
    fn gff_line_fields() {
        let line = "chr1\tcuff\texon\t100\t200\t.\t-\t.\tgene_id \"G1\";";
        let gl = GffLine::parse(line).unwrap();
        assert_eq!(gl.seqname(), "chr1");
        assert_eq!(gl.feature(), "exon");
        assert_eq!(gl.start().unwrap(), 100);
        assert_eq!(gl.end().unwrap(), 200);
        assert_eq!(gl.strand(), "-");
        assert_eq!(gtf_kv(gl.attributes()).get("gene_id"), Some(&"G1"));
    }

    #[test]
    fn gff_line_short() {
        assert!(GffLine::parse("chr1\t100\t200").is_err());
    }
}
