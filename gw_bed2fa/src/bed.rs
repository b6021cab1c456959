use std::path::Path;

use anyhow::Context;
use compress_io::compress::CompressIo;

use utils::get_next_line;

/// One BED feature as needed for sequence extraction.  Only the first six
/// columns are used; block structure is not supported.
#[derive(Debug, PartialEq, Eq)]
pub struct BedFeature {
    pub chrom: String,
    pub start: usize,
    pub end: usize,
    pub name: Option<String>,
    pub strand: char,
}

impl BedFeature {
    pub fn parse(fields: &[&str]) -> anyhow::Result<Self> {
        if fields.len() < 3 {
            return Err(anyhow!(
                "Expected at least 3 fields in BED line, found {}",
                fields.len()
            ));
        }
        let start = fields[1]
            .parse::<usize>()
            .with_context(|| "Error reading feature start")?;
        let end = fields[2]
            .parse::<usize>()
            .with_context(|| "Error reading feature end")?;
        // A name of . means unnamed
        let name = fields
            .get(3)
            .filter(|s| !s.is_empty() && **s != ".")
            .map(|s| (*s).to_owned());
        let strand = if fields.get(5) == Some(&"-") { '-' } else { '+' };

        Ok(Self {
            chrom: fields[0].to_owned(),
            start,
            end,
            name,
            strand,
        })
    }

    /// FASTA header for the extracted feature
    pub fn fasta_header(&self) -> String {
        match &self.name {
            Some(n) => format!(
                "{}:{}:{}-{}:{}",
                n, self.chrom, self.start, self.end, self.strand
            ),
            None => format!("{}:{}-{}:{}", self.chrom, self.start, self.end, self.strand),
        }
    }
}

/// Read all features from a BED file
pub fn read_bed_file(fname: &Path) -> anyhow::Result<Vec<BedFeature>> {
    debug!("Reading in BED features from {}", fname.display());

    let mut rdr = CompressIo::new()
        .path(fname)
        .bufreader()
        .with_context(|| format!("Error opening BED file {}", fname.display()))?;

    let mut buf = String::new();
    let mut line = 0;
    let mut features = Vec::new();
    while let Some(fields) = get_next_line(&mut rdr, &mut buf).with_context(|| {
        format!(
            "Error after reading {} lines from {}",
            line,
            fname.display()
        )
    })? {
        line += 1;
        // Skip blank lines, comments and headers
        if fields.len() < 3
            || fields[0].starts_with('#')
            || fields[0] == "track"
            || fields[0] == "browser"
        {
            continue;
        }
        features.push(
            BedFeature::parse(&fields)
                .with_context(|| format!("{}:{} Parse error", fname.display(), line))?,
        );
    }

    debug!(
        "Finished reading in {} lines; found {} features",
        line,
        features.len()
    );
    Ok(features)
}
