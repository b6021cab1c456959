use std::collections::HashMap;

use anyhow::Context;

use utils::gff::gtf_kv;

use crate::{bam::WeightTable, peaks::tight_window};

/// One reported overlap between a read interval and an expanded peak window,
/// parsed from a line of `intersectBed -split -wo -bed -abam` output.
///
/// Column layout is the external tool's contract: read interval in columns
/// 1-2, read name in column 3, window interval in columns 9-10, peak
/// attributes in column 14.
#[derive(Debug)]
pub struct OverlapRecord<'a> {
    pub read_start: i64,
    pub read_end: i64,
    pub read_name: &'a str,
    pub window_start: i64,
    pub window_end: i64,
    pub peak_id: &'a str,
}

impl<'a> OverlapRecord<'a> {
    pub fn parse(fields: &[&'a str]) -> anyhow::Result<Self> {
        if fields.len() < 15 {
            return Err(anyhow!(
                "Expected at least 15 fields in overlap record, found {}",
                fields.len()
            ));
        }
        let read_start = fields[1]
            .parse::<i64>()
            .with_context(|| "Error reading read start")?;
        let read_end = fields[2]
            .parse::<i64>()
            .with_context(|| "Error reading read end")?;
        let window_start = fields[9]
            .parse::<i64>()
            .with_context(|| "Error reading window start")?;
        let window_end = fields[10]
            .parse::<i64>()
            .with_context(|| "Error reading window end")?;
        let peak_id = gtf_kv(fields[14])
            .get("id")
            .copied()
            .ok_or_else(|| anyhow!("Missing id attribute in peak annotation"))?;

        Ok(Self {
            read_start,
            read_end,
            read_name: fields[3],
            window_start,
            window_end,
            peak_id,
        })
    }
}

/// Accumulates fragment-weighted coverage over the overlap stream.  All
/// state is owned here for the lifetime of one run and handed to reporting
/// when the stream is exhausted.
pub struct CoverageAccumulator {
    range: usize,
    global: Vec<f64>,
    individual: Option<HashMap<String, Vec<f64>>>,
    peak_reads: HashMap<String, usize>,
}

impl CoverageAccumulator {
    pub fn new(range: usize, individual_plots: bool) -> Self {
        Self {
            range,
            global: vec![0.0; range + 1],
            individual: if individual_plots {
                Some(HashMap::new())
            } else {
                None
            },
            peak_reads: HashMap::new(),
        }
    }

    /// Fold one overlap record into the coverage state
    pub fn add(&mut self, rec: &OverlapRecord, weights: &WeightTable) {
        // The intersection tool can report zero or negative length read
        // intervals for indels near interval endpoints; these contribute
        // nothing at all
        if rec.read_start >= rec.read_end {
            return;
        }

        *self.peak_reads.entry(rec.peak_id.to_owned()).or_insert(0) += 1;

        // Clip the read to the tight midpoint-centered window, not the
        // inflated bounds used for intersection.  Read intervals are
        // half-open, window bounds inclusive.
        let (tstart, tend) = tight_window(rec.window_start, rec.window_end, self.range as i64);
        let range_start = rec.read_start.max(tstart);
        let range_end = rec.read_end.min(tend + 1);
        if range_start >= range_end {
            return;
        }

        let weight = 1.0
            / weights
                .get(rec.read_name)
                .copied()
                .unwrap_or(1)
                .max(1) as f64;

        let i0 = (range_start - tstart) as usize;
        let i1 = (range_end - tstart) as usize;
        for x in &mut self.global[i0..i1] {
            *x += weight;
        }

        let len = self.range + 1;
        if let Some(ind) = self.individual.as_mut() {
            let cov = ind
                .entry(rec.peak_id.to_owned())
                .or_insert_with(|| vec![0.0; len]);
            for x in &mut cov[i0..i1] {
                *x += weight;
            }
        }
    }

    pub fn global(&self) -> &[f64] {
        &self.global
    }

    pub fn individual(&self) -> Option<&HashMap<String, Vec<f64>>> {
        self.individual.as_ref()
    }

    pub fn peak_reads(&self) -> &HashMap<String, usize> {
        &self.peak_reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::expanded_window;

    // Overlap record against the expanded form of tight window [10,14]
    // (range 4, midpoint 12)
    fn rec<'a>(read_start: i64, read_end: i64, name: &'a str, peak: &'a str) -> OverlapRecord<'a> {
        let (ws, we) = expanded_window(10, 14, 4);
        OverlapRecord {
            read_start,
            read_end,
            read_name: name,
            window_start: ws,
            window_end: we,
            peak_id: peak,
        }
    }

    #[test]
    fn parse_overlap_line() {
        let line = "chr1\t11\t13\tread_1\t255\t+\tchr1\tmacs\tpeak\t9\t15\t.\t+\t.\tid \"P1\";\t2";
        let fields: Vec<&str> = line.split('\t').collect();
        let r = OverlapRecord::parse(&fields).unwrap();
        assert_eq!(r.read_start, 11);
        assert_eq!(r.read_end, 13);
        assert_eq!(r.read_name, "read_1");
        assert_eq!(r.window_start, 9);
        assert_eq!(r.window_end, 15);
        assert_eq!(r.peak_id, "P1");
    }

    #[test]
    fn parse_rejects_short_line() {
        let fields: Vec<&str> = "chr1\t11\t13".split('\t').collect();
        assert!(OverlapRecord::parse(&fields).is_err());
    }

    #[test]
    fn arrays_have_range_plus_one_entries() {
        for r in [0, 1, 4, 299, 300] {
            let mut acc = CoverageAccumulator::new(r, true);
            assert_eq!(acc.global().len(), r + 1);
            let (ws, we) = expanded_window(1000, 1100, r as i64);
            acc.add(
                &OverlapRecord {
                    read_start: 900,
                    read_end: 1200,
                    read_name: "r",
                    window_start: ws,
                    window_end: we,
                    peak_id: "P",
                },
                &WeightTable::new(),
            );
            assert_eq!(acc.individual().unwrap()["P"].len(), r + 1);
        }
    }

    #[test]
    fn degenerate_records_leave_state_unchanged() {
        let weights = WeightTable::new();
        let mut acc = CoverageAccumulator::new(4, true);
        acc.add(&rec(13, 13, "r1", "P1"), &weights);
        acc.add(&rec(14, 12, "r2", "P1"), &weights);
        assert!(acc.global().iter().all(|x| *x == 0.0));
        assert!(acc.individual().unwrap().is_empty());
        assert!(acc.peak_reads().is_empty());
    }

    #[test]
    fn unique_contained_read() {
        // range 4, tight window [10,14]; read [11,13) covers offsets 1 and 2
        let mut acc = CoverageAccumulator::new(4, false);
        acc.add(&rec(11, 13, "r1", "P1"), &WeightTable::new());
        assert_eq!(acc.global(), &[0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(acc.peak_reads()["P1"], 1);
    }

    #[test]
    fn multi_mapper_fractional_weight() {
        let mut weights = WeightTable::new();
        weights.insert("m".to_owned(), 2);
        let mut acc = CoverageAccumulator::new(4, false);
        acc.add(&rec(12, 13, "u", "P1"), &weights);
        acc.add(&rec(12, 13, "m", "P1"), &weights);
        assert_eq!(acc.global()[2], 1.5);
    }

    #[test]
    fn accumulation_is_order_independent() {
        let mut weights = WeightTable::new();
        weights.insert("m".to_owned(), 4);
        let recs = [
            rec(11, 13, "u1", "P1"),
            rec(5, 100, "m", "P2"),
            rec(13, 15, "u2", "P1"),
        ];
        let mut fwd = CoverageAccumulator::new(4, true);
        for r in recs.iter() {
            fwd.add(r, &weights);
        }
        let mut rev = CoverageAccumulator::new(4, true);
        for r in recs.iter().rev() {
            rev.add(r, &weights);
        }
        assert_eq!(fwd.global(), rev.global());
        assert_eq!(fwd.peak_reads(), rev.peak_reads());
        assert_eq!(
            fwd.individual().unwrap()["P1"],
            rev.individual().unwrap()["P1"]
        );
    }

    #[test]
    fn read_spanning_window_covers_every_offset() {
        let mut acc = CoverageAccumulator::new(4, false);
        acc.add(&rec(5, 100, "r1", "P1"), &WeightTable::new());
        assert_eq!(acc.global(), &[1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn read_in_inflated_margin_only_counts_no_coverage() {
        // Position 9 lies in the expanded window [9,15] but outside the
        // tight window [10,14]
        let mut acc = CoverageAccumulator::new(4, false);
        acc.add(&rec(9, 10, "r1", "P1"), &WeightTable::new());
        assert!(acc.global().iter().all(|x| *x == 0.0));
        assert_eq!(acc.peak_reads()["P1"], 1);
    }

    #[test]
    fn individual_disabled_keeps_no_per_peak_state() {
        let mut acc = CoverageAccumulator::new(4, false);
        for i in 0..10 {
            acc.add(&rec(10, 14, "r", if i % 2 == 0 { "P1" } else { "P2" }), &WeightTable::new());
        }
        assert!(acc.individual().is_none());
        assert_eq!(acc.peak_reads()["P1"], 5);
    }
}
