use std::io::{BufRead, Write};

use anyhow::Context;

use utils::get_next_line;

/// Midpoint of a peak interval as used for window centering
pub fn midpoint(start: i64, end: i64) -> i64 {
    start + (end - start) / 2
}

/// Window bounds written out for intersection.  One position wider than the
/// tight window on each side so the intersection tool does not truncate
/// overlaps at the window edges.
pub fn expanded_window(start: i64, end: i64, range: i64) -> (i64, i64) {
    let mid = midpoint(start, end);
    (mid - range / 2 - 1, mid + range / 2 + 1)
}

/// Tight midpoint-centered bounds used for accumulation, recovered from an
/// expanded window
pub fn tight_window(wstart: i64, wend: i64, range: i64) -> (i64, i64) {
    let mid = midpoint(wstart, wend);
    (mid - range / 2, mid + range / 2)
}

/// Copy peak GFF lines with the coordinate columns replaced by the expanded
/// window bounds.  Input order is preserved; identical windows are not
/// deduplicated.  Returns the number of peaks written.
pub fn write_expanded_peaks<R: BufRead, W: Write>(
    rdr: &mut R,
    wrt: &mut W,
    range: i64,
) -> anyhow::Result<usize> {
    let mut buf = String::new();
    let mut line = 0;
    let mut n_peaks = 0;

    while let Some(fields) = get_next_line(rdr, &mut buf)
        .with_context(|| format!("Error after reading {} lines from peaks file", line))?
    {
        line += 1;
        // Skip comments and short lines
        if fields.len() < 9 || fields[0].starts_with('#') {
            continue;
        }

        let pstart = fields[3]
            .parse::<i64>()
            .with_context(|| format!("line {}: Error reading peak start", line))?;
        let pend = fields[4]
            .parse::<i64>()
            .with_context(|| format!("line {}: Error reading peak end", line))?;

        let (wstart, wend) = expanded_window(pstart, pend, range);
        let ws = wstart.to_string();
        let we = wend.to_string();
        let out_fields: Vec<&str> = fields
            .iter()
            .enumerate()
            .map(|(i, f)| match i {
                3 => ws.as_str(),
                4 => we.as_str(),
                _ => *f,
            })
            .collect();
        writeln!(wrt, "{}", out_fields.join("\t"))
            .with_context(|| "Error writing expanded peaks file")?;
        n_peaks += 1;
    }

    Ok(n_peaks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn midpoint_floors() {
        assert_eq!(midpoint(10, 14), 12);
        assert_eq!(midpoint(10, 15), 12);
        assert_eq!(midpoint(7, 7), 7);
    }

    #[test]
    fn expanded_window_inflation() {
        // mid 12, range 4: tight [10,14], expanded one wider on each side
        assert_eq!(expanded_window(10, 14, 4), (9, 15));
    }

    #[test]
    fn tight_window_recovers_bounds() {
        let (ws, we) = expanded_window(10, 14, 4);
        assert_eq!(tight_window(ws, we, 4), (10, 14));
    }

    #[test]
    fn tight_window_length() {
        for r in [0i64, 4, 100, 300] {
            let (ws, we) = expanded_window(1000, 1200, r);
            let (ts, te) = tight_window(ws, we, r);
            assert_eq!(te - ts, (r / 2) * 2);
        }
    }

    #[test]
    fn expansion_rewrites_coordinate_columns() {
        let gff = "chr1\tmacs\tpeak\t100\t200\t.\t+\t.\tid \"P1\";\n\
                   # comment\n\
                   chr2\tmacs\tpeak\t50\t50\t.\t-\t.\tid \"P2\";\n";
        let mut out = Vec::new();
        let n = write_expanded_peaks(&mut Cursor::new(gff), &mut out, 10).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        // mid 150: [150-5-1, 150+5+1]
        assert_eq!(lines[0], "chr1\tmacs\tpeak\t144\t156\t.\t+\t.\tid \"P1\";");
        assert_eq!(lines[1], "chr2\tmacs\tpeak\t44\t56\t.\t-\t.\tid \"P2\";");
    }
}
