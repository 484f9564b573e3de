//! Parsing of raw TLE text into (name, line1, line2) triples
//!
//! Feeds mix two layouts: proper 3-line groups, and fragments where a name
//! line is only recognizable after seeing the first element line. The scanner
//! tries the look-back form first and the look-ahead form second; keep that
//! order, reordering changes which line becomes the name on mixed inputs.
//!
//! Every line is right-trimmed, so the column padding CelesTrak puts after
//! names never reaches the store's (name, line1, line2) key.

use super::ElementTriple;

const LINE1_MARKER: &str = "1 ";
const LINE2_MARKER: &str = "2 ";

/// Parse raw TLE text.
///
/// Blank lines are ignored and trailing whitespace (including `\r`) is
/// stripped. Malformed groups and trailing fragments are dropped without
/// error.
pub fn parse_tle_text(text: &str) -> Vec<ElementTriple> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let n = lines.len();
    let mut triples = Vec::with_capacity(n / 3);
    let mut i = 0;

    while i + 1 < n {
        if lines[i].starts_with(LINE1_MARKER) && i >= 1 {
            // Look-back: the prior line names this pair
            triples.push(ElementTriple::new(lines[i - 1], lines[i], lines[i + 1]));
            i += 2;
        } else if i + 2 < n {
            if lines[i + 1].starts_with(LINE1_MARKER) && lines[i + 2].starts_with(LINE2_MARKER) {
                triples.push(ElementTriple::new(lines[i], lines[i + 1], lines[i + 2]));
                i += 3;
            } else {
                i += 1;
            }
        } else {
            break;
        }
    }

    triples
}

/// Serialize triples back into 3-line text, one line per row.
pub fn format_tle_text(triples: &[ElementTriple]) -> String {
    let mut out = String::new();
    for t in triples {
        out.push_str(&t.name);
        out.push('\n');
        out.push_str(&t.line1);
        out.push('\n');
        out.push_str(&t.line2);
        out.push('\n');
    }
    out
}
