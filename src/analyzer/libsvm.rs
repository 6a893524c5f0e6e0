//! Parser for libsvm-formatted lines: `label idx1:w1 idx2:w2 ...`
//!
//! Indices are 1-based on the wire and shifted down by one internally.

use crate::{Error, Result, TermId};

/// The leading label token of a line
pub fn label(line: &str) -> Result<&str> {
    line.split_whitespace()
        .next()
        .ok_or_else(|| Error::Libsvm("missing label".to_string()))
}

/// Parse the (term, weight) pairs after the label, shifted to 0-based ids
/// and sorted ascending by term id
pub fn counts(line: &str) -> Result<Vec<(TermId, f64)>> {
    let mut fields = line.split_whitespace();
    if fields.next().is_none() {
        return Err(Error::Libsvm("missing label".to_string()));
    }

    let mut counts: Vec<(TermId, f64)> = Vec::new();
    for field in fields {
        let (index, weight) = field
            .split_once(':')
            .ok_or_else(|| Error::Libsvm(format!("missing `:` in `{field}`")))?;
        let index: TermId = index
            .parse()
            .map_err(|_| Error::Libsvm(format!("bad term index `{index}`")))?;
        if index == 0 {
            return Err(Error::Libsvm("term indices are 1-based".to_string()));
        }
        let weight: f64 = weight
            .parse()
            .map_err(|_| Error::Libsvm(format!("bad weight `{weight}`")))?;
        counts.push((index - 1, weight));
    }

    counts.sort_unstable_by_key(|&(term, _)| term);
    if counts.windows(2).any(|pair| pair[0].0 == pair[1].0) {
        return Err(Error::Libsvm("duplicate term index".to_string()));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_and_counts() {
        let line = "+1 3:0.5 1:2.0";
        assert_eq!(label(line).unwrap(), "+1");
        assert_eq!(counts(line).unwrap(), vec![(0, 2.0), (2, 0.5)]);
    }

    #[test]
    fn test_counts_are_sorted() {
        let line = "spam 7:1 2:4 5:0.25";
        assert_eq!(counts(line).unwrap(), vec![(1, 4.0), (4, 0.25), (6, 1.0)]);
    }

    #[test]
    fn test_label_only_line() {
        assert_eq!(counts("label").unwrap(), Vec::new());
    }

    #[test]
    fn test_malformed_lines() {
        assert!(label("").is_err());
        assert!(counts("").is_err());
        assert!(counts("+1 nocolon").is_err());
        assert!(counts("+1 x:1.0").is_err());
        assert!(counts("+1 2:abc").is_err());
        // zero index: libsvm is 1-based
        assert!(counts("+1 0:1.0").is_err());
        assert!(counts("+1 2:1.0 2:3.0").is_err());
    }
}
