//! Haplotype counts for the loci in a `.loci` file.
//!
//! A `.loci` file lists the aligned sequences of each locus followed by a marker line:
//!
//! ```text
//! taxonA ACGT
//! taxonB ACGA
//! //--*|loc1|
//! ```
//!
//! A data line is `<taxon_id><spaces><sequence>`, where the sequence is the text after the last space.
//! A marker line is `//<variant_string>|<locus_id>|` and terminates the current locus.
//! The number of haplotypes of a locus is the number of distinct sequences in its data lines.
//! Data lines after the last marker do not belong to any locus and are ignored.

use crate::{formats, utils, ProgramError};

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;

use tracing::{info, trace, warn};

//-----------------------------------------------------------------------------

/// Format name used in error messages.
const FORMAT: &str = "loci";

/// Prefix of marker lines.
const MARKER_PREFIX: &str = "//";

/// The haplotype count of a locus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocusHaplotypes {
    pub locus_id: String,
    pub haplotypes: usize,
}

// Line parser for `.loci` files.
struct LociParser {
    marker: Regex,
    data: Regex,
}

impl LociParser {
    fn new() -> Result<Self, regex::Error> {
        let marker = Regex::new(r"^//(.*)\|(.*)\|$")?;
        let data = Regex::new(r"^(.*) (.*)$")?;
        Ok(LociParser { marker, data })
    }

    // Returns `(variant_string, locus_id)` for a marker line.
    fn marker<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.marker.captures(line)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
    }

    // Returns `(taxon_id, sequence)` for a data line.
    fn data<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.data.captures(line)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
    }
}

//-----------------------------------------------------------------------------

/// Counts the haplotypes of each locus in the file.
///
/// The loci are returned in file order.
/// If a locus identifier occurs more than once, the locus keeps its first position and gets the last count.
/// Blank lines are ignored.
///
/// # Errors
///
/// Returns [`ProgramError::Format`] if a line starting with `//` is not a valid marker or a data line has no space.
/// Passes through file errors.
pub fn count_haplotypes<P: AsRef<Path>>(filename: P) -> Result<Vec<LocusHaplotypes>, ProgramError> {
    let filename = filename.as_ref();
    info!("Counting haplotypes in {}", filename.display());
    let parser = LociParser::new().map_err(|x| ProgramError::Argument(format!("Invalid loci pattern: {}", x)))?;
    let mut reader = utils::open_file(filename)?;

    let mut result: Vec<LocusHaplotypes> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut pending: Vec<String> = Vec::new();
    let mut line_num: usize = 0;
    while let Some(line) = utils::read_line(reader.as_mut(), filename)? {
        line_num += 1;
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(MARKER_PREFIX) {
            pending.push(line);
            continue;
        }

        let (variants, locus_id) = parser.marker(&line).ok_or_else(|| ProgramError::format(filename, FORMAT))?;
        let haplotypes = {
            let mut sequences: HashSet<&str> = HashSet::new();
            for data_line in pending.iter() {
                let (_, sequence) = parser.data(data_line).ok_or_else(|| ProgramError::format(filename, FORMAT))?;
                sequences.insert(sequence);
            }
            sequences.len()
        };
        trace!("Line {}: locus {} with variants {} has {} haplotypes", line_num, locus_id, variants, haplotypes);

        match positions.get(locus_id) {
            Some(&position) => result[position].haplotypes = haplotypes,
            None => {
                positions.insert(locus_id.to_string(), result.len());
                result.push(LocusHaplotypes { locus_id: locus_id.to_string(), haplotypes });
            },
        }
        pending.clear();
    }

    if !pending.is_empty() {
        warn!("Ignoring {} data lines after the last locus marker", pending.len());
    }
    info!("Found {} loci in {} lines", result.len(), line_num);
    Ok(result)
}

/// Writes the haplotype counts as CSV sorted by the number of haplotypes.
///
/// The sort is stable: loci with the same count stay in the given order.
/// The file is gzip-compressed if the name ends with `.gz`.
pub fn write_haplotype_stats<P: AsRef<Path>>(loci: &[LocusHaplotypes], filename: P) -> Result<(), ProgramError> {
    let filename = filename.as_ref();
    let mut sorted: Vec<&LocusHaplotypes> = loci.iter().collect();
    sorted.sort_by_key(|locus| locus.haplotypes);

    let mut output = utils::OutputFile::create(filename)?;
    formats::write_haplotype_header(&mut output).map_err(|x| ProgramError::write(filename, x))?;
    for locus in sorted {
        formats::write_haplotype_row(&mut output, locus.haplotypes, &locus.locus_id).map_err(|x| ProgramError::write(filename, x))?;
    }
    output.finish().map_err(|x| ProgramError::write(filename, x))?;

    info!("Wrote haplotype statistics for {} loci to {}", loci.len(), filename.display());
    Ok(())
}

/// Counts the haplotypes in `loci_file` and writes the statistics to `stats_file`.
pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(loci_file: P, stats_file: Q) -> Result<Vec<LocusHaplotypes>, ProgramError> {
    let loci = count_haplotypes(loci_file)?;
    write_haplotype_stats(&loci, stats_file)?;
    Ok(loci)
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use tempfile::TempDir;

    fn create_loci_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let filename = dir.path().join("input.loci");
        let result = fs::write(&filename, content);
        assert!(result.is_ok(), "Failed to write the loci file: {}", result.unwrap_err());
        filename
    }

    fn count(content: &str) -> Result<Vec<LocusHaplotypes>, ProgramError> {
        let dir = tempfile::tempdir().unwrap();
        let filename = create_loci_file(&dir, content);
        count_haplotypes(&filename)
    }

    fn locus(locus_id: &str, haplotypes: usize) -> LocusHaplotypes {
        LocusHaplotypes { locus_id: locus_id.to_string(), haplotypes }
    }

    const TWO_LOCI: &str = "taxonA ACGT\ntaxonB ACGT\ntaxonC ACGA\n//--*|loc1|\ntaxonA TTTT\ntaxonB TTTC\n//--|loc2|\n";

    #[test]
    fn distinct_sequences() {
        let loci = count(TWO_LOCI);
        assert!(loci.is_ok(), "Failed to count haplotypes: {}", loci.unwrap_err());
        assert_eq!(loci.unwrap(), vec![locus("loc1", 2), locus("loc2", 2)]);
    }

    #[test]
    fn sequence_after_last_space() {
        let content = "taxon A    ACGT\ntaxonB      ACGT\ntaxonC AC-T\n//  -|7|\n";
        let loci = count(content).unwrap();
        assert_eq!(loci, vec![locus("7", 2)]);
    }

    #[test]
    fn empty_locus() {
        let content = "//|empty|\ntaxonA AAAA\n//-|one|\n";
        let loci = count(content).unwrap();
        assert_eq!(loci, vec![locus("empty", 0), locus("one", 1)]);
    }

    #[test]
    fn trailing_partial_locus() {
        let content = "taxonA AAAA\n//-|one|\ntaxonA CCCC\ntaxonB GGGG\n";
        let loci = count(content).unwrap();
        assert_eq!(loci, vec![locus("one", 1)]);
    }

    #[test]
    fn repeated_locus_id() {
        let content = "taxonA AAAA\n//-|x|\ntaxonA CCCC\n//-|y|\ntaxonA AAAA\ntaxonB CCCC\n//-|x|\n";
        let loci = count(content).unwrap();
        assert_eq!(loci, vec![locus("x", 2), locus("y", 1)]);
    }

    #[test]
    fn invalid_lines() {
        let result = count("taxonA AAAA\n//-|missing-bar\n");
        assert_eq!(result.map_err(|x| x.code()), Err("F006"), "Accepted an invalid marker");
        let result = count("taxonA\n//-|one|\n");
        assert_eq!(result.map_err(|x| x.code()), Err("F006"), "Accepted a data line without a sequence");
    }

    #[test]
    fn sorted_output() {
        let dir = tempfile::tempdir().unwrap();
        let content = "a AAAA\nb CCCC\nc GGGG\n//-|three|\na AAAA\n//-|one|\na AAAA\nb CCCC\n//-|two|\na TTTT\n//-|another|\n";
        let loci_file = create_loci_file(&dir, content);
        let stats_file = dir.path().join("stats.csv");
        let result = process(&loci_file, &stats_file);
        assert!(result.is_ok(), "Failed to process the loci file: {}", result.unwrap_err());

        let expected = "\"haplotype number\",\"locus identification\"\n\
            1,\"locus_one\"\n\
            1,\"locus_another\"\n\
            2,\"locus_two\"\n\
            3,\"locus_three\"\n";
        assert_eq!(fs::read_to_string(&stats_file).unwrap(), expected);
    }

    #[test]
    fn latin1_locus_id() {
        let dir = tempfile::tempdir().unwrap();
        let loci_file = dir.path().join("input.loci");
        let content: Vec<u8> = [&b"a AAAA\n//-|Pin"[..], &[0xFAu8][..], &b"s|\n"[..]].concat();
        fs::write(&loci_file, &content).unwrap();
        let stats_file = dir.path().join("stats.csv");
        let result = process(&loci_file, &stats_file);
        assert!(result.is_ok(), "Failed to process the loci file: {}", result.unwrap_err());
        assert_eq!(result.unwrap(), vec![locus("Pinús", 1)]);

        let expected: Vec<u8> = [
            &b"\"haplotype number\",\"locus identification\"\n1,\"locus_Pin"[..],
            &[0xFAu8][..],
            &b"s\"\n"[..],
        ].concat();
        assert_eq!(fs::read(&stats_file).unwrap(), expected, "The output is not ISO-8859-1");
    }

    #[test]
    fn header_only_output() {
        let dir = tempfile::tempdir().unwrap();
        let stats_file = dir.path().join("stats.csv");
        write_haplotype_stats(&[], &stats_file).unwrap();
        assert_eq!(fs::read_to_string(&stats_file).unwrap(), "\"haplotype number\",\"locus identification\"\n");
    }
}

//-----------------------------------------------------------------------------
