//! Unifying per-cluster consensus FASTA files into a single file.
//!
//! The input directory contains one or more files per cluster, selected by a pattern with a single `*` wildcard, such as `cluster*_consensus.fasta`.
//! The cluster identifier of a file is the part of the file name from the last occurrence of `cluster` to the literal suffix after `*`.
//! For example, file `cluster7_consensus.fasta` has identifier `cluster7`.
//!
//! Each sequence in each selected file is written under a header line with the cluster identifier.
//! Masked bases (`x` or `X`) at either end of the sequence are removed.
//! The original header lines are discarded.

use crate::{utils, ProgramError};

use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::Path;

use glob::Pattern;

use tracing::{info, trace};

//-----------------------------------------------------------------------------

/// Format name used in error messages.
const FORMAT: &str = "FASTA";

/// The part of a file name where the cluster identifier starts.
pub const CLUSTER_PREFIX: &str = "cluster";

/// Counters from [`unify`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnifyStats {
    /// Number of input files.
    pub files: usize,
    /// Number of sequences written.
    pub sequences: usize,
}

/// Writes the sequences of all files in `indir` matching `pattern` to file `out`.
///
/// Files are processed in natural order of their names; see [`natural_cmp`].
/// The output file is gzip-compressed if the name ends with `.gz`.
///
/// # Errors
///
/// Returns [`ProgramError::Argument`] if the pattern does not contain exactly one `*`.
/// Returns [`ProgramError::Format`] if a selected file is not in FASTA format or its name does not contain the cluster identifier.
/// Passes through file errors.
pub fn unify<P: AsRef<Path>, Q: AsRef<Path>>(indir: P, pattern: &str, out: Q) -> Result<UnifyStats, ProgramError> {
    let indir = indir.as_ref();
    let out = out.as_ref();
    let suffix = pattern_suffix(pattern)?;
    let files = select_files(indir, pattern)?;
    info!("Selected {} files matching {} in {}", files.len(), pattern, indir.display());

    let mut stats = UnifyStats::default();
    let mut output = utils::OutputFile::create(out)?;
    for name in files.iter() {
        let cluster_id = cluster_id(name, suffix).ok_or_else(|| ProgramError::format(name, "cluster file name"))?;
        let filename = indir.join(name);
        let sequences = read_sequences(&filename)?;
        trace!("File {}: cluster {} with {} sequences", name, cluster_id, sequences.len());
        for sequence in sequences.iter() {
            let record = format!(">{}\n{}\n", cluster_id, trim_masking(sequence));
            output.write_all(&utils::encode_latin1(&record)).map_err(|x| ProgramError::write(out, x))?;
            stats.sequences += 1;
        }
        stats.files += 1;
    }
    output.finish().map_err(|x| ProgramError::write(out, x))?;

    info!("Wrote {} sequences from {} files to {}", stats.sequences, stats.files, out.display());
    Ok(stats)
}

//-----------------------------------------------------------------------------

/// Returns the literal part of the pattern after the only `*`.
pub fn pattern_suffix(pattern: &str) -> Result<&str, ProgramError> {
    if pattern.matches('*').count() != 1 {
        return Err(ProgramError::Argument(format!("The pattern {} must contain exactly one *.", pattern)));
    }
    let (_, suffix) = pattern.split_once('*').unwrap_or((pattern, ""));
    Ok(suffix)
}

/// Returns the names of the files in the directory that match the pattern in natural order.
pub fn select_files<P: AsRef<Path>>(indir: P, pattern: &str) -> Result<Vec<String>, ProgramError> {
    let indir = indir.as_ref();
    let matcher = Pattern::new(pattern).map_err(
        |x| ProgramError::Argument(format!("Invalid pattern {}: {}", pattern, x))
    )?;

    let mut result: Vec<String> = Vec::new();
    let entries = fs::read_dir(indir).map_err(|x| ProgramError::read(indir, x))?;
    for entry in entries {
        let entry = entry.map_err(|x| ProgramError::read(indir, x))?;
        let is_file = entry.file_type().map(|x| x.is_file()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && matcher.matches(&name) {
            result.push(name);
        }
    }
    result.sort_by(|a, b| natural_cmp(a, b));
    Ok(result)
}

/// Returns the cluster identifier in the file name.
///
/// The identifier starts at the last occurrence of [`CLUSTER_PREFIX`] before `suffix`, and the name must end with `suffix`.
///
/// # Examples
///
/// ```
/// use gymno_db::fasta;
///
/// assert_eq!(fasta::cluster_id("cluster7_consensus.fasta", "_consensus.fasta"), Some("cluster7"));
/// assert_eq!(fasta::cluster_id("run1-cluster12.fa", ".fa"), Some("cluster12"));
/// assert_eq!(fasta::cluster_id("sample7.fa", ".fa"), None);
/// ```
pub fn cluster_id<'a>(file_name: &'a str, suffix: &str) -> Option<&'a str> {
    let stem = file_name.strip_suffix(suffix)?;
    let start = stem.rfind(CLUSTER_PREFIX)?;
    Some(&stem[start..])
}

/// Reads the sequences in a FASTA file.
///
/// Sequence lines following a header line are concatenated.
/// Blank lines are ignored, and an empty file has no sequences.
///
/// # Errors
///
/// Returns [`ProgramError::Format`] if there is a sequence line before the first header line.
/// Passes through file errors.
pub fn read_sequences<P: AsRef<Path>>(filename: P) -> Result<Vec<String>, ProgramError> {
    let filename = filename.as_ref();
    let mut reader = utils::open_file(filename)?;

    let mut result: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    while let Some(line) = utils::read_line(reader.as_mut(), filename)? {
        if line.starts_with('>') {
            if let Some(sequence) = current.take() {
                result.push(sequence);
            }
            current = Some(String::new());
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match current.as_mut() {
            Some(sequence) => sequence.push_str(line),
            None => return Err(ProgramError::format(filename, FORMAT)),
        }
    }
    if let Some(sequence) = current {
        result.push(sequence);
    }

    Ok(result)
}

/// Removes runs of `x` and `X` from both ends of the sequence.
///
/// # Examples
///
/// ```
/// use gymno_db::fasta;
///
/// assert_eq!(fasta::trim_masking("xXACxGTxx"), "ACxGT");
/// assert_eq!(fasta::trim_masking("xxxx"), "");
/// ```
pub fn trim_masking(sequence: &str) -> &str {
    sequence.trim_matches(|c| c == 'x' || c == 'X')
}

//-----------------------------------------------------------------------------

/// Compares strings in natural order.
///
/// Runs of ASCII digits are compared by their numeric values, and other characters are compared as usual.
/// If the numeric values are equal, the shorter run (fewer leading zeros) comes first.
///
/// # Examples
///
/// ```
/// use gymno_db::fasta;
/// use std::cmp::Ordering;
///
/// assert_eq!(fasta::natural_cmp("cluster7.fa", "cluster12.fa"), Ordering::Less);
/// assert_eq!(fasta::natural_cmp("clusterB", "clusterA"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.as_bytes();
    let mut right = b.as_bytes();
    loop {
        match (left.first(), right.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left_len = left.iter().take_while(|c| c.is_ascii_digit()).count();
                let right_len = right.iter().take_while(|c| c.is_ascii_digit()).count();
                let ordering = compare_numbers(&left[..left_len], &right[..right_len]);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left = &left[left_len..];
                right = &right[right_len..];
            },
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(y);
                }
                left = &left[1..];
                right = &right[1..];
            },
        }
    }
}

// Compares two runs of digits by value without overflow.
fn compare_numbers(a: &[u8], b: &[u8]) -> Ordering {
    let a_trimmed = &a[a.iter().take_while(|&&c| c == b'0').count()..];
    let b_trimmed = &b[b.iter().take_while(|&&c| c == b'0').count()..];
    a_trimmed.len().cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
