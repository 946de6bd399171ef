//! Support for the text formats read and written by the tools.
//!
//! ### Delimited records (reading)
//!
//! The alignment and ortholog files are delimited text with [`SEPARATOR`] between the fields.
//! [`split_fields`] turns a line into whitespace-trimmed fields and checks that enough of them are present.
//!
//! ### Statistics report (writing)
//!
//! The statistics report is a single INI section named [`STATS_SECTION`] with one `key = value` line per counter.
//! [`write_stats_report`] writes the keys in the order of [`STATS_KEYS`], and [`write_stats_file`] writes the report to a file.
//! The key `clusternum_tair10_ortologs` is spelled as downstream readers expect it.
//!
//! ### Haplotype statistics (writing)
//!
//! [`write_haplotype_header`] and [`write_haplotype_row`] write the CSV produced by [`crate::loci`].

use crate::{utils, ProgramError, Statistics};

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Field separator in delimited records.
pub const SEPARATOR: char = ';';

/// Splits a delimited record into whitespace-trimmed fields.
///
/// A trailing `\n` (or `\r\n`) is removed before splitting.
/// Returns [`None`] if there are fewer than `required` fields.
/// Additional fields are kept.
///
/// # Examples
///
/// ```
/// use gymno_db::formats;
///
/// let fields = formats::split_fields("AT1G01010 ; seqA;ath\n", formats::SEPARATOR, 3);
/// assert_eq!(fields, Some(vec![String::from("AT1G01010"), String::from("seqA"), String::from("ath")]));
/// assert_eq!(formats::split_fields("v1\n", formats::SEPARATOR, 6), None);
/// ```
pub fn split_fields(line: &str, separator: char, required: usize) -> Option<Vec<String>> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<String> = line.split(separator).map(|field| field.trim().to_string()).collect();
    if fields.len() < required {
        return None;
    }
    Some(fields)
}

//-----------------------------------------------------------------------------

/// Name of the INI section in the statistics report.
pub const STATS_SECTION: &str = "statistics";

/// Keys of the statistics report in output order.
pub const STATS_KEYS: [&str; 6] = [
    "seqnum_acrogymnospermae",
    "clusternum_total",
    "clusternum_interproscan_annotations",
    "clusternum_emapper_annotations",
    "clusternum_tair10_ortologs",
    "clusternum_without_annotations",
];

/// Writes the statistics report as an INI section.
pub fn write_stats_report<W: Write>(writer: &mut W, stats: &Statistics) -> io::Result<()> {
    writeln!(writer, "[{}]", STATS_SECTION)?;
    for (key, value) in STATS_KEYS.iter().zip(stats.values()) {
        writeln!(writer, "{} = {}", key, value)?;
    }
    Ok(())
}

/// Writes the statistics report to the file, which is gzip-compressed if the name ends with `.gz`.
pub fn write_stats_file<P: AsRef<Path>>(filename: P, stats: &Statistics) -> Result<(), ProgramError> {
    let filename = filename.as_ref();
    let mut output = utils::OutputFile::create(filename)?;
    write_stats_report(&mut output, stats).map_err(|x| ProgramError::write(filename, x))?;
    output.finish().map_err(|x| ProgramError::write(filename, x))?;
    Ok(())
}

//-----------------------------------------------------------------------------

/// Writes the header line of the haplotype statistics CSV.
pub fn write_haplotype_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "\"haplotype number\",\"locus identification\"")
}

/// Writes a row of the haplotype statistics CSV.
///
/// The row is encoded as ISO-8859-1.
pub fn write_haplotype_row<W: Write>(writer: &mut W, haplotypes: usize, locus_id: &str) -> io::Result<()> {
    let row = format!("{},\"locus_{}\"\n", haplotypes, locus_id);
    writer.write_all(&utils::encode_latin1(&row))
}

//-----------------------------------------------------------------------------
