//! Structured errors shared by the library and the command-line tools.
//!
//! Every failure is fatal for the current invocation.
//! The tools print the rendered error and exit with a non-zero status.

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::utils;

//-----------------------------------------------------------------------------

/// An error with a stable code and enough context to locate the problem.
///
/// The rendered message starts with `*** ERROR <code>:`.
///
/// # Examples
///
/// ```
/// use gymno_db::ProgramError;
///
/// let err = ProgramError::Parse { file: String::from("a.csv"), record: 2 };
/// assert_eq!(err.code(), "F009");
/// assert_eq!(err.to_string(), "*** ERROR F009: Wrong data format in record 2 of file a.csv.");
/// ```
#[derive(Debug, Error)]
pub enum ProgramError {
    /// Invalid or missing command-line argument.
    #[error("*** ERROR P001: {0}")]
    Argument(String),

    /// A plain file cannot be opened or read.
    #[error("*** ERROR F001: The file {file} can not be opened or read: {source}")]
    FileRead { file: String, source: io::Error },

    /// A gzip-compressed file cannot be opened or read.
    #[error("*** ERROR F002: The GZ compressed file {file} can not be opened or read: {source}")]
    GzipRead { file: String, source: io::Error },

    /// A plain file cannot be created or written.
    #[error("*** ERROR F003: The file {file} can not be written: {source}")]
    FileWrite { file: String, source: io::Error },

    /// A gzip-compressed file cannot be created or written.
    #[error("*** ERROR F004: The GZ compressed file {file} can not be written: {source}")]
    GzipWrite { file: String, source: io::Error },

    /// The file content does not follow the expected format.
    #[error("*** ERROR F006: The format of the file {file} is not {format}.")]
    Format { file: String, format: String },

    /// A record does not have the required fields.
    #[error("*** ERROR F009: Wrong data format in record {record} of file {file}.")]
    Parse { file: String, record: usize },

    /// The database cannot be opened or a statement fails.
    #[error("*** ERROR D001: Database error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl ProgramError {
    /// Returns the code of the error.
    pub fn code(&self) -> &'static str {
        match self {
            ProgramError::Argument(_) => "P001",
            ProgramError::FileRead { .. } => "F001",
            ProgramError::GzipRead { .. } => "F002",
            ProgramError::FileWrite { .. } => "F003",
            ProgramError::GzipWrite { .. } => "F004",
            ProgramError::Format { .. } => "F006",
            ProgramError::Parse { .. } => "F009",
            ProgramError::Store(_) => "D001",
        }
    }

    /// Creates a read error for the file, choosing the gzip variant by the file name.
    pub fn read<P: AsRef<Path>>(filename: P, source: io::Error) -> Self {
        let file = filename.as_ref().display().to_string();
        if utils::is_gzip_name(&filename) {
            ProgramError::GzipRead { file, source }
        } else {
            ProgramError::FileRead { file, source }
        }
    }

    /// Creates a write error for the file, choosing the gzip variant by the file name.
    pub fn write<P: AsRef<Path>>(filename: P, source: io::Error) -> Self {
        let file = filename.as_ref().display().to_string();
        if utils::is_gzip_name(&filename) {
            ProgramError::GzipWrite { file, source }
        } else {
            ProgramError::FileWrite { file, source }
        }
    }

    /// Creates a format error reporting the base name of the file.
    pub fn format<P: AsRef<Path>>(filename: P, format: &str) -> Self {
        ProgramError::Format { file: utils::base_name(filename), format: format.to_string() }
    }

    /// Creates a parse error for the given 1-based record of the file.
    pub fn parse<P: AsRef<Path>>(filename: P, record: usize) -> Self {
        ProgramError::Parse { file: utils::base_name(filename), record }
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_by_file_name() {
        let plain = ProgramError::read("input.csv", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(plain.code(), "F001");
        let gzipped = ProgramError::read("input.csv.gz", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(gzipped.code(), "F002");
        let plain = ProgramError::write("stats.txt", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(plain.code(), "F003");
        let gzipped = ProgramError::write("stats.txt.gz", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(gzipped.code(), "F004");
    }

    #[test]
    fn base_name_in_context() {
        let err = ProgramError::parse("/some/dir/a.csv", 2);
        match &err {
            ProgramError::Parse { file, record } => {
                assert_eq!(file, "a.csv", "Wrong file name in the error");
                assert_eq!(*record, 2, "Wrong record number in the error");
            },
            _ => panic!("Unexpected error: {}", err),
        }
        let err = ProgramError::format("/some/dir/x.fasta", "FASTA");
        assert_eq!(err.to_string(), "*** ERROR F006: The format of the file x.fasta is not FASTA.");
    }
}

//-----------------------------------------------------------------------------
