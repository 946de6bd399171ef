//! # Gymno-db: ingest and statistics tools for a gymnosperm annotation database.
//!
//! The downstream annotation pipeline stores its data in a SQLite database.
//! This crate rebuilds two tables of that database from delimited text files,
//! computes summary statistics from a prepared database,
//! and provides two file transforms used when preparing the inputs.
//! Each command-line tool in `src/bin` is a thin driver around one of these operations.
//!
//! ### Database
//!
//! See [`GymnoBase`] for the database interface.
//! Table `alignments` is rebuilt from a variant alignment file with [`GymnoBase::load_alignments`],
//! and table `tair10_orthologs` from a TAIR10 ortholog file with [`GymnoBase::load_tair10_orthologs`].
//! Each load drops the table, creates it again, inserts the rows, and creates an index on the key column.
//! The rows and the index are committed together at the end.
//!
//! [`GymnoBase::statistics`] counts sequences and clusters, and [`formats::write_stats_report`] writes the counts as an INI section.
//!
//! ### Transforms
//!
//! * [`loci`]: counts the haplotypes of each locus in a `.loci` file and writes them as CSV.
//! * [`fasta`]: merges per-cluster consensus FASTA files into one file with cluster identifiers as headers.
//!
//! ### Text encoding
//!
//! Input and output files are ISO-8859-1 text, and files with names ending in `.gz` are gzip-compressed.
//! See [`utils`] for the file handling.
//!
//! ### Errors
//!
//! All fallible operations return a [`ProgramError`] with a stable code, such as `F009` for a record with missing fields.

pub mod db;
pub mod error;
pub mod fasta;
pub mod formats;
pub mod loci;
pub mod utils;

pub use db::{GymnoBase, Table, TableRecord, AlignmentRecord, OrthologRecord};
pub use db::{LoadStats, Statistics};
pub use error::ProgramError;
pub use fasta::UnifyStats;
pub use loci::LocusHaplotypes;
