//! Gymno-base: the SQLite database shared by the annotation pipeline.
//!
//! This module owns two tables that are rebuilt from delimited text files:
//!
//! * `alignments(variant_id, chromosome_id)` with index `alignments_index` on `variant_id`.
//! * `tair10_orthologs(cluster_id, ortholog_seq_id)` with index `tair10_orthologs_index` on `cluster_id`.
//!
//! A load always drops the table and creates it again, so loading the same file twice gives the same table.
//! The rows and the index are inserted in a single transaction that is committed at the end.
//! If the load fails, the transaction is rolled back and the table stays empty.
//!
//! The statistics query also reads tables that are created elsewhere in the pipeline.
//! See [`GymnoBase::statistics`].

use crate::{formats, utils, ProgramError};

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use tracing::{info, trace};


//-----------------------------------------------------------------------------

/// A table rebuilt by the loaders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    /// Variant alignments to chromosomes.
    Alignments,
    /// TAIR10 orthologs of the clusters.
    Tair10Orthologs,
}

impl Table {
    /// Returns the name of the table.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Alignments => "alignments",
            Table::Tair10Orthologs => "tair10_orthologs",
        }
    }

    /// Returns the names of the columns in order.
    pub fn columns(&self) -> [&'static str; 2] {
        match self {
            Table::Alignments => ["variant_id", "chromosome_id"],
            Table::Tair10Orthologs => ["cluster_id", "ortholog_seq_id"],
        }
    }

    /// Returns the name of the indexed column.
    pub fn key_column(&self) -> &'static str {
        self.columns()[0]
    }

    /// Returns the name of the index on the key column.
    pub fn index_name(&self) -> &'static str {
        match self {
            Table::Alignments => "alignments_index",
            Table::Tair10Orthologs => "tair10_orthologs_index",
        }
    }

    fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name())
    }

    fn create_statement(&self) -> String {
        let [first, second] = self.columns();
        format!("CREATE TABLE {} ({} TEXT NOT NULL, {} TEXT NOT NULL)", self.name(), first, second)
    }

    fn index_statement(&self) -> String {
        format!("CREATE INDEX {} ON {}({})", self.index_name(), self.name(), self.key_column())
    }

    fn insert_statement(&self) -> String {
        let [first, second] = self.columns();
        format!("INSERT INTO {}({}, {}) VALUES (?1, ?2)", self.name(), first, second)
    }
}

//-----------------------------------------------------------------------------

/// A row of a [`Table`] built from a delimited source record.
///
/// The values are in the order of [`Table::columns`].
pub trait TableRecord: Sized {
    /// The table storing the records.
    const TABLE: Table;

    /// Number of fields a source record must have.
    const FIELDS: usize;

    /// Whether the source file starts with a header line.
    const HEADER: bool;

    /// Builds the record from the fields of a source record.
    ///
    /// There are at least [`Self::FIELDS`] fields.
    fn from_fields(fields: Vec<String>) -> Self;

    /// Returns the column values.
    fn values(&self) -> [&str; 2];
}

/// A row of table `alignments`.
///
/// The source record is `variant_id;chromosome_id;identity;coord1;coord2;e-value`.
/// Only the first two fields are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub variant_id: String,
    pub chromosome_id: String,
}

impl TableRecord for AlignmentRecord {
    const TABLE: Table = Table::Alignments;
    const FIELDS: usize = 6;
    const HEADER: bool = true;

    fn from_fields(fields: Vec<String>) -> Self {
        let mut iter = fields.into_iter();
        let variant_id = iter.next().unwrap_or_default();
        let chromosome_id = iter.next().unwrap_or_default();
        AlignmentRecord { variant_id, chromosome_id }
    }

    fn values(&self) -> [&str; 2] {
        [&self.variant_id, &self.chromosome_id]
    }
}

/// A row of table `tair10_orthologs`.
///
/// The source record is `cluster_id;seq_id;species`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrthologRecord {
    pub cluster_id: String,
    pub ortholog_seq_id: String,
}

impl TableRecord for OrthologRecord {
    const TABLE: Table = Table::Tair10Orthologs;
    const FIELDS: usize = 3;
    const HEADER: bool = false;

    fn from_fields(fields: Vec<String>) -> Self {
        let mut iter = fields.into_iter();
        let cluster_id = iter.next().unwrap_or_default();
        let ortholog_seq_id = iter.next().unwrap_or_default();
        OrthologRecord { cluster_id, ortholog_seq_id }
    }

    fn values(&self) -> [&str; 2] {
        [&self.cluster_id, &self.ortholog_seq_id]
    }
}

/// Counters from a table load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-empty data records read from the source.
    pub records: usize,
    /// Rows inserted into the table.
    pub inserted: usize,
}

/// Counters reported by the statistics writer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub seqnum_acrogymnospermae: usize,
    pub clusternum_total: usize,
    pub clusternum_interproscan_annotations: usize,
    pub clusternum_emapper_annotations: usize,
    pub clusternum_tair10_orthologs: usize,
    pub clusternum_without_annotations: usize,
}

impl Statistics {
    /// Returns the counters in report order.
    pub fn values(&self) -> [usize; 6] {
        [
            self.seqnum_acrogymnospermae,
            self.clusternum_total,
            self.clusternum_interproscan_annotations,
            self.clusternum_emapper_annotations,
            self.clusternum_tair10_orthologs,
            self.clusternum_without_annotations,
        ]
    }
}

//-----------------------------------------------------------------------------

/// A read-write connection to the database.
///
/// The database file is created if it does not exist.
/// Only one writer per database file is assumed.
///
/// # Examples
///
/// ```
/// use gymno_db::{GymnoBase, Table};
/// use std::fs;
///
/// let dir = tempfile::tempdir().unwrap();
/// let csv_file = dir.path().join("orthologs.csv");
/// fs::write(&csv_file, "AT1G01010;seqA;ath\nAT1G01020;seqB;ath\n").unwrap();
///
/// let mut database = GymnoBase::open(dir.path().join("gymno.db")).unwrap();
/// let stats = database.load_tair10_orthologs(&csv_file).unwrap();
/// assert_eq!(stats.inserted, 2);
/// assert_eq!(database.row_count(Table::Tair10Orthologs).unwrap(), 2);
/// assert!(database.has_index(Table::Tair10Orthologs).unwrap());
/// ```
#[derive(Debug)]
pub struct GymnoBase {
    pub(crate) connection: Connection,
}

/// Using the database.
impl GymnoBase {
    /// Sequences of the Acrogymnospermae clade.
    pub const SEQUENCES_TABLE: &'static str = "acrogymnospermae_sequences";

    /// Sequence clusters.
    pub const CLUSTERS_TABLE: &'static str = "clusters";

    /// InterProScan annotations keyed by cluster.
    pub const INTERPROSCAN_TABLE: &'static str = "interproscan_annotations";

    /// eggNOG-mapper annotations keyed by cluster.
    pub const EMAPPER_TABLE: &'static str = "emapper_annotations";

    /// Opens a connection to the database in the given file, creating the file if necessary.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, ProgramError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(&filename, flags)?;
        info!("Opened database {}", filename.as_ref().display());
        Ok(GymnoBase { connection })
    }

    /// Returns `true` if the database file exists.
    pub fn exists<P: AsRef<Path>>(filename: P) -> bool {
        utils::file_exists(filename)
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Drops the table if it exists.
    pub fn drop_table(&self, table: Table) -> Result<(), ProgramError> {
        self.connection.execute(&table.drop_statement(), ())?;
        Ok(())
    }

    /// Creates the table.
    ///
    /// Fails if the table already exists.
    pub fn create_table(&self, table: Table) -> Result<(), ProgramError> {
        self.connection.execute(&table.create_statement(), ())?;
        Ok(())
    }

    /// Creates the index on the key column of the table.
    pub fn create_index(&self, table: Table) -> Result<(), ProgramError> {
        self.connection.execute(&table.index_statement(), ())?;
        Ok(())
    }

    /// Inserts a single record outside any explicit transaction.
    ///
    /// The loaders use a transaction instead.
    pub fn insert<R: TableRecord>(&self, record: &R) -> Result<(), ProgramError> {
        let mut insert = self.connection.prepare_cached(&R::TABLE.insert_statement())?;
        let [first, second] = record.values();
        insert.execute((first, second))?;
        Ok(())
    }

    /// Returns `true` if the table exists.
    pub fn has_table(&self, table: Table) -> Result<bool, ProgramError> {
        self.has_object("table", table.name(), table.name())
    }

    /// Returns `true` if the index on the key column of the table exists.
    pub fn has_index(&self, table: Table) -> Result<bool, ProgramError> {
        self.has_object("index", table.index_name(), table.name())
    }

    fn has_object(&self, object_type: &str, name: &str, table_name: &str) -> Result<bool, ProgramError> {
        let count: usize = self.connection.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2 AND tbl_name = ?3",
            (object_type, name, table_name),
            |row| row.get(0)
        )?;
        Ok(count > 0)
    }

    /// Returns the number of rows in the table.
    pub fn row_count(&self, table: Table) -> Result<usize, ProgramError> {
        let query = format!("SELECT COUNT(*) FROM {}", table.name());
        let count = self.connection.query_row(&query, (), |row| row.get::<_, usize>(0))?;
        Ok(count)
    }

    /// Returns all rows of the table in insertion order.
    pub fn rows(&self, table: Table) -> Result<Vec<(String, String)>, ProgramError> {
        let [first, second] = table.columns();
        let query = format!("SELECT {}, {} FROM {} ORDER BY rowid", first, second, table.name());
        let mut statement = self.connection.prepare(&query)?;
        let mut rows = statement.query(())?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push((row.get(0)?, row.get(1)?));
        }
        Ok(result)
    }
}

//-----------------------------------------------------------------------------

/// Loading tables.
impl GymnoBase {
    /// Rebuilds table `alignments` from the given file.
    ///
    /// The first line of the file is a header.
    /// See [`GymnoBase::load_table`] for details.
    pub fn load_alignments<P: AsRef<Path>>(&mut self, filename: P) -> Result<LoadStats, ProgramError> {
        self.load_table::<AlignmentRecord, P>(filename)
    }

    /// Rebuilds table `tair10_orthologs` from the given file.
    ///
    /// The file has no header.
    /// See [`GymnoBase::load_table`] for details.
    pub fn load_tair10_orthologs<P: AsRef<Path>>(&mut self, filename: P) -> Result<LoadStats, ProgramError> {
        self.load_table::<OrthologRecord, P>(filename)
    }

    /// Rebuilds the table for records of type `R` from the given file.
    ///
    /// The file is ISO-8859-1 text, gzip-compressed if the name ends with `.gz`.
    /// Empty lines are skipped.
    /// The table is dropped and created before reading the file.
    /// The rows and the index are committed in one transaction after the entire file has been read.
    ///
    /// # Errors
    ///
    /// Returns [`ProgramError::Parse`] with the 1-based line number if a record has too few fields.
    /// Passes through file and database errors.
    /// In all cases, nothing is committed after the table was created.
    pub fn load_table<R: TableRecord, P: AsRef<Path>>(&mut self, filename: P) -> Result<LoadStats, ProgramError> {
        let table = R::TABLE;
        let filename = filename.as_ref();
        info!("Rebuilding table {} from {}", table.name(), filename.display());

        self.drop_table(table)?;
        self.create_table(table)?;
        let mut reader = utils::open_file(filename)?;

        let mut stats = LoadStats::default();
        let mut line_num: usize = 0;
        let transaction = self.connection.transaction()?;
        {
            let mut insert = transaction.prepare(&table.insert_statement())?;
            if R::HEADER {
                if let Some(header) = utils::read_line(reader.as_mut(), filename)? {
                    line_num += 1;
                    trace!("Skipping header: {}", header);
                }
            }
            while let Some(line) = utils::read_line(reader.as_mut(), filename)? {
                line_num += 1;
                if line.trim().is_empty() {
                    continue;
                }
                stats.records += 1;
                let fields = formats::split_fields(&line, formats::SEPARATOR, R::FIELDS).ok_or_else(
                    || ProgramError::parse(filename, line_num)
                )?;
                let record = R::from_fields(fields);
                let [first, second] = record.values();
                insert.execute((first, second))?;
                stats.inserted += 1;
                trace!("Record {}: inserted ({}, {})", line_num, first, second);
            }
        }
        transaction.execute(&table.index_statement(), ())?;
        transaction.commit()?;

        info!("Processed {} records; inserted {} rows into {}", stats.records, stats.inserted, table.name());
        info!("Created index {}", table.index_name());
        Ok(stats)
    }
}

//-----------------------------------------------------------------------------

/// Statistics.
impl GymnoBase {
    /// Returns the counters for the statistics report.
    ///
    /// Requires the tables [`Self::SEQUENCES_TABLE`], [`Self::CLUSTERS_TABLE`], [`Self::INTERPROSCAN_TABLE`],
    /// [`Self::EMAPPER_TABLE`], and `tair10_orthologs`.
    /// All tables except the sequence table need a `cluster_id` column.
    ///
    /// * `seqnum_acrogymnospermae`: rows in the sequence table.
    /// * `clusternum_total`: distinct clusters in the cluster table.
    /// * `clusternum_interproscan_annotations`, `clusternum_emapper_annotations`, `clusternum_tair10_orthologs`:
    ///   distinct clusters in each annotation table.
    /// * `clusternum_without_annotations`: clusters that appear in none of the annotation tables.
    ///
    /// # Errors
    ///
    /// Passes through database errors, including missing tables.
    pub fn statistics(&self) -> Result<Statistics, ProgramError> {
        let orthologs = Table::Tair10Orthologs.name();
        let sequences = format!("SELECT COUNT(*) FROM {}", Self::SEQUENCES_TABLE);
        let clusters = Self::distinct_clusters(Self::CLUSTERS_TABLE);
        let interproscan = Self::distinct_clusters(Self::INTERPROSCAN_TABLE);
        let emapper = Self::distinct_clusters(Self::EMAPPER_TABLE);
        let tair10 = Self::distinct_clusters(orthologs);
        let without = format!(
            "SELECT COUNT(DISTINCT cluster_id) FROM {}
            WHERE cluster_id NOT IN (SELECT cluster_id FROM {} WHERE cluster_id IS NOT NULL)
            AND cluster_id NOT IN (SELECT cluster_id FROM {} WHERE cluster_id IS NOT NULL)
            AND cluster_id NOT IN (SELECT cluster_id FROM {} WHERE cluster_id IS NOT NULL)",
            Self::CLUSTERS_TABLE, Self::INTERPROSCAN_TABLE, Self::EMAPPER_TABLE, orthologs
        );

        let stats = Statistics {
            seqnum_acrogymnospermae: self.count(&sequences)?,
            clusternum_total: self.count(&clusters)?,
            clusternum_interproscan_annotations: self.count(&interproscan)?,
            clusternum_emapper_annotations: self.count(&emapper)?,
            clusternum_tair10_orthologs: self.count(&tair10)?,
            clusternum_without_annotations: self.count(&without)?,
        };
        info!("Statistics: {:?}", stats);
        Ok(stats)
    }

    fn distinct_clusters(table_name: &str) -> String {
        format!("SELECT COUNT(DISTINCT cluster_id) FROM {}", table_name)
    }

    // Executes a query returning a single count.
    fn count(&self, query: &str) -> Result<usize, ProgramError> {
        let value = self.connection.query_row(query, (), |row| row.get::<_, usize>(0))?;
        Ok(value)
    }
}

//-----------------------------------------------------------------------------
