use std::time::Instant;
use std::{env, process};

use gymno_db::{utils, GymnoBase, ProgramError, Table};
use getopts::Options;
use tracing::info;

//-----------------------------------------------------------------------------

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn run() -> Result<(), ProgramError> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = match Config::new()? {
        Some(config) => config,
        None => return Ok(()),
    };
    utils::init_logging(config.verbose, config.trace);

    // Rebuild the table.
    let mut database = GymnoBase::open(&config.db_file)?;
    let stats = database.load_tair10_orthologs(&config.orthologs_file)?;
    info!("Read {} records and inserted {} rows", stats.records, stats.inserted);
    info!("Table {} contains {} rows", Table::Tair10Orthologs.name(), database.row_count(Table::Tair10Orthologs)?);
    info!("Database size: {}", database.file_size().unwrap_or(String::from("unknown")));

    let seconds = start_time.elapsed().as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub db_file: String,
    pub orthologs_file: String,
    pub verbose: bool,
    pub trace: bool,
}

impl Config {
    pub fn new() -> Result<Option<Config>, ProgramError> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} --db FILE (--tair10_orthologs | --alignment) FILE[.gz] [options]", program);

        let mut opts = Options::new();
        opts.optopt("", "db", "database file (created if missing)", "FILE");
        opts.optopt("", "tair10_orthologs", "TAIR10 ortholog CSV file, possibly gzip-compressed", "FILE");
        opts.optopt("", "alignment", "same as --tair10_orthologs", "FILE");
        utils::add_common_options(&mut opts);
        let matches = match utils::parse_options(&opts, &args[1..], &header)? {
            Some(matches) => matches,
            None => return Ok(None),
        };

        let db_file = utils::required_option(&matches, "db")?;
        let orthologs_file = utils::required_option_of(&matches, &["tair10_orthologs", "alignment"])?;
        let (verbose, trace) = utils::logging_options(&matches)?;

        Ok(Some(Config { db_file, orthologs_file, verbose, trace }))
    }
}

//-----------------------------------------------------------------------------
