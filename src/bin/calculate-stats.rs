use std::time::Instant;
use std::{env, process};

use gymno_db::{formats, utils, GymnoBase, ProgramError};
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

    // Opening would create an empty database.
    if !GymnoBase::exists(&config.db_file) {
        return Err(ProgramError::Argument(format!("Database {} does not exist.", config.db_file)));
    }
    let database = GymnoBase::open(&config.db_file)?;
    let stats = database.statistics()?;
    formats::write_stats_file(&config.stats_file, &stats)?;
    info!("Wrote statistics to {}", config.stats_file);

    let seconds = start_time.elapsed().as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub db_file: String,
    pub stats_file: String,
    pub verbose: bool,
    pub trace: bool,
}

impl Config {
    pub fn new() -> Result<Option<Config>, ProgramError> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} --db FILE --stats FILE[.gz] [options]", program);

        let mut opts = Options::new();
        opts.optopt("", "db", "database file", "FILE");
        opts.optopt("", "stats", "output statistics file, gzip-compressed if the name ends with .gz", "FILE");
        utils::add_common_options(&mut opts);
        let matches = match utils::parse_options(&opts, &args[1..], &header)? {
            Some(matches) => matches,
            None => return Ok(None),
        };

        let db_file = utils::required_option(&matches, "db")?;
        let stats_file = utils::required_option(&matches, "stats")?;
        let (verbose, trace) = utils::logging_options(&matches)?;

        Ok(Some(Config { db_file, stats_file, verbose, trace }))
    }
}

//-----------------------------------------------------------------------------
