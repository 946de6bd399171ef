use std::time::Instant;
use std::{env, process};

use gymno_db::{loci, utils, ProgramError};
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

    let loci = loci::process(&config.loci_file, &config.stats_file)?;
    let max_haplotypes = loci.iter().map(|locus| locus.haplotypes).max().unwrap_or(0);
    info!("{} loci with at most {} haplotypes", loci.len(), max_haplotypes);

    let seconds = start_time.elapsed().as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub loci_file: String,
    pub stats_file: String,
    pub verbose: bool,
    pub trace: bool,
}

impl Config {
    pub fn new() -> Result<Option<Config>, ProgramError> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} --loci_file FILE.loci --stats_file FILE.csv [options]", program);

        let mut opts = Options::new();
        opts.optopt("", "loci_file", "input loci file", "FILE");
        opts.optopt("", "stats_file", "output CSV file with haplotype counts", "FILE");
        utils::add_common_options(&mut opts);
        let matches = match utils::parse_options(&opts, &args[1..], &header)? {
            Some(matches) => matches,
            None => return Ok(None),
        };

        let loci_file = utils::required_option(&matches, "loci_file")?;
        let stats_file = utils::required_option(&matches, "stats_file")?;
        let (verbose, trace) = utils::logging_options(&matches)?;

        Ok(Some(Config { loci_file, stats_file, verbose, trace }))
    }
}

//-----------------------------------------------------------------------------
