use std::path::PathBuf;
use std::time::Instant;
use std::{env, process};

use gymno_db::{fasta, utils, ProgramError};
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

    let stats = fasta::unify(&config.indir, &config.pattern, &config.out)?;
    info!("Unified {} sequences from {} files", stats.sequences, stats.files);

    let seconds = start_time.elapsed().as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub indir: PathBuf,
    pub pattern: String,
    pub out: PathBuf,
    pub verbose: bool,
    pub trace: bool,
}

impl Config {
    pub fn new() -> Result<Option<Config>, ProgramError> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} --indir DIR --pattern PATTERN --out FILE [options]", program);

        let mut opts = Options::new();
        opts.optopt("", "indir", "directory of consensus FASTA files", "DIR");
        opts.optopt("", "pattern", "file name pattern with a single * (e.g. cluster*_consensus.fasta)", "PATTERN");
        opts.optopt("", "out", "output FASTA file", "FILE");
        utils::add_common_options(&mut opts);
        let matches = match utils::parse_options(&opts, &args[1..], &header)? {
            Some(matches) => matches,
            None => return Ok(None),
        };

        let indir = PathBuf::from(utils::required_option(&matches, "indir")?);
        let pattern = utils::required_option(&matches, "pattern")?;
        let out = PathBuf::from(utils::required_option(&matches, "out")?);
        let (verbose, trace) = utils::logging_options(&matches)?;

        Ok(Some(Config { indir, pattern, out, verbose, trace }))
    }
}

//-----------------------------------------------------------------------------
