//! Utility functions and structures.

use crate::ProgramError;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use getopts::{Matches, Options};

use tracing_subscriber::EnvFilter;

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file name ends with `.gz`.
pub fn is_gzip_name<P: AsRef<Path>>(filename: P) -> bool {
    filename.as_ref().to_string_lossy().ends_with(".gz")
}

/// Returns the last component of the path, or the whole path if there is none.
pub fn base_name<P: AsRef<Path>>(filename: P) -> String {
    let path = filename.as_ref();
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    }
}

/// Returns a buffered reader for the file, which is decompressed if the name ends with `.gz`.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, ProgramError> {
    let file = File::open(&filename).map_err(|x| ProgramError::read(&filename, x))?;
    let inner = BufReader::new(file);
    if is_gzip_name(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

/// Reads the next line from the reader and decodes it as ISO-8859-1.
///
/// The line terminator (`\n` or `\r\n`) is removed.
/// Returns [`None`] at the end of the file.
/// `filename` is only used for error messages.
pub fn read_line<P: AsRef<Path>>(reader: &mut dyn BufRead, filename: P) -> Result<Option<String>, ProgramError> {
    let mut buf: Vec<u8> = Vec::new();
    let len = reader.read_until(b'\n', &mut buf).map_err(|x| ProgramError::read(&filename, x))?;
    if len == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(decode_latin1(&buf)))
}

/// An output file, which is gzip-compressed if the name ends with `.gz`.
///
/// Call [`OutputFile::finish`] to flush the data and to see any errors.
/// Dropping the file without finishing it may lose buffered data silently.
pub enum OutputFile {
    /// Uncompressed output.
    Plain(BufWriter<File>),
    /// Gzip-compressed output.
    Gzip(GzEncoder<BufWriter<File>>),
}

impl OutputFile {
    /// Creates the file, truncating it if it already exists.
    pub fn create<P: AsRef<Path>>(filename: P) -> Result<Self, ProgramError> {
        let file = File::create(&filename).map_err(|x| ProgramError::write(&filename, x))?;
        let inner = BufWriter::new(file);
        if is_gzip_name(&filename) {
            Ok(OutputFile::Gzip(GzEncoder::new(inner, Compression::default())))
        } else {
            Ok(OutputFile::Plain(inner))
        }
    }

    /// Writes the remaining data to the file.
    pub fn finish(self) -> io::Result<()> {
        match self {
            OutputFile::Plain(mut inner) => inner.flush(),
            OutputFile::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Plain(inner) => inner.write(buf),
            OutputFile::Gzip(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(inner) => inner.flush(),
            OutputFile::Gzip(inner) => inner.flush(),
        }
    }
}

//-----------------------------------------------------------------------------

// ISO-8859-1 maps each byte to the code point with the same value.

/// Decodes ISO-8859-1 bytes into a string.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| byte as char).collect()
}

/// Encodes a string as ISO-8859-1.
///
/// Characters outside the character set are replaced with `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars().map(|c| if (c as u32) < 256 { c as u8 } else { b'?' }).collect()
}

//-----------------------------------------------------------------------------

// Command-line options shared by the tools.

/// Adds `--verbose`, `--trace`, and `--help` to the options.
pub fn add_common_options(opts: &mut Options) {
    opts.optflag("h", "help", "print this help");
    opts.optopt("", "verbose", "report progress and counters: Y or N (default: N)", "Y|N");
    opts.optopt("", "trace", "report every record: Y or N (default: N)", "Y|N");
}

/// Parses the arguments or returns [`None`] if the user asked for help.
///
/// The help message is printed to stderr.
pub fn parse_options(opts: &Options, args: &[String], header: &str) -> Result<Option<Matches>, ProgramError> {
    let matches = opts.parse(args).map_err(|x| ProgramError::Argument(x.to_string()))?;
    if matches.opt_present("h") {
        eprint!("{}", opts.usage(header));
        return Ok(None);
    }
    if !matches.free.is_empty() {
        let msg = format!("Unexpected arguments: {}", matches.free.join(" "));
        return Err(ProgramError::Argument(msg));
    }
    Ok(Some(matches))
}

/// Returns the value of a required option.
pub fn required_option(matches: &Matches, option: &str) -> Result<String, ProgramError> {
    matches.opt_str(option).ok_or_else(|| ProgramError::Argument(format!("The option --{} is required.", option)))
}

/// Returns the value of the first given option in `options`, which are alternative names for the same option.
pub fn required_option_of(matches: &Matches, options: &[&str]) -> Result<String, ProgramError> {
    let given: Vec<&str> = options.iter().copied().filter(|option| matches.opt_present(option)).collect();
    if given.len() > 1 {
        return Err(ProgramError::Argument(format!("Options --{} are mutually exclusive.", options.join(" and --"))));
    }
    match given.first() {
        Some(option) => required_option(matches, option),
        None => Err(ProgramError::Argument(format!("One of the options --{} is required.", options.join(", --")))),
    }
}

/// Returns the values of `--verbose` and `--trace`.
pub fn logging_options(matches: &Matches) -> Result<(bool, bool), ProgramError> {
    let verbose = match matches.opt_str("verbose") {
        Some(value) => parse_yes_no("verbose", &value)?,
        None => false,
    };
    let trace = match matches.opt_str("trace") {
        Some(value) => parse_yes_no("trace", &value)?,
        None => false,
    };
    Ok((verbose, trace))
}

/// Parses a `Y`/`N` option value (case insensitive).
pub fn parse_yes_no(option: &str, value: &str) -> Result<bool, ProgramError> {
    match value.to_ascii_uppercase().as_str() {
        "Y" => Ok(true),
        "N" => Ok(false),
        _ => Err(ProgramError::Argument(format!("The value of --{} must be Y or N, not {}.", option, value))),
    }
}

/// Installs a log subscriber writing to stderr.
///
/// The level is `warn` by default, `info` in verbose mode, and `trace` in trace mode.
/// `RUST_LOG` is not consulted.
pub fn init_logging(verbose: bool, trace: bool) {
    let level = if trace {
        "trace"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    #[test]
    fn latin1_codec() {
        let bytes: Vec<u8> = vec![b'P', b'i', b'n', 0xFA, b's'];
        let text = decode_latin1(&bytes);
        assert_eq!(text, "Pinús", "Wrong decoded text");
        assert_eq!(encode_latin1(&text), bytes, "Wrong encoded bytes");
        assert_eq!(encode_latin1("a\u{4e00}b"), b"a?b".to_vec(), "Characters outside the set should become ?");
    }

    #[test]
    fn line_terminators() {
        let data: &[u8] = b"first\r\nsecond\nthird";
        let mut reader: Box<dyn BufRead> = Box::new(data);
        let mut lines = Vec::new();
        while let Some(line) = read_line(reader.as_mut(), "memory").unwrap() {
            lines.push(line);
        }
        assert_eq!(lines, vec!["first", "second", "third"], "Wrong lines");
    }

    #[test]
    fn gzip_output_and_input() {
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("text.txt.gz");
        let mut output = OutputFile::create(&filename).unwrap();
        output.write_all(b"line 1\nline 2\n").unwrap();
        output.finish().unwrap();

        // The file is compressed.
        let mut raw = Vec::new();
        File::open(&filename).unwrap().read_to_end(&mut raw).unwrap();
        assert_eq!(&raw[0..2], &[0x1F, 0x8B], "Missing gzip magic number");

        let mut reader = open_file(&filename).unwrap();
        assert_eq!(read_line(reader.as_mut(), &filename).unwrap(), Some(String::from("line 1")));
        assert_eq!(read_line(reader.as_mut(), &filename).unwrap(), Some(String::from("line 2")));
        assert_eq!(read_line(reader.as_mut(), &filename).unwrap(), None);
    }

    #[test]
    fn missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_file(dir.path().join("missing.csv"));
        assert!(matches!(result, Err(ProgramError::FileRead { .. })), "Expected F001");
        let result = open_file(dir.path().join("missing.csv.gz"));
        assert!(matches!(result, Err(ProgramError::GzipRead { .. })), "Expected F002");
    }

    fn test_options() -> Options {
        let mut opts = Options::new();
        opts.optopt("", "db", "database file", "FILE");
        add_common_options(&mut opts);
        opts
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn command_line_options() {
        let opts = test_options();
        let matches = parse_options(&opts, &args(&["--db", "x.db", "--verbose", "Y"]), "Usage").unwrap();
        assert!(matches.is_some(), "No matches without --help");
        let matches = matches.unwrap();
        assert_eq!(required_option(&matches, "db").unwrap(), "x.db");
        assert_eq!(logging_options(&matches).unwrap(), (true, false));

        let matches = parse_options(&opts, &args(&[]), "Usage").unwrap().unwrap();
        assert_eq!(required_option(&matches, "db").map_err(|x| x.code()), Err("P001"));
        assert_eq!(logging_options(&matches).unwrap(), (false, false));

        let result = parse_options(&opts, &args(&["--db", "x.db", "extra"]), "Usage");
        assert_eq!(result.map_err(|x| x.code()).map(|x| x.is_some()), Err("P001"));
        let result = parse_options(&opts, &args(&["--unknown"]), "Usage");
        assert_eq!(result.map_err(|x| x.code()).map(|x| x.is_some()), Err("P001"));
        let result = parse_options(&opts, &args(&["--help"]), "Usage");
        assert!(matches!(result, Ok(None)), "Expected help");
    }

    #[test]
    fn alternative_option_names() {
        let mut opts = test_options();
        opts.optopt("", "input", "input file", "FILE");
        let names = ["db", "input"];

        let matches = parse_options(&opts, &args(&["--input", "a.csv"]), "Usage").unwrap().unwrap();
        assert_eq!(required_option_of(&matches, &names).unwrap(), "a.csv");
        let matches = parse_options(&opts, &args(&["--db", "b.csv"]), "Usage").unwrap().unwrap();
        assert_eq!(required_option_of(&matches, &names).unwrap(), "b.csv");

        let matches = parse_options(&opts, &args(&[]), "Usage").unwrap().unwrap();
        assert_eq!(required_option_of(&matches, &names).map_err(|x| x.code()), Err("P001"));
        let matches = parse_options(&opts, &args(&["--db", "a", "--input", "b"]), "Usage").unwrap().unwrap();
        assert_eq!(required_option_of(&matches, &names).map_err(|x| x.code()), Err("P001"));
    }

    #[test]
    fn yes_no_values() {
        assert!(parse_yes_no("verbose", "Y").unwrap());
        assert!(parse_yes_no("verbose", "y").unwrap());
        assert!(!parse_yes_no("verbose", "N").unwrap());
        let result = parse_yes_no("trace", "maybe");
        assert!(result.is_err(), "Invalid value was accepted");
        assert_eq!(result.unwrap_err().code(), "P001");
    }
}

//-----------------------------------------------------------------------------
