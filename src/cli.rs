use clap::Parser;
use std::path::PathBuf;

/// Round Bench - concurrent key/value workload with per-round latency logs
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Folder receiving the description file and the CSV logs
    #[clap(short = 'f', long, default_value = crate::defaults::OUTPUT_FOLDER, help_heading = "Output Options")]
    pub folder: PathBuf,

    /// Prefix shared by the description file and all logs (default: run_<uuid>)
    #[clap(short = 'b', long, help_heading = "Output Options")]
    pub base_filename: Option<String>,

    /// Log file suffix; stats go to <base>_<extension>.log
    #[clap(short = 'e', long, default_value = crate::defaults::FILE_EXTENSION, help_heading = "Output Options")]
    pub extension: String,

    /// Field delimiter for the CSV logs
    #[clap(long, default_value_t = crate::defaults::DELIMITER, value_parser = parse_delimiter, help_heading = "Output Options")]
    pub delimiter: char,

    /// Percentiles reported for each outcome
    #[clap(long, default_values_t = crate::defaults::PERCENTILES.to_vec(), num_args = 1.., help_heading = "Output Options")]
    pub percentiles: Vec<f64>,

    /// Number of worker threads
    #[clap(short = 't', long, default_value_t = crate::utils::get_recommended_threads(), help_heading = "Core Options")]
    pub threads: usize,

    /// Operations per worker thread per round
    #[clap(short = 'n', long = "ops", default_value_t = crate::defaults::OPS_PER_THREAD, help_heading = "Core Options")]
    pub ops_per_thread: usize,

    /// Number of measurement rounds
    #[clap(short = 'r', long, default_value_t = crate::defaults::ROUNDS, help_heading = "Core Options")]
    pub rounds: u64,

    /// Keys are drawn uniformly from 0..key-space
    #[clap(long, default_value_t = crate::defaults::KEY_SPACE, help_heading = "Workload Options")]
    pub key_space: u64,

    /// Size of each stored value in bytes
    #[clap(long, default_value_t = crate::defaults::VALUE_SIZE, help_heading = "Workload Options")]
    pub value_size: usize,

    /// Also record failed operations (get/remove on a missing key)
    #[clap(long, default_value_t = false, help_heading = "Workload Options")]
    pub collect_miss: bool,

    /// Pin worker threads to CPU cores round-robin
    #[clap(long, default_value_t = false, help_heading = "Workload Options")]
    pub pin_cores: bool,

    /// Also write logs to this file (plain text)
    #[clap(long)]
    pub log_file: Option<PathBuf>,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Parse a single-character delimiter. `\t` and `tab` select a tab.
fn parse_delimiter(s: &str) -> Result<char, String> {
    if s == "\\t" || s.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\n' && c != '\r' => Ok(c),
        (Some(_), None) => Err("Delimiter cannot be a line break".to_string()),
        (None, _) => Err("Delimiter cannot be empty".to_string()),
        _ => Err(format!("Delimiter must be a single character, got {:?}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), ',');
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter("TAB").unwrap(), '\t');

        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("\n").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["round-bench"]);

        assert_eq!(args.folder, PathBuf::from(crate::defaults::OUTPUT_FOLDER));
        assert!(args.base_filename.is_none());
        assert_eq!(args.extension, "latency");
        assert_eq!(args.delimiter, ',');
        assert_eq!(args.percentiles, crate::defaults::PERCENTILES.to_vec());
        assert_eq!(args.rounds, crate::defaults::ROUNDS);
        assert!(args.threads > 0);
        assert!(!args.collect_miss);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "round-bench",
            "-t",
            "2",
            "--ops",
            "50",
            "-r",
            "5",
            "--collect-miss",
            "--delimiter",
            ";",
            "--percentiles",
            "50",
            "99.9",
            "-b",
            "nightly",
        ]);

        assert_eq!(args.threads, 2);
        assert_eq!(args.ops_per_thread, 50);
        assert_eq!(args.rounds, 5);
        assert!(args.collect_miss);
        assert_eq!(args.delimiter, ';');
        assert_eq!(args.percentiles, vec![50.0, 99.9]);
        assert_eq!(args.base_filename.as_deref(), Some("nightly"));
    }
}
