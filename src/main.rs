use clap::error::ErrorKind;
use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;

use is_tls_expiring::config::Config;
use is_tls_expiring::error::{EXIT_ERROR, EXIT_OK};
use is_tls_expiring::CheckError;

const COMMIT: &str = match option_env!("IS_TLS_EXPIRING_COMMIT") {
    Some(commit) => commit,
    None => "NONE",
};

const BUILD_DATE: &str = match option_env!("IS_TLS_EXPIRING_DATE") {
    Some(date) => date,
    None => "UNKNOWN",
};

const EXIT_CODES_HELP: &str = "\
Returns with exit code

- 0 if the certificate of the given hostname will be valid in the given distance from now, or
- 1 if the certificate will not be valid anymore, or
- 2 if the certificate will not be valid yet.

On any other error, the exit code will be 3.

Example:

  is-tls-expiring --in 7d example.com";

#[derive(Parser, Debug)]
#[command(
    author,
    about = "Checks whether the TLS certificates of HOSTNAME are valid some time from now",
    after_help = EXIT_CODES_HELP,
    disable_version_flag = true
)]
struct Cli {
    /// Hostname to check (port 443)
    #[arg(value_name = "HOSTNAME")]
    hosts: Vec<String>,

    /// Check if the certificates are valid in this duration from now [default: 7d]
    #[arg(short = 'i', long = "in", value_name = "DURATION")]
    in_duration: Option<String>,

    /// Prints verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prints the version and exits
    #[arg(short = 'V', long)]
    version: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp) => {
            eprint!("{}", e.render());
            exit(EXIT_OK);
        }
        Err(e) => {
            let _ = e.print();
            exit(EXIT_ERROR);
        }
    };

    if cli.version {
        println!(
            "{} {} ({}), built on {}",
            binary_name(),
            env!("CARGO_PKG_VERSION"),
            COMMIT,
            BUILD_DATE
        );
        exit(EXIT_OK);
    }

    match run(cli) {
        Ok(()) => exit(EXIT_OK),
        Err(e) if e.is_validity_failure() => {
            eprintln!("{}", e);
            exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<(), CheckError> {
    let mut config = Config::default();
    if let Some(path) = &cli.config {
        config = config.merge_with(Config::from_file(path)?);
    }

    let config = config.merge_with(Config::from_cli_args(
        cli.in_duration,
        cli.verbose.then_some(true),
    ));

    init_logger(config.is_verbose());

    let check = config.into_check(cli.hosts)?;
    check.run()
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    // A logger may already be installed when `run` is driven from tests.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}

fn binary_name() -> String {
    let argv0 = std::env::args().next().unwrap_or_default();
    Path::new(&argv0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}
