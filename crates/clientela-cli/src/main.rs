mod config;
mod logging;
mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clientela_core::Cedula;
use clientela_generate::GenerationError;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Generation(#[from] GenerationError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{0}")]
    RunFailed(String),
    #[error("{invalid} of {total} identifiers are invalid")]
    InvalidIdentifiers { invalid: usize, total: usize },
}

#[derive(Parser, Debug)]
#[command(
    name = "clientela",
    version,
    about = "Synthetic Ecuadorian customer records"
)]
struct Cli {
    /// Log filter (e.g. `info`, `clientela_generate=debug`); overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
    /// Also append JSON logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate customer records into a CSV file.
    Generate(GenerateArgs),
    /// Check cédula numbers.
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Number of records (0 = run until Ctrl-C). Default 100000.
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    pub count: Option<String>,
    /// Email domain, or `random` for a common provider per record.
    #[arg(long, value_name = "random|DOMAIN")]
    pub domain: Option<String>,
    /// Destination CSV file. Default `clientes.csv`.
    #[arg(long, short, value_name = "PATH")]
    pub out: Option<PathBuf>,
    /// Directory holding the reference files. Default `.`.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
    /// Male given names, one per line.
    #[arg(long, value_name = "PATH")]
    pub male_names: Option<PathBuf>,
    /// Female given names, one per line.
    #[arg(long, value_name = "PATH")]
    pub female_names: Option<PathBuf>,
    /// Surnames, one per line.
    #[arg(long, value_name = "PATH")]
    pub surnames: Option<PathBuf>,
    /// Province/canton/parish CSV with a header row.
    #[arg(long, value_name = "PATH")]
    pub locations: Option<PathBuf>,
    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Log progress every N records. Default 1000.
    #[arg(long, value_name = "N")]
    pub progress_every: Option<u64>,
    /// Write the run summary as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
    /// TOML file with defaults for the options above.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(required = true, value_name = "CEDULA")]
    cedulas: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    match cli.command {
        Command::Generate(args) => run::run_generate(args).await,
        Command::Validate(args) => run_validate(&args),
    }
}

fn run_validate(args: &ValidateArgs) -> Result<(), CliError> {
    let total = args.cedulas.len();
    let mut invalid = 0;
    for value in &args.cedulas {
        match Cedula::parse(value) {
            Ok(cedula) => println!(
                "{cedula}: valid (province {:02})",
                cedula.province_code()
            ),
            Err(err) => {
                invalid += 1;
                println!("{value}: invalid ({err})");
            }
        }
    }

    tracing::info!(event = "validation_finished", checked = total, invalid);
    if invalid > 0 {
        return Err(CliError::InvalidIdentifiers { invalid, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_flags_parse() {
        let cli = Cli::try_parse_from([
            "clientela",
            "--log-level",
            "debug",
            "generate",
            "--count",
            "-3",
            "--domain",
            "example.org",
            "-o",
            "out.csv",
        ])
        .expect("parse");
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.count.as_deref(), Some("-3"));
                assert_eq!(args.domain.as_deref(), Some("example.org"));
                assert_eq!(args.out, Some(PathBuf::from("out.csv")));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn validate_counts_invalid_identifiers() {
        let args = ValidateArgs {
            cedulas: vec!["1710034065".to_string(), "1710034064".to_string()],
        };
        assert!(matches!(
            run_validate(&args),
            Err(CliError::InvalidIdentifiers {
                invalid: 1,
                total: 2
            })
        ));
    }
}
