use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use gearing::Result;
use gearing::api::{request_from_json, run_http_server, sample_request};
use gearing::export::{render_table, to_csv_string};

/// Negative-gearing cash-flow and capital-gains projection for up to five
/// leveraged rental properties over a 30-year horizon.
#[derive(Parser, Debug)]
#[command(name = "gearing")]
struct Args {
    /// One of: off, error, warn, info, debug, trace. RUST_LOG takes precedence.
    #[arg(long, global = true, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project a portfolio described by a JSON request file.
    Project {
        /// Request file, or `-` for stdin.
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the projection over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print a request containing one default property.
    Defaults,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.log_level);
    debug!("Log level set to {}", args.log_level);

    match main_inner(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn main_inner(args: Args) -> Result<()> {
    match args.command {
        Command::Project {
            input,
            format,
            output,
        } => {
            let json = read_input(&input)?;
            let request = request_from_json(&json)?;
            let results = request.run()?;
            info!(
                properties = request.properties.len(),
                "projection complete"
            );

            let rendered = match format {
                OutputFormat::Table => render_table(&results),
                OutputFormat::Csv => to_csv_string(&results)?,
                OutputFormat::Json => to_json(&results)?,
            };
            match output {
                Some(path) => {
                    fs::write(&path, rendered)?;
                    info!("wrote {}", path.display());
                }
                None => print!("{rendered}"),
            }
        }
        Command::Serve { port } => run_http_server(port).await?,
        Command::Defaults => println!("{}", to_json(&sample_request())?),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(fs::read_to_string(path)?)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
