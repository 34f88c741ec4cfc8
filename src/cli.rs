use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::debug;

use crate::client::ReplayClient;
use crate::config::{self, ReportDefinition};
use crate::render;

#[derive(Parser)]
#[command(name = "gridwatch", version)]
#[command(about = "Time-aligned statistics reports from a monitoring API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every metric in a report definition and render the table
    Report {
        /// Path to the TOML report definition
        definition: PathBuf,
        /// JSON file of recorded series to serve the fetches from
        #[arg(long = "replay")]
        replay: PathBuf,
        /// Write the report as CSV to this path instead of printing a table
        #[arg(long = "csv")]
        csv: Option<PathBuf>,
        /// Window in hours ending now, used when the definition sets no window
        #[arg(long = "hours", default_value_t = 6)]
        hours: u64,
        /// Fetch the metrics on parallel threads
        #[arg(long = "parallel")]
        parallel: bool,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the resolved query parameters without fetching anything
    Resolve {
        /// Path to the TOML report definition
        definition: PathBuf,
        /// Print the parameters as JSON
        #[arg(long = "json")]
        json: bool,
        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn configure_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    let _ = builder.try_init();
}

fn apply_default_window(definition: &mut ReportDefinition, hours: u64) {
    if definition.start_time.is_none() && definition.end_time.is_none() {
        let end = Utc::now().timestamp();
        definition.start_time = Some(end - hours as i64 * 3600);
        definition.end_time = Some(end);
        debug!("definition sets no window, reporting on the last {hours}h");
    }
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    match cli.command {
        Commands::Report {
            definition,
            replay,
            csv,
            hours,
            parallel,
            verbose,
        } => {
            configure_logging(verbose);
            let mut definition = config::load_definition(&definition)?;
            if definition.metrics.is_empty() {
                println!("No metrics in the report definition; nothing to fetch.");
                std::process::exit(1);
            }
            apply_default_window(&mut definition, hours);

            let builder = definition.into_builder()?;
            let client = ReplayClient::from_path(&replay)?;
            let table = if parallel {
                builder.run_parallel(&client)?
            } else {
                builder.run(&client)?
            };

            match csv {
                Some(path) => {
                    let file = File::create(&path)?;
                    render::write_csv(&table, file)?;
                    println!("Wrote {} rows to {}", table.timestamps.len(), path.display());
                }
                None => println!("{}", render::render_table(&table)),
            }
        }
        Commands::Resolve {
            definition,
            json,
            verbose,
        } => {
            configure_logging(verbose);
            let definition = config::load_definition(&definition)?;
            let queries = definition.into_builder()?.resolve();
            if json {
                println!("{}", serde_json::to_string_pretty(&queries)?);
            } else {
                println!("{}", render::render_queries(&queries));
            }
        }
    }
    Ok(())
}
