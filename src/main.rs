use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use tracing_subscriber::EnvFilter;

use docxref::config::{get_config_path, load_config, load_config_file, save_config, XrefConfig};
use docxref::pipeline::{build_index, load_batch_input, run_batch};
use docxref::report::{format_report_as_json, format_report_as_text};

/// Cross-reference resolver for documentation comments.
#[derive(Parser)]
#[command(name = "docxref", about = "Resolve symbol references in documentation comments")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Project path (default: current directory)
        path: Option<String>,
    },
    /// Resolve every reference in a batch file and print the report
    Resolve {
        /// Batch file with `declarations` and `references`
        input: PathBuf,
        /// Configuration file (default: .docxref/config.json in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
        /// Resolve references in parallel
        #[arg(short, long)]
        parallel: bool,
    },
    /// Show every declaration sharing a name
    Lookup {
        /// Batch file with `declarations`
        input: PathBuf,
        /// Name to look up
        name: String,
        /// Configuration file (default: .docxref/config.json in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so that stdout only carries the report.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> docxref::errors::Result<()> {
    match cli.command {
        Commands::Init { path } => {
            let project_path = resolve_path(path);
            save_config(&project_path, &XrefConfig::default())?;
            println!("Wrote {}", get_config_path(&project_path).display());
        }
        Commands::Resolve {
            input,
            config,
            json,
            parallel,
        } => {
            let mut config = read_config(config.as_deref())?;
            config.parallel |= parallel;
            let batch = load_batch_input(&input)?;
            let report = run_batch(batch, &config)?;
            if json {
                println!("{}", format_report_as_json(&report)?);
            } else {
                print!("{}", format_report_as_text(&report));
            }
        }
        Commands::Lookup {
            input,
            name,
            config,
        } => {
            let config = read_config(config.as_deref())?;
            let batch = load_batch_input(&input)?;
            let index = build_index(batch.declarations, &config)?;
            let set = index.lookup(&name);
            if set.is_empty() {
                println!("No declarations named '{}'", name);
            } else {
                for decl in set.iter() {
                    println!("{} [{}]", decl.describe(), decl.id);
                    if let Some(summary) = &decl.doc_summary {
                        println!("  {}", summary);
                    }
                }
            }
        }
    }
    Ok(())
}

fn read_config(path: Option<&Path>) -> docxref::errors::Result<XrefConfig> {
    match path {
        Some(p) => load_config_file(p),
        None => load_config(&resolve_path(None)),
    }
}

/// Resolves an optional path argument to a `PathBuf`.
///
/// Defaults to the current working directory if no path is provided.
fn resolve_path(path: Option<String>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
