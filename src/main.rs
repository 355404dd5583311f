use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use icann_docs::{
    config::{load_config, Config, CONFIG_ENV},
    fetch::HttpFetcher,
    mirror::Mirror,
    open::{open_document, SystemViewer},
    Family,
};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

/// Command-line access to ICANN SSAC, RSSAC and OCTO documents.
#[derive(Parser)]
#[command(name = "icann", disable_version_flag = true, disable_help_flag = true)]
struct Cli {
    /// Config file to use instead of searching the usual places.
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch SSAC, RSSAC, and OCTO documents
    Mirror,
    /// Open SSAC documents associated with num
    Ssac {
        /// Document number, number with suffix, or `index`
        #[arg(value_name = "num|index")]
        token: String,
    },
    /// Open RSSAC documents associated with num
    Rssac {
        #[arg(value_name = "num|index")]
        token: String,
    },
    /// Open OCTO documents associated with num
    Octo {
        #[arg(value_name = "num|index")]
        token: String,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // ─── 2) help and version end with status 1 ───────────────────────
    let args: Vec<String> = std::env::args().collect();
    let first = args.get(1).map(String::as_str);
    if first == Some("help") || args.iter().any(|a| a == "--help" || a == "-h") {
        Cli::command().print_help()?;
        std::process::exit(1);
    }
    if first == Some("version") || args.iter().any(|a| a == "--version" || a == "-v") {
        println!("icann {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(1);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    // ─── 3) config before any work ───────────────────────────────────
    let config = load_config(cli.config.as_deref())?;
    debug!(config = %config.source.display(), "loaded config");

    // ─── 4) dispatch ─────────────────────────────────────────────────
    match cli.command {
        Commands::Mirror => {
            let fetcher = HttpFetcher::new()?;
            Mirror::new(&fetcher, &config).run_all()?;
        }
        Commands::Ssac { token } => open(&config, Family::Ssac, &token)?,
        Commands::Rssac { token } => open(&config, Family::Rssac, &token)?,
        Commands::Octo { token } => open(&config, Family::Octo, &token)?,
    }
    Ok(())
}

fn open(config: &Config, family: Family, token: &str) -> Result<()> {
    let viewer = SystemViewer::detect()?;
    open_document(&viewer, family, config.dir(family), token)?;
    Ok(())
}
