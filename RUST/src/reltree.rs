use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;
use reltree::terminal::{self, StdinSource, TerminalGuard};
use reltree::{discover, logging, Config, InputHandler, MemoryStore, RecordId, RecordStore, Renderer, TreeState};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CONFIG_FILE: &str = "reltree.toml";

#[derive(Parser, Debug)]
#[command(name = "reltree", version, about = "Browse a record and its relationships as a tree")]
struct Cli {
    /// Record type of the root record (e.g. User)
    #[arg(required_unless_present = "types")]
    type_name: Option<String>,

    /// Id of the root record
    #[arg(required_unless_present = "types")]
    id: Option<String>,

    /// List the record types and their relationships instead of browsing
    #[arg(long)]
    types: bool,

    /// JSON fixture holding the records
    #[arg(short, long)]
    data: PathBuf,

    /// TOML configuration (defaults to ./reltree.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Records fetched per page of a plural relationship
    #[arg(long)]
    page_size: Option<usize>,

    /// Log filter used when RELTREE_LOG is unset
    #[arg(long, default_value = "reltree=info,warn")]
    log_level: String,

    /// Do not write a log file
    #[arg(long)]
    no_log: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.no_log {
        // The browser still works without a log file.
        if let Err(e) = logging::init(&cli.log_level) {
            eprintln!("{} logging disabled: {}", "warning:".yellow().bold(), e);
        }
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(n) = cli.page_size {
        config.page_size = n;
    }
    config.validate()?;

    let store = MemoryStore::from_path(&cli.data)
        .with_context(|| format!("failed to load data file '{}'", cli.data.display()))?;

    if cli.types {
        print_types(&store, &config);
        return Ok(());
    }
    let (Some(type_name), Some(id)) = (cli.type_name, cli.id) else {
        anyhow::bail!("a record type and id are required");
    };

    let mut state = TreeState::open(Arc::new(store), Arc::new(config), &type_name, &RecordId::new(id))?;
    let renderer = Renderer::new();

    let _guard = TerminalGuard::enter().context("failed to prepare terminal")?;
    let mut input = InputHandler::new(StdinSource::spawn().context("failed to read stdin")?);
    let mut stdout = std::io::stdout();

    reltree::run(&mut state, &renderer, &mut input, &mut stdout, terminal::size)?;
    tracing::info!("reltree exiting");
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("failed to load config '{}'", path.display()));
    }

    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.is_file() {
        tracing::debug!(path = %fallback.display(), "using config from working directory");
        return Config::load(fallback).with_context(|| format!("failed to load config '{}'", fallback.display()));
    }
    Ok(Config::default())
}

fn print_types(store: &dyn RecordStore, config: &Config) {
    let types = discover(store, config);
    if types.is_empty() {
        println!("{}", "no record types found".dim());
        return;
    }

    for summary in types {
        println!("{}{}", summary.name.as_str().cyan().bold(), "/".dim());
        for rel in &summary.relationships {
            println!(
                "  {} {} {}",
                format!("{:<10}", rel.macro_kind.as_str()).yellow(),
                format!("{:<20}", format!(":{}", rel.name)).white().bold(),
                format!("-> {} via {}", rel.target, rel.foreign_key).dim(),
            );
        }
        for field in &summary.fields {
            println!("  {}", field.as_str().dim());
        }
    }
}
