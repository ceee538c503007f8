use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rnd_core::store::{MemoryStoreFactory, StoreConfig, StoreRegistry};
use rnd_core::{
    AssessmentInput, AssessmentKey, CreditEngine, EngineConfig, MemoizedEngine, StateCreditTable,
};
use rnd_data::{AssessmentLoader, ConfigLoader, StateCreditLoader, builtin_state_table, init_logging};
use tracing::{debug, info};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// R&D tax credit calculator.
///
/// Reads assessment snapshots as JSON, runs the credit engine and prints the
/// results as JSON on stdout. Log output goes to stderr.
#[derive(Debug, Parser)]
#[command(name = "rnd-credit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter: a bare level ("debug") or any RUST_LOG directive.
    /// Defaults to RUST_LOG, then "info".
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate credits for one or more assessment snapshots.
    Calculate(CalculateArgs),

    /// Print the state credit reference table.
    States(StatesArgs),
}

#[derive(Debug, Args)]
struct CalculateArgs {
    /// Assessment JSON file; `-` reads stdin. Repeat for several snapshots.
    #[arg(short, long = "input", required = true)]
    inputs: Vec<PathBuf>,

    /// State credit CSV replacing the built-in table.
    #[arg(short, long)]
    states: Option<PathBuf>,

    /// Engine configuration TOML.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store results under this tenant (requires --client).
    #[arg(long, requires = "client")]
    tenant: Option<String>,

    /// Client identifier used with --tenant.
    #[arg(long, requires = "tenant")]
    client: Option<String>,
}

#[derive(Debug, Args)]
struct StatesArgs {
    /// State credit CSV replacing the built-in table.
    #[arg(short, long)]
    states: Option<PathBuf>,
}

// ─── helpers ─────────────────────────────────────────────────────────────────

fn load_states(path: Option<&Path>) -> Result<Arc<StateCreditTable>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open: {}", path.display()))?;
            let version = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom".to_string());
            let table = StateCreditLoader::load(&version, file)
                .with_context(|| format!("Failed to load state credits: {}", path.display()))?;
            Ok(Arc::new(table))
        }
        None => builtin_state_table().context("Built-in state credit table is invalid"),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_input(path: &Path) -> Result<AssessmentInput> {
    if path == Path::new("-") {
        return AssessmentLoader::parse(io::stdin().lock())
            .context("Failed to parse assessment from stdin");
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    AssessmentLoader::parse(file)
        .with_context(|| format!("Failed to parse assessment: {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("Failed to write JSON")?;
    writeln!(stdout)?;
    Ok(())
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn calculate(args: CalculateArgs) -> Result<()> {
    let states = load_states(args.states.as_deref())?;
    let config = load_config(args.config.as_deref())?;
    info!(version = %states.version(), states = states.len(), "state credit table loaded");

    let engine = MemoizedEngine::new(
        CreditEngine::new(config, states).context("Invalid engine configuration")?,
    );

    let key = match (args.tenant, args.client) {
        (Some(tenant), Some(client)) => Some(AssessmentKey::new(tenant, client)),
        _ => None,
    };
    let store = match &key {
        Some(_) => {
            let mut registry = StoreRegistry::new();
            registry.register(Box::new(MemoryStoreFactory));
            let store_config = StoreConfig::default();
            debug!(backend = %store_config.backend, "opening assessment store");
            Some(registry.create(&store_config).await?)
        }
        None => None,
    };

    for path in &args.inputs {
        let input = load_input(path)?;
        let result = engine.calculate(&input);
        info!(
            input = %path.display(),
            qualified = result.is_qualified,
            total_credit = %result.total_credit,
            "assessment calculated"
        );

        match (&store, &key) {
            (Some(store), Some(key)) => {
                let record = store.save(key.clone(), input, (*result).clone()).await?;
                print_json(&record)?;
            }
            _ => print_json(&*result)?,
        }
    }

    Ok(())
}

fn states(args: StatesArgs) -> Result<()> {
    let table = load_states(args.states.as_deref())?;
    let rows: Vec<_> = table.rows().collect();
    info!(version = %table.version(), states = rows.len(), "state credit table");
    print_json(&rows)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    match cli.command {
        Command::Calculate(args) => calculate(args).await,
        Command::States(args) => states(args),
    }
}
