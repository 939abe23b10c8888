use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use matlib_client::models::Unit;
use matlib_client::{Operation, Resource, ResourceClient};
use matlib_core::Strategy;
use matlib_http::{Config, Http};
use matlib_persist::SqliteCache;
use matlib_schema::{Transform, Validate};
use matlib_store::{enqueue_refresh, ResourceStore, TaskQueue};

#[derive(Parser, Debug)]
#[command(name = "matlibctl", version, about = "Materials library client")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Measurement units
    Units {
        #[command(subcommand)]
        command: UnitsCmd,
    },
    /// Local ETag cache maintenance
    Cache {
        #[command(subcommand)]
        command: CacheCmd,
    },
    /// Tail server-push events from a path and print them
    Events {
        /// Path or absolute URL of the event stream
        path: String,
        /// Named events to subscribe to in addition to plain messages
        #[arg(long = "event")]
        events: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum UnitsCmd {
    /// List all units (through the ETag cache)
    Ls,
    /// Refresh the unit store out-of-band and print the new snapshot
    Refresh,
    /// Fetch one unit by id
    Get { id: i64 },
    /// Create a unit
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        label: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 1.0)]
        coefficient: f64,
    },
    /// Update fields on an existing unit
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        coefficient: Option<f64>,
    },
    /// Delete a unit
    Rm { id: i64 },
}

#[derive(Subcommand, Debug)]
enum CacheCmd {
    /// Drop the cached unit collection
    Invalidate,
}

fn init_tracing() {
    let env = std::env::var("MATLIB_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn print_unit(unit: &Unit, output: Output) -> Result<()> {
    match output {
        Output::Human => {
            let id = unit.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "{} • {} • coefficient={}",
                id,
                unit.display_name(),
                unit.coefficient
            );
        }
        Output::Json => {
            println!("{}", serde_json::to_string_pretty(&unit.apply_to(Strategy::Export))?)
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let http = Arc::new(
        Http::new(Config::from_env())?
            .with_unauthorized_hook(|| warn!("session expired; sign in again")),
    );
    let cache = Arc::new(SqliteCache::open_default().context("opening local cache")?);
    let client = Arc::new(ResourceClient::new(http.clone(), cache));

    match cli.command {
        Commands::Units { command } => match command {
            UnitsCmd::Ls => {
                let units = client.fetch_all::<Unit>().await?;
                info!(count = units.count(), "units fetched");
                for unit in &units {
                    print_unit(unit, cli.output)?;
                }
            }
            UnitsCmd::Refresh => {
                let queue = TaskQueue::spawn();
                let store: Arc<ResourceStore<Unit>> = Arc::new(ResourceStore::new());
                let mut epochs = store.subscribe_epoch();
                enqueue_refresh(&queue, client.clone(), store.clone(), "units");
                tokio::time::timeout(std::time::Duration::from_secs(60), epochs.changed())
                    .await
                    .context("refresh did not complete")?
                    .ok();
                for unit in store.snapshot().iter() {
                    print_unit(unit, cli.output)?;
                }
            }
            UnitsCmd::Get { id } => {
                let unit = client.fetch_one::<Unit>(id).await?;
                print_unit(&unit, cli.output)?;
            }
            UnitsCmd::Create { name, label, description, coefficient } => {
                let mut unit = Unit::new();
                unit.name = name;
                unit.label = label;
                unit.description = description;
                unit.coefficient = coefficient;
                let violations = unit.validation_errors();
                if !violations.is_empty() {
                    for violation in &violations {
                        eprintln!("{}: {}", violation.property, violation.message);
                    }
                    bail!("unit is not valid");
                }
                let stored = client.create(&unit).await?;
                print_unit(&stored, cli.output)?;
            }
            UnitsCmd::Update { id, name, label, description, coefficient } => {
                let mut unit = client.fetch_one::<Unit>(id).await?;
                if let Some(name) = name {
                    unit.name = name;
                }
                if let Some(label) = label {
                    unit.label = label;
                }
                if let Some(description) = description {
                    unit.description = Some(description);
                }
                if let Some(coefficient) = coefficient {
                    unit.coefficient = coefficient;
                }
                let violations = unit.validation_errors();
                if !violations.is_empty() {
                    for violation in &violations {
                        eprintln!("{}: {}", violation.property, violation.message);
                    }
                    bail!("unit is not valid");
                }
                let stored = client.update(&unit).await?;
                print_unit(&stored, cli.output)?;
            }
            UnitsCmd::Rm { id } => {
                let mut unit = Unit::new();
                unit.id = Some(id);
                client.destroy(&unit).await?;
                println!("deleted unit {id}");
            }
        },
        Commands::Cache { command } => match command {
            CacheCmd::Invalidate => {
                client.invalidate::<Unit>()?;
                let path = Unit::resource().path_for(Operation::FetchAll, None);
                println!("invalidated cache for {path}");
            }
        },
        Commands::Events { path, events } => {
            let mut stream = http.stream(&path).on_message(|payload| {
                println!("message: {payload}");
            });
            for name in events {
                let label = name.clone();
                stream = stream.on(&name, move |payload| {
                    println!("{label}: {payload}");
                });
            }
            let stream = stream
                .on_error(|err| eprintln!("stream error: {err}"))
                .open();
            info!("event stream open; press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            stream.close();
        }
    }

    Ok(())
}
