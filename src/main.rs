use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tcprov::config::Config;
use tcprov::error::ProviderError;
use tcprov::provider::Provider;
use tcprov::resource::{self, Applied, Lifecycle, ResourceKind};
use tcprov::schema::AttrMap;
use tcprov::state::{self, InstanceState, StateFile};
use tracing_subscriber::EnvFilter;

/// Manage TencentCloud resources from declarative configuration files
#[derive(Parser, Debug)]
#[command(name = "tcprov", version = tcprov::VERSION, about, long_about = None)]
struct Args {
    /// Region to use
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Base URL replacing the per-service API endpoints
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Log level for debugging (TCPROV_LOG overrides it)
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// State file
    #[arg(long, default_value = "tcprov.state.json", global = true)]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported resource and data source types
    Resources,
    /// Print the schema of a type
    Schema { type_name: String },
    /// Create, update or replace a resource to match a configuration file
    Apply {
        type_name: String,
        name: String,
        /// JSON or YAML attribute file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Re-read resources from the cloud; every state entry when no address is given
    Refresh {
        type_name: Option<String>,
        name: Option<String>,
        /// Concurrent reads
        #[arg(long, default_value_t = 4)]
        parallelism: usize,
    },
    /// Adopt an existing resource into state
    Import {
        type_name: String,
        name: String,
        id: String,
    },
    /// Delete a resource and drop it from state
    Destroy { type_name: String, name: String },
    /// Run a data source query and print the result
    Query {
        type_name: String,
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match EnvFilter::try_from_env("TCPROV_LOG") {
        Ok(filter) => filter,
        Err(_) => match level.directive() {
            Some(directive) => EnvFilter::new(directive),
            None => return Ok(None),
        },
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("tcprov {} started with log level: {:?}", tcprov::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("tcprov").join("tcprov.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tcprov").join("tcprov.log");
    }
    PathBuf::from("tcprov.log")
}

/// Attributes from a `.json`, `.yaml` or `.yml` file
fn load_attributes(path: &Path) -> Result<AttrMap> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {:?}", path))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))?
    };

    match value {
        serde_json::Value::Object(attrs) => Ok(attrs),
        _ => bail!("{:?} must contain an object of attributes", path),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report(address: &str, applied: &Applied) {
    let verb = match applied {
        Applied::Created(_) => "created",
        Applied::Updated(_) => "updated",
        Applied::Replaced(_) => "replaced",
        Applied::Unchanged(_) => "unchanged",
    };
    println!("{}: {} (id: {})", address, verb, applied.state().id);
}

fn list_types() {
    for key in resource::get_all_resource_keys() {
        let Some(def) = resource::get_resource(key) else {
            continue;
        };
        let kind = match def.kind {
            ResourceKind::Resource => "resource",
            ResourceKind::DataSource => "data source",
        };
        println!("{:<36} {:<12} {}", key, kind, def.display_name);
    }
}

async fn refresh_one(provider: &Provider, entry: &InstanceState) -> Result<Option<InstanceState>> {
    let lifecycle = Lifecycle::new(provider, &entry.resource_type)?;
    Ok(lifecycle.read(entry).await?)
}

async fn refresh(
    provider: &Provider,
    state: &mut StateFile,
    only: Option<String>,
    parallelism: usize,
) -> Result<()> {
    let entries: Vec<(String, InstanceState)> = state
        .resources
        .iter()
        .filter(|(address, _)| only.as_deref().map_or(true, |o| o == address.as_str()))
        .map(|(address, entry)| (address.clone(), entry.clone()))
        .collect();

    if let Some(address) = &only {
        if entries.is_empty() {
            bail!("{} is not in state", address);
        }
    }

    let results: Vec<_> = stream::iter(entries)
        .map(|(address, entry)| async move { (address, refresh_one(provider, &entry).await) })
        .buffer_unordered(parallelism.max(1))
        .collect()
        .await;

    let mut failures = 0;
    for (address, result) in results {
        match result {
            Ok(Some(entry)) => {
                println!("{}: refreshed", address);
                state.insert(address, entry);
            },
            Ok(None) => {
                println!("{}: gone, removing from state", address);
                state.remove(&address);
            },
            Err(e) => {
                failures += 1;
                eprintln!("{}: {:#}", address, e);
            },
        }
    }

    if failures > 0 {
        bail!("{} resources failed to refresh", failures);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load();

    match args.command {
        Command::Resources => {
            list_types();
            Ok(())
        },
        Command::Schema { type_name } => {
            let def = resource::get_resource(&type_name).with_context(|| format!("Unknown type {}", type_name))?;
            print_json(&def.schema)
        },
        Command::Apply { type_name, name, config: file } => {
            let attrs = load_attributes(&file)?;
            let provider = config.build_provider(args.region.as_deref(), args.endpoint.as_deref())?;
            let mut state = StateFile::load(&args.state)?;
            let address = state::address(&type_name, &name);

            let lifecycle = Lifecycle::new(&provider, &type_name)?;
            let result = lifecycle.apply(state.get(&address), &attrs).await;
            let applied = match result {
                Ok(applied) => applied,
                Err(e) => {
                    if e.prior_deleted() {
                        state.remove(&address);
                        state.save(&args.state)?;
                    }
                    return Err(e).with_context(|| format!("Failed to apply {}", address));
                },
            };

            report(&address, &applied);
            state.insert(address, applied.into_state());
            state.save(&args.state)?;
            Ok(())
        },
        Command::Refresh { type_name, name, parallelism } => {
            let only = match (type_name, name) {
                (Some(t), Some(n)) => Some(state::address(&t, &n)),
                (None, None) => None,
                _ => bail!("refresh takes both a type and a name, or neither"),
            };
            let provider = config.build_provider(args.region.as_deref(), args.endpoint.as_deref())?;
            let mut state = StateFile::load(&args.state)?;

            let result = refresh(&provider, &mut state, only, parallelism).await;
            state.save(&args.state)?;
            result
        },
        Command::Import { type_name, name, id } => {
            let provider = config.build_provider(args.region.as_deref(), args.endpoint.as_deref())?;
            let mut state = StateFile::load(&args.state)?;
            let address = state::address(&type_name, &name);
            if state.get(&address).is_some() {
                bail!("{} is already in state", address);
            }

            let imported = Lifecycle::new(&provider, &type_name)?
                .import(&id)
                .await
                .with_context(|| format!("Failed to import {}", address))?;

            println!("{}: imported (id: {})", address, imported.id);
            state.insert(address, imported);
            state.save(&args.state)?;
            Ok(())
        },
        Command::Destroy { type_name, name } => {
            let provider = config.build_provider(args.region.as_deref(), args.endpoint.as_deref())?;
            let mut state = StateFile::load(&args.state)?;
            let address = state::address(&type_name, &name);
            let entry = state
                .get(&address)
                .cloned()
                .with_context(|| format!("{} is not in state", address))?;

            Lifecycle::new(&provider, &type_name)?
                .delete(&entry)
                .await
                .with_context(|| format!("Failed to destroy {}", address))?;

            println!("{}: destroyed", address);
            state.remove(&address);
            state.save(&args.state)?;
            Ok(())
        },
        Command::Query { type_name, config: file } => {
            let attrs = load_attributes(&file)?;
            let provider = config.build_provider(args.region.as_deref(), args.endpoint.as_deref())?;
            let result = resource::read_data_source(&provider, &type_name, &attrs)
                .await
                .with_context(|| format!("Failed to query {}", type_name))?;
            print_json(&result)
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level)?;

    if let Err(err) = run(args).await {
        tracing::error!("{:#}", err);
        match err.chain().find_map(|cause| cause.downcast_ref::<ProviderError>()) {
            Some(cause) if err.downcast_ref::<ProviderError>().is_some() => {
                eprintln!("Error: {}", cause.user_message())
            },
            Some(cause) => eprintln!("Error: {}: {}", err, cause.user_message()),
            None => eprintln!("Error: {err:#}"),
        }
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
