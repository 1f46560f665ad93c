//! Rollcall admin binary: operator commands over the attendance stores.
//!
//! ```text
//! rollcall-admin [config.toml] <command>
//!
//!   migrate            apply pending registry and schema store migrations
//!   check-stores       ping the registry, live state and schema store
//!   live <event>       list participants currently checked in
//!   finalize <event>   reconcile live attendance into the registry
//!   view <event>       print the merged view of an event
//! ```
//!
//! Results are printed to stdout as JSON. Logs go to stderr.

mod config;

use std::process::ExitCode;
use std::sync::Arc;

use rollcall_attendance::{AttendanceError, AttendanceService, StoreContext};
use rollcall_db::{DbPool, MigrationError, PoolError};
use rollcall_live::{LiveStateError, LiveStateStore, MemoryLiveState, RedisLiveState};
use rollcall_schema::{SchemaStoreError, SqliteDocumentStore};
use rollcall_types::EventId;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError, LiveBackend};

const USAGE: &str =
    "usage: rollcall-admin [config.toml] <migrate | check-stores | live <event> | finalize <event> | view <event>>";

#[derive(Debug, Error)]
enum AdminError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("registry pool: {0}")]
    Pool(#[from] PoolError),

    #[error("registry connection: {0}")]
    Connection(#[from] r2d2::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    LiveState(#[from] LiveStateError),

    #[error(transparent)]
    SchemaStore(#[from] SchemaStoreError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),

    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Migrate,
    CheckStores,
    Live(EventId),
    Finalize(EventId),
    View(EventId),
}

impl Command {
    const NAMES: [&'static str; 5] = ["migrate", "check-stores", "live", "finalize", "view"];

    fn parse(args: &[String]) -> Result<Self, AdminError> {
        let usage = || AdminError::Usage(USAGE.to_string());
        let event = |raw: Option<&String>| -> Result<EventId, AdminError> {
            let raw = raw.ok_or_else(usage)?;
            raw.parse::<i64>()
                .map(EventId)
                .map_err(|_| AdminError::Usage(format!("invalid event id '{raw}'")))
        };

        match args.first().map(String::as_str) {
            Some("migrate") => Ok(Self::Migrate),
            Some("check-stores") => Ok(Self::CheckStores),
            Some("live") => Ok(Self::Live(event(args.get(1))?)),
            Some("finalize") => Ok(Self::Finalize(event(args.get(1))?)),
            Some("view") => Ok(Self::View(event(args.get(1))?)),
            _ => Err(usage()),
        }
    }
}

/// Splits the optional leading config path from the command words.
fn split_args(args: &[String]) -> (Option<&str>, &[String]) {
    match args.first() {
        Some(first) if !Command::NAMES.contains(&first.as_str()) => (Some(first.as_str()), &args[1..]),
        _ => (None, args),
    }
}

fn resolve_config_path(cli: Option<&str>) -> (Option<String>, &'static str) {
    if let Some(path) = cli.filter(|value| !value.trim().is_empty()) {
        return (Some(path.to_string()), "cli-arg");
    }

    if let Ok(path) = std::env::var("ROLLCALL_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Opens the registry pool and applies its migrations.
fn open_registry(config: &Config) -> Result<(DbPool, usize), AdminError> {
    let pool = rollcall_db::create_pool(
        &config.registry.path,
        config.registry.runtime_settings(),
    )?;
    let conn = pool.get()?;
    let applied = rollcall_db::run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "applied registry migrations");
    }
    drop(conn);
    Ok((pool, applied))
}

fn open_live_state(config: &Config) -> Result<Arc<dyn LiveStateStore>, AdminError> {
    Ok(match config.live_state.backend {
        LiveBackend::Redis => Arc::new(RedisLiveState::connect(
            &config.live_state.redis_url,
            config.live_state.runtime_settings(),
        )?),
        LiveBackend::Memory => {
            tracing::warn!("using in-process live state; nothing persists past this command");
            Arc::new(MemoryLiveState::new())
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AdminError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: Command, config: &Config) -> Result<(), AdminError> {
    let (registry, registry_applied) = open_registry(config)?;
    let schema = SqliteDocumentStore::open(
        &config.schema_store.path,
        config.schema_store.runtime_settings(),
    )?;
    let live = open_live_state(config)?;
    let service = AttendanceService::new(StoreContext::new(registry, live, Arc::new(schema)));

    match command {
        Command::Migrate => print_json(&json!({ "registry_migrations_applied": registry_applied })),
        Command::CheckStores => print_json(&service.check_stores()),
        Command::Live(event_id) => {
            let attendees = service.query_live(event_id)?;
            print_json(&json!({
                "event_id": event_id,
                "count": attendees.len(),
                "participants": attendees,
            }))
        }
        Command::Finalize(event_id) => print_json(&service.finalize(event_id)?),
        Command::View(event_id) => print_json(&service.merged_event_view(event_id)?),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config, command_args) = split_args(&args);
    let (resolved_config_path, config_source) = resolve_config_path(cli_config);
    let selected_config_path = resolved_config_path.as_deref().or(Some("rollcall.toml"));

    let config = match config::load_config(selected_config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rollcall-admin: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    let result = Command::parse(command_args).and_then(|command| run(command, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AdminError::Usage(message)) => {
            eprintln!("{message}");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}
