// # standingsd - Standings Daemon
//
// This is a THIN integration layer ONLY. All standings logic lives in
// standings-core; the daemon reads configuration, wires components through
// the registry and runs the engine.
//
// The standingsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Registering sources and stores
// 4. Starting the standings engine
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Outcome Source
// - `STANDINGS_SOURCE_TYPE`: Type of outcome source (jsonl)
// - `STANDINGS_SOURCE_PATH`: Path to the result feed file (for jsonl)
// - `STANDINGS_SOURCE_POLL_INTERVAL`: Poll interval in seconds (for jsonl)
//
// ### Leagues
// - `STANDINGS_LEAGUES`: Comma-separated leagues to maintain, either
//   `id` or `id=Display Name`
//
// ### Store
// - `STANDINGS_STORE_TYPE`: Type of standings store (file, memory)
// - `STANDINGS_STORE_PATH`: Path to the state file (for file store)
//
// ### Engine
// - `STANDINGS_MAX_RETRIES`: Maximum rebuild retry attempts
// - `STANDINGS_RETRY_DELAY_SECS`: Delay between rebuild retries
// - `STANDINGS_LOG_LEVEL`: trace, debug, info, warn or error
//
// ## Example
//
// ```bash
// export STANDINGS_SOURCE_TYPE=jsonl
// export STANDINGS_SOURCE_PATH=/var/lib/standings/results.jsonl
// export STANDINGS_LEAGUES="premier-league=Premier League,la-liga=La Liga"
// export STANDINGS_STORE_TYPE=file
// export STANDINGS_STORE_PATH=/var/lib/standings/state.json
//
// standingsd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use standings_core::config::{
    EngineConfig, LeagueConfig, OutcomeSourceConfig, StandingsConfig, StoreConfig,
};
use standings_core::{ComponentRegistry, StandingsEngine};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    source_type: String,
    source_path: Option<String>,
    source_poll_interval: Option<u64>,
    leagues: Vec<(String, Option<String>)>,
    store_type: String,
    store_path: Option<String>,
    max_retries: Option<usize>,
    retry_delay_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            source_type: env::var("STANDINGS_SOURCE_TYPE").unwrap_or_else(|_| "jsonl".to_string()),
            source_path: env::var("STANDINGS_SOURCE_PATH").ok(),
            source_poll_interval: env::var("STANDINGS_SOURCE_POLL_INTERVAL")
                .ok()
                .map(|s| s.parse().unwrap_or(5)),
            leagues: env::var("STANDINGS_LEAGUES")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|entry| match entry.split_once('=') {
                    Some((id, name)) => (id.trim().to_string(), Some(name.trim().to_string())),
                    None => (entry.to_string(), None),
                })
                .collect(),
            store_type: env::var("STANDINGS_STORE_TYPE").unwrap_or_else(|_| "file".to_string()),
            store_path: env::var("STANDINGS_STORE_PATH").ok(),
            max_retries: env::var("STANDINGS_MAX_RETRIES")
                .ok()
                .map(|s| s.parse().unwrap_or(3)),
            retry_delay_secs: env::var("STANDINGS_RETRY_DELAY_SECS")
                .ok()
                .map(|s| s.parse().unwrap_or(5)),
            log_level: env::var("STANDINGS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs comprehensive validation including:
    /// - Required field presence
    /// - League identifier format
    /// - Numeric range validation
    /// - Type enumeration validation
    fn validate(&self) -> Result<()> {
        // Validate source type
        match self.source_type.as_str() {
            "jsonl" => {}
            _ => anyhow::bail!(
                "STANDINGS_SOURCE_TYPE '{}' is not supported. \
                Supported types: jsonl",
                self.source_type
            ),
        }

        if self.source_type == "jsonl" {
            match self.source_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "STANDINGS_SOURCE_PATH is required when STANDINGS_SOURCE_TYPE=jsonl. \
                    Set it via: export STANDINGS_SOURCE_PATH=/var/lib/standings/results.jsonl"
                ),
                Some(_) => {}
            }
        }

        // Validate store type
        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "STANDINGS_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.store_type
            ),
        }

        // Validate leagues
        if self.leagues.is_empty() {
            anyhow::bail!(
                "STANDINGS_LEAGUES must contain at least one league. \
                Set it via: export STANDINGS_LEAGUES=premier-league,la-liga"
            );
        }

        for (id, _) in &self.leagues {
            self.validate_league_id(id)?;
        }

        // Validate state store path for the file store
        if self.store_type == "file" {
            if let Some(ref path) = self.store_path {
                if path.is_empty() {
                    anyhow::bail!(
                        "STANDINGS_STORE_PATH cannot be empty when STANDINGS_STORE_TYPE=file"
                    );
                }

                if let Some(parent) = std::path::Path::new(path).parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    anyhow::bail!(
                        "STANDINGS_STORE_PATH parent directory does not exist: {}. \
                            Create it first: sudo mkdir -p {}",
                        parent.display(),
                        parent.display()
                    );
                }
            } else {
                anyhow::bail!(
                    "STANDINGS_STORE_PATH is required when STANDINGS_STORE_TYPE=file. \
                    Set it via: export STANDINGS_STORE_PATH=/var/lib/standings/state.json"
                );
            }
        }

        // Validate numeric ranges
        if let Some(interval) = self.source_poll_interval
            && !(1..=3600).contains(&interval)
        {
            anyhow::bail!(
                "STANDINGS_SOURCE_POLL_INTERVAL must be between 1 and 3600 seconds. Got: {}",
                interval
            );
        }

        if let Some(max_retries) = self.max_retries
            && max_retries > 10
        {
            anyhow::bail!(
                "STANDINGS_MAX_RETRIES must be between 0 and 10. Got: {}",
                max_retries
            );
        }

        if let Some(retry_delay) = self.retry_delay_secs
            && !(1..=300).contains(&retry_delay)
        {
            anyhow::bail!(
                "STANDINGS_RETRY_DELAY_SECS must be between 1 and 300 seconds. Got: {}",
                retry_delay
            );
        }

        // Validate log level
        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "STANDINGS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Validate that a string is a usable league identifier
    ///
    /// League ids are opaque, but they end up in file contents and log
    /// lines, so basic shape checks catch common configuration mistakes.
    fn validate_league_id(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            anyhow::bail!("League id cannot be empty");
        }

        if id.len() > 128 {
            anyhow::bail!("League id too long: {} chars (max 128). Got: {}", id.len(), id);
        }

        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            anyhow::bail!(
                "League id contains invalid characters: '{}'. \
                Valid: alphanumeric, hyphen, underscore, dot.",
                id
            );
        }

        Ok(())
    }

    /// Build the typed engine configuration
    fn to_standings_config(&self) -> StandingsConfig {
        let source = OutcomeSourceConfig::Jsonl {
            path: self.source_path.clone().unwrap_or_default(),
            poll_interval_secs: self.source_poll_interval.unwrap_or(5),
        };

        let store = match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            _ => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
        };

        let leagues = self
            .leagues
            .iter()
            .map(|(id, name)| {
                let league = LeagueConfig::new(id);
                match name {
                    Some(name) => league.with_name(name),
                    None => league,
                }
            })
            .collect();

        let mut engine = EngineConfig::default();
        if let Some(max_retries) = self.max_retries {
            engine.max_retries = max_retries;
        }
        if let Some(retry_delay_secs) = self.retry_delay_secs {
            engine.retry_delay_secs = retry_delay_secs;
        }

        StandingsConfig {
            source,
            store,
            leagues,
            engine,
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting standingsd daemon");
    info!("Configuration loaded: {} league(s)", config.leagues.len());

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    // Create the component registry with built-in stores
    let registry = ComponentRegistry::with_builtin_stores();

    info!("Registering JSONL outcome source");
    standings_source_jsonl::register(&registry);

    let standings_config = config.to_standings_config();

    info!("Source type: {}", config.source_type);
    info!("Store type: {}", config.store_type);
    for league in &standings_config.leagues {
        info!("Maintaining league: {} ({})", league.id, league.name);
    }

    let source = registry.create_source(&standings_config.source)?;
    let store = registry.create_store(&standings_config.store).await?;

    let (engine, mut event_rx) = StandingsEngine::new(source, store, standings_config)?;

    // Drain engine events into the log
    let event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            info!("engine event: {:?}", event);
        }
    });

    info!("Starting standings engine");
    engine.run().await?;

    event_task.abort();
    Ok(())
}
