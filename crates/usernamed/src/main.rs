// # usernamed - Username Registry Daemon
//
// This is a thin integration layer. All validation, uniqueness and storage
// logic lives in username-core; this binary only wires it to a transport.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Opening the configured account store and building the registry once
// 4. Serving requests as newline-delimited JSON on stdin/stdout
//
// ## Configuration
//
// - `USERNAMED_STORE_TYPE`: Type of account store (memory, file)
// - `USERNAMED_STORE_PATH`: Path to the account file (for file store)
// - `USERNAMED_LOG_LEVEL`: trace, debug, info, warn, error
//
// Logs go to stderr so stdout carries responses only.
//
// ## Protocol
//
// One request per line, one response per line:
//
// ```text
// {"type":"register_account","accountId":"6f1c...","username":"alice123"}
// {"success":true,"message":"User account created successfully","accountId":"6f1c...","username":"alice123","errors":[]}
// ```

mod protocol;

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use username_core::{RegistryConfig, StoreConfig, UsernameRegistry};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum UsernamedExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<UsernamedExitCode> for ExitCode {
    fn from(code: UsernamedExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    store_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        Self {
            store_type: env::var("USERNAMED_STORE_TYPE").unwrap_or_else(|_| "memory".to_string()),
            store_path: env::var("USERNAMED_STORE_PATH").ok(),
            log_level: env::var("USERNAMED_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" | "file" => {}
            _ => anyhow::bail!(
                "USERNAMED_STORE_TYPE '{}' is not supported. \
                Supported types: memory, file",
                self.store_type
            ),
        }

        if self.store_type == "file" {
            match self.store_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "USERNAMED_STORE_PATH is required when USERNAMED_STORE_TYPE=file. \
                    Set it via: export USERNAMED_STORE_PATH=/var/lib/usernamed/accounts.json"
                ),
                Some(path) => {
                    if let Some(parent) = std::path::Path::new(path).parent()
                        && !parent.as_os_str().is_empty()
                        && !parent.exists()
                    {
                        anyhow::bail!(
                            "USERNAMED_STORE_PATH parent directory does not exist: {}. \
                            Create it first: sudo mkdir -p {}",
                            parent.display(),
                            parent.display()
                        );
                    }
                }
            }
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "USERNAMED_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build the library configuration
    fn registry_config(&self) -> RegistryConfig {
        let store = match (self.store_type.as_str(), &self.store_path) {
            ("file", Some(path)) => StoreConfig::File { path: path.clone() },
            _ => StoreConfig::Memory,
        };
        RegistryConfig::new().with_store(store)
    }
}

fn main() -> ExitCode {
    let config = Config::from_env();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return UsernamedExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UsernamedExitCode::ConfigError.into();
    }

    info!("Starting usernamed");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UsernamedExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let registry = match UsernameRegistry::from_config(&config.registry_config()).await {
            Ok(registry) => registry,
            Err(e) => {
                error!("Failed to open account store: {}", e);
                return UsernamedExitCode::ConfigError;
            }
        };

        match run_daemon(registry).await {
            Ok(()) => UsernamedExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {}", e);
                UsernamedExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Serve requests until stdin closes or a shutdown signal arrives
async fn run_daemon(registry: UsernameRegistry) -> Result<()> {
    info!("Ready to serve requests on stdin");

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let response = protocol::handle_line(&registry, &line).await;
                let mut json = serde_json::to_string(&response)?;
                json.push('\n');
                stdout.write_all(json.as_bytes()).await?;
                stdout.flush().await?;
            }

            signal = &mut shutdown => {
                match signal {
                    Ok(name) => info!("Received shutdown signal: {}", name),
                    Err(e) => warn!("Signal handler failed: {}", e),
                }
                break;
            }
        }
    }

    registry.flush().await?;
    info!("Shutting down usernamed");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
