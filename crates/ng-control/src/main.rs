//! netgate control-plane admin tool
//!
//! Runs management operations against a JSON account snapshot on behalf of
//! the user named with `--user`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ng_control::auth::{AuthClaims, TracingAuditSink};
use ng_control::service::{CreateSetupKey, PeerChanges, SetupKeyUpdate};
use ng_control::store::{load_snapshot, save_snapshot, InMemoryAccountManager};
use ng_control::ControlState;
use ng_core::config::{self, ControlConfig};

#[derive(Parser)]
#[command(name = "ng-control")]
#[command(author, version, about = "netgate control-plane administration")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the account snapshot (overrides config)
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// User the command runs as
    #[arg(short, long, global = true, env = "NETGATE_USER")]
    user: Option<String>,

    /// Domain for the user's account if it doesn't exist yet
    #[arg(short, long, global = true)]
    domain: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage peers
    #[command(subcommand)]
    Peers(PeerCommands),

    /// Manage setup keys
    #[command(subcommand)]
    Keys(KeyCommands),

    /// Manage users
    #[command(subcommand)]
    Users(UserCommands),
}

#[derive(Subcommand)]
enum PeerCommands {
    /// List peers
    List {
        /// List the peers of this user's account (operators only)
        #[arg(long)]
        user_override: Option<String>,
    },
    /// Show a peer
    Show {
        /// Peer IP
        ip: String,
    },
    /// Update a peer
    Update {
        /// Peer IP
        ip: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        ssh_enabled: Option<bool>,
    },
    /// Delete a peer
    Delete {
        /// Peer IP
        ip: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// List setup keys
    List,
    /// Show a setup key
    Show {
        /// Setup key ID
        id: String,
    },
    /// Create a setup key
    Create {
        #[arg(short, long)]
        name: String,
        /// reusable or one-off
        #[arg(short = 't', long = "type")]
        key_type: String,
        /// Lifetime in seconds; 0 never expires
        #[arg(short, long)]
        expires_in: Option<u64>,
        /// Create the key in this account (operators only)
        #[arg(long)]
        account_override: Option<String>,
        /// Create the key in this user's account (operators only)
        #[arg(long)]
        user_override: Option<String>,
    },
    /// Rename or revoke a setup key
    Update {
        /// Setup key ID
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        revoke: bool,
    },
    /// Redeem a setup key by its secret
    Redeem {
        secret: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users of the account
    List,
}

impl Commands {
    fn is_mutating(&self) -> bool {
        matches!(
            self,
            Commands::Peers(PeerCommands::Update { .. } | PeerCommands::Delete { .. })
                | Commands::Keys(
                    KeyCommands::Create { .. }
                        | KeyCommands::Update { .. }
                        | KeyCommands::Redeem { .. }
                )
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_control_config(cli.config.as_ref())?;
    config.validate().context("Invalid configuration")?;

    let state_path = cli.state.clone().unwrap_or_else(|| config.state_path.clone());
    let manager = Arc::new(
        load_snapshot(&state_path)
            .with_context(|| format!("Failed to load account snapshot from {:?}", state_path))?,
    );

    let state = ControlState::new(config, manager.clone(), Arc::new(TracingAuditSink));

    let claims = cli.user.as_ref().map(|user| {
        let claims = AuthClaims::new(user.as_str());
        match &cli.domain {
            Some(domain) => claims.with_domain(domain.as_str()),
            None => claims,
        }
    });
    let claims = AuthClaims::require(claims.as_ref())?;

    run_and_persist(&state, &manager, &state_path, claims, &cli.command).await
}

/// Run a command, then save the snapshot if anything may have changed
///
/// First contact creates an account even for read-only commands, and a
/// failed command may already have applied part of its changes, so the save
/// happens whether or not the command succeeded.
async fn run_and_persist(
    state: &ControlState,
    manager: &InMemoryAccountManager,
    state_path: &Path,
    claims: &AuthClaims,
    command: &Commands,
) -> Result<()> {
    let accounts_before = manager.len();
    let result = run(state, claims, command).await;

    if command.is_mutating() || manager.len() != accounts_before {
        save_snapshot(state_path, manager)
            .with_context(|| format!("Failed to save account snapshot to {:?}", state_path))?;
        tracing::debug!("Saved {} accounts to {:?}", manager.len(), state_path);
    }

    result
}

fn load_control_config(path: Option<&PathBuf>) -> Result<ControlConfig> {
    if let Some(path) = path {
        return config::load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        Ok(config::load_config(&default_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
            ControlConfig::default()
        }))
    } else {
        tracing::debug!("Using default configuration");
        Ok(ControlConfig::default())
    }
}

async fn run(state: &ControlState, claims: &AuthClaims, command: &Commands) -> Result<()> {
    let service = state.service();
    match command {
        Commands::Peers(cmd) => match cmd {
            PeerCommands::List { user_override } => {
                print_json(&service.list_peers(claims, user_override.as_deref()).await?)
            }
            PeerCommands::Show { ip } => print_json(&service.get_peer(claims, ip).await?),
            PeerCommands::Update {
                ip,
                name,
                ssh_enabled,
            } => {
                let changes = PeerChanges {
                    name: name.clone(),
                    ssh_enabled: *ssh_enabled,
                };
                print_json(&service.update_peer(claims, ip, changes).await?)
            }
            PeerCommands::Delete { ip } => print_json(&service.delete_peer(claims, ip).await?),
        },
        Commands::Keys(cmd) => match cmd {
            KeyCommands::List => print_json(&service.list_setup_keys(claims).await?),
            KeyCommands::Show { id } => print_json(&service.get_setup_key(claims, id).await?),
            KeyCommands::Create {
                name,
                key_type,
                expires_in,
                account_override,
                user_override,
            } => {
                let request = CreateSetupKey {
                    name: name.clone(),
                    key_type: key_type.clone(),
                    expires_in: expires_in.map(Duration::from_secs),
                    account_override: account_override.clone(),
                    user_override: user_override.clone(),
                };
                print_json(&service.create_setup_key(claims, request).await?)
            }
            KeyCommands::Update { id, name, revoke } => {
                let update = SetupKeyUpdate {
                    name: name.clone(),
                    revoked: *revoke,
                };
                print_json(&service.update_setup_key(claims, id, update).await?)
            }
            KeyCommands::Redeem { secret } => {
                print_json(&service.redeem_setup_key(claims, secret).await?)
            }
        },
        Commands::Users(UserCommands::List) => print_json(&service.list_users(claims).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_control::auth::MemoryAuditSink;

    fn state(manager: &Arc<InMemoryAccountManager>) -> ControlState {
        ControlState::new(
            ControlConfig::default(),
            manager.clone(),
            Arc::new(MemoryAuditSink::new()),
        )
    }

    #[tokio::test]
    async fn test_failed_read_still_saves_new_account() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let manager = Arc::new(InMemoryAccountManager::new());

        let command = Commands::Peers(PeerCommands::Show {
            ip: "100.64.0.9".to_string(),
        });
        let result = run_and_persist(
            &state(&manager),
            &manager,
            &path,
            &AuthClaims::new("alice"),
            &command,
        )
        .await;
        assert!(result.is_err());

        let reloaded = load_snapshot(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_mutating_command_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let manager = Arc::new(InMemoryAccountManager::new());
        let state = state(&manager);
        let claims = AuthClaims::new("alice");
        let key = state
            .service()
            .create_setup_key(
                &claims,
                CreateSetupKey {
                    name: "ci".to_string(),
                    key_type: "reusable".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let command = Commands::Keys(KeyCommands::Update {
            id: key.id.clone(),
            name: Some("renamed".to_string()),
            revoke: true,
        });
        run_and_persist(&state, &manager, &path, &claims, &command)
            .await
            .unwrap();

        let reloaded = load_snapshot(&path).unwrap();
        let account = reloaded.accounts().pop().unwrap();
        let stored = account.setup_key(&key.id).unwrap();
        assert!(stored.is_revoked());
        assert_eq!(stored.name, "renamed");
    }
}
