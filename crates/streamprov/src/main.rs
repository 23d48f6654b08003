//! streamprov
//!
//! Provisions and reconciles media-server tenants on remote hosts over SSH

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde::Serialize;
use streamprov_core::{FieldChanges, Provisioner, Reconciler, TenantName};
use streamprov_exec::{ExecutionMode, Secret};
use streamprov_inventory::{StaticInventory, ViewerCap};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod factory;

use config::Config;
use factory::DefaultExecutorFactory;

#[derive(Parser)]
#[command(name = "streamprov")]
#[command(about = "Media-server tenant provisioning", long_about = None)]
struct Cli {
    /// Config file (otherwise `STREAMPROV_CONFIG` and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer every remote command from a simulated host
    #[arg(long, global = true)]
    simulate: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a tenant, or update it if already present
    Create {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
        #[command(flatten)]
        limits: Limits,
    },
    /// Apply changed limits to an existing tenant
    Update {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
        #[command(flatten)]
        limits: Limits,
    },
    /// Verify tenants are present, provisioning missing ones
    Sync {
        #[arg(long)]
        host: String,
        /// Only this tenant (default: every tenant in the inventory)
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Remove a tenant's account and directories
    Remove {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
    },
    /// Remove config directories no tenant record claims
    Cleanup {
        #[arg(long)]
        host: String,
    },
    /// List configuration entries on a host
    List {
        #[arg(long)]
        host: String,
    },
    /// Show media server status
    Status {
        #[arg(long)]
        host: String,
    },
    /// Replace a tenant's publish credential
    Password {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
        #[arg(long, env = "STREAMPROV_NEW_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Copy a tenant's config directory aside
    Backup {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
    },
    /// Put a backup back in place
    Restore {
        #[arg(long)]
        host: String,
        #[arg(long)]
        tenant: String,
        /// Path printed by `backup`
        #[arg(long)]
        backup: String,
    },
}

#[derive(clap::Args)]
struct Limits {
    /// Bandwidth limit in kbps
    #[arg(long)]
    bandwidth: Option<u32>,
    /// Viewer cap: a number or `unlimited`
    #[arg(long, value_parser = parse_viewers)]
    viewers: Option<ViewerCap>,
}

impl Limits {
    fn changes(&self) -> FieldChanges {
        FieldChanges {
            bandwidth_kbps: self.bandwidth,
            viewer_cap: self.viewers,
        }
    }
}

fn parse_viewers(raw: &str) -> Result<ViewerCap, String> {
    if raw.eq_ignore_ascii_case("unlimited") {
        return Ok(ViewerCap::Unlimited);
    }
    raw.parse::<u32>()
        .map(ViewerCap::Limited)
        .map_err(|_| format!("{raw:?} is neither a number nor \"unlimited\""))
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (mut config, source) = Config::load_default(cli.config.as_deref())?;
    if cli.simulate {
        config.settings.mode = ExecutionMode::Simulated;
    }
    init_tracing(&config.settings.log_level, cli.log_json);
    match &source {
        Some(path) => info!(path = %path.display(), "config loaded"),
        None => warn!("no config file found, using defaults"),
    }
    config.engine.validate()?;

    let tenant_names: Vec<String> = config.tenant.iter().map(|t| t.name.clone()).collect();
    let store = Arc::new(StaticInventory::new(config.host, config.tenant));
    let factory = Arc::new(DefaultExecutorFactory::new(
        config.settings.mode,
        config.ssh.timeouts(),
    ));
    let engine = Arc::new(Reconciler::new(store, factory, config.engine));
    info!(mode = ?engine.mode(), "streamprov starting");

    let provisioner = Provisioner::new(engine.clone());
    let outcome = run(cli.command, &provisioner, &engine, tenant_names).await;
    provisioner.shutdown().await;
    outcome
}

async fn run(
    command: Commands,
    provisioner: &Provisioner,
    engine: &Reconciler,
    tenant_names: Vec<String>,
) -> Result<()> {
    match command {
        Commands::Create {
            host,
            tenant,
            limits,
        } => {
            let tenant = engine.tenant_config(&tenant).await?.with_changes(&limits.changes());
            print_json(&provisioner.create(tenant, &host).await)
        }
        Commands::Update {
            host,
            tenant,
            limits,
        } => {
            let tenant = engine.tenant_config(&tenant).await?;
            let mut changes = limits.changes();
            if changes.is_empty() {
                changes = FieldChanges::all_of(&tenant);
            }
            let tenant = tenant.with_changes(&changes);
            print_json(&provisioner.update(tenant, &host, changes).await)
        }
        Commands::Sync { host, tenant } => {
            let names = match tenant {
                Some(name) => vec![name],
                None => tenant_names,
            };
            let mut results = Vec::with_capacity(names.len());
            for name in names {
                let tenant = engine.tenant_config(&name).await?;
                results.push(provisioner.sync(tenant, &host).await);
            }
            print_json(&results)
        }
        Commands::Remove { host, tenant } => {
            let name = TenantName::parse(&tenant)?;
            print_json(&provisioner.remove(name, &host).await)
        }
        Commands::Cleanup { host } => print_json(&provisioner.cleanup_orphans(&host).await),
        Commands::List { host } => print_json(&provisioner.list_configurations(&host).await?),
        Commands::Status { host } => print_json(&provisioner.service_status(&host).await),
        Commands::Password {
            host,
            tenant,
            secret,
        } => {
            let name = TenantName::parse(&tenant)?;
            let result = provisioner
                .change_password(name, &host, Secret::new(secret))
                .await?;
            print_json(&result)
        }
        Commands::Backup { host, tenant } => {
            let name = TenantName::parse(&tenant)?;
            let backup = provisioner.backup(name, &host).await?;
            println!("{backup}");
            Ok(())
        }
        Commands::Restore {
            host,
            tenant,
            backup,
        } => {
            let name = TenantName::parse(&tenant)?;
            print_json(&provisioner.restore(name, &host, backup).await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewers() {
        assert_eq!(parse_viewers("unlimited").unwrap(), ViewerCap::Unlimited);
        assert_eq!(parse_viewers("250").unwrap(), ViewerCap::Limited(250));
        assert!(parse_viewers("lots").is_err());
    }

    #[test]
    fn test_cli_parses_update() {
        let cli = Cli::try_parse_from([
            "streamprov",
            "update",
            "--host",
            "10.0.0.5",
            "--tenant",
            "acct1",
            "--viewers",
            "unlimited",
        ])
        .unwrap();

        match cli.command {
            Commands::Update { limits, .. } => {
                let changes = limits.changes();
                assert_eq!(changes.bandwidth_kbps, None);
                assert_eq!(changes.viewer_cap, Some(ViewerCap::Unlimited));
            }
            _ => panic!("expected update"),
        }
    }
}
