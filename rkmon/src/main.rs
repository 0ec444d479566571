mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use log::info;
use std::path::Path;
use std::sync::Arc;

use rkmon::api::xlinestore::XlineStore;
use rkmon::mon::KeyringManager;
use rkmon::operator::Cluster;
use rkmon::protocol::config::{Config, load_config};

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(env_logger::Target::Stdout)
        .init();
}

async fn connect(path: &Path) -> Result<(Config, Cluster)> {
    let path = path
        .to_str()
        .with_context(|| format!("config path {} is not valid UTF-8", path.display()))?;
    let cfg = load_config(path)?;
    let store = XlineStore::new(&cfg.xline_config)
        .await
        .with_context(|| format!("failed to connect xline at {:?}", cfg.xline_config.endpoints))?;
    let manager = KeyringManager::new(cfg.mon.port);
    let cluster = Cluster::from_config(&cfg, Arc::new(store), Arc::new(manager));
    Ok((cfg, cluster))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Start { config } => {
            let (cfg, cluster) = connect(config).await?;
            let info = cluster
                .start()
                .await
                .with_context(|| format!("failed to start mons in namespace {}", cfg.namespace))?;
            info!(
                "[{}] cluster {} ({}) has {} monitors",
                cfg.namespace,
                info.name,
                info.fsid,
                info.monitors.len()
            );
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Status {
            config,
            cluster_name,
        } => {
            let (_, cluster) = connect(config).await?;
            let name = match cluster_name {
                Some(name) => name.clone(),
                None => {
                    cluster
                        .identity()
                        .load()
                        .await
                        .context("failed to load cluster identity")?
                        .name
                }
            };
            let (running, pending) = cluster.get_mon_pods_running(&name).await?;
            println!("cluster {name}: {running} running, {pending} pending mon pods");
        }
    }

    Ok(())
}
