use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rkmon", version, about = "RK8s monitor bootstrap CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap the cluster identity and start the monitor pods
    Start {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show how many monitor pods are running and pending
    Status {
        #[arg(short, long)]
        config: PathBuf,
        /// Cluster to query; defaults to the name in the persisted identity
        #[arg(long)]
        cluster_name: Option<String>,
    },
}
