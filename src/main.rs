mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{InstancesArgs, SessionArgs, SnapshotsArgs, VolumesArgs};
use env_logger::{Builder, Env};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// AWS profile (default: from configuration, else `shotty`)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// AWS region (default: from configuration or the profile)
    #[arg(long, short = 'r', global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commands for instances
    Instances(InstancesArgs),
    /// Commands for volumes
    Volumes(VolumesArgs),
    /// Commands for snapshots
    Snapshots(SnapshotsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG=info shows every ec2 call, debug adds state polling
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let session = SessionArgs {
        profile: cli.profile,
        region: cli.region,
    };

    use Commands::*;
    match cli.command {
        Instances(args) => args.main(session).await,
        Volumes(args) => args.main(session).await,
        Snapshots(args) => args.main(session).await,
    }
}
