use anyhow::Result;
use clap::{Args, Subcommand};
use shotty::ops::list_snapshot_lines;

use super::{FilterArgs, SessionArgs};

#[derive(Args)]
pub struct SnapshotsArgs {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List EC2 snapshots
    List(ListArgs),
}

#[derive(Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// List all snapshots for each volume, not just the most recent
    #[arg(long)]
    all: bool,
}

impl SnapshotsArgs {
    pub async fn main(self, session: SessionArgs) -> Result<()> {
        match self.cmd {
            Cmd::List(args) => {
                let session = session.connect().await?;
                let lines =
                    list_snapshot_lines(&session.ec2, &args.filter.filter(), args.all).await?;
                for line in lines {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}
