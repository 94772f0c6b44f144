use anyhow::Result;
use clap::{Args, Subcommand};
use shotty::ops::list_volume_lines;

use super::{FilterArgs, SessionArgs};

#[derive(Args)]
pub struct VolumesArgs {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List EC2 volumes
    List(FilterArgs),
}

impl VolumesArgs {
    pub async fn main(self, session: SessionArgs) -> Result<()> {
        match self.cmd {
            Cmd::List(filter) => {
                let session = session.connect().await?;
                for line in list_volume_lines(&session.ec2, &filter.filter()).await? {
                    println!("{line}");
                }
            }
        }
        Ok(())
    }
}
