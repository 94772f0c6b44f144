use anyhow::Result;
use chrono::{SubsecRound, Utc};
use clap::{Args, Subcommand};
use shotty::ops::{
    change_state, list_instance_lines, snapshot_instances, SnapshotPlan, Transition,
};

use super::{print_report, FilterArgs, SessionArgs, TargetArgs};

#[derive(Args)]
pub struct InstancesArgs {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List EC2 instances
    List(FilterArgs),
    /// Start EC2 instances
    Start(StateArgs),
    /// Stop EC2 instances
    Stop(StateArgs),
    /// Reboot EC2 instances
    Reboot(TargetArgs),
    /// Create snapshots of all volumes, stopping instances while they are taken
    #[command(alias = "snapshots")]
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct StateArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Block until every instance has finished the transition
    #[arg(long)]
    wait: bool,
}

#[derive(Args)]
struct SnapshotArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Skip volumes whose newest snapshot is younger than this many days
    #[arg(long = "age", value_name = "DAYS")]
    min_age_days: Option<u32>,
}

impl InstancesArgs {
    pub async fn main(self, session: SessionArgs) -> Result<()> {
        match self.cmd {
            Cmd::List(filter) => {
                let session = session.connect().await?;
                for line in list_instance_lines(&session.ec2, &filter.filter()).await? {
                    println!("{line}");
                }
            }
            Cmd::Start(args) => {
                apply_transition(session, args.target, Transition::Start, args.wait).await?
            }
            Cmd::Stop(args) => {
                apply_transition(session, args.target, Transition::Stop, args.wait).await?
            }
            Cmd::Reboot(target) => {
                apply_transition(session, target, Transition::Reboot, false).await?
            }
            Cmd::Snapshot(args) => {
                let filter = args.target.resolve("snapshot")?;
                let session = session.connect().await?;
                let plan = SnapshotPlan {
                    min_age_days: args.min_age_days.or(session.config.min_age_days),
                    description: session.config.snapshot_description.clone(),
                };
                let now = Utc::now().trunc_subsecs(0);
                let report = snapshot_instances(&session.ec2, &filter, &plan, now).await?;
                print_report(&report);
            }
        }
        Ok(())
    }
}

async fn apply_transition(
    session: SessionArgs,
    target: TargetArgs,
    transition: Transition,
    wait: bool,
) -> Result<()> {
    let filter = target.resolve(transition.verb())?;
    let session = session.connect().await?;
    let report = change_state(&session.ec2, &filter, transition, wait).await?;
    print_report(&report);
    Ok(())
}
