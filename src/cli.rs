mod instances;
mod snapshots;
mod volumes;

pub use instances::InstancesArgs;
pub use snapshots::SnapshotsArgs;
pub use volumes::VolumesArgs;

use anyhow::{bail, Result};
use atty::Stream;
use clap::Args;
use shotty::{
    aws::{ec2::Ec2, Context},
    config::Config,
    filter::{parse_instance_id, InstanceFilter},
    report::{BatchReport, Outcome},
};
use std::io::{stdin, stdout, Write};

/// Global options, resolved into a [`Session`] once a command knows it
/// will talk to AWS.
pub struct SessionArgs {
    pub profile: Option<String>,
    pub region: Option<String>,
}

pub struct Session {
    pub config: Config,
    pub ec2: Ec2,
}

impl SessionArgs {
    pub async fn connect(self) -> Result<Session> {
        let config = Config::load()?;
        let profile = self.profile.unwrap_or_else(|| config.profile.clone());
        let region = self.region.or_else(|| config.region.clone());
        let ctx = Context::load(&profile, region).await;
        let ec2 = Ec2::new(&ctx, config.poll_interval(), config.wait_timeout());
        Ok(Session { config, ec2 })
    }
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Only instances for project (tag Project:<name>)
    #[arg(long)]
    project: Option<String>,

    /// Only this instance id
    #[arg(long, short = 'i', value_parser = parse_instance_id)]
    instance: Option<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> InstanceFilter {
        InstanceFilter::new(self.project.clone(), self.instance.clone())
    }
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    #[command(flatten)]
    filter: FilterArgs,

    /// Act on every instance when neither project nor instance is given
    #[arg(long)]
    force: bool,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    yes: bool,
}

impl TargetArgs {
    /// Runs the target guard, then the confirmation prompt.
    pub fn resolve(&self, verb: &str) -> Result<InstanceFilter> {
        let filter = self.filter.filter();
        filter.require_target(self.force)?;
        confirm(verb, self.yes)?;
        Ok(filter)
    }
}

fn confirm(verb: &str, yes: bool) -> Result<()> {
    if yes {
        return Ok(());
    }
    if !atty::is(Stream::Stdin) {
        bail!("Aborted! stdin is not a terminal; pass --yes to {verb} without a prompt");
    }
    print!("Are you sure you want to {verb}? [y/N]: ");
    stdout().flush()?;
    let mut answer = String::new();
    stdin().read_line(&mut answer)?;
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Ok(()),
        _ => bail!("Aborted!"),
    }
}

/// Failures go to stderr one per line, followed by the tally.
pub fn print_report(report: &BatchReport) {
    for entry in report.failures() {
        if let Outcome::Failed(reason) = &entry.outcome {
            eprintln!("failed: {}: {reason}", entry.resource);
        }
    }
    eprintln!("{report}");
}
