use anyhow::Result;
use chrono::{DateTime, Local, Utc};

use crate::{
    aws::ec2::Ec2Api,
    filter::InstanceFilter,
    model::{Instance, InstanceState, Snapshot, SnapshotState, Volume, PROJECT_TAG},
    report::BatchReport,
    snapshot::evaluate,
};

pub fn instance_line(i: &Instance) -> String {
    [
        i.id.as_str(),
        i.instance_type.as_str(),
        i.availability_zone.as_str(),
        i.state.as_str(),
        i.public_dns.as_str(),
        i.tags.get_or(PROJECT_TAG, "<no project>"),
    ]
    .join(", ")
}

pub fn volume_line(v: &Volume) -> String {
    [
        v.id.clone(),
        v.instance_id.clone(),
        v.state.clone(),
        format!("{}GiB", v.size_gib),
        if v.encrypted {
            "Encrypted"
        } else {
            "Not Encrypted"
        }
        .to_string(),
    ]
    .join(", ")
}

pub fn snapshot_line(s: &Snapshot, instance_id: &str) -> String {
    let started = s.started_at.with_timezone(&Local).format("%c").to_string();
    [
        s.id.as_str(),
        s.volume_id.as_str(),
        instance_id,
        s.state.as_str(),
        s.progress.as_str(),
        started.as_str(),
    ]
    .join(", ")
}

pub async fn list_instance_lines<E: Ec2Api + ?Sized>(
    ec2: &E,
    filter: &InstanceFilter,
) -> Result<Vec<String>> {
    let instances = ec2.list_instances(filter).await?;
    Ok(instances.iter().map(instance_line).collect())
}

pub async fn list_volume_lines<E: Ec2Api + ?Sized>(
    ec2: &E,
    filter: &InstanceFilter,
) -> Result<Vec<String>> {
    let mut lines = vec![];
    for i in ec2.list_instances(filter).await? {
        for v in ec2.list_volumes(&i.id).await? {
            lines.push(volume_line(&v));
        }
    }
    Ok(lines)
}

/// Without `list_all`, each volume's listing ends at its newest completed
/// snapshot.
pub async fn list_snapshot_lines<E: Ec2Api + ?Sized>(
    ec2: &E,
    filter: &InstanceFilter,
    list_all: bool,
) -> Result<Vec<String>> {
    let mut lines = vec![];
    for i in ec2.list_instances(filter).await? {
        for v in ec2.list_volumes(&i.id).await? {
            for s in ec2.list_snapshots(&v.id).await? {
                lines.push(snapshot_line(&s, &i.id));
                if s.state == SnapshotState::Completed && !list_all {
                    break;
                }
            }
        }
    }
    Ok(lines)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
    Reboot,
}

impl Transition {
    pub fn verb(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Stop => "stop",
            Transition::Reboot => "reboot",
        }
    }

    fn progress(&self) -> &'static str {
        match self {
            Transition::Start => "Starting",
            Transition::Stop => "Stopping",
            Transition::Reboot => "Rebooting",
        }
    }
}

/// Apply `transition` to every selected instance. A failure is recorded
/// against the instance and the batch moves on.
pub async fn change_state<E: Ec2Api + ?Sized>(
    ec2: &E,
    filter: &InstanceFilter,
    transition: Transition,
    wait: bool,
) -> Result<BatchReport> {
    let mut report = BatchReport::new();
    for i in ec2.list_instances(filter).await? {
        println!("{} {}...", transition.progress(), i.id);
        let res = match transition {
            Transition::Start => ec2.start(&i.id).await,
            Transition::Stop => ec2.stop(&i.id).await,
            Transition::Reboot => ec2.reboot(&i.id).await,
        };
        if let Err(e) = res {
            println!(" Could not {} {}. {e}", transition.verb(), i.id);
            report.failed(&i.id, e);
            continue;
        }

        let waited = match (transition, wait) {
            (Transition::Start, true) => ec2.wait_until_running(&i.id).await,
            (Transition::Stop, true) => ec2.wait_until_stopped(&i.id).await,
            _ => Ok(()),
        };
        match waited {
            Ok(()) => report.done(&i.id, transition.verb()),
            Err(e) => report.failed(&i.id, e),
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPlan {
    /// Skip volumes whose newest snapshot is younger than this many days.
    pub min_age_days: Option<u32>,
    pub description: String,
}

/// Snapshot the volumes of every selected instance.
///
/// Per instance: volumes are judged one by one; if any is eligible the
/// instance is stopped (unless already stopped), each eligible volume is
/// snapshotted, and the instance is started again only if it was running
/// when the cycle began.
pub async fn snapshot_instances<E: Ec2Api + ?Sized>(
    ec2: &E,
    filter: &InstanceFilter,
    plan: &SnapshotPlan,
    now: DateTime<Utc>,
) -> Result<BatchReport> {
    let mut report = BatchReport::new();
    for i in ec2.list_instances(filter).await? {
        snapshot_instance(ec2, &i, plan, now, &mut report).await;
    }
    println!("Job's done!");
    Ok(report)
}

async fn snapshot_instance<E: Ec2Api + ?Sized>(
    ec2: &E,
    i: &Instance,
    plan: &SnapshotPlan,
    now: DateTime<Utc>,
    report: &mut BatchReport,
) {
    if i.state.is_gone() {
        report.skipped(&i.id, format!("instance is {}", i.state));
        return;
    }

    let volumes = match ec2.list_volumes(&i.id).await {
        Ok(v) => v,
        Err(e) => return report.failed(&i.id, e),
    };

    let mut eligible = vec![];
    for v in volumes {
        let snapshots = match ec2.list_snapshots(&v.id).await {
            Ok(s) => s,
            Err(e) => return report.failed(&i.id, e),
        };
        let decision = evaluate(&snapshots, plan.min_age_days, now);
        if decision.is_eligible() {
            eligible.push(v);
        } else {
            println!("Skipping {}, {decision}", v.id);
            report.skipped(&v.id, decision.to_string());
        }
    }
    if eligible.is_empty() {
        report.skipped(&i.id, "no volume needs a snapshot");
        return;
    }

    // A booting instance is headed for running and comes back up afterwards.
    let was_running = matches!(i.state, InstanceState::Running | InstanceState::Pending);
    if i.state != InstanceState::Stopped {
        println!("Stopping {}...", i.id);
        if let Err(e) = ec2.stop(&i.id).await {
            return report.failed(&i.id, e);
        }
    }
    if let Err(e) = ec2.wait_until_stopped(&i.id).await {
        return report.failed(&i.id, e);
    }

    let mut volumes = eligible.iter();
    for v in volumes.by_ref() {
        println!("   Creating snapshot of {}", v.id);
        match ec2.create_snapshot(&v.id, &plan.description).await {
            Ok(snap_id) => report.done(&v.id, snap_id),
            Err(e) => {
                report.failed(&v.id, format!("{e} (instance {})", i.id));
                break;
            }
        }
    }
    for v in volumes {
        report.skipped(&v.id, "earlier snapshot on the instance failed");
    }

    if !was_running {
        report.done(&i.id, "left stopped");
        return;
    }
    println!("Starting {}...", i.id);
    let restarted = match ec2.start(&i.id).await {
        Ok(()) => ec2.wait_until_running(&i.id).await,
        Err(e) => Err(e),
    };
    match restarted {
        Ok(()) => report.done(&i.id, "restarted"),
        Err(e) => report.failed(&i.id, e),
    }
}
