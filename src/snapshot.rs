use chrono::{DateTime, SubsecRound, Utc};
use std::fmt;

use crate::model::{Snapshot, SnapshotState};

/// Whether a volume should be snapshotted in this run, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    NoPriorSnapshot,
    Eligible { age_days: i64 },
    InProgress,
    TooRecent { age_days: i64, min_age_days: u32 },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            Eligibility::NoPriorSnapshot | Eligibility::Eligible { .. }
        )
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::NoPriorSnapshot => write!(f, "no prior snapshot"),
            Eligibility::Eligible { .. } => write!(f, "eligible"),
            Eligibility::InProgress => write!(f, "snapshot already in progress"),
            Eligibility::TooRecent {
                age_days,
                min_age_days,
            } => write!(
                f,
                "too recent (newest snapshot is {age_days} day(s) old, minimum is {min_age_days})"
            ),
        }
    }
}

/// Decide on a volume from its snapshots, newest first.
///
/// Only the newest snapshot is looked at. A pending one blocks a new
/// snapshot regardless of age. Otherwise the age in whole elapsed days is
/// compared against `min_age_days`; the boundary is inclusive.
pub fn evaluate(
    snapshots: &[Snapshot],
    min_age_days: Option<u32>,
    now: DateTime<Utc>,
) -> Eligibility {
    let Some(newest) = snapshots.first() else {
        return Eligibility::NoPriorSnapshot;
    };

    if newest.state == SnapshotState::Pending {
        return Eligibility::InProgress;
    }

    let age_days = age_in_days(newest.started_at, now);
    match min_age_days {
        Some(min) if age_days < i64::from(min) => Eligibility::TooRecent {
            age_days,
            min_age_days: min,
        },
        _ => Eligibility::Eligible { age_days },
    }
}

fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed = now.trunc_subsecs(0) - created.trunc_subsecs(0);
    elapsed.num_seconds().div_euclid(86_400)
}
