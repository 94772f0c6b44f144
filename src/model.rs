use chrono::{DateTime, Utc};
use std::{collections::BTreeMap, fmt};

pub const PROJECT_TAG: &str = "Project";

/// Key/value labels attached to an instance. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    pub fn project(&self) -> Option<&str> {
        self.get(PROJECT_TAG)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Tags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        use InstanceState::*;
        match self {
            Pending => "pending",
            Running => "running",
            ShuttingDown => "shutting-down",
            Terminated => "terminated",
            Stopping => "stopping",
            Stopped => "stopped",
            Unknown(s) => s.as_str(),
        }
    }

    /// Instances on their way out have nothing left to snapshot or restart.
    pub fn is_gone(&self) -> bool {
        matches!(self, InstanceState::ShuttingDown | InstanceState::Terminated)
    }
}

impl From<&str> for InstanceState {
    fn from(s: &str) -> Self {
        use InstanceState::*;
        match s {
            "pending" => Pending,
            "running" => Running,
            "shutting-down" => ShuttingDown,
            "terminated" => Terminated,
            "stopping" => Stopping,
            "stopped" => Stopped,
            other => Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub instance_type: String,
    pub availability_zone: String,
    pub state: InstanceState,
    pub public_dns: String,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    pub instance_id: String,
    pub size_gib: i32,
    pub encrypted: bool,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    Other(String),
}

impl SnapshotState {
    pub fn as_str(&self) -> &str {
        match self {
            SnapshotState::Pending => "pending",
            SnapshotState::Completed => "completed",
            SnapshotState::Error => "error",
            SnapshotState::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for SnapshotState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => SnapshotState::Pending,
            "completed" => SnapshotState::Completed,
            "error" => SnapshotState::Error,
            other => SnapshotState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
    pub state: SnapshotState,
    pub progress: String,
    pub started_at: DateTime<Utc>,
}
