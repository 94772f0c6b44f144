use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

pub const APP_NAME: &str = "shotty";

/// Persistent defaults, stored by `confy` under the `shotty` app name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// AWS profile used when `--profile` is not given
    pub profile: String,
    /// Region override; otherwise resolved from the profile / environment
    pub region: Option<String>,
    /// Description attached to every snapshot created
    pub snapshot_description: String,
    /// Default for `instances snapshot --age`
    pub min_age_days: Option<u32>,
    /// Seconds between state polls while waiting on an instance
    pub poll_interval_secs: u64,
    /// Give up waiting on an instance after this many seconds (default: wait forever)
    pub wait_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: APP_NAME.to_string(),
            region: None,
            snapshot_description: "Created by Snapshotalyzer".to_string(),
            min_age_days: None,
            poll_interval_secs: 15,
            wait_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        confy::load(APP_NAME, None).with_context(|| "loading shotty configuration")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        confy::load_path(path)
            .with_context(|| format!("loading shotty configuration from {}", path.display()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_secs.map(Duration::from_secs)
    }
}
