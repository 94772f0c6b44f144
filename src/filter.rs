use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::model::Instance;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("please specify a project name or an instance id (or pass --force to target every instance)")]
    MissingTarget,
}

/// Which instances a command applies to. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    pub project: Option<String>,
    pub instance_id: Option<String>,
}

impl InstanceFilter {
    pub fn new(project: Option<String>, instance_id: Option<String>) -> Self {
        Self {
            project,
            instance_id,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.project.is_none() && self.instance_id.is_none()
    }

    /// Mutating commands refuse to touch every instance unless forced.
    pub fn require_target(&self, force: bool) -> Result<&Self, UsageError> {
        if self.is_unrestricted() && !force {
            return Err(UsageError::MissingTarget);
        }
        Ok(self)
    }

    pub fn matches(&self, instance: &Instance) -> bool {
        let id_ok = self
            .instance_id
            .as_deref()
            .map_or(true, |id| instance.id == id);
        let project_ok = self
            .project
            .as_deref()
            .map_or(true, |p| instance.tags.project() == Some(p));
        id_ok && project_ok
    }

    pub fn select(&self, instances: Vec<Instance>) -> Vec<Instance> {
        instances.into_iter().filter(|i| self.matches(i)).collect()
    }
}

/// `clap` value parser for `--instance`.
pub fn parse_instance_id(s: &str) -> Result<String, String> {
    lazy_static! {
        static ref INSTANCE_ID: Regex = Regex::new(r"^i-([0-9a-f]{8}|[0-9a-f]{17})$").unwrap();
    }
    if INSTANCE_ID.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(format!("`{s}` is not an ec2 instance id (expected i-xxxxxxxx)"))
    }
}
