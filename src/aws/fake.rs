//! In-memory `Ec2Api` that records every call, for orchestration tests.

use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use super::ec2::{Ec2Api, ProviderError, ProviderResult};
use crate::{
    filter::InstanceFilter,
    model::{Instance, InstanceState, Snapshot, Volume},
};

#[derive(Default)]
pub(crate) struct FakeEc2 {
    instances: Vec<Instance>,
    volumes: HashMap<String, Vec<Volume>>,
    snapshots: HashMap<String, Vec<Snapshot>>,
    failing: HashSet<(&'static str, String)>,
    calls: Mutex<Vec<String>>,
}

impl FakeEc2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, instance: Instance, volumes: Vec<Volume>) -> Self {
        self.volumes.insert(instance.id.clone(), volumes);
        self.instances.push(instance);
        self
    }

    pub fn with_snapshots(mut self, volume_id: &str, snapshots: Vec<Snapshot>) -> Self {
        self.snapshots.insert(volume_id.to_string(), snapshots);
        self
    }

    /// Make `op` (e.g. "stop", "wait_until_stopped") fail for `resource`.
    pub fn failing(mut self, op: &'static str, resource: &str) -> Self {
        self.failing.insert((op, resource.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &'static str, resource: &str) -> ProviderResult<()> {
        self.calls.lock().unwrap().push(format!("{op} {resource}"));
        if self.failing.contains(&(op, resource.to_string())) {
            return Err(ProviderError::Call {
                op,
                resource: resource.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Ec2Api for FakeEc2 {
    async fn list_instances(&self, filter: &InstanceFilter) -> ProviderResult<Vec<Instance>> {
        self.record("list_instances", "account")?;
        Ok(filter.select(self.instances.clone()))
    }

    async fn list_volumes(&self, instance_id: &str) -> ProviderResult<Vec<Volume>> {
        self.record("list_volumes", instance_id)?;
        Ok(self.volumes.get(instance_id).cloned().unwrap_or_default())
    }

    async fn list_snapshots(&self, volume_id: &str) -> ProviderResult<Vec<Snapshot>> {
        self.record("list_snapshots", volume_id)?;
        Ok(self.snapshots.get(volume_id).cloned().unwrap_or_default())
    }

    async fn stop(&self, instance_id: &str) -> ProviderResult<()> {
        self.record("stop", instance_id)
    }

    async fn start(&self, instance_id: &str) -> ProviderResult<()> {
        self.record("start", instance_id)
    }

    async fn reboot(&self, instance_id: &str) -> ProviderResult<()> {
        self.record("reboot", instance_id)
    }

    async fn wait_until_stopped(&self, instance_id: &str) -> ProviderResult<()> {
        self.record("wait_until_stopped", instance_id)
    }

    async fn wait_until_running(&self, instance_id: &str) -> ProviderResult<()> {
        self.record("wait_until_running", instance_id)
    }

    async fn create_snapshot(&self, volume_id: &str, _description: &str) -> ProviderResult<String> {
        self.record("create_snapshot", volume_id)?;
        Ok(format!("snap-of-{volume_id}"))
    }
}

pub(crate) fn instance(id: &str, project: Option<&str>, state: InstanceState) -> Instance {
    let mut tags = crate::model::Tags::new();
    if let Some(p) = project {
        tags.insert(crate::model::PROJECT_TAG, p);
    }
    Instance {
        id: id.to_string(),
        instance_type: "t2.micro".to_string(),
        availability_zone: "us-east-1a".to_string(),
        state,
        public_dns: format!("{id}.compute.amazonaws.com"),
        tags,
    }
}

pub(crate) fn volume(id: &str, instance_id: &str) -> Volume {
    Volume {
        id: id.to_string(),
        instance_id: instance_id.to_string(),
        size_gib: 8,
        encrypted: false,
        state: "in-use".to_string(),
    }
}
