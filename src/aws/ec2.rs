use async_trait::async_trait;
use aws_sdk_ec2 as ec2;
use chrono::{DateTime, Utc};
use ec2::{config::Builder, error::DisplayErrorContext, types::Filter, Client};
use std::{
    future::Future,
    time::{Duration, SystemTime},
};
use thiserror::Error;
use tokio::time::Instant;

use super::Context;
use crate::{
    filter::InstanceFilter,
    model::{Instance, InstanceState, Snapshot, SnapshotState, Tags, Volume},
};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{op} failed for {resource}: {message}")]
    Call {
        op: &'static str,
        resource: String,
        message: String,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{resource} went {state} while waiting for it to be {target}")]
    UnexpectedState {
        resource: String,
        state: InstanceState,
        target: InstanceState,
    },
    #[error("gave up after {waited:?} waiting for {resource} to be {target}")]
    WaitTimeout {
        resource: String,
        target: InstanceState,
        waited: Duration,
    },
}

impl ProviderError {
    fn call<E: std::error::Error>(op: &'static str, resource: &str, err: E) -> Self {
        ProviderError::Call {
            op,
            resource: resource.to_string(),
            message: DisplayErrorContext(err).to_string(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// The slice of EC2 this tool talks to.
///
/// `list_snapshots` returns newest first. The `wait_until_*` calls block
/// until the instance reaches the state (or the implementation gives up).
#[async_trait]
pub trait Ec2Api: Send + Sync {
    async fn list_instances(&self, filter: &InstanceFilter) -> ProviderResult<Vec<Instance>>;
    async fn list_volumes(&self, instance_id: &str) -> ProviderResult<Vec<Volume>>;
    async fn list_snapshots(&self, volume_id: &str) -> ProviderResult<Vec<Snapshot>>;

    async fn stop(&self, instance_id: &str) -> ProviderResult<()>;
    async fn start(&self, instance_id: &str) -> ProviderResult<()>;
    async fn reboot(&self, instance_id: &str) -> ProviderResult<()>;
    async fn wait_until_stopped(&self, instance_id: &str) -> ProviderResult<()>;
    async fn wait_until_running(&self, instance_id: &str) -> ProviderResult<()>;

    /// Returns the id of the new snapshot.
    async fn create_snapshot(&self, volume_id: &str, description: &str) -> ProviderResult<String>;
}

pub struct Ec2 {
    client: Client,
    poll_interval: Duration,
    wait_timeout: Option<Duration>,
}

impl Ec2 {
    pub fn new(ctx: &Context, poll_interval: Duration, wait_timeout: Option<Duration>) -> Self {
        let config = Builder::from(&ctx.sdk_config).build();
        Self {
            client: Client::from_conf(config),
            poll_interval,
            wait_timeout,
        }
    }

    async fn instance_state(&self, id: &str) -> ProviderResult<InstanceState> {
        let res = self
            .client
            .describe_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(|e| ProviderError::call("describe instance", id, e))?;
        res.reservations()
            .iter()
            .flat_map(|r| r.instances())
            .find_map(|i| i.state().and_then(|s| s.name()))
            .map(|name| InstanceState::from(name.as_str()))
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    async fn wait_for(&self, id: &str, target: InstanceState) -> ProviderResult<()> {
        poll_state(id, target, self.poll_interval, self.wait_timeout, move || {
            self.instance_state(id)
        })
        .await
    }
}

/// Poll `fetch` until it reports `target`. Ends early if the instance goes
/// away, and after `timeout` if one is given.
async fn poll_state<F, Fut>(
    id: &str,
    target: InstanceState,
    poll_interval: Duration,
    timeout: Option<Duration>,
    mut fetch: F,
) -> ProviderResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<InstanceState>>,
{
    let started = Instant::now();
    loop {
        let state = fetch().await?;
        log::debug!("{id} is {state}, waiting for {target}");
        if state == target {
            return Ok(());
        }
        if state.is_gone() {
            return Err(ProviderError::UnexpectedState {
                resource: id.to_string(),
                state,
                target,
            });
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                return Err(ProviderError::WaitTimeout {
                    resource: id.to_string(),
                    target,
                    waited: started.elapsed(),
                });
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[async_trait]
impl Ec2Api for Ec2 {
    async fn list_instances(&self, filter: &InstanceFilter) -> ProviderResult<Vec<Instance>> {
        let mut req = self.client.describe_instances();
        if let Some(project) = &filter.project {
            req = req.filters(
                Filter::builder()
                    .name(format!("tag:{}", crate::model::PROJECT_TAG))
                    .values(project)
                    .build(),
            );
        }
        if let Some(id) = &filter.instance_id {
            req = req.instance_ids(id);
        }
        log::info!("describing instances ({filter:?})");
        let res = req
            .send()
            .await
            .map_err(|e| ProviderError::call("describe instances", "account", e))?;

        let instances: Vec<_> = res
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(to_instance)
            .collect();
        Ok(filter.select(instances))
    }

    async fn list_volumes(&self, instance_id: &str) -> ProviderResult<Vec<Volume>> {
        let res = self
            .client
            .describe_volumes()
            .filters(
                Filter::builder()
                    .name("attachment.instance-id")
                    .values(instance_id)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| ProviderError::call("describe volumes", instance_id, e))?;

        Ok(res
            .volumes()
            .iter()
            .filter_map(|v| {
                Some(Volume {
                    id: v.volume_id()?.to_string(),
                    instance_id: instance_id.to_string(),
                    size_gib: v.size().unwrap_or_default(),
                    encrypted: v.encrypted().unwrap_or(false),
                    state: v
                        .state()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn list_snapshots(&self, volume_id: &str) -> ProviderResult<Vec<Snapshot>> {
        let res = self
            .client
            .describe_snapshots()
            .owner_ids("self")
            .filters(Filter::builder().name("volume-id").values(volume_id).build())
            .send()
            .await
            .map_err(|e| ProviderError::call("describe snapshots", volume_id, e))?;

        let mut snapshots: Vec<_> = res
            .snapshots()
            .iter()
            .filter_map(|s| {
                Some(Snapshot {
                    id: s.snapshot_id()?.to_string(),
                    volume_id: volume_id.to_string(),
                    state: s
                        .state()
                        .map(|st| SnapshotState::from(st.as_str()))
                        .unwrap_or_else(|| SnapshotState::Other("unknown".to_string())),
                    progress: s.progress().unwrap_or_default().to_string(),
                    started_at: s
                        .start_time()
                        .and_then(|t| SystemTime::try_from(t.clone()).ok())
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH)),
                })
            })
            .collect();
        snapshots.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(snapshots)
    }

    async fn stop(&self, instance_id: &str) -> ProviderResult<()> {
        log::info!("stop {instance_id}");
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ProviderError::call("stop", instance_id, e))?;
        Ok(())
    }

    async fn start(&self, instance_id: &str) -> ProviderResult<()> {
        log::info!("start {instance_id}");
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ProviderError::call("start", instance_id, e))?;
        Ok(())
    }

    async fn reboot(&self, instance_id: &str) -> ProviderResult<()> {
        log::info!("reboot {instance_id}");
        self.client
            .reboot_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| ProviderError::call("reboot", instance_id, e))?;
        Ok(())
    }

    async fn wait_until_stopped(&self, instance_id: &str) -> ProviderResult<()> {
        self.wait_for(instance_id, InstanceState::Stopped).await
    }

    async fn wait_until_running(&self, instance_id: &str) -> ProviderResult<()> {
        self.wait_for(instance_id, InstanceState::Running).await
    }

    async fn create_snapshot(&self, volume_id: &str, description: &str) -> ProviderResult<String> {
        log::info!("create snapshot of {volume_id}");
        let res = self
            .client
            .create_snapshot()
            .volume_id(volume_id)
            .description(description)
            .send()
            .await
            .map_err(|e| ProviderError::call("create snapshot", volume_id, e))?;
        Ok(res.snapshot_id().unwrap_or("snapshot").to_string())
    }
}

fn to_instance(ins: &ec2::types::Instance) -> Option<Instance> {
    let tags: Tags = ins
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?, t.value().unwrap_or_default())))
        .collect();

    Some(Instance {
        id: ins.instance_id()?.to_string(),
        instance_type: ins
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        availability_zone: ins
            .placement()
            .and_then(|p| p.availability_zone())
            .unwrap_or_default()
            .to_string(),
        state: ins
            .state()
            .and_then(|s| s.name())
            .map(|n| InstanceState::from(n.as_str()))
            .unwrap_or_else(|| InstanceState::Unknown("unknown".to_string())),
        public_dns: ins.public_dns_name().unwrap_or_default().to_string(),
        tags,
    })
}
