use aws_config::{BehaviorVersion, SdkConfig};
use aws_types::region::Region;

pub mod ec2;
#[cfg(test)]
pub(crate) mod fake;

/// AWS session for one invocation, resolved from a named profile and an
/// optional region override.
pub struct Context {
    pub sdk_config: SdkConfig,
}

impl Context {
    pub async fn load(profile: &str, region: Option<String>) -> Self {
        let loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(profile);
        let loader = match region {
            Some(r) => loader.region(Region::new(r)),
            None => loader,
        };
        let sdk_config = loader.load().await;
        log::debug!("aws profile {profile}, region {:?}", sdk_config.region());
        Self { sdk_config }
    }
}
