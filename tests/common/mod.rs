#![allow(dead_code)]

use cloud_foundation::azure::credentials::CredentialStrategy;
use cloud_foundation::azure::services::CloudServices;
use cloud_foundation::context::ProvisioningContext;
use cloud_foundation::foundation::orchestrator::FoundationOptions;
use cloud_foundation::foundation::stage::{PollPolicy, StageOptions};
use cloud_foundation::foundation::tags::TagSet;
use std::sync::Arc;

pub mod mocks;

pub use mocks::*;

pub fn stage_options() -> Arc<StageOptions> {
    Arc::new(StageOptions {
        subscription_id: SUBSCRIPTION_ID.to_string(),
        credential: CredentialStrategy::Token {
            token: "fake-token".to_string(),
        },
    })
}

/// Pipeline options with zero-delay provider polling.
pub fn foundation_options() -> FoundationOptions {
    let mut options = FoundationOptions::new(stage_options().as_ref().clone());
    options.provider_poll = PollPolicy::immediate(3);
    options
}

pub fn services(cloud: &Arc<FakeCloud>) -> CloudServices {
    CloudServices::from_shared(cloud.clone())
}

pub fn context(operator: Option<&str>) -> Arc<ProvisioningContext> {
    Arc::new(match operator {
        Some(operator) => ProvisioningContext::with_operator(operator),
        None => ProvisioningContext::default(),
    })
}

pub fn tags(pairs: &[(&str, &str)]) -> TagSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
