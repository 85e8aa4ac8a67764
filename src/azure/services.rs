use crate::azure::arm::ArmClient;
use crate::azure::credentials::{CredentialResolver, TokenProvider};
use crate::azure::traits::*;
use crate::error::Result;
use crate::foundation::stage::StageOptions;
use reqwest::Client;
use std::sync::Arc;
use tracing::info;

/// Management clients handed to every stage
#[derive(Clone)]
pub struct CloudServices {
    pub resources: Arc<dyn ResourceManagementApi>,
    pub network: Arc<dyn NetworkApi>,
    pub insights: Arc<dyn OperationalInsightsApi>,
    pub key_vault: Arc<dyn KeyVaultApi>,
    pub monitor: Arc<dyn MonitorApi>,
    pub policy: Arc<dyn PolicyApi>,
    pub authorization: Arc<dyn AuthorizationApi>,
    pub container_apps: Arc<dyn ContainerAppsApi>,
}

impl CloudServices {
    /// Build every client on one Resource Manager connection.
    pub fn arm(
        http: Client,
        endpoint: &str,
        options: &StageOptions,
        resolver: Arc<dyn CredentialResolver>,
    ) -> Result<Self> {
        let tokens = TokenProvider::new(resolver, options.credential.clone());
        let client = ArmClient::new(http, endpoint, options.subscription_id.clone(), tokens)?;

        info!(
            subscription_id = %options.subscription_id,
            method = options.credential.method(),
            "🔌 Connected management clients to {}",
            endpoint
        );
        Ok(Self::from_shared(Arc::new(client)))
    }

    /// Use one value for every resource family.
    pub fn from_shared<T>(client: Arc<T>) -> Self
    where
        T: ResourceManagementApi
            + NetworkApi
            + OperationalInsightsApi
            + KeyVaultApi
            + MonitorApi
            + PolicyApi
            + AuthorizationApi
            + ContainerAppsApi
            + 'static,
    {
        Self {
            resources: client.clone(),
            network: client.clone(),
            insights: client.clone(),
            key_vault: client.clone(),
            monitor: client.clone(),
            policy: client.clone(),
            authorization: client.clone(),
            container_apps: client,
        }
    }
}
