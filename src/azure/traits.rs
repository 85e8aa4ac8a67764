use crate::azure::models::*;
use crate::error::{AppError, Result};
use async_trait::async_trait;

/// Subscription-level resource management: providers, regions and resource groups
#[async_trait]
pub trait ResourceManagementApi: Send + Sync {
    async fn get_provider(&self, namespace: &str) -> Result<ProviderInfo>;

    async fn register_provider(&self, namespace: &str) -> Result<ProviderInfo>;

    async fn list_locations(&self, subscription_id: &str) -> Result<Vec<Location>>;

    async fn create_or_update_resource_group(
        &self,
        name: &str,
        params: &ResourceGroupParams,
    ) -> Result<ResourceGroup>;
}

#[async_trait]
pub trait NetworkApi: Send + Sync {
    /// Create or update a virtual network and wait for provisioning to finish
    async fn create_or_update_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        params: &VirtualNetworkParams,
    ) -> Result<VirtualNetwork>;
}

#[async_trait]
pub trait OperationalInsightsApi: Send + Sync {
    async fn create_or_update_workspace(
        &self,
        resource_group: &str,
        name: &str,
        params: &WorkspaceParams,
    ) -> Result<Workspace>;

    async fn get_shared_keys(&self, resource_group: &str, name: &str) -> Result<SharedKeys>;
}

#[async_trait]
pub trait KeyVaultApi: Send + Sync {
    async fn create_or_update_vault(
        &self,
        resource_group: &str,
        name: &str,
        params: &VaultParams,
    ) -> Result<Vault>;
}

#[async_trait]
pub trait MonitorApi: Send + Sync {
    async fn create_or_update_diagnostic_setting(
        &self,
        resource_uri: &str,
        name: &str,
        params: &DiagnosticSettingParams,
    ) -> Result<DiagnosticSetting>;
}

#[async_trait]
pub trait PolicyApi: Send + Sync {
    async fn create_policy_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &PolicyAssignmentParams,
    ) -> Result<PolicyAssignment>;
}

#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    async fn create_role_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &RoleAssignmentParams,
    ) -> Result<RoleAssignment>;
}

/// How a container apps client exposes dedicated start/stop operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleSupport {
    /// Start/stop are long-running operations the client can wait on
    AwaitCompletion,
    /// Start/stop can only be kicked off
    BeginOnly,
    /// No dedicated operation; callers fall back to a scale update
    None,
}

#[async_trait]
pub trait ContainerAppsApi: Send + Sync {
    async fn get_container_app(&self, resource_group: &str, name: &str) -> Result<ContainerApp>;

    async fn list_revisions(&self, resource_group: &str, app_name: &str) -> Result<Vec<Revision>>;

    async fn list_replicas(
        &self,
        resource_group: &str,
        app_name: &str,
        revision_name: &str,
    ) -> Result<Vec<Replica>>;

    async fn create_or_update_container_app(
        &self,
        resource_group: &str,
        name: &str,
        app: &ContainerApp,
    ) -> Result<ContainerApp>;

    fn toggle_support(&self) -> ToggleSupport {
        ToggleSupport::None
    }

    /// Start the app. `wait` asks for completion of the long-running operation.
    async fn start_container_app(
        &self,
        resource_group: &str,
        name: &str,
        wait: bool,
    ) -> Result<()> {
        let _ = (resource_group, wait);
        Err(AppError::Unimplemented(format!(
            "start operation is not available for container app '{}'",
            name
        )))
    }

    /// Stop the app. `wait` asks for completion of the long-running operation.
    async fn stop_container_app(&self, resource_group: &str, name: &str, wait: bool) -> Result<()> {
        let _ = (resource_group, wait);
        Err(AppError::Unimplemented(format!(
            "stop operation is not available for container app '{}'",
            name
        )))
    }
}
