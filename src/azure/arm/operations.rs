use super::api_versions as api;
use super::wire::*;
use super::ArmClient;
use crate::azure::models::*;
use crate::azure::traits::*;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

impl ArmClient {
    fn container_app_path(&self, resource_group: &str, name: &str) -> String {
        format!(
            "{}/providers/Microsoft.App/containerApps/{}",
            self.resource_group_path(resource_group),
            name
        )
    }
}

fn scoped(scope: &str, suffix: &str) -> String {
    format!("{}/{}", scope.trim_end_matches('/'), suffix)
}

#[async_trait]
impl ResourceManagementApi for ArmClient {
    async fn get_provider(&self, namespace: &str) -> Result<ProviderInfo> {
        let path = format!("{}/providers/{}", self.subscription_path(), namespace);
        let body: ProviderBody = self.get_json(&path, api::PROVIDERS).await?;
        Ok(body.into_model(namespace))
    }

    async fn register_provider(&self, namespace: &str) -> Result<ProviderInfo> {
        let path = format!(
            "{}/providers/{}/register",
            self.subscription_path(),
            namespace
        );
        info!(namespace = %namespace, "📝 Registering resource provider");
        let body: ProviderBody = self.post_action(&path, api::PROVIDERS).await?;
        Ok(body.into_model(namespace))
    }

    async fn list_locations(&self, subscription_id: &str) -> Result<Vec<Location>> {
        let path = format!("/subscriptions/{}/locations", subscription_id);
        let locations: Vec<LocationBody> = self.list_paged(&path, api::LOCATIONS).await?;
        Ok(locations.into_iter().map(Location::from).collect())
    }

    async fn create_or_update_resource_group(
        &self,
        name: &str,
        params: &ResourceGroupParams,
    ) -> Result<ResourceGroup> {
        let path = self.resource_group_path(name);
        debug!(resource_group = %name, "PUT resource group");
        let body: ResourceGroupBody = self
            .put_json(
                &path,
                api::RESOURCE_GROUPS,
                &ResourceGroupRequest::from(params),
            )
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl NetworkApi for ArmClient {
    async fn create_or_update_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        params: &VirtualNetworkParams,
    ) -> Result<VirtualNetwork> {
        let path = format!(
            "{}/providers/Microsoft.Network/virtualNetworks/{}",
            self.resource_group_path(resource_group),
            name
        );
        debug!(resource_group = %resource_group, vnet = %name, "PUT virtual network");
        let body: VirtualNetworkBody = self
            .put_json(&path, api::NETWORK, &VirtualNetworkRequest::from(params))
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl OperationalInsightsApi for ArmClient {
    async fn create_or_update_workspace(
        &self,
        resource_group: &str,
        name: &str,
        params: &WorkspaceParams,
    ) -> Result<Workspace> {
        let path = format!(
            "{}/providers/Microsoft.OperationalInsights/workspaces/{}",
            self.resource_group_path(resource_group),
            name
        );
        let body: WorkspaceBody = self
            .put_json(&path, api::WORKSPACES, &WorkspaceRequest::from(params))
            .await?;
        Ok(body.into())
    }

    async fn get_shared_keys(&self, resource_group: &str, name: &str) -> Result<SharedKeys> {
        let path = format!(
            "{}/providers/Microsoft.OperationalInsights/workspaces/{}/sharedKeys",
            self.resource_group_path(resource_group),
            name
        );
        let body: SharedKeysBody = self.post_action(&path, api::SHARED_KEYS).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl KeyVaultApi for ArmClient {
    async fn create_or_update_vault(
        &self,
        resource_group: &str,
        name: &str,
        params: &VaultParams,
    ) -> Result<Vault> {
        let path = format!(
            "{}/providers/Microsoft.KeyVault/vaults/{}",
            self.resource_group_path(resource_group),
            name
        );
        let body: VaultBody = self
            .put_json(&path, api::KEY_VAULT, &VaultRequest::from(params))
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl MonitorApi for ArmClient {
    async fn create_or_update_diagnostic_setting(
        &self,
        resource_uri: &str,
        name: &str,
        params: &DiagnosticSettingParams,
    ) -> Result<DiagnosticSetting> {
        let path = scoped(
            resource_uri,
            &format!("providers/Microsoft.Insights/diagnosticSettings/{}", name),
        );
        let body: NamedResourceBody = self
            .put_json(
                &path,
                api::DIAGNOSTIC_SETTINGS,
                &DiagnosticSettingRequest::from(params),
            )
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl PolicyApi for ArmClient {
    async fn create_policy_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &PolicyAssignmentParams,
    ) -> Result<PolicyAssignment> {
        let path = scoped(
            scope,
            &format!("providers/Microsoft.Authorization/policyAssignments/{}", name),
        );
        let body: NamedResourceBody = self
            .put_json(
                &path,
                api::POLICY_ASSIGNMENTS,
                &PolicyAssignmentRequest::from(params),
            )
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl AuthorizationApi for ArmClient {
    async fn create_role_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &RoleAssignmentParams,
    ) -> Result<RoleAssignment> {
        let path = scoped(
            scope,
            &format!("providers/Microsoft.Authorization/roleAssignments/{}", name),
        );
        let body: NamedResourceBody = self
            .put_json(
                &path,
                api::ROLE_ASSIGNMENTS,
                &RoleAssignmentRequest::from(params),
            )
            .await?;
        Ok(body.into())
    }
}

#[async_trait]
impl ContainerAppsApi for ArmClient {
    async fn get_container_app(&self, resource_group: &str, name: &str) -> Result<ContainerApp> {
        let path = self.container_app_path(resource_group, name);
        let body: ContainerAppBody = self.get_json(&path, api::CONTAINER_APPS).await?;
        Ok(body.into())
    }

    async fn list_revisions(&self, resource_group: &str, app_name: &str) -> Result<Vec<Revision>> {
        let path = format!(
            "{}/revisions",
            self.container_app_path(resource_group, app_name)
        );
        let revisions: Vec<RevisionBody> = self.list_paged(&path, api::CONTAINER_APPS).await?;
        Ok(revisions.into_iter().map(Revision::from).collect())
    }

    async fn list_replicas(
        &self,
        resource_group: &str,
        app_name: &str,
        revision_name: &str,
    ) -> Result<Vec<Replica>> {
        let path = format!(
            "{}/revisions/{}/replicas",
            self.container_app_path(resource_group, app_name),
            revision_name
        );
        let replicas: Vec<ReplicaBody> = self.list_paged(&path, api::CONTAINER_APPS).await?;
        Ok(replicas.into_iter().map(Replica::from).collect())
    }

    async fn create_or_update_container_app(
        &self,
        resource_group: &str,
        name: &str,
        app: &ContainerApp,
    ) -> Result<ContainerApp> {
        let path = self.container_app_path(resource_group, name);
        let body: ContainerAppBody = self
            .put_json(&path, api::CONTAINER_APPS, &ContainerAppBody::from(app))
            .await?;
        Ok(body.into())
    }

    fn toggle_support(&self) -> ToggleSupport {
        ToggleSupport::AwaitCompletion
    }

    async fn start_container_app(
        &self,
        resource_group: &str,
        name: &str,
        wait: bool,
    ) -> Result<()> {
        let path = format!("{}/start", self.container_app_path(resource_group, name));
        self.post_lro(&path, api::CONTAINER_APPS, wait).await
    }

    async fn stop_container_app(&self, resource_group: &str, name: &str, wait: bool) -> Result<()> {
        let path = format!("{}/stop", self.container_app_path(resource_group, name));
        self.post_lro(&path, api::CONTAINER_APPS, wait).await
    }
}
