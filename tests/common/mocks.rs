use async_trait::async_trait;
use cloud_foundation::azure::models::*;
use cloud_foundation::azure::traits::*;
use cloud_foundation::error::{AppError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const SUBSCRIPTION_ID: &str = "sub-123";

/// One recorded collaborator call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetProvider(String),
    RegisterProvider(String),
    ListLocations(String),
    ResourceGroup {
        name: String,
        params: ResourceGroupParams,
    },
    VirtualNetwork {
        resource_group: String,
        name: String,
        params: VirtualNetworkParams,
    },
    Workspace {
        resource_group: String,
        name: String,
        params: WorkspaceParams,
    },
    SharedKeys {
        resource_group: String,
        name: String,
    },
    Vault {
        resource_group: String,
        name: String,
        params: VaultParams,
    },
    DiagnosticSetting {
        resource_uri: String,
        name: String,
        params: DiagnosticSettingParams,
    },
    PolicyAssignment {
        scope: String,
        name: String,
        params: PolicyAssignmentParams,
    },
    RoleAssignment {
        scope: String,
        name: String,
        params: RoleAssignmentParams,
    },
    GetContainerApp(String),
    ListRevisions(String),
    ListReplicas {
        app: String,
        revision: String,
    },
    UpdateContainerApp {
        name: String,
        app: ContainerApp,
    },
    StartContainerApp {
        name: String,
        wait: bool,
    },
    StopContainerApp {
        name: String,
        wait: bool,
    },
}

impl Call {
    /// True for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::GetProvider(_)
                | Call::ListLocations(_)
                | Call::GetContainerApp(_)
                | Call::ListRevisions(_)
                | Call::ListReplicas { .. }
                | Call::SharedKeys { .. }
        )
    }
}

/// In-memory cloud implementing every collaborator trait
pub struct FakeCloud {
    calls: Arc<RwLock<Vec<Call>>>,
    provider_states: RwLock<HashMap<String, VecDeque<Option<String>>>>,
    failing: RwLock<HashSet<String>>,
    locations: RwLock<Vec<Location>>,
    subnets: RwLock<Option<Vec<Subnet>>>,
    container_app: RwLock<Option<ContainerApp>>,
    revisions: RwLock<Option<Vec<Revision>>>,
    replicas: RwLock<HashMap<String, Vec<Replica>>>,
    toggle: ToggleSupport,
}

impl Default for FakeCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            provider_states: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            locations: RwLock::new(vec![
                Location {
                    name: Some("westus2".to_string()),
                    display_name: Some("West US 2".to_string()),
                },
                Location {
                    name: Some("eastus".to_string()),
                    display_name: None,
                },
            ]),
            subnets: RwLock::new(None),
            container_app: RwLock::new(None),
            revisions: RwLock::new(Some(Vec::new())),
            replicas: RwLock::new(HashMap::new()),
            toggle: ToggleSupport::None,
        }
    }

    /// Successive `get_provider` answers; the last one repeats.
    pub fn with_provider_states(mut self, namespace: &str, states: Vec<Option<&str>>) -> Self {
        self.provider_states.get_mut().insert(
            namespace.to_string(),
            states.into_iter().map(|s| s.map(str::to_string)).collect(),
        );
        self
    }

    /// Make an operation (or a provider namespace) fail.
    pub fn failing(mut self, key: &str) -> Self {
        self.failing.get_mut().insert(key.to_string());
        self
    }

    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        *self.locations.get_mut() = locations;
        self
    }

    /// Subnets the virtual network reports back, instead of echoing the request.
    pub fn with_subnets(mut self, subnets: Vec<Subnet>) -> Self {
        *self.subnets.get_mut() = Some(subnets);
        self
    }

    pub fn with_container_app(mut self, app: ContainerApp) -> Self {
        *self.container_app.get_mut() = Some(app);
        self
    }

    /// `None` makes revision listing fail.
    pub fn with_revisions(mut self, revisions: Option<Vec<Revision>>) -> Self {
        *self.revisions.get_mut() = revisions;
        self
    }

    /// Revisions without replicas make replica listing fail.
    pub fn with_replicas(mut self, revision: &str, replicas: Vec<Replica>) -> Self {
        self.replicas.get_mut().insert(revision.to_string(), replicas);
        self
    }

    pub fn with_toggle_support(mut self, toggle: ToggleSupport) -> Self {
        self.toggle = toggle;
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.read().await.clone()
    }

    pub async fn mutations(&self) -> Vec<Call> {
        self.calls()
            .await
            .into_iter()
            .filter(Call::is_mutation)
            .collect()
    }

    pub async fn count<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.calls.read().await.iter().filter(|c| predicate(c)).count()
    }

    async fn record(&self, call: Call) {
        self.calls.write().await.push(call);
    }

    async fn check(&self, key: &str) -> Result<()> {
        if self.failing.read().await.contains(key) {
            return Err(AppError::ExternalServiceError(format!("{} failed", key)));
        }
        Ok(())
    }

    fn rg_id(resource_group: &str) -> String {
        format!("/subscriptions/{}/resourceGroups/{}", SUBSCRIPTION_ID, resource_group)
    }
}

#[async_trait]
impl ResourceManagementApi for FakeCloud {
    async fn get_provider(&self, namespace: &str) -> Result<ProviderInfo> {
        self.record(Call::GetProvider(namespace.to_string())).await;
        self.check(namespace).await?;

        let mut states = self.provider_states.write().await;
        let registration_state = match states.get_mut(namespace) {
            Some(queue) if queue.len() > 1 => queue.pop_front().flatten(),
            Some(queue) => queue.front().cloned().flatten(),
            None => Some("Registered".to_string()),
        };

        Ok(ProviderInfo {
            namespace: namespace.to_string(),
            registration_state,
        })
    }

    async fn register_provider(&self, namespace: &str) -> Result<ProviderInfo> {
        self.record(Call::RegisterProvider(namespace.to_string())).await;
        Ok(ProviderInfo {
            namespace: namespace.to_string(),
            registration_state: Some("Registering".to_string()),
        })
    }

    async fn list_locations(&self, subscription_id: &str) -> Result<Vec<Location>> {
        self.record(Call::ListLocations(subscription_id.to_string())).await;
        self.check("list_locations").await?;
        Ok(self.locations.read().await.clone())
    }

    async fn create_or_update_resource_group(
        &self,
        name: &str,
        params: &ResourceGroupParams,
    ) -> Result<ResourceGroup> {
        self.record(Call::ResourceGroup {
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_or_update_resource_group").await?;

        Ok(ResourceGroup {
            id: Some(Self::rg_id(name)),
            name: Some(name.to_string()),
            location: Some(params.location.clone()),
            tags: params.tags.clone(),
        })
    }
}

#[async_trait]
impl NetworkApi for FakeCloud {
    async fn create_or_update_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
        params: &VirtualNetworkParams,
    ) -> Result<VirtualNetwork> {
        self.record(Call::VirtualNetwork {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_or_update_virtual_network").await?;

        let subnets = match self.subnets.read().await.clone() {
            Some(subnets) => subnets,
            None => params
                .subnets
                .iter()
                .map(|subnet| Subnet {
                    name: Some(subnet.name.clone()),
                    id: Some(format!("{}/{}/{}", resource_group, name, subnet.name)),
                })
                .collect(),
        };

        Ok(VirtualNetwork {
            id: Some(format!(
                "{}/providers/Microsoft.Network/virtualNetworks/{}",
                Self::rg_id(resource_group),
                name
            )),
            subnets,
        })
    }
}

#[async_trait]
impl OperationalInsightsApi for FakeCloud {
    async fn create_or_update_workspace(
        &self,
        resource_group: &str,
        name: &str,
        params: &WorkspaceParams,
    ) -> Result<Workspace> {
        self.record(Call::Workspace {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_or_update_workspace").await?;

        Ok(Workspace {
            id: Some(format!(
                "{}/providers/Microsoft.OperationalInsights/workspaces/{}",
                Self::rg_id(resource_group),
                name
            )),
            customer_id: Some(format!("customer-{}", name)),
        })
    }

    async fn get_shared_keys(&self, resource_group: &str, name: &str) -> Result<SharedKeys> {
        self.record(Call::SharedKeys {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
        })
        .await;
        Ok(SharedKeys {
            primary_shared_key: Some("primary-key".to_string()),
            secondary_shared_key: Some("secondary-key".to_string()),
        })
    }
}

#[async_trait]
impl KeyVaultApi for FakeCloud {
    async fn create_or_update_vault(
        &self,
        resource_group: &str,
        name: &str,
        params: &VaultParams,
    ) -> Result<Vault> {
        self.record(Call::Vault {
            resource_group: resource_group.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_or_update_vault").await?;

        Ok(Vault {
            id: Some(format!(
                "{}/providers/Microsoft.KeyVault/vaults/{}",
                Self::rg_id(resource_group),
                name
            )),
            vault_uri: Some(format!("https://{}.vault.azure.net/", name)),
        })
    }
}

#[async_trait]
impl MonitorApi for FakeCloud {
    async fn create_or_update_diagnostic_setting(
        &self,
        resource_uri: &str,
        name: &str,
        params: &DiagnosticSettingParams,
    ) -> Result<DiagnosticSetting> {
        self.record(Call::DiagnosticSetting {
            resource_uri: resource_uri.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_or_update_diagnostic_setting").await?;

        Ok(DiagnosticSetting {
            id: Some(format!(
                "{}/providers/Microsoft.Insights/diagnosticSettings/{}",
                resource_uri, name
            )),
            name: Some(name.to_string()),
        })
    }
}

#[async_trait]
impl PolicyApi for FakeCloud {
    async fn create_policy_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &PolicyAssignmentParams,
    ) -> Result<PolicyAssignment> {
        self.record(Call::PolicyAssignment {
            scope: scope.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_policy_assignment").await?;

        Ok(PolicyAssignment {
            id: Some(format!(
                "{}/providers/Microsoft.Authorization/policyAssignments/{}",
                scope, name
            )),
            name: Some(name.to_string()),
        })
    }
}

#[async_trait]
impl AuthorizationApi for FakeCloud {
    async fn create_role_assignment(
        &self,
        scope: &str,
        name: &str,
        params: &RoleAssignmentParams,
    ) -> Result<RoleAssignment> {
        self.record(Call::RoleAssignment {
            scope: scope.to_string(),
            name: name.to_string(),
            params: params.clone(),
        })
        .await;
        self.check("create_role_assignment").await?;

        Ok(RoleAssignment {
            id: Some(format!(
                "{}/providers/Microsoft.Authorization/roleAssignments/{}",
                scope, name
            )),
            name: Some(name.to_string()),
        })
    }
}

#[async_trait]
impl ContainerAppsApi for FakeCloud {
    async fn get_container_app(&self, _resource_group: &str, name: &str) -> Result<ContainerApp> {
        self.record(Call::GetContainerApp(name.to_string())).await;
        self.container_app
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("container app {}", name)))
    }

    async fn list_revisions(&self, _resource_group: &str, app_name: &str) -> Result<Vec<Revision>> {
        self.record(Call::ListRevisions(app_name.to_string())).await;
        self.revisions
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::ExternalServiceError("revision listing failed".to_string()))
    }

    async fn list_replicas(
        &self,
        _resource_group: &str,
        app_name: &str,
        revision_name: &str,
    ) -> Result<Vec<Replica>> {
        self.record(Call::ListReplicas {
            app: app_name.to_string(),
            revision: revision_name.to_string(),
        })
        .await;
        self.replicas
            .read()
            .await
            .get(revision_name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("revision {}", revision_name)))
    }

    async fn create_or_update_container_app(
        &self,
        _resource_group: &str,
        name: &str,
        app: &ContainerApp,
    ) -> Result<ContainerApp> {
        self.record(Call::UpdateContainerApp {
            name: name.to_string(),
            app: app.clone(),
        })
        .await;
        self.check("create_or_update_container_app").await?;
        *self.container_app.write().await = Some(app.clone());
        Ok(app.clone())
    }

    fn toggle_support(&self) -> ToggleSupport {
        self.toggle
    }

    async fn start_container_app(
        &self,
        _resource_group: &str,
        name: &str,
        wait: bool,
    ) -> Result<()> {
        self.record(Call::StartContainerApp {
            name: name.to_string(),
            wait,
        })
        .await;
        self.check("start_container_app").await
    }

    async fn stop_container_app(
        &self,
        _resource_group: &str,
        name: &str,
        wait: bool,
    ) -> Result<()> {
        self.record(Call::StopContainerApp {
            name: name.to_string(),
            wait,
        })
        .await;
        self.check("stop_container_app").await
    }
}
