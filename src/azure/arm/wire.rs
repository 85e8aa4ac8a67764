//! JSON shapes of the Azure Resource Manager REST API and their mapping onto
//! the collaborator models.

use crate::azure::models::*;
use crate::foundation::tags::TagSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct OperationStatus {
    pub status: Option<String>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OperationError {
    pub code: Option<String>,
    pub message: Option<String>,
}

// ---------- Resources ----------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ProviderBody {
    pub namespace: Option<String>,
    pub registration_state: Option<String>,
}

impl ProviderBody {
    pub fn into_model(self, requested: &str) -> ProviderInfo {
        ProviderInfo {
            namespace: self.namespace.unwrap_or_else(|| requested.to_string()),
            registration_state: self.registration_state,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LocationBody {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

impl From<LocationBody> for Location {
    fn from(body: LocationBody) -> Self {
        Location {
            name: body.name,
            display_name: body.display_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResourceGroupRequest<'a> {
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a TagSet>,
}

impl<'a> From<&'a ResourceGroupParams> for ResourceGroupRequest<'a> {
    fn from(params: &'a ResourceGroupParams) -> Self {
        ResourceGroupRequest {
            location: &params.location,
            tags: params.tags.as_ref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResourceGroupBody {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub tags: Option<TagSet>,
}

impl From<ResourceGroupBody> for ResourceGroup {
    fn from(body: ResourceGroupBody) -> Self {
        ResourceGroup {
            id: body.id,
            name: body.name,
            location: body.location,
            tags: body.tags,
        }
    }
}

// ---------- Network ----------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VirtualNetworkRequest<'a> {
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a TagSet>,
    pub properties: VirtualNetworkRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VirtualNetworkRequestProperties<'a> {
    pub address_space: AddressSpace<'a>,
    pub subnets: Vec<SubnetRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddressSpace<'a> {
    pub address_prefixes: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct SubnetRequest<'a> {
    pub name: &'a str,
    pub properties: SubnetRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubnetRequestProperties<'a> {
    pub address_prefix: &'a str,
}

impl<'a> From<&'a VirtualNetworkParams> for VirtualNetworkRequest<'a> {
    fn from(params: &'a VirtualNetworkParams) -> Self {
        VirtualNetworkRequest {
            location: &params.location,
            tags: params.tags.as_ref(),
            properties: VirtualNetworkRequestProperties {
                address_space: AddressSpace {
                    address_prefixes: &params.address_prefixes,
                },
                subnets: params
                    .subnets
                    .iter()
                    .map(|subnet| SubnetRequest {
                        name: &subnet.name,
                        properties: SubnetRequestProperties {
                            address_prefix: &subnet.address_prefix,
                        },
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VirtualNetworkBody {
    pub id: Option<String>,
    pub properties: VirtualNetworkBodyProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VirtualNetworkBodyProperties {
    pub subnets: Vec<SubnetBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SubnetBody {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl From<VirtualNetworkBody> for VirtualNetwork {
    fn from(body: VirtualNetworkBody) -> Self {
        VirtualNetwork {
            id: body.id,
            subnets: body
                .properties
                .subnets
                .into_iter()
                .map(|s| Subnet {
                    name: s.name,
                    id: s.id,
                })
                .collect(),
        }
    }
}

// ---------- Operational Insights ----------

#[derive(Debug, Serialize)]
pub(crate) struct WorkspaceRequest<'a> {
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a TagSet>,
    pub properties: WorkspaceRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkspaceRequestProperties<'a> {
    pub sku: NamedSku<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NamedSku<'a> {
    pub name: &'a str,
}

impl<'a> From<&'a WorkspaceParams> for WorkspaceRequest<'a> {
    fn from(params: &'a WorkspaceParams) -> Self {
        WorkspaceRequest {
            location: &params.location,
            tags: params.tags.as_ref(),
            properties: WorkspaceRequestProperties {
                sku: NamedSku {
                    name: &params.sku_name,
                },
                retention_in_days: params.retention_in_days,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WorkspaceBody {
    pub id: Option<String>,
    pub properties: WorkspaceBodyProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WorkspaceBodyProperties {
    pub customer_id: Option<String>,
}

impl From<WorkspaceBody> for Workspace {
    fn from(body: WorkspaceBody) -> Self {
        Workspace {
            id: body.id,
            customer_id: body.properties.customer_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct SharedKeysBody {
    pub primary_shared_key: Option<String>,
    pub secondary_shared_key: Option<String>,
}

impl From<SharedKeysBody> for SharedKeys {
    fn from(body: SharedKeysBody) -> Self {
        SharedKeys {
            primary_shared_key: body.primary_shared_key,
            secondary_shared_key: body.secondary_shared_key,
        }
    }
}

// ---------- Key Vault ----------

#[derive(Debug, Serialize)]
pub(crate) struct VaultRequest<'a> {
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a TagSet>,
    pub properties: VaultRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VaultRequestProperties<'a> {
    pub tenant_id: &'a str,
    pub sku: VaultSku<'a>,
    pub access_policies: Vec<AccessPolicyRequest<'a>>,
    pub enabled_for_deployment: bool,
    pub enabled_for_template_deployment: bool,
    pub enable_soft_delete: bool,
    pub soft_delete_retention_in_days: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct VaultSku<'a> {
    pub family: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessPolicyRequest<'a> {
    pub tenant_id: &'a str,
    pub object_id: &'a str,
    pub permissions: PermissionsRequest<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PermissionsRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'a [String]>,
}

impl<'a> From<&'a VaultParams> for VaultRequest<'a> {
    fn from(params: &'a VaultParams) -> Self {
        let access_policies = params
            .access_policies
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|policy| AccessPolicyRequest {
                tenant_id: &policy.tenant_id,
                object_id: &policy.object_id,
                permissions: PermissionsRequest {
                    keys: policy.permissions.keys.as_deref(),
                    secrets: policy.permissions.secrets.as_deref(),
                    certificates: policy.permissions.certificates.as_deref(),
                    storage: policy.permissions.storage.as_deref(),
                },
            })
            .collect();

        VaultRequest {
            location: &params.location,
            tags: params.tags.as_ref(),
            properties: VaultRequestProperties {
                tenant_id: &params.tenant_id,
                sku: VaultSku {
                    family: &params.sku_family,
                    name: &params.sku_name,
                },
                access_policies,
                enabled_for_deployment: params.enabled_for_deployment,
                enabled_for_template_deployment: params.enabled_for_template_deployment,
                enable_soft_delete: params.enable_soft_delete,
                soft_delete_retention_in_days: params.soft_delete_retention_in_days,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct VaultBody {
    pub id: Option<String>,
    pub properties: VaultBodyProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct VaultBodyProperties {
    pub vault_uri: Option<String>,
}

impl From<VaultBody> for Vault {
    fn from(body: VaultBody) -> Self {
        Vault {
            id: body.id,
            vault_uri: body.properties.vault_uri,
        }
    }
}

// ---------- Monitor ----------

#[derive(Debug, Serialize)]
pub(crate) struct DiagnosticSettingRequest<'a> {
    pub properties: DiagnosticSettingRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DiagnosticSettingRequestProperties<'a> {
    pub workspace_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<CategoryRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<CategoryRequest<'a>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryRequest<'a> {
    pub category: &'a str,
    pub enabled: bool,
    pub retention_policy: &'a RetentionPolicy,
}

fn categories(settings: &Option<Vec<CategorySetting>>) -> Option<Vec<CategoryRequest<'_>>> {
    settings.as_ref().map(|entries| {
        entries
            .iter()
            .map(|entry| CategoryRequest {
                category: &entry.category,
                enabled: entry.enabled,
                retention_policy: &entry.retention_policy,
            })
            .collect()
    })
}

impl<'a> From<&'a DiagnosticSettingParams> for DiagnosticSettingRequest<'a> {
    fn from(params: &'a DiagnosticSettingParams) -> Self {
        DiagnosticSettingRequest {
            properties: DiagnosticSettingRequestProperties {
                workspace_id: &params.workspace_id,
                logs: categories(&params.logs),
                metrics: categories(&params.metrics),
            },
        }
    }
}

/// Plain `{id, name}` body shared by settings and assignments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NamedResourceBody {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl From<NamedResourceBody> for DiagnosticSetting {
    fn from(body: NamedResourceBody) -> Self {
        DiagnosticSetting {
            id: body.id,
            name: body.name,
        }
    }
}

impl From<NamedResourceBody> for PolicyAssignment {
    fn from(body: NamedResourceBody) -> Self {
        PolicyAssignment {
            id: body.id,
            name: body.name,
        }
    }
}

impl From<NamedResourceBody> for RoleAssignment {
    fn from(body: NamedResourceBody) -> Self {
        RoleAssignment {
            id: body.id,
            name: body.name,
        }
    }
}

// ---------- Policy / Authorization ----------

#[derive(Debug, Serialize)]
pub(crate) struct PolicyAssignmentRequest<'a> {
    pub properties: PolicyAssignmentRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PolicyAssignmentRequestProperties<'a> {
    pub policy_definition_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<&'a BTreeMap<String, Value>>,
    pub scope: &'a str,
}

impl<'a> From<&'a PolicyAssignmentParams> for PolicyAssignmentRequest<'a> {
    fn from(params: &'a PolicyAssignmentParams) -> Self {
        PolicyAssignmentRequest {
            properties: PolicyAssignmentRequestProperties {
                policy_definition_id: &params.policy_definition_id,
                parameters: params.parameters.as_ref(),
                scope: &params.scope,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleAssignmentRequest<'a> {
    pub properties: RoleAssignmentRequestProperties<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoleAssignmentRequestProperties<'a> {
    pub role_definition_id: &'a str,
    pub principal_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_version: Option<&'a str>,
}

impl<'a> From<&'a RoleAssignmentParams> for RoleAssignmentRequest<'a> {
    fn from(params: &'a RoleAssignmentParams) -> Self {
        RoleAssignmentRequest {
            properties: RoleAssignmentRequestProperties {
                role_definition_id: &params.role_definition_id,
                principal_id: &params.principal_id,
                condition: params.condition.as_deref(),
                condition_version: params.condition_version.as_deref(),
            },
        }
    }
}

// ---------- Container Apps ----------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ContainerAppBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
    pub properties: ContainerAppProperties,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ContainerAppProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_environment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<ContainerAppTemplate>,
    #[serde(skip_serializing)]
    pub latest_revision_name: Option<String>,
    #[serde(skip_serializing)]
    pub latest_ready_revision_name: Option<String>,
    #[serde(skip_serializing)]
    pub active_revision_names: Vec<String>,
}

impl From<ContainerAppBody> for ContainerApp {
    fn from(body: ContainerAppBody) -> Self {
        ContainerApp {
            id: body.id,
            name: body.name,
            location: body.location,
            tags: body.tags,
            managed_environment_id: body.properties.managed_environment_id,
            configuration: body.properties.configuration,
            template: body.properties.template,
            latest_revision_name: body.properties.latest_revision_name,
            latest_ready_revision_name: body.properties.latest_ready_revision_name,
            active_revision_names: body.properties.active_revision_names,
        }
    }
}

impl From<&ContainerApp> for ContainerAppBody {
    fn from(app: &ContainerApp) -> Self {
        ContainerAppBody {
            id: None,
            name: None,
            location: app.location.clone(),
            tags: app.tags.clone(),
            properties: ContainerAppProperties {
                managed_environment_id: app.managed_environment_id.clone(),
                configuration: app.configuration.clone(),
                template: app.template.clone(),
                latest_revision_name: None,
                latest_ready_revision_name: None,
                active_revision_names: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RevisionBody {
    pub name: Option<String>,
    pub properties: RevisionProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RevisionProperties {
    pub active: Option<bool>,
    pub traffic_weight: Option<f64>,
    pub replicas: Option<u32>,
}

impl From<RevisionBody> for Revision {
    fn from(body: RevisionBody) -> Self {
        Revision {
            name: body.name,
            active: body.properties.active,
            traffic_weight: body.properties.traffic_weight,
            replicas: body.properties.replicas,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReplicaBody {
    pub name: Option<String>,
    pub properties: ReplicaProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ReplicaProperties {
    pub running_state: Option<String>,
}

impl From<ReplicaBody> for Replica {
    fn from(body: ReplicaBody) -> Self {
        Replica {
            name: body.name,
            status: body.properties.running_state,
        }
    }
}
