//! Typed request/response shapes for the cloud management collaborators.
//!
//! These mirror the flattened shapes the management SDKs expose. Wire encoding
//! for the REST API lives in `arm::wire`; stage logic only ever sees these.

use crate::foundation::tags::TagSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub namespace: String,
    pub registration_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupParams {
    pub location: String,
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubnetParams {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetworkParams {
    pub location: String,
    pub address_prefixes: Vec<String>,
    pub subnets: Vec<SubnetParams>,
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualNetwork {
    pub id: Option<String>,
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceParams {
    pub location: String,
    pub sku_name: String,
    pub retention_in_days: Option<u32>,
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Option<String>,
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedKeys {
    pub primary_shared_key: Option<String>,
    pub secondary_shared_key: Option<String>,
}

/// Per-category permission lists of a vault access policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permissions {
    pub keys: Option<Vec<String>>,
    pub secrets: Option<Vec<String>>,
    pub certificates: Option<Vec<String>>,
    pub storage: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicyEntry {
    pub tenant_id: String,
    pub object_id: String,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultParams {
    pub location: String,
    pub tenant_id: String,
    pub sku_family: String,
    pub sku_name: String,
    pub access_policies: Option<Vec<AccessPolicyEntry>>,
    pub enabled_for_deployment: bool,
    pub enabled_for_template_deployment: bool,
    pub enable_soft_delete: bool,
    pub soft_delete_retention_in_days: u32,
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: Option<String>,
    pub vault_uri: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub enabled: bool,
    pub days: u32,
}

/// One log or metric category routed by a diagnostic setting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySetting {
    pub category: String,
    pub enabled: bool,
    pub retention_policy: RetentionPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSettingParams {
    pub workspace_id: String,
    pub logs: Option<Vec<CategorySetting>>,
    pub metrics: Option<Vec<CategorySetting>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSetting {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssignmentParams {
    pub policy_definition_id: String,
    pub parameters: Option<BTreeMap<String, Value>>,
    pub scope: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignmentParams {
    pub role_definition_id: String,
    pub principal_id: String,
    pub condition: Option<String>,
    pub condition_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Scale bounds of a container app template. Unknown keys (scale rules and
/// the like) are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAppTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleSettings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerApp {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub tags: Option<TagSet>,
    pub managed_environment_id: Option<String>,
    /// Passed back verbatim on update; never inspected.
    pub configuration: Option<Value>,
    pub template: Option<ContainerAppTemplate>,
    pub latest_revision_name: Option<String>,
    pub latest_ready_revision_name: Option<String>,
    pub active_revision_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub traffic_weight: Option<f64>,
    pub replicas: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    pub name: Option<String>,
    pub status: Option<String>,
}
