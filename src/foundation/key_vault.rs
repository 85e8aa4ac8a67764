use crate::azure::models::{AccessPolicyEntry, Permissions, VaultParams};
use crate::azure::traits::KeyVaultApi;
use crate::error::{AppError, Result};
use crate::foundation::stage::{Stage, StageOptions};
use crate::foundation::tags::{self, TagSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const VAULT_SKU_NAME: &str = "standard";
pub const VAULT_SKU_FAMILY: &str = "A";
pub const SOFT_DELETE_RETENTION_DAYS: u32 = 90;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccessPolicyConfig {
    pub tenant_id: String,
    pub object_id: String,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

impl From<&AccessPolicyConfig> for AccessPolicyEntry {
    fn from(policy: &AccessPolicyConfig) -> Self {
        AccessPolicyEntry {
            tenant_id: policy.tenant_id.clone(),
            object_id: policy.object_id.clone(),
            permissions: Permissions {
                keys: policy.permissions.keys.clone(),
                secrets: policy.permissions.secrets.clone(),
                certificates: policy.permissions.certificates.clone(),
                storage: policy.permissions.storage.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyVaultInput {
    pub vault_name: String,
    pub location: String,
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_policies: Option<Vec<AccessPolicyConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyVaultOutput {
    pub vault_id: String,
    pub vault_uri: String,
}

pub struct KeyVaultStage {
    vaults: Arc<dyn KeyVaultApi>,
    options: Arc<StageOptions>,
    tenant_id: String,
}

impl KeyVaultStage {
    pub fn new(
        vaults: Arc<dyn KeyVaultApi>,
        options: Arc<StageOptions>,
        tenant_id: impl Into<String>,
    ) -> Result<Self> {
        let tenant_id = tenant_id.into();
        if tenant_id.trim().is_empty() {
            return Err(AppError::ConfigurationError(
                "Key Vault stage requires a tenant id".to_string(),
            ));
        }

        Ok(Self {
            vaults,
            options,
            tenant_id,
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

#[async_trait]
impl Stage for KeyVaultStage {
    type Input = KeyVaultInput;
    type Output = KeyVaultOutput;

    fn name(&self) -> &'static str {
        "key-vault"
    }

    fn description(&self) -> &'static str {
        "Ensuring Key Vault with access policies"
    }

    async fn run(&self, input: KeyVaultInput) -> Result<KeyVaultOutput> {
        let access_policies = input
            .access_policies
            .as_ref()
            .map(|policies| policies.iter().map(AccessPolicyEntry::from).collect::<Vec<_>>());

        info!(
            subscription_id = %self.options.subscription_id,
            resource_group = %input.resource_group_name,
            vault = %input.vault_name,
            policies = access_policies.as_ref().map_or(0, |p| p.len()),
            "🔐 Converging Key Vault"
        );

        let vault = self
            .vaults
            .create_or_update_vault(
                &input.resource_group_name,
                &input.vault_name,
                &VaultParams {
                    location: input.location.clone(),
                    tenant_id: self.tenant_id.clone(),
                    sku_family: VAULT_SKU_FAMILY.to_string(),
                    sku_name: VAULT_SKU_NAME.to_string(),
                    access_policies,
                    enabled_for_deployment: true,
                    enabled_for_template_deployment: true,
                    enable_soft_delete: true,
                    soft_delete_retention_in_days: SOFT_DELETE_RETENTION_DAYS,
                    tags: tags::non_empty(tags::normalize(input.tags.as_ref())),
                },
            )
            .await?;

        Ok(KeyVaultOutput {
            vault_id: vault.id.unwrap_or_default(),
            vault_uri: vault.vault_uri.unwrap_or_default(),
        })
    }
}
