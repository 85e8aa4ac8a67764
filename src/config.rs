use crate::azure::arm::DEFAULT_ARM_ENDPOINT;
use crate::azure::credentials::CredentialStrategy;
use crate::azure::secrets::SecretStore;
use crate::error::{AppError, Result};
use crate::foundation::orchestrator::FoundationOptions;
use crate::foundation::stage::StageOptions;
use crate::foundation::tags::{self, TagSet};

#[derive(Debug, Clone, PartialEq)]
pub struct FoundationConfig {
    pub subscription_id: String,
    pub tenant_id: Option<String>,
    pub credential: CredentialStrategy,
    pub resource_group_root: Option<String>,
    pub default_providers: Option<Vec<String>>,
    pub default_tags: Option<TagSet>,
    pub retrieve_log_analytics_shared_keys: bool,
    pub arm_endpoint: String,
}

impl FoundationConfig {
    pub async fn load(secrets: &dyn SecretStore) -> Result<FoundationConfig> {
        let subscription_id = secrets.get_required("AZURE_SUBSCRIPTION_ID").await?;
        let tenant_id = secrets.get("AZURE_TENANT_ID").await?;

        let access_token = secrets.get("AZURE_ACCESS_TOKEN").await?;
        let client_id = secrets.get("AZURE_CLIENT_ID").await?;
        let client_secret = secrets.get("AZURE_CLIENT_SECRET").await?;

        let credential = match (access_token, &tenant_id, client_id, client_secret) {
            (Some(token), _, _, _) => CredentialStrategy::Token { token },
            (None, Some(tenant_id), Some(client_id), Some(client_secret)) => {
                CredentialStrategy::ClientSecret {
                    tenant_id: tenant_id.clone(),
                    client_id,
                    client_secret,
                }
            }
            (None, _, client_id, _) => CredentialStrategy::ManagedIdentity { client_id },
        };

        let resource_group_root = secrets.get("RESOURCE_GROUP_ROOT").await?;

        let default_providers = secrets
            .get("DEFAULT_PROVIDERS")
            .await?
            .map(|raw| {
                raw.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|providers| !providers.is_empty());

        let default_tags = secrets
            .get("DEFAULT_TAGS")
            .await?
            .map(|raw| tags::parse_pairs(&raw))
            .and_then(tags::non_empty);

        let retrieve_log_analytics_shared_keys = match secrets
            .get("RETRIEVE_LOG_ANALYTICS_SHARED_KEYS")
            .await?
        {
            Some(raw) => parse_bool("RETRIEVE_LOG_ANALYTICS_SHARED_KEYS", &raw)?,
            None => false,
        };

        let arm_endpoint = secrets
            .get("ARM_ENDPOINT")
            .await?
            .unwrap_or_else(|| DEFAULT_ARM_ENDPOINT.to_owned());

        Ok(FoundationConfig {
            subscription_id,
            tenant_id,
            credential,
            resource_group_root,
            default_providers,
            default_tags,
            retrieve_log_analytics_shared_keys,
            arm_endpoint,
        })
    }

    pub fn stage_options(&self) -> StageOptions {
        StageOptions {
            subscription_id: self.subscription_id.clone(),
            credential: self.credential.clone(),
        }
    }

    pub fn foundation_options(&self) -> FoundationOptions {
        let mut options = FoundationOptions::new(self.stage_options());
        options.tenant_id = self.tenant_id.clone();
        options.default_providers = self.default_providers.clone();
        options.resource_group_root = self.resource_group_root.clone();
        options.default_tags = self.default_tags.clone();
        options.retrieve_log_analytics_shared_keys = self.retrieve_log_analytics_shared_keys;
        options
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::ConfigurationError(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}
