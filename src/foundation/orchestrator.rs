//! The cloud foundation pipeline.
//!
//! Provider registration and the landing zone always run. Every other stage
//! is opted in by supplying its block in the request, and runs against the
//! resource group the landing zone resolved.

use crate::azure::services::CloudServices;
use crate::context::ProvisioningContext;
use crate::error::{AppError, Result};
use crate::foundation::diagnostics::{
    DiagnosticsInput, DiagnosticsOutput, DiagnosticsStage, DiagnosticsTarget,
};
use crate::foundation::governance::{GovernanceInput, GovernanceOutput, GovernanceStage};
use crate::foundation::key_vault::{
    AccessPolicyConfig, KeyVaultInput, KeyVaultOutput, KeyVaultStage,
};
use crate::foundation::landing_zone::{
    self, LandingZoneInput, LandingZoneOutput, LandingZoneStage, NetworkConfig, ResourceGroupConfig,
    DEFAULT_RESOURCE_GROUP_ROOT,
};
use crate::foundation::log_analytics::{LogAnalyticsInput, LogAnalyticsOutput, LogAnalyticsStage};
use crate::foundation::providers::{EnsureProvidersStage, ProvidersInput, ProvidersOutput};
use crate::foundation::stage::{execute_stage, PollPolicy, StageOptions};
use crate::foundation::tags::TagSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyVaultConfig {
    pub vault_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_policies: Option<Vec<AccessPolicyConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogAnalyticsConfig {
    pub workspace_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnosticsConfig {
    /// Overrides the workspace produced by the Log Analytics stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_resource_id: Option<String>,
    #[serde(default)]
    pub targets: Vec<DiagnosticsTarget>,
}

impl DiagnosticsConfig {
    fn explicit_workspace(&self) -> Option<&str> {
        self.workspace_resource_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

pub type GovernanceConfig = GovernanceInput;

/// Input document of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_lookup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
    pub resource_group: ResourceGroupConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_vault: Option<KeyVaultConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_analytics: Option<LogAnalyticsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceConfig>,
}

impl ProvisioningRequest {
    /// Parse a YAML or JSON document.
    pub fn from_document(document: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(document)?)
    }

    fn diagnostics_with_targets(&self) -> Option<&DiagnosticsConfig> {
        self.diagnostics.as_ref().filter(|d| !d.targets.is_empty())
    }

    fn governance_with_assignments(&self) -> Option<&GovernanceConfig> {
        self.governance.as_ref().filter(|g| g.has_assignments())
    }
}

/// Static configuration of the pipeline, fixed for a run.
#[derive(Debug, Clone)]
pub struct FoundationOptions {
    pub stage: StageOptions,
    pub tenant_id: Option<String>,
    pub default_providers: Option<Vec<String>>,
    pub resource_group_root: Option<String>,
    pub default_tags: Option<TagSet>,
    pub retrieve_log_analytics_shared_keys: bool,
    pub provider_poll: PollPolicy,
}

impl FoundationOptions {
    pub fn new(stage: StageOptions) -> Self {
        Self {
            stage,
            tenant_id: None,
            default_providers: None,
            resource_group_root: None,
            default_tags: None,
            retrieve_log_analytics_shared_keys: false,
            provider_poll: PollPolicy::default(),
        }
    }
}

/// Aggregate result. A stage's field is present exactly when it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FoundationResult {
    pub providers: ProvidersOutput,
    pub landing_zone: LandingZoneOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_vault: Option<KeyVaultOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_analytics: Option<LogAnalyticsOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceOutput>,
}

pub struct FoundationStages {
    pub providers: EnsureProvidersStage,
    pub landing_zone: LandingZoneStage,
    pub log_analytics: LogAnalyticsStage,
    pub diagnostics: DiagnosticsStage,
    pub governance: GovernanceStage,
    /// Built only when a tenant is configured.
    pub key_vault: Option<KeyVaultStage>,
}

pub struct CloudFoundation {
    stages: FoundationStages,
    resource_group_root: String,
}

impl CloudFoundation {
    pub fn build(
        options: FoundationOptions,
        services: &CloudServices,
        context: Arc<ProvisioningContext>,
    ) -> Result<Self> {
        let shared = Arc::new(options.stage.clone());
        let resource_group_root = options
            .resource_group_root
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RESOURCE_GROUP_ROOT.to_string());

        let key_vault = match options.tenant_id.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(tenant) => Some(KeyVaultStage::new(
                services.key_vault.clone(),
                shared.clone(),
                tenant,
            )?),
            None => None,
        };

        let stages = FoundationStages {
            providers: EnsureProvidersStage::new(services.resources.clone(), shared.clone())
                .with_default_providers(options.default_providers.clone().unwrap_or_default())
                .with_poll_policy(options.provider_poll.clone()),
            landing_zone: LandingZoneStage::new(
                services.resources.clone(),
                services.network.clone(),
                shared.clone(),
                context,
            )
            .with_root(resource_group_root.clone())
            .with_default_tags(options.default_tags.clone().unwrap_or_default()),
            log_analytics: LogAnalyticsStage::new(services.insights.clone(), shared.clone())
                .with_shared_keys(options.retrieve_log_analytics_shared_keys),
            diagnostics: DiagnosticsStage::new(services.monitor.clone(), shared.clone()),
            governance: GovernanceStage::new(
                services.policy.clone(),
                services.authorization.clone(),
                shared,
            ),
            key_vault,
        };

        Ok(Self {
            stages,
            resource_group_root,
        })
    }

    pub fn stages(&self) -> &FoundationStages {
        &self.stages
    }

    /// Cross-field checks that must hold before anything is provisioned.
    pub fn validate(&self, request: &ProvisioningRequest) -> Result<()> {
        landing_zone::resource_group_name(
            &self.resource_group_root,
            request.resource_group.name.as_deref(),
            request.workspace_lookup.as_deref(),
        )?;

        if request.key_vault.is_some() && self.stages.key_vault.is_none() {
            return Err(AppError::ConfigurationError(
                "A TenantId must be configured when a KeyVault block is provided".to_string(),
            ));
        }

        if let Some(diagnostics) = request.diagnostics_with_targets() {
            if diagnostics.explicit_workspace().is_none() && request.log_analytics.is_none() {
                return Err(AppError::ConfigurationError(
                    "Diagnostics require a WorkspaceResourceId or a LogAnalytics block".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub async fn run(&self, request: ProvisioningRequest) -> Result<FoundationResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("foundation", run_id = %run_id);

        async {
            let started = Instant::now();
            info!("🚀 Starting cloud foundation run");

            match self.run_stages(request).await {
                Ok(result) => {
                    info!(
                        duration_ms = started.elapsed().as_millis() as u64,
                        resource_group = %result.landing_zone.resource_group.name,
                        "✅ Cloud foundation run completed"
                    );
                    Ok(result)
                }
                Err(e) => {
                    error!(error = %e, "❌ Cloud foundation run failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, request: ProvisioningRequest) -> Result<FoundationResult> {
        self.validate(&request)?;

        let providers = execute_stage(
            &self.stages.providers,
            ProvidersInput {
                providers: request.providers.clone(),
            },
        )
        .await?;

        let landing_zone = execute_stage(
            &self.stages.landing_zone,
            LandingZoneInput {
                workspace_lookup: request.workspace_lookup.clone(),
                resource_group: request.resource_group.clone(),
                network: request.network.clone(),
            },
        )
        .await?;
        let resource_group_name = landing_zone.resource_group.name.clone();
        let location = landing_zone.resource_group.location.clone();

        let log_analytics = match &request.log_analytics {
            Some(config) => Some(
                execute_stage(
                    &self.stages.log_analytics,
                    LogAnalyticsInput {
                        workspace_name: config.workspace_name.clone(),
                        location: location.clone(),
                        resource_group_name: resource_group_name.clone(),
                        retention_in_days: config.retention_in_days,
                        tags: config.tags.clone(),
                    },
                )
                .await?,
            ),
            None => None,
        };

        let key_vault = match &request.key_vault {
            Some(config) => {
                let stage = self.stages.key_vault.as_ref().ok_or_else(|| {
                    AppError::ConfigurationError(
                        "A TenantId must be configured when a KeyVault block is provided"
                            .to_string(),
                    )
                })?;
                Some(
                    execute_stage(
                        stage,
                        KeyVaultInput {
                            vault_name: config.vault_name.clone(),
                            location: location.clone(),
                            resource_group_name: resource_group_name.clone(),
                            access_policies: config.access_policies.clone(),
                            tags: config.tags.clone(),
                        },
                    )
                    .await?,
                )
            }
            None => None,
        };

        let diagnostics = match request.diagnostics_with_targets() {
            Some(config) => {
                let workspace_resource_id = config
                    .explicit_workspace()
                    .map(str::to_string)
                    .or_else(|| {
                        log_analytics
                            .as_ref()
                            .map(|la| la.workspace_id.clone())
                            .filter(|id| !id.is_empty())
                    })
                    .ok_or_else(|| {
                        AppError::ConfigurationError(
                            "Diagnostics require a WorkspaceResourceId or a LogAnalytics block"
                                .to_string(),
                        )
                    })?;

                Some(
                    execute_stage(
                        &self.stages.diagnostics,
                        DiagnosticsInput {
                            workspace_resource_id,
                            targets: config.targets.clone(),
                        },
                    )
                    .await?,
                )
            }
            None => None,
        };

        let governance = match request.governance_with_assignments() {
            Some(config) => Some(execute_stage(&self.stages.governance, config.clone()).await?),
            None => None,
        };

        Ok(FoundationResult {
            providers,
            landing_zone,
            key_vault,
            log_analytics,
            diagnostics,
            governance,
        })
    }
}
