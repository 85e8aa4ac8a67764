use crate::azure::models::{CategorySetting, DiagnosticSettingParams, RetentionPolicy};
use crate::azure::traits::MonitorApi;
use crate::error::{AppError, Result};
use crate::foundation::identity;
use crate::foundation::stage::{Stage, StageOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const SETTING_PREFIX: &str = "diag";
const SETTING_SALT: &str = "diag";
const SETTING_HASH_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnosticsTarget {
    pub resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnosticsInput {
    pub workspace_resource_id: String,
    pub targets: Vec<DiagnosticsTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppliedSetting {
    pub resource_id: String,
    pub setting_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiagnosticsOutput {
    pub applied: Vec<AppliedSetting>,
}

/// `diag-<first 12 hex of derive(resource_id, "diag")>`
pub fn setting_name(resource_id: &str) -> String {
    identity::short_name(SETTING_PREFIX, &[resource_id, SETTING_SALT], SETTING_HASH_LEN)
}

/// Enabled entries in input order. Retention belongs to the workspace.
pub fn category_settings(categories: Option<&Vec<String>>) -> Option<Vec<CategorySetting>> {
    categories.map(|categories| {
        categories
            .iter()
            .map(|category| CategorySetting {
                category: category.clone(),
                enabled: true,
                retention_policy: RetentionPolicy {
                    enabled: false,
                    days: 0,
                },
            })
            .collect()
    })
}

pub struct DiagnosticsStage {
    monitor: Arc<dyn MonitorApi>,
    options: Arc<StageOptions>,
}

impl DiagnosticsStage {
    pub fn new(monitor: Arc<dyn MonitorApi>, options: Arc<StageOptions>) -> Self {
        Self { monitor, options }
    }
}

#[async_trait]
impl Stage for DiagnosticsStage {
    type Input = DiagnosticsInput;
    type Output = DiagnosticsOutput;

    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn description(&self) -> &'static str {
        "Wiring diagnostic settings to the workspace"
    }

    fn validate(&self, input: &DiagnosticsInput) -> Result<()> {
        if input.workspace_resource_id.trim().is_empty() {
            return Err(AppError::ConfigurationError(
                "Diagnostics wiring requires a workspace resource id".to_string(),
            ));
        }
        Ok(())
    }

    async fn run(&self, input: DiagnosticsInput) -> Result<DiagnosticsOutput> {
        let mut applied = Vec::with_capacity(input.targets.len());

        // One call per target, in order, so a failure names its target.
        for target in &input.targets {
            let name = setting_name(&target.resource_id);
            debug!(
                subscription_id = %self.options.subscription_id,
                resource_id = %target.resource_id,
                setting = %name,
                "🩺 Applying diagnostic setting"
            );

            self.monitor
                .create_or_update_diagnostic_setting(
                    &target.resource_id,
                    &name,
                    &DiagnosticSettingParams {
                        workspace_id: input.workspace_resource_id.clone(),
                        logs: category_settings(target.logs.as_ref()),
                        metrics: category_settings(target.metrics.as_ref()),
                    },
                )
                .await?;

            applied.push(AppliedSetting {
                resource_id: target.resource_id.clone(),
                setting_name: name,
            });
        }

        info!(applied = applied.len(), "✅ Diagnostic settings applied");
        Ok(DiagnosticsOutput { applied })
    }
}
