use crate::azure::models::WorkspaceParams;
use crate::azure::traits::OperationalInsightsApi;
use crate::error::Result;
use crate::foundation::stage::{Stage, StageOptions};
use crate::foundation::tags::{self, TagSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const WORKSPACE_SKU: &str = "PerGB2018";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogAnalyticsInput {
    pub workspace_name: String,
    pub location: String,
    pub resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogAnalyticsOutput {
    pub workspace_id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_shared_key: Option<String>,
}

pub struct LogAnalyticsStage {
    insights: Arc<dyn OperationalInsightsApi>,
    options: Arc<StageOptions>,
    retrieve_shared_keys: bool,
}

impl LogAnalyticsStage {
    pub fn new(insights: Arc<dyn OperationalInsightsApi>, options: Arc<StageOptions>) -> Self {
        Self {
            insights,
            options,
            retrieve_shared_keys: false,
        }
    }

    pub fn with_shared_keys(mut self, retrieve: bool) -> Self {
        self.retrieve_shared_keys = retrieve;
        self
    }
}

#[async_trait]
impl Stage for LogAnalyticsStage {
    type Input = LogAnalyticsInput;
    type Output = LogAnalyticsOutput;

    fn name(&self) -> &'static str {
        "log-analytics"
    }

    fn description(&self) -> &'static str {
        "Ensuring Log Analytics workspace"
    }

    async fn run(&self, input: LogAnalyticsInput) -> Result<LogAnalyticsOutput> {
        info!(
            subscription_id = %self.options.subscription_id,
            resource_group = %input.resource_group_name,
            workspace = %input.workspace_name,
            "📊 Converging Log Analytics workspace"
        );

        let workspace = self
            .insights
            .create_or_update_workspace(
                &input.resource_group_name,
                &input.workspace_name,
                &WorkspaceParams {
                    location: input.location.clone(),
                    sku_name: WORKSPACE_SKU.to_string(),
                    retention_in_days: input.retention_in_days,
                    tags: tags::non_empty(tags::normalize(input.tags.as_ref())),
                },
            )
            .await?;

        let primary_shared_key = if self.retrieve_shared_keys {
            debug!(workspace = %input.workspace_name, "🔑 Fetching workspace shared keys");
            self.insights
                .get_shared_keys(&input.resource_group_name, &input.workspace_name)
                .await?
                .primary_shared_key
        } else {
            None
        };

        Ok(LogAnalyticsOutput {
            workspace_id: workspace.id.unwrap_or_default(),
            customer_id: workspace.customer_id.unwrap_or_default(),
            primary_shared_key,
        })
    }
}
