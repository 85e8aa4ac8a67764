use crate::azure::traits::ResourceManagementApi;
use crate::error::Result;
use crate::foundation::stage::{PollPolicy, Stage, StageOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Namespaces the foundation stages depend on.
pub const DEFAULT_PROVIDERS: [&str; 6] = [
    "Microsoft.Resources",
    "Microsoft.Network",
    "Microsoft.KeyVault",
    "Microsoft.OperationalInsights",
    "Microsoft.Insights",
    "Microsoft.Authorization",
];

pub fn default_providers() -> Vec<String> {
    DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvidersInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvidersOutput {
    /// Final registration state per namespace, or `Error: <message>`.
    pub registered: BTreeMap<String, String>,
    pub regions: Vec<Region>,
}

pub struct EnsureProvidersStage {
    resources: Arc<dyn ResourceManagementApi>,
    options: Arc<StageOptions>,
    default_providers: Vec<String>,
    poll: PollPolicy,
}

impl EnsureProvidersStage {
    pub fn new(resources: Arc<dyn ResourceManagementApi>, options: Arc<StageOptions>) -> Self {
        Self {
            resources,
            options,
            default_providers: default_providers(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_default_providers(mut self, providers: Vec<String>) -> Self {
        if !providers.is_empty() {
            self.default_providers = providers;
        }
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    async fn ensure(&self, namespace: &str) -> Result<String> {
        let current = self
            .resources
            .get_provider(namespace)
            .await?
            .registration_state
            .unwrap_or_else(|| "NotRegistered".to_string());

        if !current.eq_ignore_ascii_case("registered") {
            info!(namespace = %namespace, state = %current, "📝 Registering provider");
            self.resources.register_provider(namespace).await?;
        }

        Ok(self
            .await_settled(namespace)
            .await?
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    /// Poll until the namespace reports registered or registering; after the
    /// last attempt, whatever a final fetch returns is accepted.
    async fn await_settled(&self, namespace: &str) -> Result<Option<String>> {
        for attempt in 1..=self.poll.max_attempts {
            let state = self.resources.get_provider(namespace).await?.registration_state;
            let settled = state.as_deref().is_some_and(|s| {
                s.eq_ignore_ascii_case("registered") || s.eq_ignore_ascii_case("registering")
            });
            if settled {
                return Ok(state);
            }

            debug!(namespace = %namespace, attempt, "⏳ Provider not registered yet");
            self.poll.wait().await;
        }

        Ok(self
            .resources
            .get_provider(namespace)
            .await?
            .registration_state)
    }
}

#[async_trait]
impl Stage for EnsureProvidersStage {
    type Input = ProvidersInput;
    type Output = ProvidersOutput;

    fn name(&self) -> &'static str {
        "ensure-providers"
    }

    fn description(&self) -> &'static str {
        "Ensuring resource providers are registered"
    }

    async fn run(&self, input: ProvidersInput) -> Result<ProvidersOutput> {
        let providers = match input.providers {
            Some(list) if !list.is_empty() => list,
            _ => self.default_providers.clone(),
        };

        let mut registered = BTreeMap::new();
        for namespace in &providers {
            let state = match self.ensure(namespace).await {
                Ok(state) => state,
                Err(e) => {
                    warn!(
                        namespace = %namespace,
                        error = %e,
                        "⚠️ Provider registration failed"
                    );
                    format!("Error: {}", e)
                }
            };
            registered.insert(namespace.clone(), state);
        }

        let regions: Vec<Region> = self
            .resources
            .list_locations(&self.options.subscription_id)
            .await?
            .into_iter()
            .filter_map(|location| {
                let name = location.name.filter(|n| !n.is_empty())?;
                Some(Region {
                    name,
                    display_name: location.display_name,
                })
            })
            .collect();

        info!(
            subscription_id = %self.options.subscription_id,
            providers = registered.len(),
            regions = regions.len(),
            "✅ Providers checked"
        );

        Ok(ProvidersOutput {
            registered,
            regions,
        })
    }
}
