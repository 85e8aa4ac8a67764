//! Resource group and optional virtual network hosting everything else.

use crate::azure::models::{ResourceGroupParams, SubnetParams, VirtualNetworkParams};
use crate::azure::traits::{NetworkApi, ResourceManagementApi};
use crate::context::ProvisioningContext;
use crate::error::{AppError, Result};
use crate::foundation::identity;
use crate::foundation::stage::{Stage, StageOptions};
use crate::foundation::tags::{self, TagSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_RESOURCE_GROUP_ROOT: &str = "oi-found";
pub const WORKSPACE_LOOKUP_TAG: &str = "WorkspaceLookup";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceGroupConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetConfig {
    pub name: String,
    pub address_prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConfig {
    pub name: String,
    pub address_space: String,
    #[serde(default)]
    pub subnets: Vec<SubnetConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LandingZoneInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_lookup: Option<String>,
    pub resource_group: ResourceGroupConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceGroupOutput {
    pub name: String,
    pub id: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkOutput {
    pub id: String,
    pub subnet_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LandingZoneOutput {
    pub resource_group: ResourceGroupOutput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkOutput>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Explicit name, or `<root>-<derive(workspace, "")>`.
pub fn resource_group_name(
    root: &str,
    explicit: Option<&str>,
    workspace_lookup: Option<&str>,
) -> Result<String> {
    if let Some(name) = present(explicit) {
        return Ok(name.to_string());
    }

    match present(workspace_lookup) {
        Some(workspace) => Ok(format!("{}-{}", root, identity::derive(&[workspace, ""]))),
        None => Err(AppError::ConfigurationError(
            "Either ResourceGroup.Name or WorkspaceLookup must be provided".to_string(),
        )),
    }
}

pub struct LandingZoneStage {
    resources: Arc<dyn ResourceManagementApi>,
    network: Arc<dyn NetworkApi>,
    options: Arc<StageOptions>,
    context: Arc<ProvisioningContext>,
    root: String,
    default_tags: TagSet,
}

impl LandingZoneStage {
    pub fn new(
        resources: Arc<dyn ResourceManagementApi>,
        network: Arc<dyn NetworkApi>,
        options: Arc<StageOptions>,
        context: Arc<ProvisioningContext>,
    ) -> Self {
        Self {
            resources,
            network,
            options,
            context,
            root: DEFAULT_RESOURCE_GROUP_ROOT.to_string(),
            default_tags: TagSet::new(),
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_default_tags(mut self, tags: TagSet) -> Self {
        self.default_tags = tags;
        self
    }

    /// Defaults then caller tags. A workspace lookup adds its own tag underneath
    /// and turns on operator identity enrichment.
    pub fn resolve_tags(
        &self,
        workspace_lookup: Option<&str>,
        caller: Option<&TagSet>,
    ) -> Option<TagSet> {
        let caller = caller.cloned().unwrap_or_default();

        match present(workspace_lookup) {
            Some(workspace) => {
                let mut lookup = TagSet::new();
                lookup.insert(WORKSPACE_LOOKUP_TAG.to_string(), workspace.to_string());
                self.context
                    .tag(tags::merge_layers([&lookup, &self.default_tags, &caller]))
            }
            None => tags::non_empty(tags::merge_layers([&self.default_tags, &caller])),
        }
    }
}

#[async_trait]
impl Stage for LandingZoneStage {
    type Input = LandingZoneInput;
    type Output = LandingZoneOutput;

    fn name(&self) -> &'static str {
        "landing-zone"
    }

    fn description(&self) -> &'static str {
        "Ensuring landing zone resource group and networking"
    }

    fn validate(&self, input: &LandingZoneInput) -> Result<()> {
        resource_group_name(
            &self.root,
            input.resource_group.name.as_deref(),
            input.workspace_lookup.as_deref(),
        )
        .map(|_| ())
    }

    async fn run(&self, input: LandingZoneInput) -> Result<LandingZoneOutput> {
        let LandingZoneInput {
            workspace_lookup,
            resource_group,
            network,
        } = input;

        let name = resource_group_name(
            &self.root,
            resource_group.name.as_deref(),
            workspace_lookup.as_deref(),
        )?;
        let tagged = self.resolve_tags(workspace_lookup.as_deref(), resource_group.tags.as_ref());

        info!(
            subscription_id = %self.options.subscription_id,
            resource_group = %name,
            location = %resource_group.location,
            "📦 Converging resource group"
        );
        let group = self
            .resources
            .create_or_update_resource_group(
                &name,
                &ResourceGroupParams {
                    location: resource_group.location.clone(),
                    tags: tagged.clone(),
                },
            )
            .await?;

        let network_output = match network {
            Some(network) => {
                debug!(
                    resource_group = %name,
                    vnet = %network.name,
                    "🌐 Converging virtual network"
                );
                let params = VirtualNetworkParams {
                    location: resource_group.location.clone(),
                    address_prefixes: vec![network.address_space.clone()],
                    subnets: network
                        .subnets
                        .iter()
                        .map(|subnet| SubnetParams {
                            name: subnet.name.clone(),
                            address_prefix: subnet.address_prefix.clone(),
                        })
                        .collect(),
                    tags: tagged,
                };
                let vnet = self
                    .network
                    .create_or_update_virtual_network(&name, &network.name, &params)
                    .await?;

                let subnet_ids = vnet
                    .subnets
                    .into_iter()
                    .filter_map(|subnet| match (subnet.name, subnet.id) {
                        (Some(name), Some(id)) if !name.is_empty() && !id.is_empty() => {
                            Some((name, id))
                        }
                        _ => None,
                    })
                    .collect();

                Some(NetworkOutput {
                    id: vnet.id.unwrap_or_default(),
                    subnet_ids,
                })
            }
            None => None,
        };

        Ok(LandingZoneOutput {
            resource_group: ResourceGroupOutput {
                name,
                id: group.id.unwrap_or_default(),
                location: group.location.unwrap_or(resource_group.location),
            },
            network: network_output,
        })
    }
}
