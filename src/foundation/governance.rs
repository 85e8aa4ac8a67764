use crate::azure::models::{PolicyAssignmentParams, RoleAssignmentParams};
use crate::azure::traits::{AuthorizationApi, PolicyApi};
use crate::error::Result;
use crate::foundation::identity;
use crate::foundation::stage::{Stage, StageOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const POLICY_PREFIX: &str = "policy";
const POLICY_SALT: &str = "policy";
const POLICY_HASH_LEN: usize = 24;
const ROLE_SALT: &str = "role";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDefinitionRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleAssignmentConfig {
    pub role_definition_id: String,
    pub principal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GovernanceInput {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_definitions: Option<Vec<PolicyDefinitionRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_assignments: Option<Vec<RoleAssignmentConfig>>,
}

impl GovernanceInput {
    /// At least one policy definition or role assignment.
    pub fn has_assignments(&self) -> bool {
        self.policy_definitions.as_ref().is_some_and(|p| !p.is_empty())
            || self.role_assignments.as_ref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GovernanceOutput {
    pub policy_assignment_ids: Vec<String>,
    pub role_assignment_ids: Vec<String>,
}

/// `policy-<first 24 hex of derive(definition_id, "policy")>`
pub fn policy_assignment_name(definition_id: &str) -> String {
    identity::short_name(POLICY_PREFIX, &[definition_id, POLICY_SALT], POLICY_HASH_LEN)
}

/// GUID-shaped name; the authorization API rejects anything else.
pub fn role_assignment_name(role_definition_id: &str, principal_id: &str, scope: &str) -> String {
    let seed = format!("{}-{}-{}", role_definition_id, principal_id, scope);
    identity::guid(&[seed.as_str(), ROLE_SALT])
}

pub struct GovernanceStage {
    policy: Arc<dyn PolicyApi>,
    authorization: Arc<dyn AuthorizationApi>,
    options: Arc<StageOptions>,
}

impl GovernanceStage {
    pub fn new(
        policy: Arc<dyn PolicyApi>,
        authorization: Arc<dyn AuthorizationApi>,
        options: Arc<StageOptions>,
    ) -> Self {
        Self {
            policy,
            authorization,
            options,
        }
    }
}

#[async_trait]
impl Stage for GovernanceStage {
    type Input = GovernanceInput;
    type Output = GovernanceOutput;

    fn name(&self) -> &'static str {
        "governance"
    }

    fn description(&self) -> &'static str {
        "Applying policy and role assignments"
    }

    async fn run(&self, input: GovernanceInput) -> Result<GovernanceOutput> {
        let scope = input.scope.as_str();
        let mut output = GovernanceOutput::default();

        for definition in input.policy_definitions.iter().flatten() {
            let name = policy_assignment_name(&definition.id);
            debug!(
                scope = %scope,
                assignment = %name,
                "🛡️ Assigning policy {}",
                definition.id
            );

            let assignment = self
                .policy
                .create_policy_assignment(
                    scope,
                    &name,
                    &PolicyAssignmentParams {
                        policy_definition_id: definition.id.clone(),
                        parameters: definition.parameters.clone(),
                        scope: scope.to_string(),
                    },
                )
                .await?;

            if let Some(id) = assignment.id {
                output.policy_assignment_ids.push(id);
            }
        }

        for role in input.role_assignments.iter().flatten() {
            let name = role_assignment_name(&role.role_definition_id, &role.principal_id, scope);
            debug!(
                scope = %scope,
                assignment = %name,
                principal = %role.principal_id,
                "👥 Assigning role"
            );

            let assignment = self
                .authorization
                .create_role_assignment(
                    scope,
                    &name,
                    &RoleAssignmentParams {
                        role_definition_id: role.role_definition_id.clone(),
                        principal_id: role.principal_id.clone(),
                        condition: role.condition.clone(),
                        condition_version: role.condition_version.clone(),
                    },
                )
                .await?;

            if let Some(id) = assignment.id {
                output.role_assignment_ids.push(id);
            }
        }

        info!(
            subscription_id = %self.options.subscription_id,
            policies = output.policy_assignment_ids.len(),
            roles = output.role_assignment_ids.len(),
            "✅ Governance applied"
        );
        Ok(output)
    }
}
