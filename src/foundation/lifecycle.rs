//! Start and stop for container apps.
//!
//! Both directions first classify the live replica state. Converging is a
//! no-op when the app is already where it should be; otherwise the dedicated
//! start/stop operation is used when the client offers one, and a scale
//! update when it does not.

use crate::azure::models::{ContainerApp, ContainerAppTemplate, ScaleSettings};
use crate::azure::traits::{ContainerAppsApi, ToggleSupport};
use crate::context::ProvisioningContext;
use crate::error::{AppError, Result};
use crate::foundation::stage::{Stage, StageOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaState {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ReplicaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicaState::Running => write!(f, "running"),
            ReplicaState::Stopped => write!(f, "stopped"),
            ReplicaState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Why a state came out as `Unknown`. Reported in logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownCause {
    /// No candidate revision was found
    NoRevisions,
    /// Every replica listing failed
    ReplicaLookupFailed,
}

#[derive(Debug, Clone)]
pub struct ResolvedState {
    pub current: Option<ContainerApp>,
    pub state: ReplicaState,
    pub unknown_cause: Option<UnknownCause>,
}

fn is_running_status(status: Option<&str>) -> bool {
    let status = status.unwrap_or("").trim().to_lowercase();
    matches!(status.as_str(), "" | "running" | "succeeded" | "pending")
}

fn candidate_revisions(app: Option<&ContainerApp>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let Some(app) = app else {
        return names;
    };

    let declared = [
        app.latest_revision_name.as_deref(),
        app.latest_ready_revision_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .chain(app.active_revision_names.iter().map(String::as_str));

    for name in declared {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Classify the live replica state of an app. Lookup failures never escalate.
pub async fn resolve_state(
    apps: &dyn ContainerAppsApi,
    resource_group: &str,
    app_name: &str,
) -> ResolvedState {
    let current = match apps.get_container_app(resource_group, app_name).await {
        Ok(app) => Some(app),
        Err(e) => {
            debug!(app = %app_name, error = %e, "Container app lookup failed");
            None
        }
    };

    let mut revisions = candidate_revisions(current.as_ref());
    if revisions.is_empty() {
        match apps.list_revisions(resource_group, app_name).await {
            Ok(listed) => {
                for revision in listed {
                    let Some(name) = revision.name.filter(|n| !n.trim().is_empty()) else {
                        continue;
                    };
                    let active = revision.active == Some(true)
                        || revision.traffic_weight.unwrap_or(0.0) > 0.0
                        || revision.replicas.unwrap_or(0) > 0;
                    if active && !revisions.contains(&name) {
                        revisions.push(name);
                    }
                }
            }
            Err(e) => debug!(app = %app_name, error = %e, "Revision listing failed"),
        }
    }

    if revisions.is_empty() {
        return ResolvedState {
            current,
            state: ReplicaState::Unknown,
            unknown_cause: Some(UnknownCause::NoRevisions),
        };
    }

    let mut any_listed = false;
    for revision in &revisions {
        match apps.list_replicas(resource_group, app_name, revision).await {
            Ok(replicas) => {
                any_listed = true;
                if replicas.iter().any(|r| is_running_status(r.status.as_deref())) {
                    return ResolvedState {
                        current,
                        state: ReplicaState::Running,
                        unknown_cause: None,
                    };
                }
            }
            Err(e) => debug!(
                app = %app_name,
                revision = %revision,
                error = %e,
                "Replica listing failed"
            ),
        }
    }

    if any_listed {
        ResolvedState {
            current,
            state: ReplicaState::Stopped,
            unknown_cause: None,
        }
    } else {
        ResolvedState {
            current,
            state: ReplicaState::Unknown,
            unknown_cause: Some(UnknownCause::ReplicaLookupFailed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Start,
    Stop,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Start => "start",
            Direction::Stop => "stop",
        }
    }

    fn settled(self) -> ReplicaState {
        match self {
            Direction::Start => ReplicaState::Running,
            Direction::Stop => ReplicaState::Stopped,
        }
    }

    fn status(self) -> AppStatus {
        match self {
            Direction::Start => AppStatus::Started,
            Direction::Stop => AppStatus::Stopped,
        }
    }

    fn scale(self, existing: Option<&ScaleSettings>) -> ScaleSettings {
        let mut scale = existing.cloned().unwrap_or_default();
        match self {
            Direction::Start => {
                scale.min_replicas = Some(1);
                scale.max_replicas = Some(scale.max_replicas.unwrap_or(1).max(1));
            }
            Direction::Stop => {
                scale.min_replicas = Some(0);
                scale.max_replicas = Some(0);
            }
        }
        scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppStatus {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerAppTarget {
    pub resource_group_name: String,
    pub app_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerAppToggleOutput {
    pub app_name: String,
    pub status: AppStatus,
}

struct Toggle {
    apps: Arc<dyn ContainerAppsApi>,
    options: Arc<StageOptions>,
    context: Arc<ProvisioningContext>,
}

impl Toggle {
    async fn converge(
        &self,
        direction: Direction,
        target: ContainerAppTarget,
    ) -> Result<ContainerAppToggleOutput> {
        let ContainerAppTarget {
            resource_group_name,
            app_name,
        } = target;

        self.apply(direction, &resource_group_name, &app_name)
            .await
            .map_err(|e| AppError::lifecycle(direction.verb(), &app_name, e))?;

        Ok(ContainerAppToggleOutput {
            app_name,
            status: direction.status(),
        })
    }

    async fn apply(
        &self,
        direction: Direction,
        resource_group: &str,
        app_name: &str,
    ) -> Result<()> {
        let resolved = resolve_state(self.apps.as_ref(), resource_group, app_name).await;
        info!(
            subscription_id = %self.options.subscription_id,
            resource_group = %resource_group,
            app = %app_name,
            state = %resolved.state,
            "🔍 Resolved container app state"
        );
        if let Some(cause) = resolved.unknown_cause {
            warn!(app = %app_name, cause = ?cause, "⚠️ Replica state unknown");
        }

        if resolved.state == direction.settled() {
            info!(app = %app_name, "✅ Already {}, nothing to do", resolved.state);
            return Ok(());
        }

        match self.apps.toggle_support() {
            ToggleSupport::AwaitCompletion => {
                self.dedicated(direction, resource_group, app_name, true)
                    .await
            }
            ToggleSupport::BeginOnly => {
                self.dedicated(direction, resource_group, app_name, false)
                    .await
            }
            ToggleSupport::None => {
                let existing = match resolved.current {
                    Some(app) => app,
                    None => self.apps.get_container_app(resource_group, app_name).await?,
                };
                self.rescale(direction, resource_group, app_name, existing).await
            }
        }
    }

    async fn dedicated(
        &self,
        direction: Direction,
        resource_group: &str,
        app_name: &str,
        wait: bool,
    ) -> Result<()> {
        info!(app = %app_name, wait, "🔁 Requesting {}", direction.verb());
        match direction {
            Direction::Start => self.apps.start_container_app(resource_group, app_name, wait).await,
            Direction::Stop => self.apps.stop_container_app(resource_group, app_name, wait).await,
        }
    }

    async fn rescale(
        &self,
        direction: Direction,
        resource_group: &str,
        app_name: &str,
        existing: ContainerApp,
    ) -> Result<()> {
        let template = existing.template.clone().unwrap_or_default();
        let scale = direction.scale(template.scale.as_ref());
        info!(
            app = %app_name,
            min_replicas = ?scale.min_replicas,
            max_replicas = ?scale.max_replicas,
            "📏 Scaling container app to {}",
            direction.verb()
        );

        let update = ContainerApp {
            location: existing.location.clone(),
            tags: self
                .context
                .retag(existing.tags.as_ref(), existing.tags.as_ref(), true),
            managed_environment_id: existing.managed_environment_id.clone(),
            configuration: existing.configuration.clone(),
            template: Some(ContainerAppTemplate {
                scale: Some(scale),
                extra: template.extra,
            }),
            ..Default::default()
        };

        self.apps
            .create_or_update_container_app(resource_group, app_name, &update)
            .await?;
        Ok(())
    }
}

pub struct ContainerAppStartStage {
    toggle: Toggle,
}

impl ContainerAppStartStage {
    pub fn new(
        apps: Arc<dyn ContainerAppsApi>,
        options: Arc<StageOptions>,
        context: Arc<ProvisioningContext>,
    ) -> Self {
        Self {
            toggle: Toggle {
                apps,
                options,
                context,
            },
        }
    }
}

#[async_trait]
impl Stage for ContainerAppStartStage {
    type Input = ContainerAppTarget;
    type Output = ContainerAppToggleOutput;

    fn name(&self) -> &'static str {
        "container-app-start"
    }

    fn description(&self) -> &'static str {
        "Starting container app"
    }

    fn validate(&self, input: &ContainerAppTarget) -> Result<()> {
        validate_target(input)
    }

    async fn run(&self, input: ContainerAppTarget) -> Result<ContainerAppToggleOutput> {
        self.toggle.converge(Direction::Start, input).await
    }
}

pub struct ContainerAppStopStage {
    toggle: Toggle,
}

impl ContainerAppStopStage {
    pub fn new(
        apps: Arc<dyn ContainerAppsApi>,
        options: Arc<StageOptions>,
        context: Arc<ProvisioningContext>,
    ) -> Self {
        Self {
            toggle: Toggle {
                apps,
                options,
                context,
            },
        }
    }
}

#[async_trait]
impl Stage for ContainerAppStopStage {
    type Input = ContainerAppTarget;
    type Output = ContainerAppToggleOutput;

    fn name(&self) -> &'static str {
        "container-app-stop"
    }

    fn description(&self) -> &'static str {
        "Stopping container app"
    }

    fn validate(&self, input: &ContainerAppTarget) -> Result<()> {
        validate_target(input)
    }

    async fn run(&self, input: ContainerAppTarget) -> Result<ContainerAppToggleOutput> {
        self.toggle.converge(Direction::Stop, input).await
    }
}

fn validate_target(target: &ContainerAppTarget) -> Result<()> {
    if target.resource_group_name.trim().is_empty() || target.app_name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "ResourceGroupName and AppName are required".to_string(),
        ));
    }
    Ok(())
}
