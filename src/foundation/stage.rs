//! The contract every provisioning stage satisfies, and the helper that runs one.

use crate::azure::credentials::CredentialStrategy;
use crate::error::Result;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Subscription and credential shared by every stage of one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct StageOptions {
    pub subscription_id: String,
    pub credential: CredentialStrategy,
}

/// Fixed-delay polling with an attempt ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(3),
        }
    }
}

impl PollPolicy {
    /// No delay between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }

    pub async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// One idempotent unit of convergence with typed input and output
#[async_trait]
pub trait Stage: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Reject input before any remote call is made
    fn validate(&self, _input: &Self::Input) -> Result<()> {
        debug!("🔍 Validating input for stage: {}", self.name());
        Ok(())
    }

    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Validate and run a stage, logging its outcome and duration.
pub async fn execute_stage<S: Stage>(stage: &S, input: S::Input) -> Result<S::Output> {
    let started = Instant::now();
    info!(stage = stage.name(), "🚀 {}", stage.description());

    if let Err(e) = stage.validate(&input) {
        error!(stage = stage.name(), error = %e, "❌ Stage input rejected");
        return Err(e);
    }

    match stage.run(input).await {
        Ok(output) => {
            info!(
                stage = stage.name(),
                duration_ms = started.elapsed().as_millis() as u64,
                "✅ Stage completed"
            );
            Ok(output)
        }
        Err(e) => {
            error!(
                stage = stage.name(),
                duration_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "❌ Stage failed"
            );
            Err(e)
        }
    }
}
