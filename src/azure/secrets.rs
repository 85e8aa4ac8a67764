use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of subscription, tenant and client credentials
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn get_required(&self, key: &str) -> Result<String> {
        self.get(key)
            .await?
            .ok_or_else(|| AppError::ConfigurationError(format!("{} must be set", key)))
    }
}

/// Reads secrets from the process environment. Blank values count as unset.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretStore;

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

#[derive(Debug, Default, Clone)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}
