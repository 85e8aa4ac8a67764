//! Credential strategies and the token plumbing shared by every management client.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

/// Lifetime stamped onto every token handed to a management client.
pub fn token_lifetime() -> Duration {
    Duration::hours(1)
}

/// How the pipeline authenticates against the management plane
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Method")]
pub enum CredentialStrategy {
    #[serde(rename = "token")]
    Token {
        #[serde(rename = "Token")]
        token: String,
    },
    #[serde(rename = "clientSecret")]
    ClientSecret {
        #[serde(rename = "TenantId")]
        tenant_id: String,
        #[serde(rename = "ClientId")]
        client_id: String,
        #[serde(rename = "ClientSecret")]
        client_secret: String,
    },
    #[serde(rename = "managedIdentity")]
    ManagedIdentity {
        #[serde(rename = "ClientId", default, skip_serializing_if = "Option::is_none")]
        client_id: Option<String>,
    },
}

impl CredentialStrategy {
    pub fn method(&self) -> &'static str {
        match self {
            CredentialStrategy::Token { .. } => "token",
            CredentialStrategy::ClientSecret { .. } => "clientSecret",
            CredentialStrategy::ManagedIdentity { .. } => "managedIdentity",
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for CredentialStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialStrategy::Token { .. } => f
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .finish(),
            CredentialStrategy::ClientSecret {
                tenant_id,
                client_id,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            CredentialStrategy::ManagedIdentity { client_id } => f
                .debug_struct("ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct AccessToken {
    pub access_token: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Turns a credential strategy into a bearer token
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, strategy: &CredentialStrategy) -> Result<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Resolver backed by the identity platform and the instance metadata service
pub struct AzureCredentialResolver {
    http: Client,
    authority: String,
    imds_endpoint: String,
}

impl AzureCredentialResolver {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            authority: DEFAULT_AUTHORITY.to_string(),
            imds_endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    pub fn with_imds_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.imds_endpoint = endpoint.into();
        self
    }

    async fn client_secret_token(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            tenant_id
        );
        debug!("🔐 Requesting client-credentials token for client {}", client_id);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", MANAGEMENT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| AppError::CredentialError(format!("token request failed: {}", e)))?;

        Self::read_token(response).await
    }

    async fn managed_identity_token(&self, client_id: Option<&str>) -> Result<AccessToken> {
        let mut url = Url::parse(&self.imds_endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-version", "2018-02-01");
            query.append_pair("resource", MANAGEMENT_RESOURCE);
            if let Some(client_id) = client_id {
                query.append_pair("client_id", client_id);
            }
        }
        debug!("🔐 Requesting managed identity token");

        let response = self
            .http
            .get(url)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| AppError::CredentialError(format!("metadata request failed: {}", e)))?;

        Self::read_token(response).await
    }

    async fn read_token(response: reqwest::Response) -> Result<AccessToken> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("❌ Token endpoint returned {}", status);
            return Err(AppError::CredentialError(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::CredentialError(format!("malformed token response: {}", e)))?;

        Ok(AccessToken {
            access_token: token.access_token,
        })
    }
}

#[async_trait]
impl CredentialResolver for AzureCredentialResolver {
    async fn resolve(&self, strategy: &CredentialStrategy) -> Result<AccessToken> {
        match strategy {
            CredentialStrategy::Token { token } => {
                if token.trim().is_empty() {
                    return Err(AppError::CredentialError(
                        "token strategy requires a non-empty token".to_string(),
                    ));
                }
                Ok(AccessToken {
                    access_token: token.clone(),
                })
            }
            CredentialStrategy::ClientSecret {
                tenant_id,
                client_id,
                client_secret,
            } => {
                self.client_secret_token(tenant_id, client_id, client_secret)
                    .await
            }
            CredentialStrategy::ManagedIdentity { client_id } => {
                self.managed_identity_token(client_id.as_deref()).await
            }
        }
    }
}

/// Bearer token in the shape management clients consume
#[derive(Clone)]
pub struct BearerToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl BearerToken {
    /// True while the token is valid for at least `margin` longer.
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_on - margin > Utc::now()
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Binds a resolver to one credential strategy
#[derive(Clone)]
pub struct TokenProvider {
    resolver: Arc<dyn CredentialResolver>,
    strategy: CredentialStrategy,
}

impl TokenProvider {
    pub fn new(resolver: Arc<dyn CredentialResolver>, strategy: CredentialStrategy) -> Self {
        Self { resolver, strategy }
    }

    pub fn strategy(&self) -> &CredentialStrategy {
        &self.strategy
    }

    /// Resolve a token. The expiry is always one hour from now; the token is never parsed.
    pub async fn get_token(&self) -> Result<BearerToken> {
        let AccessToken { access_token } = self.resolver.resolve(&self.strategy).await?;

        Ok(BearerToken {
            token: access_token,
            expires_on: Utc::now() + token_lifetime(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_strategy_is_returned_verbatim() {
        let resolver = AzureCredentialResolver::new(Client::new());
        let token = resolver
            .resolve(&CredentialStrategy::Token {
                token: "fake-token".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.access_token, "fake-token");
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let resolver = AzureCredentialResolver::new(Client::new());
        let result = resolver
            .resolve(&CredentialStrategy::Token {
                token: "  ".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::CredentialError(_))));
    }

    #[tokio::test]
    async fn test_token_provider_stamps_one_hour_expiry() {
        let provider = TokenProvider::new(
            Arc::new(AzureCredentialResolver::new(Client::new())),
            CredentialStrategy::Token {
                token: "fake-token".to_string(),
            },
        );

        let before = Utc::now();
        let token = provider.get_token().await.unwrap();
        let after = Utc::now();

        assert_eq!(token.token, "fake-token");
        assert!(token.expires_on >= before + token_lifetime());
        assert!(token.expires_on <= after + token_lifetime());
        assert!(token.is_fresh(Duration::minutes(5)));
    }

    #[test]
    fn test_strategy_deserializes_from_method_tag() {
        let strategy: CredentialStrategy =
            serde_json::from_str(r#"{"Method":"token","Token":"abc"}"#).unwrap();
        assert_eq!(
            strategy,
            CredentialStrategy::Token {
                token: "abc".to_string()
            }
        );

        let strategy: CredentialStrategy =
            serde_json::from_str(r#"{"Method":"managedIdentity"}"#).unwrap();
        assert_eq!(strategy.method(), "managedIdentity");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let strategy = CredentialStrategy::ClientSecret {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", strategy);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("client"));
    }
}
