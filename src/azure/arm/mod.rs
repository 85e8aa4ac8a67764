//! REST client for the Azure Resource Manager API.
//!
//! `ArmClient` implements every collaborator trait in `azure::traits`. It
//! handles authentication, error mapping, `nextLink` paging and long-running
//! operation polling; the per-family request shapes live in `wire` and the
//! trait implementations in `operations`.

mod operations;
mod wire;

use crate::azure::credentials::{BearerToken, TokenProvider};
use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use wire::{OperationStatus, Page};

pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

const ASYNC_OPERATION: &str = "azure-asyncoperation";

/// Pinned api-versions per resource family.
pub mod api_versions {
    pub const PROVIDERS: &str = "2021-04-01";
    pub const LOCATIONS: &str = "2022-12-01";
    pub const RESOURCE_GROUPS: &str = "2021-04-01";
    pub const NETWORK: &str = "2023-09-01";
    pub const WORKSPACES: &str = "2022-10-01";
    pub const SHARED_KEYS: &str = "2020-08-01";
    pub const KEY_VAULT: &str = "2023-07-01";
    pub const DIAGNOSTIC_SETTINGS: &str = "2021-05-01-preview";
    pub const POLICY_ASSIGNMENTS: &str = "2022-06-01";
    pub const ROLE_ASSIGNMENTS: &str = "2022-04-01";
    pub const CONTAINER_APPS: &str = "2023-05-01";
}

/// Bounds on long-running operation polling.
#[derive(Debug, Clone)]
pub struct LroPolicy {
    pub max_attempts: u32,
    pub default_delay: Duration,
}

impl Default for LroPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            default_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerKind {
    AsyncOperation,
    Location,
}

#[derive(Debug, Clone)]
struct OperationTracker {
    url: Url,
    kind: TrackerKind,
    retry_after: Option<Duration>,
}

impl OperationTracker {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let retry_after = retry_after(headers);
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| Url::parse(v).ok())
        };

        if let Some(url) = header(ASYNC_OPERATION) {
            return Some(Self {
                url,
                kind: TrackerKind::AsyncOperation,
                retry_after,
            });
        }
        header(LOCATION.as_str()).map(|url| Self {
            url,
            kind: TrackerKind::Location,
            retry_after,
        })
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

pub struct ArmClient {
    http: Client,
    endpoint: Url,
    subscription_id: String,
    tokens: TokenProvider,
    cached_token: Mutex<Option<BearerToken>>,
    lro: LroPolicy,
}

impl ArmClient {
    pub fn new(
        http: Client,
        endpoint: &str,
        subscription_id: impl Into<String>,
        tokens: TokenProvider,
    ) -> Result<Self> {
        // Url::join only appends below a base that ends with a slash.
        let endpoint = if endpoint.ends_with('/') {
            Url::parse(endpoint)?
        } else {
            Url::parse(&format!("{}/", endpoint))?
        };

        Ok(Self {
            http,
            endpoint,
            subscription_id: subscription_id.into(),
            tokens,
            cached_token: Mutex::new(None),
            lro: LroPolicy::default(),
        })
    }

    pub fn with_lro_policy(mut self, policy: LroPolicy) -> Self {
        self.lro = policy;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub(crate) fn subscription_path(&self) -> String {
        format!("/subscriptions/{}", self.subscription_id)
    }

    pub(crate) fn resource_group_path(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, resource_group
        )
    }

    fn url(&self, path: &str, api_version: &str) -> Result<Url> {
        let mut url = self.endpoint.join(path.trim_start_matches('/'))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn bearer(&self) -> Result<String> {
        let mut cached = self.cached_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(chrono::Duration::minutes(5)) {
                return Ok(token.token.clone());
            }
        }

        debug!("🔐 Refreshing management token");
        let token = self.tokens.get_token().await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        let token = self.bearer().await?;
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token);

        request = match body {
            Some(body) => request.json(body),
            None if method == Method::POST => request.header(CONTENT_LENGTH, 0),
            None => request,
        };

        let response = request.send().await?;
        Self::check(&method, &url, response).await
    }

    async fn check(method: &Method, url: &Url, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "{} {}: {}",
                method,
                url.path(),
                body
            )));
        }

        Err(AppError::ExternalServiceError(format!(
            "{} {} failed with {}: {}",
            method,
            url.path(),
            status,
            body
        )))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T> {
        let url = self.url(path, api_version)?;
        let response = self.send::<()>(Method::GET, url, None).await?;
        Self::read_json(response).await
    }

    /// POST an action without a body and parse its response.
    pub(crate) async fn post_action<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T> {
        let url = self.url(path, api_version)?;
        let response = self.send::<()>(Method::POST, url, None).await?;
        Self::read_json(response).await
    }

    /// POST an action that may be long-running. With `wait`, returns only once
    /// the operation has settled.
    pub(crate) async fn post_lro(&self, path: &str, api_version: &str, wait: bool) -> Result<()> {
        let url = self.url(path, api_version)?;
        let response = self.send::<()>(Method::POST, url, None).await?;
        if !wait {
            return Ok(());
        }
        if let Some(tracker) = OperationTracker::from_headers(response.headers()) {
            self.poll_operation(tracker).await?;
        }
        Ok(())
    }

    /// PUT a resource. Long-running creates are awaited and the settled
    /// resource is read back.
    pub(crate) async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path, api_version)?;
        let response = self.send(Method::PUT, url, Some(body)).await?;
        let status = response.status();

        if let Some(tracker) = OperationTracker::from_headers(response.headers()) {
            self.poll_operation(tracker).await?;
            return self.get_json(path, api_version).await;
        }
        if status == StatusCode::ACCEPTED {
            return self.get_json(path, api_version).await;
        }

        Self::read_json(response).await
    }

    /// GET every page of a collection, following `nextLink`.
    pub(crate) async fn list_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path, api_version)?);

        while let Some(url) = next.take() {
            let response = self.send::<()>(Method::GET, url, None).await?;
            let page: Page<T> = Self::read_json(response).await?;
            items.extend(page.value);
            next = match page.next_link {
                Some(link) if !link.is_empty() => Some(Url::parse(&link)?),
                _ => None,
            };
        }

        Ok(items)
    }

    async fn poll_operation(&self, tracker: OperationTracker) -> Result<()> {
        let mut delay = tracker.retry_after.unwrap_or(self.lro.default_delay);
        debug!(
            "⏳ Waiting on long-running operation {}",
            tracker.url.path()
        );

        for attempt in 1..=self.lro.max_attempts {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let response = self
                .send::<()>(Method::GET, tracker.url.clone(), None)
                .await?;
            let status = response.status();
            delay = retry_after(response.headers()).unwrap_or(self.lro.default_delay);

            match tracker.kind {
                TrackerKind::Location => {
                    if status != StatusCode::ACCEPTED {
                        return Ok(());
                    }
                }
                TrackerKind::AsyncOperation => {
                    let body: OperationStatus = Self::read_json(response).await?;
                    let state = body.status.unwrap_or_default().to_lowercase();
                    match state.as_str() {
                        "succeeded" => return Ok(()),
                        "failed" | "canceled" | "cancelled" => {
                            let detail = body
                                .error
                                .map(|e| {
                                    format!(
                                        "{}: {}",
                                        e.code.unwrap_or_default(),
                                        e.message.unwrap_or_default()
                                    )
                                })
                                .unwrap_or_default();
                            return Err(AppError::ExternalServiceError(format!(
                                "operation ended with status {} {}",
                                state, detail
                            )));
                        }
                        _ => {}
                    }
                }
            }

            debug!(attempt, "⏳ Operation still in progress");
        }

        warn!(
            "⚠️ Long-running operation did not settle after {} attempts",
            self.lro.max_attempts
        );
        Err(AppError::ExternalServiceError(format!(
            "operation {} did not complete after {} attempts",
            tracker.url.path(),
            self.lro.max_attempts
        )))
    }
}
