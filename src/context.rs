use crate::foundation::tags::{self, TagSet};
use tracing::debug;

/// Environment variable carrying the operator identity.
pub const OPERATOR_IDENTITY_VAR: &str = "DEV_USER";

/// Process-wide values resolved once at startup and shared by `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvisioningContext {
    operator_identity: Option<String>,
}

impl ProvisioningContext {
    pub fn from_env() -> Self {
        let operator_identity = std::env::var(OPERATOR_IDENTITY_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(identity) = &operator_identity {
            debug!("👤 Operator identity: {}", identity);
        }
        Self { operator_identity }
    }

    pub fn with_operator(identity: impl Into<String>) -> Self {
        let identity = identity.into().trim().to_string();
        Self {
            operator_identity: Some(identity).filter(|v| !v.is_empty()),
        }
    }

    pub fn operator_identity(&self) -> Option<&str> {
        self.operator_identity.as_deref()
    }

    pub fn tag(&self, merged: TagSet) -> Option<TagSet> {
        tags::with_identity_tag(merged, self.operator_identity())
    }

    pub fn retag(
        &self,
        tags: Option<&TagSet>,
        existing: Option<&TagSet>,
        only_if_present: bool,
    ) -> Option<TagSet> {
        tags::apply_identity_tag(tags, existing, only_if_present, self.operator_identity())
    }
}
