#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("Failed to {message}")]
    LifecycleError { resource: String, message: String },

    #[error("Not implemented: {0}")]
    Unimplemented(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// Wrap a lifecycle failure with the container app it targeted.
    pub fn lifecycle(action: &str, resource: &str, cause: impl std::fmt::Display) -> Self {
        AppError::LifecycleError {
            resource: resource.to_string(),
            message: format!("{} container app '{}': {}", action, resource, cause),
        }
    }

    /// True for failures raised before any collaborator was contacted.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::ConfigurationError(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalServerError(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ValidationError(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalServiceError(format!("HTTP error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::ConfigurationError(format!("Invalid URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_error_names_the_resource() {
        let err = AppError::lifecycle("start", "orders-api", "boom");
        assert_eq!(
            err.to_string(),
            "Failed to start container app 'orders-api': boom"
        );
        match err {
            AppError::LifecycleError { resource, .. } => assert_eq!(resource, "orders-api"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_configuration_classification() {
        assert!(AppError::ConfigurationError("x".into()).is_configuration());
        assert!(!AppError::NotFound("x".into()).is_configuration());
    }
}
