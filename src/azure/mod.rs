pub mod arm;
pub mod credentials;
pub mod models;
pub mod secrets;
pub mod services;
pub mod traits;

pub use arm::ArmClient;
pub use credentials::{CredentialResolver, CredentialStrategy, TokenProvider};
pub use secrets::{EnvSecretStore, SecretStore, StaticSecretStore};
pub use services::CloudServices;
pub use traits::*;
