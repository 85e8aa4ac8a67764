pub mod diagnostics;
pub mod governance;
pub mod identity;
pub mod key_vault;
pub mod landing_zone;
pub mod lifecycle;
pub mod log_analytics;
pub mod orchestrator;
pub mod providers;
pub mod stage;
pub mod tags;

pub use lifecycle::{
    ContainerAppStartStage, ContainerAppStopStage, ContainerAppTarget, ReplicaState,
};
pub use orchestrator::{CloudFoundation, FoundationOptions, FoundationResult, ProvisioningRequest};
pub use stage::{execute_stage, PollPolicy, Stage, StageOptions};
