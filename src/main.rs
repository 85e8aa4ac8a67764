use anyhow::Context;
use clap::{Parser, Subcommand};
use cloud_foundation::azure::credentials::AzureCredentialResolver;
use cloud_foundation::azure::{CloudServices, EnvSecretStore};
use cloud_foundation::config::FoundationConfig;
use cloud_foundation::context::ProvisioningContext;
use cloud_foundation::foundation::identity;
use cloud_foundation::foundation::{
    execute_stage, CloudFoundation, ContainerAppStartStage, ContainerAppStopStage,
    ContainerAppTarget, ProvisioningRequest,
};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cloud-foundation", about = "Provision and converge an Azure cloud foundation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the foundation pipeline for a request document (YAML or JSON)
    Provision {
        #[arg(long)]
        request: PathBuf,
    },
    /// Start a container app
    Start {
        #[arg(long)]
        resource_group: String,
        #[arg(long)]
        app: String,
    },
    /// Stop a container app
    Stop {
        #[arg(long)]
        resource_group: String,
        #[arg(long)]
        app: String,
    },
    /// Print the deterministic identifier of the given parts
    Derive { parts: Vec<String> },
}

struct Runtime {
    config: FoundationConfig,
    services: CloudServices,
    context: Arc<ProvisioningContext>,
}

async fn connect() -> anyhow::Result<Runtime> {
    let config = FoundationConfig::load(&EnvSecretStore)
        .await
        .context("failed to load configuration")?;
    let http = reqwest::Client::new();
    let resolver = Arc::new(AzureCredentialResolver::new(http.clone()));
    let services = CloudServices::arm(
        http,
        &config.arm_endpoint,
        &config.stage_options(),
        resolver,
    )?;

    Ok(Runtime {
        config,
        services,
        context: Arc::new(ProvisioningContext::from_env()),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Provision { request } => {
            let document = tokio::fs::read_to_string(&request)
                .await
                .with_context(|| format!("failed to read {}", request.display()))?;
            let request = ProvisioningRequest::from_document(&document)?;

            let runtime = connect().await?;
            let foundation = CloudFoundation::build(
                runtime.config.foundation_options(),
                &runtime.services,
                runtime.context,
            )?;
            let result = foundation.run(request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Start { resource_group, app } => {
            let runtime = connect().await?;
            let stage = ContainerAppStartStage::new(
                runtime.services.container_apps.clone(),
                Arc::new(runtime.config.stage_options()),
                runtime.context,
            );
            let output = execute_stage(
                &stage,
                ContainerAppTarget {
                    resource_group_name: resource_group,
                    app_name: app,
                },
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Stop { resource_group, app } => {
            let runtime = connect().await?;
            let stage = ContainerAppStopStage::new(
                runtime.services.container_apps.clone(),
                Arc::new(runtime.config.stage_options()),
                runtime.context,
            );
            let output = execute_stage(
                &stage,
                ContainerAppTarget {
                    resource_group_name: resource_group,
                    app_name: app,
                },
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Derive { parts } => {
            info!("🔍 Deriving identifier from {} part(s)", parts.len());
            println!("{}", identity::derive(parts.as_slice()));
        }
    }

    Ok(())
}
