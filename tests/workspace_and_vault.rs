mod common;

use cloud_foundation::foundation::key_vault::{
    AccessPolicyConfig, KeyVaultInput, KeyVaultStage, PermissionsConfig, SOFT_DELETE_RETENTION_DAYS,
};
use cloud_foundation::foundation::log_analytics::{
    LogAnalyticsInput, LogAnalyticsStage, WORKSPACE_SKU,
};
use cloud_foundation::foundation::stage::execute_stage;
use common::*;
use std::sync::Arc;

fn workspace_input() -> LogAnalyticsInput {
    LogAnalyticsInput {
        workspace_name: "law-foundation".to_string(),
        location: "westus2".to_string(),
        resource_group_name: "rg-foundation".to_string(),
        retention_in_days: None,
        tags: Some(tags(&[("Owner", "platform"), ("Empty", "")])),
    }
}

#[tokio::test]
async fn test_workspace_without_shared_keys() {
    let cloud = Arc::new(FakeCloud::new());
    let stage = LogAnalyticsStage::new(cloud.clone(), stage_options());

    let output = execute_stage(&stage, workspace_input()).await.unwrap();

    assert_eq!(output.customer_id, "customer-law-foundation");
    assert!(output.primary_shared_key.is_none());
    assert_eq!(cloud.count(|c| matches!(c, Call::SharedKeys { .. })).await, 0);

    let calls = cloud.calls().await;
    let params = calls
        .iter()
        .find_map(|c| match c {
            Call::Workspace { params, .. } => Some(params.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(params.sku_name, WORKSPACE_SKU);
    assert_eq!(params.retention_in_days, None);
    assert_eq!(params.tags, Some(tags(&[("Owner", "platform")])));
}

#[tokio::test]
async fn test_workspace_with_shared_keys() {
    let cloud = Arc::new(FakeCloud::new());
    let stage = LogAnalyticsStage::new(cloud.clone(), stage_options()).with_shared_keys(true);

    let output = execute_stage(&stage, workspace_input()).await.unwrap();

    assert_eq!(output.primary_shared_key.as_deref(), Some("primary-key"));
    assert!(output.workspace_id.ends_with("/workspaces/law-foundation"));
}

#[tokio::test]
async fn test_vault_defaults_and_access_policies() {
    let cloud = Arc::new(FakeCloud::new());
    let stage = KeyVaultStage::new(cloud.clone(), stage_options(), "tenant-abc").unwrap();

    let input = KeyVaultInput {
        vault_name: "kv-foundation".to_string(),
        location: "westus2".to_string(),
        resource_group_name: "rg-foundation".to_string(),
        access_policies: Some(vec![AccessPolicyConfig {
            tenant_id: "tenant-abc".to_string(),
            object_id: "object-1".to_string(),
            permissions: PermissionsConfig {
                secrets: Some(vec!["get".to_string(), "list".to_string()]),
                ..Default::default()
            },
        }]),
        tags: None,
    };

    let output = execute_stage(&stage, input).await.unwrap();
    assert!(output.vault_id.ends_with("/vaults/kv-foundation"));

    let calls = cloud.calls().await;
    let params = calls
        .iter()
        .find_map(|c| match c {
            Call::Vault {
                resource_group,
                params,
                ..
            } if resource_group == "rg-foundation" => Some(params.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(params.tenant_id, "tenant-abc");
    assert_eq!(params.sku_family, "A");
    assert_eq!(params.sku_name, "standard");
    assert!(params.enabled_for_deployment);
    assert!(params.enabled_for_template_deployment);
    assert!(params.enable_soft_delete);
    assert_eq!(params.soft_delete_retention_in_days, SOFT_DELETE_RETENTION_DAYS);
    assert_eq!(params.soft_delete_retention_in_days, 90);
    assert!(params.tags.is_none());

    let policies = params.access_policies.unwrap();
    assert_eq!(policies[0].object_id, "object-1");
    assert_eq!(
        policies[0].permissions.secrets,
        Some(vec!["get".to_string(), "list".to_string()])
    );
    assert!(policies[0].permissions.keys.is_none());
}

#[tokio::test]
async fn test_vault_requires_tenant() {
    let cloud = Arc::new(FakeCloud::new());
    let result = KeyVaultStage::new(cloud, stage_options(), " ");
    assert!(matches!(result, Err(e) if e.is_configuration()));
}
