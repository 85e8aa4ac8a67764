mod common;

use cloud_foundation::azure::models::Location;
use cloud_foundation::foundation::providers::{
    EnsureProvidersStage, ProvidersInput, DEFAULT_PROVIDERS,
};
use cloud_foundation::foundation::stage::{execute_stage, PollPolicy};
use common::*;
use std::sync::Arc;

fn stage(cloud: &Arc<FakeCloud>) -> EnsureProvidersStage {
    EnsureProvidersStage::new(cloud.clone(), stage_options())
        .with_poll_policy(PollPolicy::immediate(3))
}

fn input(namespaces: &[&str]) -> ProvidersInput {
    ProvidersInput {
        providers: Some(namespaces.iter().map(|n| n.to_string()).collect()),
    }
}

#[tokio::test]
async fn test_default_providers_when_none_requested() {
    let cloud = Arc::new(FakeCloud::new());

    let output = execute_stage(&stage(&cloud), ProvidersInput::default()).await.unwrap();

    assert_eq!(output.registered.len(), DEFAULT_PROVIDERS.len());
    for namespace in DEFAULT_PROVIDERS {
        assert_eq!(output.registered.get(namespace).map(String::as_str), Some("Registered"));
    }
    assert_eq!(cloud.count(|c| matches!(c, Call::RegisterProvider(_))).await, 0);
}

#[tokio::test]
async fn test_empty_request_list_falls_back_to_defaults() {
    let cloud = Arc::new(FakeCloud::new());
    let stage = stage(&cloud).with_default_providers(vec!["Microsoft.App".to_string()]);

    let output = execute_stage(&stage, input(&[])).await.unwrap();

    assert_eq!(output.registered.keys().collect::<Vec<_>>(), vec!["Microsoft.App"]);
}

#[tokio::test]
async fn test_unregistered_provider_is_registered() {
    let cloud = Arc::new(
        FakeCloud::new().with_provider_states(
            "Microsoft.App",
            vec![Some("NotRegistered"), Some("Registering")],
        ),
    );

    let output = execute_stage(&stage(&cloud), input(&["Microsoft.App"])).await.unwrap();

    assert_eq!(output.registered["Microsoft.App"], "Registering");
    assert_eq!(
        cloud
            .count(|c| matches!(c, Call::RegisterProvider(ns) if ns == "Microsoft.App"))
            .await,
        1
    );
}

#[tokio::test]
async fn test_missing_state_counts_as_not_registered() {
    let cloud = Arc::new(FakeCloud::new().with_provider_states("Microsoft.App", vec![None]));

    let output = execute_stage(&stage(&cloud), input(&["Microsoft.App"])).await.unwrap();

    assert_eq!(output.registered["Microsoft.App"], "Unknown");
    assert_eq!(cloud.count(|c| matches!(c, Call::RegisterProvider(_))).await, 1);
    // initial read, three polls, one final read
    assert_eq!(cloud.count(|c| matches!(c, Call::GetProvider(_))).await, 5);
}

#[tokio::test]
async fn test_polling_returns_once_settled() {
    let cloud = Arc::new(FakeCloud::new().with_provider_states(
        "Microsoft.App",
        vec![Some("Unregistered"), Some("Unregistered"), Some("Registered")],
    ));

    let output = execute_stage(&stage(&cloud), input(&["Microsoft.App"])).await.unwrap();

    assert_eq!(output.registered["Microsoft.App"], "Registered");
    assert_eq!(cloud.count(|c| matches!(c, Call::GetProvider(_))).await, 3);
}

#[tokio::test]
async fn test_namespace_failure_is_recorded_not_raised() {
    let cloud = Arc::new(FakeCloud::new().failing("Microsoft.Broken"));

    let output = execute_stage(&stage(&cloud), input(&["Microsoft.Broken", "Microsoft.Network"]))
        .await
        .unwrap();

    let broken = &output.registered["Microsoft.Broken"];
    assert!(broken.starts_with("Error: "), "unexpected state: {broken}");
    assert!(broken.contains("Microsoft.Broken failed"));
    assert_eq!(output.registered["Microsoft.Network"], "Registered");
}

#[tokio::test]
async fn test_regions_without_names_are_dropped() {
    let cloud = Arc::new(FakeCloud::new().with_locations(vec![
        Location {
            name: Some("westus2".to_string()),
            display_name: Some("West US 2".to_string()),
        },
        Location {
            name: Some(String::new()),
            display_name: Some("Nameless".to_string()),
        },
        Location {
            name: None,
            display_name: Some("Missing".to_string()),
        },
    ]));

    let output = execute_stage(&stage(&cloud), input(&["Microsoft.Network"])).await.unwrap();

    assert_eq!(output.regions.len(), 1);
    assert_eq!(output.regions[0].name, "westus2");
    assert_eq!(output.regions[0].display_name.as_deref(), Some("West US 2"));
    assert!(cloud
        .calls()
        .await
        .contains(&Call::ListLocations(SUBSCRIPTION_ID.to_string())));
}

#[tokio::test]
async fn test_location_failure_fails_the_stage() {
    let cloud = Arc::new(FakeCloud::new().failing("list_locations"));

    let result = execute_stage(&stage(&cloud), input(&["Microsoft.Network"])).await;

    assert!(result.is_err());
}
