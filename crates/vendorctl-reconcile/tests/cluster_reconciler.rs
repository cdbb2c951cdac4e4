mod common;

use std::time::Duration;

use common::{Call, FakeVendorApi, cluster, created, provider};
use vendorctl_api::{ApiError, ClusterCreation, ClusterStatus, ValidationFeedback};
use vendorctl_reconcile::{
    ClusterSpec, ClusterState, ManagedResource, POLL_INTERVAL, ReadOutcome, ReconcileError,
};

fn spec_with_wait(wait: &str) -> ClusterSpec {
    let mut spec = ClusterSpec::new("kind");
    spec.wait_duration = Some(wait.to_string());
    spec
}

fn is_get_cluster(call: &Call) -> bool {
    matches!(call, Call::GetCluster(_))
}

#[tokio::test]
async fn create_without_wait_returns_id_and_empty_kubeconfig() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))));
    let (provider, _clock) = provider(&api);

    let state = provider
        .clusters()
        .create(&ClusterSpec::new("kind"))
        .await
        .unwrap();

    assert_eq!(state.id, "c1");
    assert_eq!(state.kubeconfig, "");
    assert_eq!(state.name, "quiet-lynx");
    assert_eq!(state.version, "1.29.0");
    assert_eq!(state.disk_gib, 50);
    assert_eq!(state.nodes, 1);
    assert_eq!(api.calls().len(), 1, "no polling without a wait duration");
}

#[tokio::test]
async fn create_sends_only_declared_fields() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))));
    let (provider, _clock) = provider(&api);

    let mut spec = ClusterSpec::new("k3s");
    spec.ttl = Some("2h".into());
    spec.nodes = Some(3);
    spec.wait_duration = Some("0s".into());
    provider.clusters().create(&spec).await.unwrap();

    let Call::CreateCluster(opts) = &api.calls()[0] else {
        panic!("expected create call");
    };
    assert_eq!(opts.distribution, "k3s");
    assert_eq!(opts.ttl.as_deref(), Some("2h"));
    assert_eq!(opts.node_count, Some(3));
    assert_eq!(opts.name, None);
    assert_eq!(opts.version, None);
    assert_eq!(opts.disk_gib, None);
    assert_eq!(api.count(is_get_cluster), 0, "zero wait does not poll");
}

#[tokio::test]
async fn create_with_wait_fetches_kubeconfig_once_running() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "provisioning")))
        .on_get_cluster(Ok(cluster("c1", "running")))
        .on_kubeconfig(Ok(b"apiVersion: v1\nkind: Config\n".to_vec()));
    let (provider, clock) = provider(&api);

    let state = provider
        .clusters()
        .create(&spec_with_wait("1m"))
        .await
        .unwrap();

    assert_eq!(state.id, "c1");
    assert!(!state.kubeconfig.is_empty());
    assert_eq!(state.wait_duration, "1m");
    assert_eq!(api.count(is_get_cluster), 2);
    assert_eq!(clock.elapsed(), POLL_INTERVAL);
}

#[tokio::test]
async fn create_wait_times_out_without_error() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "pending")));
    let (provider, clock) = provider(&api);

    let state = provider
        .clusters()
        .create(&spec_with_wait("1s"))
        .await
        .unwrap();

    assert_eq!(state.id, "c1");
    assert_eq!(state.kubeconfig, "");
    // One sleep past a one second deadline, then give up.
    assert_eq!(clock.elapsed(), POLL_INTERVAL);
    assert_eq!(api.count(is_get_cluster), 2);
    assert_eq!(api.count(|c| matches!(c, Call::GetKubeconfig(_))), 0);
}

#[tokio::test]
async fn create_wait_polls_until_deadline() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "queued")));
    let (provider, clock) = provider(&api);

    provider
        .clusters()
        .create(&spec_with_wait("12s"))
        .await
        .unwrap();

    // Polls at 0s, 5s, 10s and 15s; the last one is past the deadline.
    assert_eq!(api.count(is_get_cluster), 4);
    assert_eq!(clock.elapsed(), Duration::from_secs(15));
}

#[tokio::test]
async fn create_error_status_is_provision_failure() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "error")));
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .create(&spec_with_wait("5m"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::ProvisionFailure { ref cluster_id, status: ClusterStatus::Error }
            if cluster_id == "c1"
    ));
}

#[tokio::test]
async fn create_upgrade_error_is_provision_failure() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "upgrade_error")));
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .create(&spec_with_wait("5m"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::ProvisionFailure { .. }));
}

#[tokio::test]
async fn poll_error_aborts_wait() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "queued")))
        .on_get_cluster(Err(ApiError::http(502, "bad gateway")));
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .create(&spec_with_wait("5m"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::RemoteServer(ApiError::Http { status: 502, .. })
    ));
    assert_eq!(api.count(is_get_cluster), 2, "errors are not retried");
}

#[tokio::test]
async fn kubeconfig_failure_after_ready_is_hard_error() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))))
        .on_get_cluster(Ok(cluster("c1", "running")))
        .on_kubeconfig(Err(ApiError::transport("connection reset")));
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .create(&spec_with_wait("1m"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::RemoteServer(ApiError::Transport { .. })));
}

#[tokio::test]
async fn invalid_input_makes_no_remote_call() {
    let api = FakeVendorApi::new();
    let (provider, _clock) = provider(&api);
    let clusters = provider.clusters();

    let mut bad_ttl = ClusterSpec::new("kind");
    bad_ttl.ttl = Some("forever".into());
    let mut bad_wait = ClusterSpec::new("kind");
    bad_wait.wait_duration = Some("10".into());

    for spec in [ClusterSpec::new(""), bad_ttl, bad_wait] {
        let err = clusters.create(&spec).await.unwrap_err();
        assert!(
            matches!(err, ReconcileError::Validation { created_id: None, .. }),
            "{err:?}"
        );
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn calendar_ttl_units_are_rejected_locally() {
    let api = FakeVendorApi::new();
    let (provider, _clock) = provider(&api);
    let clusters = provider.clusters();

    for ttl in ["2 days", "1 month", "1year", "3w"] {
        let mut spec = ClusterSpec::new("kind");
        spec.ttl = Some(ttl.into());
        let err = clusters.create(&spec).await.unwrap_err();
        assert!(
            matches!(err, ReconcileError::Validation { ref message, .. } if message.contains("ttl")),
            "{ttl}: {err:?}"
        );
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn zero_ttl_is_left_to_the_vendor() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))));
    let (provider, _clock) = provider(&api);

    let mut spec = ClusterSpec::new("kind");
    spec.ttl = Some("0s".into());
    let state = provider.clusters().create(&spec).await.unwrap();

    let Call::CreateCluster(opts) = &api.calls()[0] else {
        panic!("expected create call");
    };
    assert_eq!(opts.ttl, None);
    assert_eq!(state.ttl, "0s");
}

#[tokio::test]
async fn fractional_ttl_is_sent_as_declared() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(created(cluster("c1", "queued"))));
    let (provider, _clock) = provider(&api);

    let mut spec = ClusterSpec::new("kind");
    spec.ttl = Some("1.5h".into());
    provider.clusters().create(&spec).await.unwrap();

    let Call::CreateCluster(opts) = &api.calls()[0] else {
        panic!("expected create call");
    };
    assert_eq!(opts.ttl.as_deref(), Some("1.5h"));
}

#[tokio::test]
async fn validation_feedback_aborts_create_and_names_created_cluster() {
    let api = FakeVendorApi::new();
    api.on_create_cluster(Ok(ClusterCreation {
        cluster: Some(cluster("c1", "queued")),
        validation: Some(ValidationFeedback {
            message: "invalid request".into(),
            errors: vec!["ttl exceeds maximum".into()],
        }),
    }));
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .create(&spec_with_wait("1m"))
        .await
        .unwrap_err();

    match err {
        ReconcileError::Validation {
            message,
            created_id,
        } => {
            assert!(message.contains("ttl exceeds maximum"));
            assert_eq!(created_id.as_deref(), Some("c1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.count(is_get_cluster), 0);
}

#[tokio::test]
async fn read_not_found_drops_from_state() {
    let api = FakeVendorApi::new();
    api.on_get_cluster(Err(ApiError::not_found("cluster", "c1")));
    let (provider, _clock) = provider(&api);

    let prior = ClusterState {
        id: "c1".into(),
        ..ClusterState::default()
    };
    let outcome = provider.clusters().read(&prior).await.unwrap();
    assert_eq!(outcome, ReadOutcome::Gone);
}

#[tokio::test]
async fn read_other_errors_are_surfaced() {
    let api = FakeVendorApi::new();
    api.on_get_cluster(Err(ApiError::http(500, "oops")));
    let (provider, _clock) = provider(&api);

    let prior = ClusterState {
        id: "c1".into(),
        ..ClusterState::default()
    };
    let err = provider.clusters().read(&prior).await.unwrap_err();
    assert!(matches!(err, ReconcileError::RemoteServer(_)));
}

#[tokio::test]
async fn read_refreshes_remote_fields_and_keeps_local_ones() {
    let api = FakeVendorApi::new();
    let mut remote = cluster("c1", "running");
    remote.version = "1.30.1".into();
    api.on_get_cluster(Ok(remote))
        .on_kubeconfig(Ok(b"kubeconfig".to_vec()));
    let (provider, _clock) = provider(&api);

    let prior = ClusterState {
        id: "c1".into(),
        version: "1.29.0".into(),
        ttl: "4h".into(),
        wait_duration: "10m".into(),
        ..ClusterState::default()
    };
    let state = provider
        .clusters()
        .read(&prior)
        .await
        .unwrap()
        .into_option()
        .unwrap();

    assert_eq!(state.version, "1.30.1");
    assert_eq!(state.distribution, "kind");
    assert_eq!(state.ttl, "4h");
    assert_eq!(state.wait_duration, "10m");
    assert_eq!(state.kubeconfig, "kubeconfig");
}

#[tokio::test]
async fn read_clears_kubeconfig_when_not_running() {
    let api = FakeVendorApi::new();
    api.on_get_cluster(Ok(cluster("c1", "terminated")));
    let (provider, _clock) = provider(&api);

    let prior = ClusterState {
        id: "c1".into(),
        kubeconfig: "stale".into(),
        ..ClusterState::default()
    };
    let state = provider
        .clusters()
        .read(&prior)
        .await
        .unwrap()
        .into_option()
        .unwrap();
    assert_eq!(state.kubeconfig, "");
    assert_eq!(api.count(|c| matches!(c, Call::GetKubeconfig(_))), 0);
}

#[tokio::test]
async fn update_makes_no_remote_call() {
    let api = FakeVendorApi::new();
    let (provider, _clock) = provider(&api);

    let prior = ClusterState {
        id: "c1".into(),
        name: "quiet-lynx".into(),
        distribution: "kind".into(),
        version: "1.29.0".into(),
        ttl: "1h".into(),
        kubeconfig: "kubeconfig".into(),
        ..ClusterState::default()
    };
    let mut spec = ClusterSpec::new("kind");
    spec.ttl = Some("2h".into());
    spec.wait_duration = Some("5m".into());

    let state = provider.clusters().update(&spec, &prior).await.unwrap();
    assert_eq!(state.id, "c1");
    assert_eq!(state.name, "quiet-lynx");
    assert_eq!(state.version, "1.29.0");
    assert_eq!(state.ttl, "2h");
    assert_eq!(state.wait_duration, "5m");
    assert_eq!(state.kubeconfig, "kubeconfig");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn delete_removes_cluster_and_surfaces_errors() {
    let api = FakeVendorApi::new();
    api.on_remove_cluster(Ok(()))
        .on_remove_cluster(Err(ApiError::not_found("cluster", "c2")));
    let (provider, _clock) = provider(&api);
    let clusters = provider.clusters();

    let first = ClusterState {
        id: "c1".into(),
        ..ClusterState::default()
    };
    clusters.delete(&first).await.unwrap();

    let second = ClusterState {
        id: "c2".into(),
        ..ClusterState::default()
    };
    let err = clusters.delete(&second).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(
        api.calls(),
        vec![
            Call::RemoveCluster("c1".into()),
            Call::RemoveCluster("c2".into())
        ]
    );
}

#[tokio::test]
async fn delete_without_id_is_malformed_identity() {
    let api = FakeVendorApi::new();
    let (provider, _clock) = provider(&api);

    let err = provider
        .clusters()
        .delete(&ClusterState::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedIdentity { .. }));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn import_reads_by_id() {
    let api = FakeVendorApi::new();
    api.on_get_cluster(Ok(cluster("c9", "queued")));
    let (provider, _clock) = provider(&api);

    let state = provider
        .clusters()
        .import("c9")
        .await
        .unwrap()
        .into_option()
        .unwrap();
    assert_eq!(state.id, "c9");
    assert_eq!(state.distribution, "kind");
    assert_eq!(state.ttl, "");
    assert_eq!(api.calls(), vec![Call::GetCluster("c9".into())]);
}
