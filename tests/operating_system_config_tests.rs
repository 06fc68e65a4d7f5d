//! OperatingSystemConfig actuator tests
//!
//! Drive the actuator against in-memory Secret and status stores.

mod common;

use common::*;
use os_config_controller::cloudinit::{encoding, CloudInitGenerator, MissingUnitContent};
use os_config_controller::constants::{CLOUD_CONFIG_DATA_KEY, ERROR_PROGRESS, SUCCESS_PROGRESS};
use os_config_controller::controller::operatingsystemconfig::OperatingSystemConfigActuator;
use os_config_controller::controller::Actuator;
use os_config_controller::crd::{
    CloudConfig, LastOperationState, LastOperationType, OperatingSystemConfig,
    OperatingSystemConfigStatus, SecretReference,
};
use std::sync::Arc;

struct Harness {
    secrets: Arc<MemorySecretStore>,
    statuses: Arc<MemoryStatusStore<OperatingSystemConfig>>,
    actuator: OperatingSystemConfigActuator,
}

fn harness() -> Harness {
    harness_with(CloudInitGenerator::new("/etc/systemd/system"))
}

fn harness_with(generator: CloudInitGenerator) -> Harness {
    let secrets = Arc::new(MemorySecretStore::new());
    let statuses = Arc::new(MemoryStatusStore::new());
    let actuator = OperatingSystemConfigActuator::new(secrets.clone(), statuses.clone(), generator);
    Harness {
        secrets,
        statuses,
        actuator,
    }
}

fn scenario_config() -> OperatingSystemConfig {
    operating_system_config(
        "pool-a",
        vec![inline_file("/etc/x", "", "hello")],
        vec![unit(
            "x.service",
            Some("[Unit]\n"),
            &[("10-x.conf", "Env=1")],
        )],
    )
}

fn artifact(h: &Harness, name: &str) -> Vec<u8> {
    h.secrets
        .data(NAMESPACE, name, CLOUD_CONFIG_DATA_KEY)
        .expect("artifact written")
}

mod reconcile_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_writes_cloud_config_and_status() {
        let h = harness();
        let mut config = scenario_config();

        assert!(!h.actuator.exists(&config).await.unwrap());
        h.actuator.create(&mut config).await.unwrap();

        let files = written_files(&artifact(&h, "osc-result-pool-a"));
        assert_eq!(
            files,
            vec![
                ("/etc/x".to_string(), "0644".to_string(), b"hello".to_vec()),
                (
                    "/etc/systemd/system/x.service".to_string(),
                    "0644".to_string(),
                    b"[Unit]\n".to_vec()
                ),
                (
                    "/etc/systemd/system/x.service.d/10-x.conf".to_string(),
                    "0644".to_string(),
                    b"Env=1".to_vec()
                ),
            ]
        );

        let status = h.statuses.last().unwrap().status.unwrap();
        assert_eq!(status.observed_generation, Some(1));
        assert_eq!(
            status.cloud_config,
            Some(CloudConfig {
                secret_ref: SecretReference {
                    name: "osc-result-pool-a".to_string(),
                    namespace: NAMESPACE.to_string(),
                },
            })
        );
        assert_eq!(status.units, vec!["x.service".to_string()]);
        let last_operation = status.last_operation.unwrap();
        assert_eq!(last_operation.operation_type, LastOperationType::Reconcile);
        assert_eq!(last_operation.state, LastOperationState::Succeeded);
        assert_eq!(last_operation.description, "Successfully generated cloud config");
        assert_eq!(last_operation.progress, SUCCESS_PROGRESS);
        assert!(status.last_error.is_none());

        // Snapshot handed in carries the written status
        assert!(h.actuator.exists(&config).await.unwrap());
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let h = harness();
        let mut config = scenario_config();

        h.actuator.create(&mut config).await.unwrap();
        let first = artifact(&h, "osc-result-pool-a");
        let writes = h.secrets.writes();

        h.actuator.update(&mut config).await.unwrap();
        let second = artifact(&h, "osc-result-pool-a");

        assert_eq!(first, second);
        assert_eq!(h.secrets.writes(), writes, "unchanged artifact is not rewritten");
        let status = config.status.unwrap();
        assert_eq!(
            status.cloud_config.unwrap().secret_ref.name,
            "osc-result-pool-a"
        );
    }

    #[tokio::test]
    async fn test_update_reuses_recorded_artifact_name() {
        let h = harness();
        let mut config = scenario_config();
        config.status = Some(OperatingSystemConfigStatus {
            cloud_config: Some(CloudConfig {
                secret_ref: SecretReference {
                    name: "cloud-config-legacy".to_string(),
                    namespace: NAMESPACE.to_string(),
                },
            }),
            ..Default::default()
        });

        assert!(h.actuator.exists(&config).await.unwrap());
        h.actuator.update(&mut config).await.unwrap();

        assert!(h.secrets.secret(NAMESPACE, "cloud-config-legacy").is_some());
        assert!(h.secrets.secret(NAMESPACE, "osc-result-pool-a").is_none());
    }

    #[tokio::test]
    async fn test_artifact_is_owned_by_config() {
        let h = harness();
        let mut config = scenario_config();

        h.actuator.create(&mut config).await.unwrap();

        let secret = h.secrets.secret(NAMESPACE, "osc-result-pool-a").unwrap();
        let owners = secret.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "OperatingSystemConfig");
        assert_eq!(owners[0].name, "pool-a");
        assert_eq!(owners[0].uid, "uid-pool-a");
        assert_eq!(owners[0].controller, Some(true));
    }

    #[tokio::test]
    async fn test_unrelated_keys_survive_reconcile() {
        let h = harness();
        h.secrets
            .insert(NAMESPACE, "osc-result-pool-a", &[("join-token", b"abc")]);
        let mut config = scenario_config();

        h.actuator.create(&mut config).await.unwrap();

        assert_eq!(
            h.secrets.data(NAMESPACE, "osc-result-pool-a", "join-token"),
            Some(b"abc".to_vec())
        );
        assert!(h
            .secrets
            .data(NAMESPACE, "osc-result-pool-a", CLOUD_CONFIG_DATA_KEY)
            .is_some());
    }

    #[tokio::test]
    async fn test_conflicting_writer_is_retried_and_preserved() {
        let h = harness();
        h.secrets.inject_conflicts(2);
        let mut config = scenario_config();

        h.actuator.create(&mut config).await.unwrap();

        assert!(h
            .secrets
            .data(NAMESPACE, "osc-result-pool-a", CLOUD_CONFIG_DATA_KEY)
            .is_some());
        assert_eq!(
            h.secrets.data(NAMESPACE, "osc-result-pool-a", "concurrent-2"),
            Some(b"other writer".to_vec())
        );
        assert_eq!(
            h.secrets.data(NAMESPACE, "osc-result-pool-a", "concurrent-1"),
            Some(b"other writer".to_vec())
        );
    }

    #[tokio::test]
    async fn test_file_order_follows_spec_order() {
        let h = harness();
        let mut config = operating_system_config(
            "pool-b",
            vec![
                inline_file("/etc/c", "", "c"),
                inline_file("/etc/a", "", "a"),
                inline_file("/etc/b", "", "b"),
            ],
            vec![unit("y.service", Some("y"), &[]), unit("x.service", Some("x"), &[])],
        );

        h.actuator.create(&mut config).await.unwrap();

        let paths: Vec<String> = written_files(&artifact(&h, "osc-result-pool-b"))
            .into_iter()
            .map(|(path, _, _)| path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "/etc/c",
                "/etc/a",
                "/etc/b",
                "/etc/systemd/system/y.service",
                "/etc/systemd/system/x.service",
            ]
        );
        assert_eq!(
            config.status.unwrap().units,
            vec!["y.service".to_string(), "x.service".to_string()]
        );
    }

    #[tokio::test]
    async fn test_content_from_secret_and_encoding() {
        let h = harness();
        h.secrets
            .insert(NAMESPACE, "kubelet-certs", &[("ca.crt", b"-----BEGIN CERTIFICATE-----")]);
        let mut config = operating_system_config(
            "pool-c",
            vec![
                secret_file("/var/lib/kubelet/ca.crt", "kubelet-certs", "ca.crt"),
                inline_file("/etc/motd", "b64", &encoding::encode(b"welcome")),
            ],
            vec![],
        );

        h.actuator.create(&mut config).await.unwrap();

        let files = written_files(&artifact(&h, "osc-result-pool-c"));
        assert_eq!(
            files,
            vec![
                (
                    "/var/lib/kubelet/ca.crt".to_string(),
                    "0600".to_string(),
                    b"-----BEGIN CERTIFICATE-----".to_vec()
                ),
                ("/etc/motd".to_string(), "0644".to_string(), b"welcome".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unit_without_content_can_be_omitted() {
        let h = harness_with(
            CloudInitGenerator::new("/etc/systemd/system")
                .with_missing_unit_content(MissingUnitContent::OmitUnit),
        );
        let mut config = operating_system_config(
            "pool-d",
            vec![],
            vec![
                unit("docker.service", None, &[("10-opts.conf", "[Service]\n")]),
                unit("kubelet.service", Some("[Unit]\n"), &[]),
            ],
        );

        h.actuator.create(&mut config).await.unwrap();

        let paths: Vec<String> = written_files(&artifact(&h, "osc-result-pool-d"))
            .into_iter()
            .map(|(path, _, _)| path)
            .collect();
        assert_eq!(paths, vec!["/etc/systemd/system/kubelet.service"]);
        assert_eq!(config.status.unwrap().units, vec!["kubelet.service".to_string()]);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_fails_generation() {
        let h = harness();
        let mut config = operating_system_config(
            "pool-a",
            vec![secret_file("/etc/token", "bootstrap-token", "token")],
            vec![],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("/etc/token"));
        assert_eq!(h.secrets.writes(), 0, "no artifact is written");

        let status = h.statuses.last().unwrap().status.unwrap();
        assert!(status.cloud_config.is_none());
        let last_operation = status.last_operation.unwrap();
        assert_eq!(last_operation.state, LastOperationState::Error);
        assert_eq!(last_operation.progress, ERROR_PROGRESS);
        assert!(last_operation
            .description
            .starts_with("Could not generate cloud config: "));
        let last_error = status.last_error.unwrap();
        assert_eq!(last_error.description, last_operation.description);
        assert_eq!(last_error.retry_count, 0);
    }

    #[tokio::test]
    async fn test_missing_secret_key_fails_generation() {
        let h = harness();
        h.secrets
            .insert(NAMESPACE, "bootstrap-token", &[("other", b"x")]);
        let mut config = operating_system_config(
            "pool-a",
            vec![secret_file("/etc/token", "bootstrap-token", "token")],
            vec![],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("token"));
    }

    #[tokio::test]
    async fn test_unknown_encoding_fails_with_decode_error() {
        let h = harness();
        let mut config = operating_system_config(
            "pool-a",
            vec![inline_file("/etc/x", "rot13", "uryyb")],
            vec![],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(err.is_decode());
        assert!(h.secrets.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_retry_keeps_previous_artifact_reference() {
        let h = harness();
        let mut config = scenario_config();
        h.actuator.create(&mut config).await.unwrap();
        let before = artifact(&h, "osc-result-pool-a");

        config.metadata.generation = Some(2);
        config.spec.files = vec![secret_file("/etc/token", "missing", "token")];
        h.actuator.update(&mut config).await.unwrap_err();
        h.actuator.update(&mut config).await.unwrap_err();

        assert_eq!(artifact(&h, "osc-result-pool-a"), before);
        let status = h.statuses.last().unwrap().status.unwrap();
        assert_eq!(status.observed_generation, Some(2));
        assert_eq!(
            status.cloud_config.unwrap().secret_ref.name,
            "osc-result-pool-a"
        );
        assert_eq!(status.last_error.unwrap().retry_count, 1);
    }

    #[tokio::test]
    async fn test_unquotable_unit_name_fails_generation() {
        let h = harness();
        let mut config = operating_system_config(
            "pool-a",
            vec![],
            vec![unit(
                "a'; touch /pwned; echo '.service",
                Some("[Unit]\n"),
                &[],
            )],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(matches!(
            err,
            os_config_controller::Error::InvalidUnitName { .. }
        ));
        assert_eq!(h.secrets.writes(), 0);
        let status = h.statuses.last().unwrap().status.unwrap();
        assert!(status.cloud_config.is_none());
        assert!(status
            .last_operation
            .unwrap()
            .description
            .starts_with("Could not generate cloud config: "));
    }

    #[tokio::test]
    async fn test_drop_in_outside_unit_directory_fails_generation() {
        let h = harness();
        let mut config = operating_system_config(
            "pool-a",
            vec![],
            vec![unit("x.service", None, &[("../../../../etc/evil", "A=1")])],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(matches!(
            err,
            os_config_controller::Error::InvalidUnitName { .. }
        ));
        assert!(h.secrets.secret(NAMESPACE, "osc-result-pool-a").is_none());
    }

    #[tokio::test]
    async fn test_status_failure_does_not_shadow_generation_error() {
        let h = harness();
        h.statuses.fail(true);
        let mut config = operating_system_config(
            "pool-a",
            vec![inline_file("/etc/x", "b64", "not base64!")],
            vec![],
        );

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(err.is_decode(), "expected the generation error, got {err}");
        assert!(h.statuses.updates().is_empty());
    }

    #[tokio::test]
    async fn test_apply_secret_failure_is_reported_separately() {
        let h = harness();
        h.secrets.fail_writes(true);
        let mut config = scenario_config();

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(!err.is_decode());
        let status = h.statuses.last().unwrap().status.unwrap();
        assert!(status.cloud_config.is_none());
        assert!(status
            .last_operation
            .unwrap()
            .description
            .starts_with("Could not apply secret for generated cloud config: "));
    }

    #[tokio::test]
    async fn test_artifact_controlled_by_other_owner_is_rejected() {
        let h = harness();
        let mut other = scenario_config();
        other.metadata.uid = Some("uid-someone-else".to_string());
        h.actuator.create(&mut other).await.unwrap();

        let mut config = scenario_config();
        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(matches!(
            err,
            os_config_controller::Error::AlreadyOwned { .. }
        ));
    }

    #[tokio::test]
    async fn test_exhausted_conflict_retries_return_conflict() {
        let h = harness();
        h.secrets.inject_conflicts(u32::MAX);
        let mut config = scenario_config();

        let err = h.actuator.create(&mut config).await.unwrap_err();

        assert!(err.is_conflict());
    }
}

mod delete_tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_records_successful_delete() {
        let h = harness();
        let mut config = scenario_config();
        h.actuator.create(&mut config).await.unwrap();
        let writes = h.secrets.writes();

        h.actuator.delete(&mut config).await.unwrap();

        let status = h.statuses.last().unwrap().status.unwrap();
        let last_operation = status.last_operation.unwrap();
        assert_eq!(last_operation.operation_type, LastOperationType::Delete);
        assert_eq!(last_operation.state, LastOperationState::Succeeded);
        assert_eq!(last_operation.description, "Successfully deleted cloud config");
        // Secret removal belongs to the garbage collector
        assert_eq!(h.secrets.writes(), writes);
        assert!(h.secrets.secret(NAMESPACE, "osc-result-pool-a").is_some());
    }

    #[tokio::test]
    async fn test_delete_returns_status_error() {
        let h = harness();
        h.statuses.fail(true);
        let mut config = scenario_config();

        let err = h.actuator.delete(&mut config).await.unwrap_err();

        assert!(err.to_string().contains("injected status failure"));
    }
}
