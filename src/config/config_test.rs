use serial_test::serial;

use super::Settings;

#[test]
#[serial]
fn test_defaults() {
    let settings = Settings::load(None).expect("load defaults");

    assert_eq!(settings.cluster.rpc_user, "test");
    assert_eq!(settings.cluster.rpc_password, "test");
    assert_eq!(settings.readiness.poll_interval_in_ms, 100);
    assert_eq!(settings.readiness.log_every_failures, 40);
    assert_eq!(settings.readiness.max_wait_in_ms, 0);
    assert!(settings.readiness.max_wait().is_none());
    assert_eq!(settings.bootstrap.maturity_blocks, 200);
    assert_eq!(settings.bootstrap.iterations, 50);
    assert_eq!(settings.bootstrap.min_spendable, 101.0);
    assert_eq!(settings.bootstrap.spend_amount, 2.0);
    assert_eq!(settings.bootstrap.balance_poll_interval_in_ms, 200);
}

#[test]
#[serial]
fn test_environment_overrides() {
    temp_env::with_vars(
        [
            ("REGBOX_READINESS__MAX_WAIT_IN_MS", Some("30000")),
            ("REGBOX_CLUSTER__RPC_USER", Some("harness")),
            ("REGBOX_BOOTSTRAP__ITERATIONS", Some("5")),
        ],
        || {
            let settings = Settings::load(None).expect("load with env");
            assert_eq!(settings.readiness.max_wait_in_ms, 30_000);
            assert_eq!(
                settings.readiness.max_wait(),
                Some(std::time::Duration::from_secs(30))
            );
            assert_eq!(settings.cluster.rpc_user, "harness");
            assert_eq!(settings.bootstrap.iterations, 5);
        },
    );
}

#[test]
#[serial]
fn test_file_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("regbox.toml");
    std::fs::write(
        &path,
        r#"
[readiness]
poll_interval_in_ms = 25

[bootstrap]
spend_amount = 0.5
"#,
    )
    .expect("write config file");

    let settings = Settings::load(path.to_str()).expect("load from file");
    assert_eq!(settings.readiness.poll_interval_in_ms, 25);
    assert_eq!(settings.bootstrap.spend_amount, 0.5);
    // Untouched sections keep their defaults.
    assert_eq!(settings.bootstrap.maturity_blocks, 200);
}
