// tests/snapshot_merge_tests.rs
//
// Restoring a recorded configuration from disk and applying the
// evaluation overrides on top.

use std::fs;

use gaitplay::config::Config;
use gaitplay::snapshot::ConfigSnapshot;

#[test]
fn snapshot_values_survive_where_no_override_applies() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parameters.json");
    fs::write(
        &path,
        r#"{
            "Cfg": {
                "control": { "stiffness": 35.0, "damping": 0.8 },
                "sim": { "dt": 0.004 }
            }
        }"#,
    )
    .unwrap();

    let snapshot = ConfigSnapshot::load(&path).unwrap();
    let config = Config::default()
        .merged_with(&snapshot)
        .with_eval_overrides();

    assert!((config.control.stiffness - 35.0).abs() < 1e-12);
    assert!((config.control.damping - 0.8).abs() < 1e-12);
    assert!((config.sim.dt - 0.004).abs() < 1e-12);
}

#[test]
fn eval_overrides_beat_the_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parameters.json");
    fs::write(
        &path,
        r#"{
            "Cfg": {
                "env": { "num_envs": 4096 },
                "domain_rand": { "push_robots": true, "randomize_friction": true },
                "terrain": { "num_rows": 20, "num_cols": 20, "border_size": 25.0 }
            }
        }"#,
    )
    .unwrap();

    let snapshot = ConfigSnapshot::load(&path).unwrap();
    let config = Config::default()
        .merged_with(&snapshot)
        .with_eval_overrides();

    assert_eq!(config.env.num_envs, 1);
    assert!(!config.domain_rand.push_robots);
    assert!(!config.domain_rand.randomize_friction);
    assert_eq!(config.terrain.num_rows, 5);
    assert_eq!(config.terrain.num_cols, 5);
    assert!((config.terrain.border_size - 0.0).abs() < 1e-12);
    assert!(config.terrain.center_robots);
}

#[test]
fn unknown_sections_and_keys_are_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parameters.json");
    fs::write(
        &path,
        r#"{
            "Cfg": {
                "rewards": { "tracking_sigma": 0.25 },
                "control": { "stiffness": 28.0, "not_a_field": true }
            }
        }"#,
    )
    .unwrap();

    let snapshot = ConfigSnapshot::load(&path).unwrap();
    let config = Config::default().merged_with(&snapshot);

    assert!((config.control.stiffness - 28.0).abs() < 1e-12);
    assert_eq!(config, {
        let mut expected = Config::default();
        expected.control.stiffness = 28.0;
        expected
    });
}

#[test]
fn missing_snapshot_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigSnapshot::load(dir.path().join("parameters.json")).is_err());
}
