// tests/report_artifacts_tests.rs
//
// Artifact emission for a completed evaluation.

use gaitplay::commands::GaitCommand;
use gaitplay::config::Config;
use gaitplay::env::SimLeggedEnv;
use gaitplay::logging::NoopSink;
use gaitplay::policy::ZeroPolicy;
use gaitplay::report::{ResolvedRunInfo, RunReport, RunSummary, SUMMARY_SCHEMA_VERSION};
use gaitplay::runner::{EvalConfig, EvalRunner};
use gaitplay::trajectory::EvalTrace;

fn run_and_report(seed: u64) -> (EvalTrace, RunSummary) {
    let config = Config::default().with_eval_overrides();
    let env = SimLeggedEnv::new(config.clone(), seed);
    let eval_config = EvalConfig {
        num_steps: 60,
        command: GaitCommand::default(),
        verbosity: 0,
    };
    let mut runner = EvalRunner::new(env, ZeroPolicy::new(12), NoopSink, eval_config);
    let (trace, eval) = runner.run().unwrap();

    let summary = RunSummary {
        schema_version: SUMMARY_SCHEMA_VERSION,
        run: ResolvedRunInfo {
            run_dir: "runs/gait-conditioned-agility/2024-03-03/train/171750".to_string(),
            earliest: "runs/gait-conditioned-agility/2024-01-01/train/100000".to_string(),
            checkpoint_token: "000900".to_string(),
        },
        seed,
        config,
        command: GaitCommand::default(),
        eval,
        determinism_checksum: trace.checksum(),
    };
    (trace, summary)
}

#[test]
fn report_emits_charts_trace_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let (trace, summary) = run_and_report(0);
    let report = RunReport { summary };

    let written = report.write(&trace, dir.path()).unwrap();
    assert_eq!(written.len(), 4);
    assert!(dir.path().join("velocity.svg").exists());
    assert!(dir.path().join("joints.svg").exists());
    assert!(dir.path().join("trace.csv").exists());
    assert!(dir.path().join("run_summary.json").exists());
}

#[test]
fn written_summary_parses_and_echoes_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let (trace, summary) = run_and_report(0);
    RunReport { summary }.write(&trace, dir.path()).unwrap();

    let text = std::fs::read_to_string(dir.path().join("run_summary.json")).unwrap();
    let restored: RunSummary = serde_json::from_str(&text).unwrap();
    assert_eq!(restored.schema_version, SUMMARY_SCHEMA_VERSION);
    assert_eq!(restored.run.checkpoint_token, "000900");
    assert_eq!(restored.eval.num_steps, 60);
    assert_eq!(restored.determinism_checksum, trace.checksum());
}

#[test]
fn checksums_agree_across_identical_runs() {
    let (_, a) = run_and_report(42);
    let (_, b) = run_and_report(42);
    assert_eq!(a.determinism_checksum, b.determinism_checksum);
}

#[test]
fn csv_row_count_matches_the_trace() {
    let dir = tempfile::tempdir().unwrap();
    let (trace, summary) = run_and_report(0);
    RunReport { summary }.write(&trace, dir.path()).unwrap();

    let text = std::fs::read_to_string(dir.path().join("trace.csv")).unwrap();
    // Header plus one row per step.
    assert_eq!(text.lines().count(), trace.len() + 1);
}
