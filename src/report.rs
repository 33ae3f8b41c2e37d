// src/report.rs
//
// Run artifacts.
//
// After an episode completes the harness writes four files into the
// output directory: a velocity tracking chart, a joint trajectory
// chart, the raw trace as CSV, and a machine-readable run summary with
// a determinism checksum.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::commands::GaitCommand;
use crate::config::Config;
use crate::runner::EvalSummary;
use crate::trajectory::EvalTrace;

pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Joint series drawn on the joint chart. The remaining joints repeat
/// the same leg pattern and only clutter the plot.
const CHARTED_JOINTS: usize = 6;

/// Provenance of the evaluated checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRunInfo {
    pub run_dir: String,
    pub earliest: String,
    pub checkpoint_token: String,
}

/// Top-level summary persisted as `run_summary.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub run: ResolvedRunInfo,
    pub seed: u64,
    pub config: Config,
    pub command: GaitCommand,
    pub eval: EvalSummary,
    /// Sha256 over the rounded trace series. Equal checksums mean
    /// bit-equal playback.
    pub determinism_checksum: String,
}

impl RunSummary {
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Writes the full artifact set for one evaluation.
pub struct RunReport {
    pub summary: RunSummary,
}

impl RunReport {
    /// Render charts and persist the trace and summary under `out_dir`.
    /// Returns the paths written, summary last.
    pub fn write(&self, trace: &EvalTrace, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;

        let velocity_path = out_dir.join("velocity.svg");
        let joints_path = out_dir.join("joints.svg");
        let trace_path = out_dir.join("trace.csv");
        let summary_path = out_dir.join("run_summary.json");

        render_velocity_chart(trace, &velocity_path)
            .with_context(|| format!("failed to render {}", velocity_path.display()))?;
        render_joint_chart(trace, &joints_path)
            .with_context(|| format!("failed to render {}", joints_path.display()))?;
        trace
            .write_csv(&trace_path)
            .with_context(|| format!("failed to write {}", trace_path.display()))?;
        self.summary.write_to_file(&summary_path)?;

        Ok(vec![velocity_path, joints_path, trace_path, summary_path])
    }
}

fn axis_range(values: impl Iterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return fallback;
    }
    let pad = ((max - min).abs() * 0.1).max(0.05);
    (min - pad, max + pad)
}

/// Measured forward velocity against the commanded velocity.
pub fn render_velocity_chart(trace: &EvalTrace, path: &Path) -> anyhow::Result<()> {
    let times = trace.times();
    let t_max = times.last().copied().unwrap_or(1.0);
    let (y_min, y_max) = axis_range(
        trace
            .measured_x_vels
            .iter()
            .copied()
            .chain(std::iter::once(trace.target_x_vel)),
        (-0.5, 2.0),
    );

    let root = SVGBackend::new(path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Forward Linear Velocity", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Velocity (m/s)")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            times.iter().copied().zip(trace.measured_x_vels.iter().copied()),
            &BLUE,
        ))?
        .label("measured")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(LineSeries::new(
            times.iter().map(|t| (*t, trace.target_x_vel)),
            &RED,
        ))?
        .label("desired")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// First `CHARTED_JOINTS` joint positions over time.
pub fn render_joint_chart(trace: &EvalTrace, path: &Path) -> anyhow::Result<()> {
    let times = trace.times();
    let t_max = times.last().copied().unwrap_or(1.0);
    let (y_min, y_max) = axis_range(
        trace
            .joint_positions
            .iter()
            .flat_map(|row| row.iter().take(CHARTED_JOINTS).copied()),
        (-2.0, 2.0),
    );

    let root = SVGBackend::new(path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Joint Positions", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Position (rad)")
        .draw()?;

    for joint in 0..CHARTED_JOINTS {
        let color = Palette99::pick(joint).to_rgba();
        chart
            .draw_series(LineSeries::new(
                times
                    .iter()
                    .zip(&trace.joint_positions)
                    .map(|(t, row)| (*t, row[joint])),
                &color,
            ))?
            .label(format!("joint_{:02}", joint))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::NUM_DOFS;

    fn sample_trace() -> EvalTrace {
        let mut trace = EvalTrace::with_capacity(0.02, 1.5, 10);
        for i in 0..10 {
            let v = 0.15 * i as f64;
            trace.push_step(v, &[v * 0.1; NUM_DOFS], false);
        }
        trace
    }

    fn sample_summary(trace: &EvalTrace) -> RunSummary {
        RunSummary {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run: ResolvedRunInfo {
                run_dir: "runs/gait-conditioned-agility/2024-03-03/train/171750".to_string(),
                earliest: "runs/gait-conditioned-agility/2024-01-01/train/100000".to_string(),
                checkpoint_token: "latest".to_string(),
            },
            seed: 0,
            config: Config::default().with_eval_overrides(),
            command: GaitCommand::default(),
            eval: EvalSummary {
                num_steps: trace.len(),
                target_x_vel: 1.5,
                mean_x_vel: 0.675,
                final_x_vel: 1.35,
                mean_abs_tracking_error: 0.825,
                done_count: 0,
            },
            determinism_checksum: trace.checksum(),
        }
    }

    #[test]
    fn report_writes_all_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let trace = sample_trace();
        let report = RunReport {
            summary: sample_summary(&trace),
        };

        let paths = report.write(&trace, dir.path()).unwrap();
        assert_eq!(paths.len(), 4);
        for path in &paths {
            assert!(path.exists(), "missing artifact {}", path.display());
        }
    }

    #[test]
    fn summary_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let trace = sample_trace();
        let summary = sample_summary(&trace);
        let path = dir.path().join("run_summary.json");
        summary.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let restored: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(restored.schema_version, SUMMARY_SCHEMA_VERSION);
        assert_eq!(restored.determinism_checksum, summary.determinism_checksum);
        assert_eq!(restored.eval.num_steps, 10);
    }

    #[test]
    fn velocity_chart_contains_both_series_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("velocity.svg");
        render_velocity_chart(&sample_trace(), &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("measured"));
        assert!(svg.contains("desired"));
    }
}
