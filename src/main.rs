// src/main.rs
//
// gaitplay CLI: resolve a trained checkpoint, replay it in the
// simulated environment, and write the evaluation artifacts.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser};

use gaitplay::checkpoint::{self, CheckpointId, RUNS_ROOT_PATTERN};
use gaitplay::commands::{Gait, GaitCommand};
use gaitplay::config::Config;
use gaitplay::env::SimLeggedEnv;
use gaitplay::logging::FileSink;
use gaitplay::policy::TrainedPolicy;
use gaitplay::report::{ResolvedRunInfo, RunReport, RunSummary, SUMMARY_SCHEMA_VERSION};
use gaitplay::runner::{EvalConfig, EvalRunner};
use gaitplay::snapshot::ConfigSnapshot;

#[derive(Parser, Debug)]
#[command(
    name = "gaitplay",
    about = "Replay a trained quadruped gait policy and chart the episode"
)]
struct Args {
    /// Training date pattern, e.g. 2024-03-03. `*` matches any run.
    #[arg(long, default_value = "2*")]
    date: String,

    /// Training time pattern, e.g. 171750.
    #[arg(long, default_value = "*")]
    time: String,

    /// Body checkpoint iteration. Negative selects the latest export.
    #[arg(long, default_value_t = -1)]
    iteration: i64,

    /// Control steps to replay.
    #[arg(long, default_value_t = 250)]
    steps: usize,

    /// Gait to command: pronking, trotting, bounding or pacing.
    #[arg(long, default_value = "trotting")]
    gait: String,

    /// Commanded forward velocity in m/s.
    #[arg(long, default_value_t = 1.5)]
    x_vel: f64,

    /// Simulation seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Output directory for charts, trace and summary.
    #[arg(long, default_value = "eval_out")]
    out: PathBuf,

    /// Prompt for the run pattern and iteration on stdin.
    #[arg(long)]
    interactive: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

/// Stdin selection of run pattern and iteration. Empty answers keep
/// the wildcard defaults.
fn prompt_selection(args: &mut Args) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    print!("run to load (date/time, blank for latest): ");
    io::stdout().flush()?;
    if let Some(line) = lines.next() {
        let line = line.context("failed to read run selection")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let mut parts = trimmed.split('/');
            if let Some(date) = parts.next() {
                args.date = date.to_string();
            }
            if let Some(time) = parts.last() {
                args.time = time.to_string();
            }
        }
    }

    print!("checkpoint iteration (blank for latest): ");
    io::stdout().flush()?;
    if let Some(line) = lines.next() {
        let line = line.context("failed to read iteration")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            args.iteration = trimmed
                .parse()
                .map_err(|_| anyhow!("invalid iteration '{}'", trimmed))?;
        }
    }
    Ok(())
}

/// Episode settings from the parsed arguments. The summary print is
/// gated on `-v`; the default run only reports the written artifacts.
fn eval_config(args: &Args, command: GaitCommand) -> EvalConfig {
    EvalConfig {
        num_steps: args.steps,
        command,
        verbosity: args.verbose,
    }
}

fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    if args.interactive {
        prompt_selection(&mut args)?;
    }

    let gait = Gait::parse(&args.gait)
        .ok_or_else(|| anyhow!("unknown gait '{}'", args.gait))?;
    let checkpoint_id = CheckpointId::from_arg(args.iteration);

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let base = checkpoint::runs_base(&cwd);
    let pattern = format!(
        "{}/gait-conditioned-agility/{}/train*/{}",
        RUNS_ROOT_PATTERN, args.date, args.time
    );
    let resolved = checkpoint::resolve_run(&base, &pattern)?;

    println!("earliest run: {}", resolved.earliest.display());
    println!(
        "selected run: {} ({} candidates)",
        resolved.selected.display(),
        resolved.candidates
    );

    let snapshot = ConfigSnapshot::load(checkpoint::snapshot_path(&resolved.selected))?;
    let config = Config::default()
        .merged_with(&snapshot)
        .with_eval_overrides();

    let policy = TrainedPolicy::load(&resolved.selected, checkpoint_id)?;
    let env = SimLeggedEnv::new(config.clone(), args.seed);

    let command = GaitCommand {
        x_vel: args.x_vel,
        gait,
        ..GaitCommand::default()
    };

    println!(
        "gaitplay | run={} | checkpoint={} | gait={} | steps={} | seed={}",
        resolved.selected.display(),
        checkpoint_id.token(),
        gait.as_str(),
        args.steps,
        args.seed
    );

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let sink = FileSink::create(args.out.join("steps.jsonl"))
        .context("failed to create step log")?;

    let eval_config = eval_config(&args, command.clone());
    let mut runner = EvalRunner::new(env, policy, sink, eval_config);
    let (trace, summary) = runner.run()?;

    let report = RunReport {
        summary: RunSummary {
            schema_version: SUMMARY_SCHEMA_VERSION,
            run: ResolvedRunInfo {
                run_dir: resolved.selected.display().to_string(),
                earliest: resolved.earliest.display().to_string(),
                checkpoint_token: checkpoint_id.token(),
            },
            seed: args.seed,
            config,
            command,
            eval: summary,
            determinism_checksum: trace.checksum(),
        },
    };
    let written = report.write(&trace, &args.out)?;
    for path in &written {
        println!("wrote {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_print_is_off_by_default_and_counts_v_flags() {
        let args = Args::parse_from(["gaitplay"]);
        assert_eq!(eval_config(&args, GaitCommand::default()).verbosity, 0);

        let args = Args::parse_from(["gaitplay", "-v"]);
        assert_eq!(eval_config(&args, GaitCommand::default()).verbosity, 1);

        let args = Args::parse_from(["gaitplay", "-vv"]);
        assert_eq!(eval_config(&args, GaitCommand::default()).verbosity, 2);
    }

    #[test]
    fn step_count_flows_into_the_episode_settings() {
        let args = Args::parse_from(["gaitplay", "--steps", "100"]);
        assert_eq!(eval_config(&args, GaitCommand::default()).num_steps, 100);
    }
}
