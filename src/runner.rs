// src/runner.rs
//
// Evaluation loop.
//
// Drives a policy against an environment for a fixed number of control
// steps. The environment's done flag is recorded but never ends the
// loop, so every run produces buffers of identical length.

use serde::{Deserialize, Serialize};

use crate::commands::GaitCommand;
use crate::env::Environment;
use crate::logging::EventSink;
use crate::module::ModuleError;
use crate::policy::Policy;
use crate::trajectory::EvalTrace;

/// Settings for one evaluation episode.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Number of control steps to run. Fixed horizon.
    pub num_steps: usize,
    pub command: GaitCommand,
    pub verbosity: u8,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            num_steps: 250,
            command: GaitCommand::default(),
            verbosity: 0,
        }
    }
}

/// Aggregate statistics for one completed episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub num_steps: usize,
    pub target_x_vel: f64,
    pub mean_x_vel: f64,
    pub final_x_vel: f64,
    pub mean_abs_tracking_error: f64,
    pub done_count: u64,
}

/// Runs a policy against an environment and records the trace.
pub struct EvalRunner<E: Environment, P: Policy, S: EventSink> {
    env: E,
    policy: P,
    sink: S,
    config: EvalConfig,
}

impl<E: Environment, P: Policy, S: EventSink> EvalRunner<E, P, S> {
    pub fn new(env: E, policy: P, sink: S, config: EvalConfig) -> Self {
        Self {
            env,
            policy,
            sink,
            config,
        }
    }

    /// Run the fixed-horizon episode. The command vector is rewritten
    /// into the environment before every step so the buffer always
    /// reflects the requested gait.
    pub fn run(&mut self) -> Result<(EvalTrace, EvalSummary), ModuleError> {
        let mut obs = self.env.reset();
        let mut trace = EvalTrace::with_capacity(
            self.env.dt(),
            self.config.command.x_vel,
            self.config.num_steps,
        );

        for step in 1..=self.config.num_steps as u64 {
            let output = self.policy.act(&obs)?;
            self.config.command.write_to(self.env.commands_mut());
            let result = self.env.step(&output.actions);

            trace.push_step(self.env.base_lin_vel()[0], self.env.dof_pos(), result.done);
            self.sink.log_step(step, &result, &output.actions);
            obs = result.observation;
        }

        let summary = self.summarize(&trace);
        if self.config.verbosity >= 1 {
            self.print_summary(&summary);
        }
        Ok((trace, summary))
    }

    fn summarize(&self, trace: &EvalTrace) -> EvalSummary {
        let n = trace.len().max(1) as f64;
        let target = trace.target_x_vel;
        let mean_x_vel = trace.measured_x_vels.iter().sum::<f64>() / n;
        let mean_abs_tracking_error = trace
            .measured_x_vels
            .iter()
            .map(|v| (v - target).abs())
            .sum::<f64>()
            / n;
        EvalSummary {
            num_steps: trace.len(),
            target_x_vel: target,
            mean_x_vel,
            final_x_vel: trace.measured_x_vels.last().copied().unwrap_or(0.0),
            mean_abs_tracking_error,
            done_count: trace.dones,
        }
    }

    fn print_summary(&self, summary: &EvalSummary) {
        println!("=== Evaluation Summary ===");
        println!("policy:              {}", self.policy.name());
        println!("steps:               {}", summary.num_steps);
        println!("target x vel:        {:.3} m/s", summary.target_x_vel);
        println!("mean x vel:          {:.3} m/s", summary.mean_x_vel);
        println!("final x vel:         {:.3} m/s", summary.final_x_vel);
        println!(
            "mean tracking error: {:.3} m/s",
            summary.mean_abs_tracking_error
        );
        println!("done flags seen:     {}", summary.done_count);
    }
}
