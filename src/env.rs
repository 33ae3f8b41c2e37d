// src/env.rs
//
// Simulated legged environment.
//
// A lightweight stand-in for the full rigid-body simulator: it tracks
// commanded base velocity with first-order dynamics, runs a gait clock
// from the commanded step frequency, and applies delayed joint actions
// around a nominal standing pose. Deterministic given a seed.

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::commands::COMMAND_DIM;
use crate::config::Config;

/// Actuated degrees of freedom on the quadruped.
pub const NUM_DOFS: usize = 12;

/// Time constant of the base velocity response, in seconds.
const VEL_TRACK_TAU: f64 = 0.25;

/// Observation handed to the policy each step.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Current-step observation vector.
    pub obs: Vec<f32>,
    /// Flattened ring of the last `obs_history_len` observations,
    /// oldest first.
    pub obs_history: Vec<f32>,
}

/// Diagnostic payload attached to every step.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub step: u64,
    pub time_s: f64,
    pub command_x_vel: f64,
    pub termination_reason: Option<String>,
}

/// Result of advancing the environment by one control step.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Environment interface consumed by the evaluation runner.
pub trait Environment {
    fn reset(&mut self) -> Observation;
    fn step(&mut self, actions: &[f32]) -> StepResult;
    /// Mutable command buffer, written before each step.
    fn commands_mut(&mut self) -> &mut [f64];
    fn dof_pos(&self) -> &[f64];
    fn base_lin_vel(&self) -> [f64; 3];
    fn dt(&self) -> f64;
}

/// Seeded simulation of a single quadruped.
pub struct SimLeggedEnv {
    config: Config,
    rng: ChaCha8Rng,
    seed: u64,
    dt: f64,
    max_steps: u64,
    tick: u64,

    commands: Vec<f64>,
    base_lin_vel: [f64; 3],
    gait_phase: f64,
    dof_pos: Vec<f64>,
    dof_vel: Vec<f64>,
    default_dof_pos: Vec<f64>,
    action_lag: VecDeque<Vec<f32>>,
    history: VecDeque<Vec<f32>>,
}

impl SimLeggedEnv {
    pub fn new(config: Config, seed: u64) -> Self {
        let dt = config.control_dt();
        let max_steps = (config.env.episode_length_s / dt).round() as u64;
        // Nominal standing pose, repeated per leg: hip, thigh, calf.
        let default_dof_pos: Vec<f64> = (0..4).flat_map(|_| [0.1, 0.8, -1.5]).collect();
        let lag = config.domain_rand.lag_timesteps.max(1);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            dt,
            max_steps,
            tick: 0,
            commands: vec![0.0; COMMAND_DIM],
            base_lin_vel: [0.0; 3],
            gait_phase: 0.0,
            dof_pos: default_dof_pos.clone(),
            dof_vel: vec![0.0; NUM_DOFS],
            default_dof_pos,
            action_lag: VecDeque::with_capacity(lag as usize),
            history: VecDeque::new(),
            config,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn max_steps(&self) -> u64 {
        self.max_steps
    }

    fn observe(&self) -> Vec<f32> {
        let mut obs = Vec::with_capacity(self.config.env.num_observations as usize);
        obs.extend(self.base_lin_vel.iter().map(|v| *v as f32));
        obs.extend(self.commands.iter().map(|c| *c as f32));
        obs.extend(
            self.dof_pos
                .iter()
                .zip(&self.default_dof_pos)
                .map(|(p, d)| (p - d) as f32),
        );
        obs.extend(self.dof_vel.iter().map(|v| *v as f32));
        let clock = self.gait_phase * std::f64::consts::TAU;
        obs.push(clock.sin() as f32);
        obs.push(clock.cos() as f32);
        obs
    }

    fn push_history(&mut self, obs: &[f32]) {
        let len = self.config.env.obs_history_len as usize;
        if self.history.len() == len {
            self.history.pop_front();
        }
        self.history.push_back(obs.to_vec());
    }

    fn observation(&self) -> Observation {
        let obs = self.observe();
        let len = self.config.env.obs_history_len as usize;
        let width = obs.len();
        let mut obs_history = Vec::with_capacity(len * width);
        // Left-pad with zeros until the ring fills.
        for _ in self.history.len()..len {
            obs_history.extend(std::iter::repeat(0.0).take(width));
        }
        for frame in &self.history {
            obs_history.extend_from_slice(frame);
        }
        Observation { obs, obs_history }
    }

    fn delayed_action(&mut self, actions: &[f32]) -> Vec<f32> {
        let lag = self.config.domain_rand.lag_timesteps.max(1) as usize;
        self.action_lag.push_back(actions.to_vec());
        if self.action_lag.len() > lag {
            self.action_lag.pop_front();
        }
        self.action_lag
            .front()
            .cloned()
            .unwrap_or_else(|| vec![0.0; NUM_DOFS])
    }
}

impl Environment for SimLeggedEnv {
    fn reset(&mut self) -> Observation {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.tick = 0;
        self.commands.iter_mut().for_each(|c| *c = 0.0);
        self.base_lin_vel = [0.0; 3];
        self.gait_phase = 0.0;
        self.dof_pos = self.default_dof_pos.clone();
        self.dof_vel = vec![0.0; NUM_DOFS];
        self.action_lag.clear();
        self.history.clear();

        let obs = self.observe();
        self.push_history(&obs);
        self.observation()
    }

    fn step(&mut self, actions: &[f32]) -> StepResult {
        let delayed = self.delayed_action(actions);

        // Base velocity relaxes toward the commanded velocity with a
        // fixed time constant, plus a small seeded disturbance.
        let alpha = self.dt / (VEL_TRACK_TAU + self.dt);
        for axis in 0..3 {
            let target = self.commands[axis];
            let noise = self.rng.gen_range(-0.02..0.02);
            self.base_lin_vel[axis] += alpha * (target - self.base_lin_vel[axis]) + noise * alpha;
        }

        // Gait clock driven by the commanded step frequency.
        self.gait_phase = (self.gait_phase + self.commands[4] * self.dt).fract();
        let swing = (self.gait_phase * std::f64::consts::TAU).sin().max(0.0);

        let action_scale = self.config.control.action_scale;
        let footswing = self.commands[9];
        for i in 0..NUM_DOFS {
            // Calf joints carry the swing articulation.
            let swing_term = if i % 3 == 2 { swing * footswing } else { 0.0 };
            let target = self.default_dof_pos[i] + action_scale * delayed[i] as f64 + swing_term;
            let prev = self.dof_pos[i];
            self.dof_pos[i] += 0.5 * (target - prev);
            self.dof_vel[i] = (self.dof_pos[i] - prev) / self.dt;
        }

        self.tick += 1;
        let done = self.tick >= self.max_steps;

        let obs = self.observe();
        self.push_history(&obs);

        let vel_err = (self.base_lin_vel[0] - self.commands[0]).abs();
        let reward = (-vel_err).exp();

        StepResult {
            observation: self.observation(),
            reward,
            done,
            info: StepInfo {
                step: self.tick,
                time_s: self.tick as f64 * self.dt,
                command_x_vel: self.commands[0],
                termination_reason: done.then(|| "time_limit".to_string()),
            },
        }
    }

    fn commands_mut(&mut self) -> &mut [f64] {
        &mut self.commands
    }

    fn dof_pos(&self) -> &[f64] {
        &self.dof_pos
    }

    fn base_lin_vel(&self) -> [f64; 3] {
        self.base_lin_vel
    }

    fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::GaitCommand;

    fn eval_env(seed: u64) -> SimLeggedEnv {
        SimLeggedEnv::new(Config::default().with_eval_overrides(), seed)
    }

    #[test]
    fn control_dt_and_horizon_follow_config() {
        let env = eval_env(0);
        assert!((env.dt() - 0.02).abs() < 1e-12);
        assert_eq!(env.max_steps(), 1000);
    }

    #[test]
    fn observation_width_matches_config() {
        let mut env = eval_env(0);
        let obs = env.reset();
        assert_eq!(obs.obs.len(), 42);
        assert_eq!(obs.obs_history.len(), 42 * 30);
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = |seed: u64| -> Vec<f64> {
            let mut env = eval_env(seed);
            env.reset();
            GaitCommand::default().write_to(env.commands_mut());
            (0..50)
                .map(|_| {
                    env.step(&[0.1; NUM_DOFS]);
                    env.base_lin_vel()[0]
                })
                .collect()
        };
        assert_eq!(run(7), run(7));
        assert_ne!(run(7), run(8));
    }

    #[test]
    fn velocity_tracks_command() {
        let mut env = eval_env(3);
        env.reset();
        GaitCommand::default().write_to(env.commands_mut());
        for _ in 0..200 {
            env.step(&[0.0; NUM_DOFS]);
        }
        assert!((env.base_lin_vel()[0] - 1.5).abs() < 0.2);
    }

    #[test]
    fn done_rises_only_at_the_horizon() {
        let mut env = eval_env(0);
        env.reset();
        let horizon = env.max_steps();
        for step in 1..=horizon {
            let result = env.step(&[0.0; NUM_DOFS]);
            assert_eq!(result.done, step == horizon);
        }
    }
}
