// src/config.rs
//
// Typed evaluation configuration for the gaitplay harness.
// This is the single source of truth for the parameters a training run
// snapshots alongside its checkpoints (environment sizing, terrain grid,
// control mode, domain randomisation toggles, command layout).
//
// The config is a plain value: it is produced by merging a run snapshot
// into the defaults (`merged_with`) and then pinning the evaluation
// overrides (`with_eval_overrides`), and is passed into the environment
// constructor explicitly. Nothing here is global or mutated in place
// after construction.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Environment sizing and observation layout.
    pub env: EnvConfig,
    /// Terrain grid used by the simulation.
    pub terrain: TerrainConfig,
    /// Low-level joint control parameters.
    pub control: ControlConfig,
    /// Physics stepping parameters.
    pub sim: SimConfig,
    /// Domain randomisation toggles (training-time; forced off for eval).
    pub domain_rand: DomainRandConfig,
    /// Command buffer layout.
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Number of parallel environments.
    pub num_envs: u32,
    /// Number of environments recorded for video/telemetry.
    pub num_recording_envs: u32,
    /// Width of a single observation vector.
    pub num_observations: usize,
    /// Number of actuated joints / policy outputs.
    pub num_actions: usize,
    /// Number of past observations stacked into `obs_history`.
    pub obs_history_len: usize,
    /// Episode length in seconds.
    pub episode_length_s: f64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            num_envs: 1,
            num_recording_envs: 1,
            num_observations: 42,
            num_actions: 12,
            obs_history_len: 30,
            episode_length_s: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Terrain grid rows.
    pub num_rows: u32,
    /// Terrain grid columns.
    pub num_cols: u32,
    /// Flat border around the grid in meters.
    pub border_size: f64,
    /// Spawn robots at the grid centre.
    pub center_robots: bool,
    /// Half-width (in cells) of the centre spawn region.
    pub center_span: u32,
    /// Teleport robots back instead of walking off the grid edge.
    pub teleport_robots: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            num_rows: 10,
            num_cols: 10,
            border_size: 25.0,
            center_robots: false,
            center_span: 4,
            teleport_robots: false,
        }
    }
}

/// Joint control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    /// Learned actuator network (the evaluation default).
    ActuatorNet,
    /// Plain proportional gains.
    PdGains,
}

impl ControlType {
    /// Stable name used in snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlType::ActuatorNet => "actuator_net",
            ControlType::PdGains => "P",
        }
    }

    /// Parse a snapshot value. Returns None if unrecognized.
    pub fn parse(s: &str) -> Option<ControlType> {
        match s {
            "actuator_net" => Some(ControlType::ActuatorNet),
            "P" => Some(ControlType::PdGains),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Joint control mode.
    pub control_type: ControlType,
    /// Proportional gain (N*m/rad).
    pub stiffness: f64,
    /// Derivative gain (N*m*s/rad).
    pub damping: f64,
    /// Scale applied to raw policy actions before they become joint targets.
    pub action_scale: f64,
    /// Physics substeps per control step.
    pub decimation: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            control_type: ControlType::ActuatorNet,
            stiffness: 20.0,
            damping: 0.5,
            action_scale: 0.25,
            decimation: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Physics step in seconds. The control step is `dt * decimation`.
    pub dt: f64,
    /// Gravity vector (m/s^2).
    pub gravity: [f64; 3],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.005,
            gravity: [0.0, 0.0, -9.81],
        }
    }
}

/// Domain randomisation toggles snapshotted from training.
///
/// Evaluation forces every toggle off so measured trajectories are
/// reproducible; the fields exist so snapshots restore faithfully and
/// the override list has something explicit to pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRandConfig {
    pub push_robots: bool,
    pub randomize_friction: bool,
    pub randomize_gravity: bool,
    pub randomize_restitution: bool,
    pub randomize_motor_offset: bool,
    pub randomize_motor_strength: bool,
    pub randomize_friction_indep: bool,
    pub randomize_ground_friction: bool,
    pub randomize_base_mass: bool,
    pub randomize_kd_factor: bool,
    pub randomize_kp_factor: bool,
    pub randomize_joint_friction: bool,
    pub randomize_com_displacement: bool,
    /// Actuator lag in control steps.
    pub lag_timesteps: u32,
    /// Whether lag was sampled per episode during training.
    pub randomize_lag_timesteps: bool,
}

impl Default for DomainRandConfig {
    fn default() -> Self {
        Self {
            push_robots: false,
            randomize_friction: false,
            randomize_gravity: false,
            randomize_restitution: false,
            randomize_motor_offset: false,
            randomize_motor_strength: false,
            randomize_friction_indep: false,
            randomize_ground_friction: false,
            randomize_base_mass: false,
            randomize_kd_factor: false,
            randomize_kp_factor: false,
            randomize_joint_friction: false,
            randomize_com_displacement: false,
            lag_timesteps: 6,
            randomize_lag_timesteps: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Width of the environment command buffer (>= 13).
    pub num_commands: usize,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { num_commands: 15 }
    }
}

impl Config {
    /// Return a copy with the fixed evaluation overrides applied.
    ///
    /// These always win over whatever the training snapshot specified:
    /// evaluation must be deterministic and reproducible even if the run
    /// was trained with randomisation enabled.
    pub fn with_eval_overrides(mut self) -> Config {
        self.domain_rand.push_robots = false;
        self.domain_rand.randomize_friction = false;
        self.domain_rand.randomize_gravity = false;
        self.domain_rand.randomize_restitution = false;
        self.domain_rand.randomize_motor_offset = false;
        self.domain_rand.randomize_motor_strength = false;
        self.domain_rand.randomize_friction_indep = false;
        self.domain_rand.randomize_ground_friction = false;
        self.domain_rand.randomize_base_mass = false;
        self.domain_rand.randomize_kd_factor = false;
        self.domain_rand.randomize_kp_factor = false;
        self.domain_rand.randomize_joint_friction = false;
        self.domain_rand.randomize_com_displacement = false;

        self.env.num_recording_envs = 1;
        self.env.num_envs = 1;
        self.terrain.num_rows = 5;
        self.terrain.num_cols = 5;
        self.terrain.border_size = 0.0;
        self.terrain.center_robots = true;
        self.terrain.center_span = 1;
        self.terrain.teleport_robots = true;

        self.domain_rand.lag_timesteps = 6;
        self.domain_rand.randomize_lag_timesteps = true;
        self.control.control_type = ControlType::ActuatorNet;

        self
    }

    /// Control step in seconds as seen by the policy and the eval loop.
    pub fn control_dt(&self) -> f64 {
        self.sim.dt * self.control.decimation as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_overrides_disable_all_randomisation() {
        let mut cfg = Config::default();
        cfg.domain_rand.push_robots = true;
        cfg.domain_rand.randomize_friction = true;
        cfg.domain_rand.randomize_base_mass = true;

        let cfg = cfg.with_eval_overrides();

        assert!(!cfg.domain_rand.push_robots);
        assert!(!cfg.domain_rand.randomize_friction);
        assert!(!cfg.domain_rand.randomize_base_mass);
        assert!(!cfg.domain_rand.randomize_com_displacement);
    }

    #[test]
    fn eval_overrides_pin_single_env_and_terrain() {
        let mut cfg = Config::default();
        cfg.env.num_envs = 4096;
        cfg.terrain.num_rows = 20;
        cfg.terrain.border_size = 25.0;
        cfg.control.control_type = ControlType::PdGains;

        let cfg = cfg.with_eval_overrides();

        assert_eq!(cfg.env.num_envs, 1);
        assert_eq!(cfg.env.num_recording_envs, 1);
        assert_eq!(cfg.terrain.num_rows, 5);
        assert_eq!(cfg.terrain.num_cols, 5);
        assert_eq!(cfg.terrain.border_size, 0.0);
        assert!(cfg.terrain.center_robots);
        assert_eq!(cfg.terrain.center_span, 1);
        assert!(cfg.terrain.teleport_robots);
        assert_eq!(cfg.domain_rand.lag_timesteps, 6);
        assert!(cfg.domain_rand.randomize_lag_timesteps);
        assert_eq!(cfg.control.control_type, ControlType::ActuatorNet);
    }

    #[test]
    fn control_dt_is_sim_dt_times_decimation() {
        let cfg = Config::default();
        assert!((cfg.control_dt() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn control_type_parse_round_trips() {
        assert_eq!(
            ControlType::parse("actuator_net"),
            Some(ControlType::ActuatorNet)
        );
        assert_eq!(ControlType::parse("P"), Some(ControlType::PdGains));
        assert_eq!(ControlType::parse("torque"), None);
    }
}
