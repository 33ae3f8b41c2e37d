// src/snapshot.rs
//
// Configuration snapshot restore.
//
// A training run writes `parameters.json` next to its checkpoints: a
// nested mapping of section name -> parameter name -> value. The merge
// copies every known field onto the typed Config; sections and keys the
// current schema does not know are skipped silently. That skip is the one
// deliberate piece of resilience in this crate: it lets an evaluation
// build restore snapshots written by older or newer training code.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::config::{
    CommandsConfig, Config, ControlConfig, ControlType, DomainRandConfig, EnvConfig, SimConfig,
    TerrainConfig,
};

/// Deserialized run snapshot: section name -> key -> value.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    sections: BTreeMap<String, Map<String, Value>>,
}

/// Errors raised while loading a snapshot. Malformed files are fatal;
/// only unknown content inside a well-formed file is tolerated.
#[derive(Debug, Clone)]
pub enum SnapshotError {
    Io { path: String, source: String },
    Parse { path: String, source: String },
    NotAnObject { path: String },
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io { path, source } => {
                write!(f, "failed to read snapshot '{}': {}", path, source)
            }
            SnapshotError::Parse { path, source } => {
                write!(f, "failed to parse snapshot '{}': {}", path, source)
            }
            SnapshotError::NotAnObject { path } => {
                write!(f, "snapshot '{}' is not a JSON object of sections", path)
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

impl ConfigSnapshot {
    /// Load a snapshot from a `parameters.json` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SnapshotError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| SnapshotError::Parse {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        Self::from_value(value).ok_or_else(|| SnapshotError::NotAnObject {
            path: path.display().to_string(),
        })
    }

    /// Build a snapshot from an in-memory JSON value.
    ///
    /// Accepts either the bare section mapping or the training harness's
    /// `{"Cfg": {...}}` wrapper. Returns None if the value is not an
    /// object of objects.
    pub fn from_value(value: Value) -> Option<Self> {
        let mut root = match value {
            Value::Object(map) => map,
            _ => return None,
        };
        if let Some(Value::Object(inner)) = root.remove("Cfg") {
            root = inner;
        }

        let mut sections = BTreeMap::new();
        for (name, section) in root {
            if let Value::Object(map) = section {
                sections.insert(name, map);
            }
            // Non-object sections are skipped, same as unknown keys.
        }
        Some(Self { sections })
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.sections.get(name)
    }

    /// Names of all sections present in the snapshot.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

impl Config {
    /// Return a copy of this config with the snapshot merged in.
    ///
    /// For each section the schema knows about, every recognised key
    /// present in the snapshot overwrites the corresponding field.
    /// Unknown sections, unknown keys, and values of the wrong type are
    /// ignored without error.
    pub fn merged_with(&self, snapshot: &ConfigSnapshot) -> Config {
        let mut cfg = self.clone();
        if let Some(map) = snapshot.section("env") {
            apply_env(&mut cfg.env, map);
        }
        if let Some(map) = snapshot.section("terrain") {
            apply_terrain(&mut cfg.terrain, map);
        }
        if let Some(map) = snapshot.section("control") {
            apply_control(&mut cfg.control, map);
        }
        if let Some(map) = snapshot.section("sim") {
            apply_sim(&mut cfg.sim, map);
        }
        if let Some(map) = snapshot.section("domain_rand") {
            apply_domain_rand(&mut cfg.domain_rand, map);
        }
        if let Some(map) = snapshot.section("commands") {
            apply_commands(&mut cfg.commands, map);
        }
        cfg
    }
}

fn set_f64(map: &Map<String, Value>, key: &str, field: &mut f64) {
    if let Some(v) = map.get(key).and_then(Value::as_f64) {
        *field = v;
    }
}

fn set_u32(map: &Map<String, Value>, key: &str, field: &mut u32) {
    if let Some(v) = map.get(key).and_then(Value::as_u64) {
        *field = v as u32;
    }
}

fn set_usize(map: &Map<String, Value>, key: &str, field: &mut usize) {
    if let Some(v) = map.get(key).and_then(Value::as_u64) {
        *field = v as usize;
    }
}

fn set_bool(map: &Map<String, Value>, key: &str, field: &mut bool) {
    if let Some(v) = map.get(key).and_then(Value::as_bool) {
        *field = v;
    }
}

fn apply_env(cfg: &mut EnvConfig, map: &Map<String, Value>) {
    set_u32(map, "num_envs", &mut cfg.num_envs);
    set_u32(map, "num_recording_envs", &mut cfg.num_recording_envs);
    set_usize(map, "num_observations", &mut cfg.num_observations);
    set_usize(map, "num_actions", &mut cfg.num_actions);
    set_usize(map, "obs_history_len", &mut cfg.obs_history_len);
    set_f64(map, "episode_length_s", &mut cfg.episode_length_s);
}

fn apply_terrain(cfg: &mut TerrainConfig, map: &Map<String, Value>) {
    set_u32(map, "num_rows", &mut cfg.num_rows);
    set_u32(map, "num_cols", &mut cfg.num_cols);
    set_f64(map, "border_size", &mut cfg.border_size);
    set_bool(map, "center_robots", &mut cfg.center_robots);
    set_u32(map, "center_span", &mut cfg.center_span);
    set_bool(map, "teleport_robots", &mut cfg.teleport_robots);
}

fn apply_control(cfg: &mut ControlConfig, map: &Map<String, Value>) {
    if let Some(s) = map.get("control_type").and_then(Value::as_str) {
        if let Some(ct) = ControlType::parse(s) {
            cfg.control_type = ct;
        }
    }
    set_f64(map, "stiffness", &mut cfg.stiffness);
    set_f64(map, "damping", &mut cfg.damping);
    set_f64(map, "action_scale", &mut cfg.action_scale);
    set_u32(map, "decimation", &mut cfg.decimation);
}

fn apply_sim(cfg: &mut SimConfig, map: &Map<String, Value>) {
    set_f64(map, "dt", &mut cfg.dt);
    if let Some(arr) = map.get("gravity").and_then(Value::as_array) {
        if arr.len() == 3 {
            let parsed: Vec<f64> = arr.iter().filter_map(Value::as_f64).collect();
            if parsed.len() == 3 {
                cfg.gravity = [parsed[0], parsed[1], parsed[2]];
            }
        }
    }
}

fn apply_domain_rand(cfg: &mut DomainRandConfig, map: &Map<String, Value>) {
    set_bool(map, "push_robots", &mut cfg.push_robots);
    set_bool(map, "randomize_friction", &mut cfg.randomize_friction);
    set_bool(map, "randomize_gravity", &mut cfg.randomize_gravity);
    set_bool(map, "randomize_restitution", &mut cfg.randomize_restitution);
    set_bool(map, "randomize_motor_offset", &mut cfg.randomize_motor_offset);
    set_bool(map, "randomize_motor_strength", &mut cfg.randomize_motor_strength);
    set_bool(map, "randomize_friction_indep", &mut cfg.randomize_friction_indep);
    set_bool(map, "randomize_ground_friction", &mut cfg.randomize_ground_friction);
    set_bool(map, "randomize_base_mass", &mut cfg.randomize_base_mass);
    set_bool(map, "randomize_kd_factor", &mut cfg.randomize_kd_factor);
    set_bool(map, "randomize_kp_factor", &mut cfg.randomize_kp_factor);
    set_bool(map, "randomize_joint_friction", &mut cfg.randomize_joint_friction);
    set_bool(map, "randomize_com_displacement", &mut cfg.randomize_com_displacement);
    set_u32(map, "lag_timesteps", &mut cfg.lag_timesteps);
    set_bool(map, "randomize_lag_timesteps", &mut cfg.randomize_lag_timesteps);
}

fn apply_commands(cfg: &mut CommandsConfig, map: &Map<String, Value>) {
    set_usize(map, "num_commands", &mut cfg.num_commands);
}
