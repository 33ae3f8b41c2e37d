//! gaitplay: playback and evaluation harness for RL-trained quadruped
//! gait policies.
//!
//! The crate restores a trained checkpoint from a run directory tree,
//! replays it in a seeded simulated environment under a fixed gait
//! command, and writes charts plus a machine-readable summary of the
//! episode.
//!
//! The pipeline has three stages:
//!
//! 1. [`checkpoint`] resolves a run directory from a wildcard pattern
//!    and maps a checkpoint selector to module paths.
//! 2. [`snapshot`] merges the run's recorded configuration into the
//!    typed [`config::Config`], after which evaluation overrides are
//!    pinned.
//! 3. [`runner`] drives the restored [`policy`] against the simulated
//!    [`env`] for a fixed horizon and [`report`] persists the
//!    artifacts.

pub mod checkpoint;
pub mod commands;
pub mod config;
pub mod env;
pub mod logging;
pub mod module;
pub mod policy;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod trajectory;

pub use checkpoint::{CheckpointId, ModuleKind, ResolvedRun};
pub use commands::{Gait, GaitCommand, COMMAND_DIM};
pub use config::Config;
pub use env::{Environment, Observation, SimLeggedEnv, StepResult, NUM_DOFS};
pub use logging::{EventSink, FileSink, NoopSink};
pub use module::{JitModule, ModuleError};
pub use policy::{Policy, PolicyOutput, TrainedPolicy, ZeroPolicy};
pub use report::{RunReport, RunSummary};
pub use runner::{EvalConfig, EvalRunner, EvalSummary};
pub use snapshot::ConfigSnapshot;
pub use trajectory::EvalTrace;
