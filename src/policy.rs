// src/policy.rs
//
// Policy abstraction and the two-stage trained policy.
//
// A trained checkpoint splits into an adaptation module, which maps the
// observation history to a latent vector, and a body module, which maps
// history plus latent to joint actions. `ZeroPolicy` is the do-nothing
// baseline used by environment tests.

use std::path::Path;

use crate::checkpoint::{self, CheckpointId, ModuleKind};
use crate::env::Observation;
use crate::module::{JitModule, ModuleError};

/// Output of one policy evaluation.
#[derive(Debug, Clone)]
pub struct PolicyOutput {
    /// Joint action targets, one per actuated degree of freedom.
    pub actions: Vec<f32>,
    /// Adaptation latent, when the policy produces one.
    pub latent: Option<Vec<f32>>,
}

/// An action source driven by environment observations.
pub trait Policy {
    fn name(&self) -> &str;
    fn act(&mut self, obs: &Observation) -> Result<PolicyOutput, ModuleError>;
}

/// Baseline policy that always outputs zero actions.
pub struct ZeroPolicy {
    num_actions: usize,
}

impl ZeroPolicy {
    pub fn new(num_actions: usize) -> Self {
        Self { num_actions }
    }
}

impl Policy for ZeroPolicy {
    fn name(&self) -> &str {
        "zero"
    }

    fn act(&mut self, _obs: &Observation) -> Result<PolicyOutput, ModuleError> {
        Ok(PolicyOutput {
            actions: vec![0.0; self.num_actions],
            latent: None,
        })
    }
}

/// Checkpointed policy restored from a run directory.
#[derive(Debug)]
pub struct TrainedPolicy {
    adaptation: JitModule,
    body: JitModule,
}

impl TrainedPolicy {
    /// Load both modules for the selected checkpoint. Training exports
    /// the pair under the same token, so both files must carry it.
    pub fn load(run_dir: &Path, id: CheckpointId) -> Result<Self, ModuleError> {
        let body = JitModule::load(checkpoint::module_path(run_dir, ModuleKind::Body, id))?;
        let adaptation =
            JitModule::load(checkpoint::module_path(run_dir, ModuleKind::Adaptation, id))?;
        Ok(Self { adaptation, body })
    }

    pub fn from_modules(adaptation: JitModule, body: JitModule) -> Self {
        Self { adaptation, body }
    }

    pub fn latent_dim(&self) -> usize {
        self.adaptation.out_dim()
    }

    pub fn num_actions(&self) -> usize {
        self.body.out_dim()
    }
}

impl Policy for TrainedPolicy {
    fn name(&self) -> &str {
        "trained"
    }

    fn act(&mut self, obs: &Observation) -> Result<PolicyOutput, ModuleError> {
        let latent = self.adaptation.forward(&obs.obs_history)?;
        let mut body_input = Vec::with_capacity(obs.obs_history.len() + latent.len());
        body_input.extend_from_slice(&obs.obs_history);
        body_input.extend_from_slice(&latent);
        let actions = self.body.forward(&body_input)?;
        Ok(PolicyOutput {
            actions,
            latent: Some(latent),
        })
    }
}
