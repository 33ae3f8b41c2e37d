// src/trajectory.rs
//
// Evaluation trace buffers.
//
// The runner records measured base velocity and joint positions for
// every control step. The trace backs the rendered charts, the CSV
// export, and the determinism checksum in the run summary.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::env::NUM_DOFS;

/// Recorded time series for one evaluation episode.
#[derive(Debug, Clone)]
pub struct EvalTrace {
    /// Control step duration in seconds.
    pub dt: f64,
    /// Commanded forward velocity, constant over the episode.
    pub target_x_vel: f64,
    pub measured_x_vels: Vec<f64>,
    /// One vector of `NUM_DOFS` joint positions per step.
    pub joint_positions: Vec<Vec<f64>>,
    /// Count of steps where the environment raised its done flag.
    pub dones: u64,
}

impl EvalTrace {
    pub fn with_capacity(dt: f64, target_x_vel: f64, steps: usize) -> Self {
        Self {
            dt,
            target_x_vel,
            measured_x_vels: Vec::with_capacity(steps),
            joint_positions: Vec::with_capacity(steps),
            dones: 0,
        }
    }

    pub fn push_step(&mut self, measured_x_vel: f64, dof_pos: &[f64], done: bool) {
        self.measured_x_vels.push(measured_x_vel);
        self.joint_positions.push(dof_pos.to_vec());
        if done {
            self.dones += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.measured_x_vels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measured_x_vels.is_empty()
    }

    /// Timestamps for each recorded step, starting at zero.
    pub fn times(&self) -> Vec<f64> {
        (0..self.len()).map(|i| i as f64 * self.dt).collect()
    }

    /// Write the trace as CSV with one row per step.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        write!(w, "time_s,measured_x_vel,target_x_vel")?;
        for j in 0..NUM_DOFS {
            write!(w, ",joint_{:02}", j)?;
        }
        writeln!(w)?;
        for (i, (vel, joints)) in self
            .measured_x_vels
            .iter()
            .zip(&self.joint_positions)
            .enumerate()
        {
            write!(
                w,
                "{:.6},{:.6},{:.6}",
                i as f64 * self.dt,
                vel,
                self.target_x_vel
            )?;
            for pos in joints {
                write!(w, ",{:.6}", pos)?;
            }
            writeln!(w)?;
        }
        w.flush()
    }

    /// Checksum over the recorded series, rounded to micro units so the
    /// value is stable across serialization round trips.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        let round = |v: f64| (v * 1e6).round() as i64;
        hasher.update(round(self.dt).to_le_bytes());
        hasher.update(round(self.target_x_vel).to_le_bytes());
        for vel in &self.measured_x_vels {
            hasher.update(round(*vel).to_le_bytes());
        }
        for joints in &self.joint_positions {
            for pos in joints {
                hasher.update(round(*pos).to_le_bytes());
            }
        }
        hasher.update(self.dones.to_le_bytes());
        format!("{:x}", hasher.finalize())
    }
}
