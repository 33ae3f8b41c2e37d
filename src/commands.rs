// src/commands.rs
//
// Gait command vector.
//
// The environment is steered through a 13-entry command buffer written
// before every step. Entry layout is fixed by the observation encoding
// the policies were trained against, so the indices here are load
// bearing.

use serde::{Deserialize, Serialize};

/// Width of the command vector consumed by the environment.
pub const COMMAND_DIM: usize = 13;

/// Stance fraction of the gait cycle. Held constant during playback.
pub const GAIT_DURATION: f64 = 0.5;

/// Named gait, encoded as a phase-offset triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gait {
    Pronking,
    Trotting,
    Bounding,
    Pacing,
}

impl Gait {
    /// Phase offsets (phase, offset, bound) selecting the footfall
    /// pattern.
    pub fn phases(&self) -> [f64; 3] {
        match self {
            Gait::Pronking => [0.0, 0.0, 0.0],
            Gait::Trotting => [0.5, 0.0, 0.0],
            Gait::Bounding => [0.0, 0.5, 0.0],
            Gait::Pacing => [0.0, 0.0, 0.5],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gait::Pronking => "pronking",
            Gait::Trotting => "trotting",
            Gait::Bounding => "bounding",
            Gait::Pacing => "pacing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pronking" => Some(Gait::Pronking),
            "trotting" => Some(Gait::Trotting),
            "bounding" => Some(Gait::Bounding),
            "pacing" => Some(Gait::Pacing),
            _ => None,
        }
    }
}

/// Full command state written into the environment each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitCommand {
    /// Desired forward velocity in m/s.
    pub x_vel: f64,
    pub y_vel: f64,
    pub yaw_vel: f64,
    /// Body height offset from nominal, in m.
    pub body_height: f64,
    /// Stepping frequency in Hz.
    pub step_frequency: f64,
    pub gait: Gait,
    /// Peak swing foot height in m.
    pub footswing_height: f64,
    pub pitch: f64,
    pub roll: f64,
    /// Lateral distance between foot pairs in m.
    pub stance_width: f64,
}

impl Default for GaitCommand {
    fn default() -> Self {
        Self {
            x_vel: 1.5,
            y_vel: 0.0,
            yaw_vel: 0.0,
            body_height: 0.0,
            step_frequency: 3.0,
            gait: Gait::Trotting,
            footswing_height: 0.08,
            pitch: 0.0,
            roll: 0.0,
            stance_width: 0.25,
        }
    }
}

impl GaitCommand {
    /// Write the command into the environment's buffer. The buffer must
    /// be at least `COMMAND_DIM` wide; extra entries are left alone.
    pub fn write_to(&self, buf: &mut [f64]) {
        assert!(
            buf.len() >= COMMAND_DIM,
            "command buffer width {} < {}",
            buf.len(),
            COMMAND_DIM
        );
        let phases = self.gait.phases();
        buf[0] = self.x_vel;
        buf[1] = self.y_vel;
        buf[2] = self.yaw_vel;
        buf[3] = self.body_height;
        buf[4] = self.step_frequency;
        buf[5] = phases[0];
        buf[6] = phases[1];
        buf[7] = phases[2];
        buf[8] = GAIT_DURATION;
        buf[9] = self.footswing_height;
        buf[10] = self.pitch;
        buf[11] = self.roll;
        buf[12] = self.stance_width;
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut buf = vec![0.0; COMMAND_DIM];
        self.write_to(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_command_matches_playback_settings() {
        let cmd = GaitCommand::default();
        assert!((cmd.x_vel - 1.5).abs() < 1e-12);
        assert_eq!(cmd.gait, Gait::Trotting);
        assert!((cmd.step_frequency - 3.0).abs() < 1e-12);
        assert!((cmd.footswing_height - 0.08).abs() < 1e-12);
        assert!((cmd.stance_width - 0.25).abs() < 1e-12);
    }

    #[test]
    fn vector_layout_is_stable() {
        let cmd = GaitCommand {
            x_vel: 1.0,
            y_vel: 0.2,
            yaw_vel: -0.1,
            body_height: 0.05,
            gait: Gait::Bounding,
            ..GaitCommand::default()
        };
        let v = cmd.to_vec();
        assert_eq!(v.len(), COMMAND_DIM);
        assert_eq!(&v[0..4], &[1.0, 0.2, -0.1, 0.05]);
        assert_eq!(v[4], 3.0);
        assert_eq!(&v[5..8], &[0.0, 0.5, 0.0]);
        assert_eq!(v[8], GAIT_DURATION);
        assert_eq!(v[9], 0.08);
        assert_eq!(v[12], 0.25);
    }

    #[test]
    fn write_to_leaves_trailing_entries_alone() {
        let mut buf = vec![9.0; 15];
        GaitCommand::default().write_to(&mut buf);
        assert_eq!(buf[13], 9.0);
        assert_eq!(buf[14], 9.0);
    }

    #[test]
    fn gait_names_round_trip() {
        for gait in [Gait::Pronking, Gait::Trotting, Gait::Bounding, Gait::Pacing] {
            assert_eq!(Gait::parse(gait.as_str()), Some(gait));
        }
        assert_eq!(Gait::parse("galloping"), None);
    }
}
