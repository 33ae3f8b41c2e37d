// src/logging.rs
//
// Step event sinks.
//
// The runner emits one event per control step. `NoopSink` discards
// them; `FileSink` appends newline-delimited JSON records suitable for
// offline analysis.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::env::StepResult;

/// Receiver for per-step evaluation events.
pub trait EventSink {
    fn log_step(&mut self, step: u64, result: &StepResult, actions: &[f32]);
}

/// Sink that drops every event.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_step(&mut self, _step: u64, _result: &StepResult, _actions: &[f32]) {}
}

#[derive(Serialize)]
struct StepRecord<'a> {
    step: u64,
    time_s: f64,
    command_x_vel: f64,
    reward: f64,
    done: bool,
    actions: &'a [f32],
}

/// Sink that writes one JSON record per line.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl EventSink for FileSink {
    fn log_step(&mut self, step: u64, result: &StepResult, actions: &[f32]) {
        let record = StepRecord {
            step,
            time_s: result.info.time_s,
            command_x_vel: result.info.command_x_vel,
            reward: result.reward,
            done: result.done,
            actions,
        };
        // A failed diagnostic write must not abort the evaluation.
        if serde_json::to_writer(&mut self.writer, &record).is_ok() {
            let _ = self.writer.write_all(b"\n");
        }
    }
}
