// src/module.rs
//
// Serialized inference modules.
//
// A checkpointed policy is stored as two `.jit` files, each holding one
// feed-forward network as versioned JSON: an ordered list of linear
// layers with an activation tag. Shapes are validated once at load; the
// forward pass only checks the input width.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Current module payload version.
/// Increment when changing the layer schema.
pub const MODULE_FORMAT_VERSION: u32 = 1;

/// Errors raised while loading or evaluating a module.
#[derive(Debug, Clone)]
pub enum ModuleError {
    Io { path: String, source: String },
    Parse { path: String, source: String },
    /// Layer shapes are internally inconsistent.
    ShapeMismatch { detail: String },
    /// Input width does not match the first layer.
    DimensionMismatch { expected: usize, got: usize },
    /// Payload written by an incompatible serializer version.
    VersionMismatch { expected: u32, got: u32 },
}

impl std::fmt::Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleError::Io { path, source } => {
                write!(f, "failed to read module '{}': {}", path, source)
            }
            ModuleError::Parse { path, source } => {
                write!(f, "failed to parse module '{}': {}", path, source)
            }
            ModuleError::ShapeMismatch { detail } => {
                write!(f, "module shape mismatch: {}", detail)
            }
            ModuleError::DimensionMismatch { expected, got } => {
                write!(f, "module expects {} inputs, got {}", expected, got)
            }
            ModuleError::VersionMismatch { expected, got } => {
                write!(f, "module format version {} (expected {})", got, expected)
            }
        }
    }
}

impl std::error::Error for ModuleError {}

/// Per-layer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Elu,
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp() - 1.0
                }
            }
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

/// A dense layer: `out[i] = act(sum_j w[i][j] * in[j] + b[i])`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearLayer {
    /// Row-major weights, one row per output.
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl LinearLayer {
    pub fn in_dim(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    pub fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                self.activation.apply(sum + b)
            })
            .collect()
    }
}

/// A serialized feed-forward network restored from a `.jit` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitModule {
    pub format_version: u32,
    pub layers: Vec<LinearLayer>,
}

impl JitModule {
    /// Build a module from layers, validating shapes.
    pub fn new(layers: Vec<LinearLayer>) -> Result<Self, ModuleError> {
        let module = Self {
            format_version: MODULE_FORMAT_VERSION,
            layers,
        };
        module.validate()?;
        Ok(module)
    }

    /// Load a module from disk. A missing file is an `Io` error; this is
    /// where an unchecked checkpoint selection finally fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ModuleError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        let module: JitModule = serde_json::from_str(&text).map_err(|e| ModuleError::Parse {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        if module.format_version != MODULE_FORMAT_VERSION {
            return Err(ModuleError::VersionMismatch {
                expected: MODULE_FORMAT_VERSION,
                got: module.format_version,
            });
        }
        module.validate()?;
        Ok(module)
    }

    /// Serialize the module to disk (fixture generation, training export).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModuleError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ModuleError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })?;
        serde_json::to_writer(BufWriter::new(file), self).map_err(|e| ModuleError::Io {
            path: path.display().to_string(),
            source: e.to_string(),
        })
    }

    /// Input width of the first layer.
    pub fn in_dim(&self) -> usize {
        self.layers.first().map(LinearLayer::in_dim).unwrap_or(0)
    }

    /// Output width of the last layer.
    pub fn out_dim(&self) -> usize {
        self.layers.last().map(LinearLayer::out_dim).unwrap_or(0)
    }

    /// Evaluate the network on one input vector.
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>, ModuleError> {
        if input.len() != self.in_dim() {
            return Err(ModuleError::DimensionMismatch {
                expected: self.in_dim(),
                got: input.len(),
            });
        }
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.forward(&current);
        }
        Ok(current)
    }

    fn validate(&self) -> Result<(), ModuleError> {
        if self.layers.is_empty() {
            return Err(ModuleError::ShapeMismatch {
                detail: "module has no layers".to_string(),
            });
        }
        let mut prev_out: Option<usize> = None;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.weights.is_empty() {
                return Err(ModuleError::ShapeMismatch {
                    detail: format!("layer {} has no rows", i),
                });
            }
            let in_dim = layer.in_dim();
            if layer.weights.iter().any(|row| row.len() != in_dim) {
                return Err(ModuleError::ShapeMismatch {
                    detail: format!("layer {} has ragged weight rows", i),
                });
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(ModuleError::ShapeMismatch {
                    detail: format!(
                        "layer {} bias length {} != {} outputs",
                        i,
                        layer.bias.len(),
                        layer.out_dim()
                    ),
                });
            }
            if let Some(prev) = prev_out {
                if in_dim != prev {
                    return Err(ModuleError::ShapeMismatch {
                        detail: format!(
                            "layer {} expects {} inputs but layer {} produces {}",
                            i,
                            in_dim,
                            i - 1,
                            prev
                        ),
                    });
                }
            }
            prev_out = Some(layer.out_dim());
        }
        Ok(())
    }
}
