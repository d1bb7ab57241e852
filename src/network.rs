//! Dense feed-forward network evaluated in plain Rust.
//!
//! The weights file is the JSON export of a stack of fully-connected layers.
//! Matrices are row-major `[out][in]`, so each row is one output unit.

use serde::Deserialize;
use std::path::Path;

use crate::error::{InferenceError, ModelLoadError};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default = "default_activation")]
    pub activation: Activation,
}

fn default_activation() -> Activation {
    Activation::Linear
}

impl DenseLayer {
    fn input_width(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn output_width(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| {
                let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b;
                self.activation.apply(z)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct WeightsFile {
    layers: Vec<DenseLayer>,
}

#[derive(Clone, Debug)]
pub struct DenseNetwork {
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Validates layer shapes against each other and against `input_dim`.
    /// The last layer must produce exactly one unit: the spam score.
    pub fn new(layers: Vec<DenseLayer>, input_dim: usize) -> Result<Self, ModelLoadError> {
        if layers.is_empty() {
            return Err(ModelLoadError::Incompatible("network has no layers".to_string()));
        }

        let mut expected_in = input_dim;
        for (i, layer) in layers.iter().enumerate() {
            if layer.output_width() == 0 {
                return Err(ModelLoadError::Incompatible(format!("layer {} has no units", i)));
            }
            if layer.input_width() != expected_in {
                return Err(ModelLoadError::Incompatible(format!(
                    "layer {} expects {} inputs but receives {}",
                    i,
                    layer.input_width(),
                    expected_in
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_in) {
                return Err(ModelLoadError::Incompatible(format!("layer {} has ragged rows", i)));
            }
            if layer.bias.len() != layer.output_width() {
                return Err(ModelLoadError::Incompatible(format!(
                    "layer {} has {} units but {} biases",
                    i,
                    layer.output_width(),
                    layer.bias.len()
                )));
            }
            let finite = layer.weights.iter().flatten().chain(&layer.bias).all(|v| v.is_finite());
            if !finite {
                return Err(ModelLoadError::Incompatible(format!(
                    "layer {} contains non-finite parameters",
                    i
                )));
            }
            expected_in = layer.output_width();
        }

        if expected_in != 1 {
            return Err(ModelLoadError::Incompatible(format!(
                "final layer must have 1 unit, found {}",
                expected_in
            )));
        }

        Ok(Self { layers })
    }

    pub fn load(path: &Path, input_dim: usize) -> Result<Self, ModelLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: WeightsFile = serde_json::from_str(&contents).map_err(|e| ModelLoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::new(file.layers, input_dim)
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].input_width()
    }

    pub fn forward(&self, features: &[f64]) -> Result<f64, InferenceError> {
        if features.len() != self.input_dim() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.input_dim(),
                actual: features.len(),
            });
        }

        let mut activations = features.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }

        match activations.as_slice() {
            [score] => Ok(*score),
            other => Err(InferenceError::ShapeMismatch {
                expected: 1,
                actual: other.len(),
            }),
        }
    }
}
