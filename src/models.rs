use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classifier::TextClassifier;
use crate::crypto;
use crate::error::ModelLoadError;
use crate::input::{check_vocab_fits, load_tfidf_vocab};
use crate::network::DenseNetwork;

pub const MANIFEST_FILE: &str = "model.toml";

#[derive(Clone, Debug, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub input_dim: usize,
    pub vocab_size: usize,
    /// Keccak256 over manifest, vocabulary and weights.
    pub model_hash: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ModelToml {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_dim: usize,
    #[serde(default = "default_vocab_file")]
    pub vocab: String,
    #[serde(default = "default_weights_file")]
    pub weights: String,
}

fn default_vocab_file() -> String {
    "vocab.json".to_string()
}

fn default_weights_file() -> String {
    "weights.json".to_string()
}

impl ModelToml {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: ModelToml = toml::from_str(&contents).map_err(|e| ModelLoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if manifest.input_dim == 0 {
            return Err(ModelLoadError::Incompatible("input_dim must be positive".to_string()));
        }
        Ok(manifest)
    }
}

/// Reads the artifact directory into a ready-to-run classifier.
pub fn load_text_model(dir: &Path) -> Result<(TextClassifier, ModelDescriptor), ModelLoadError> {
    if !dir.is_dir() {
        return Err(ModelLoadError::Missing(dir.to_path_buf()));
    }

    let manifest_path = require(dir.join(MANIFEST_FILE))?;
    let manifest = ModelToml::load(&manifest_path)?;
    let vocab_path = require(dir.join(&manifest.vocab))?;
    let weights_path = require(dir.join(&manifest.weights))?;

    info!("[spamcheck] Loading vocabulary for {}", manifest.id);
    let vocab = load_tfidf_vocab(&vocab_path)?;
    check_vocab_fits(&vocab, manifest.input_dim)?;
    info!("[spamcheck]   {} entries loaded", vocab.len());

    let network = DenseNetwork::load(&weights_path, manifest.input_dim)?;

    let model_hash = crypto::compute_model_commitment(&[
        manifest_path.as_path(),
        vocab_path.as_path(),
        weights_path.as_path(),
    ])
    .map_err(|source| ModelLoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let descriptor = ModelDescriptor {
        id: manifest.id,
        name: manifest.name,
        description: manifest.description,
        input_dim: manifest.input_dim,
        vocab_size: vocab.len(),
        model_hash,
        loaded_at: Utc::now(),
    };

    Ok((TextClassifier::new(vocab, network), descriptor))
}

fn require(path: PathBuf) -> Result<PathBuf, ModelLoadError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ModelLoadError::Missing(path))
    }
}
