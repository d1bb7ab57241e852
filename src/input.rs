use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ModelLoadError;

static TOKENIZER: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\w+|[^\w\s]").expect("tokenizer pattern is valid"));

/// TF-IDF vocab: token -> (index, idf)
pub type TfIdfVocab = HashMap<String, (usize, f64)>;

pub fn load_tfidf_vocab(path: &Path) -> Result<TfIdfVocab, ModelLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let json: Value = serde_json::from_str(&contents).map_err(|e| ModelLoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let Value::Object(map) = json else {
        return Err(ModelLoadError::Parse {
            path: path.to_path_buf(),
            message: "vocabulary must be a JSON object".to_string(),
        });
    };

    let mut vocab = HashMap::with_capacity(map.len());
    for (token, data) in map {
        match (
            data.get("index").and_then(|v| v.as_u64()),
            data.get("idf").and_then(|v| v.as_f64()),
        ) {
            (Some(index), Some(idf)) if idf.is_finite() => {
                vocab.insert(token, (index as usize, idf));
            }
            _ => {
                return Err(ModelLoadError::Parse {
                    path: path.to_path_buf(),
                    message: format!("entry {:?} needs an integer index and a finite idf", token),
                });
            }
        }
    }

    Ok(vocab)
}

/// Every vocabulary slot must land inside the network's input layer.
pub fn check_vocab_fits(vocab: &TfIdfVocab, dim: usize) -> Result<(), ModelLoadError> {
    if let Some((token, (index, _))) = vocab.iter().find(|(_, (index, _))| *index >= dim) {
        return Err(ModelLoadError::Incompatible(format!(
            "vocabulary token {:?} maps to index {} but input_dim is {}",
            token, index, dim
        )));
    }
    Ok(())
}

pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKENIZER
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
}

pub fn build_tfidf_vector(text: &str, vocab: &TfIdfVocab, dim: usize) -> Vec<f64> {
    let mut vec = vec![0.0; dim];

    for token in tokenize(text) {
        if let Some(&(index, idf)) = vocab.get(&token) {
            if index < dim {
                vec[index] += idf;
            }
        }
    }

    vec
}
