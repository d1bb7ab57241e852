use crate::error::InferenceError;
use crate::input::{build_tfidf_vector, TfIdfVocab};
use crate::network::DenseNetwork;

/// A loaded binary classifier: one spam score in `[0, 1]` per message.
///
/// Implementations are shared read-only across request threads.
pub trait Classifier: Send + Sync {
    fn infer(&self, batch: &[&str]) -> Result<Vec<f64>, InferenceError>;
}

/// TF-IDF vectorizer feeding a dense network.
pub struct TextClassifier {
    vocab: TfIdfVocab,
    network: DenseNetwork,
}

impl TextClassifier {
    pub fn new(vocab: TfIdfVocab, network: DenseNetwork) -> Self {
        Self { vocab, network }
    }
}

impl Classifier for TextClassifier {
    fn infer(&self, batch: &[&str]) -> Result<Vec<f64>, InferenceError> {
        batch
            .iter()
            .map(|text| {
                let features = build_tfidf_vector(text, &self.vocab, self.network.input_dim());
                self.network.forward(&features)
            })
            .collect()
    }
}
