// Local ONNX toxicity classifier using Detoxify's unbiased-toxic-roberta.
//
// Runs entirely on the local CPU — no API calls, no rate limits. The model
// emits 7 toxicity category logits; only the overall `toxicity` head drives
// the binary verdict here. Sigmoid maps the logit to a probability, and the
// verdict label is `toxic` at p >= 0.5 with the probability as confidence,
// `benign` otherwise with the complement.
//
// Model: protectai/unbiased-toxic-roberta-onnx (quantized, ~126MB)

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::clip_for_model;
use super::download::{MODEL_FILE, TOKENIZER_FILE};
use super::traits::{ClassificationResult, ToxicityScorer, BENIGN_LABEL, TOXIC_LABEL};

/// Number of category logits the model emits. Index 0 is overall toxicity.
const MODEL_OUTPUTS: usize = 7;

/// RoBERTa pad token id.
const PAD_TOKEN_ID: i64 = 1;

/// Local ONNX toxicity classifier. Session and tokenizer live behind
/// Arc so inference can move to spawn_blocking; the Mutex exists because
/// ort::Session::run takes &mut self.
pub struct OnnxToxicityScorer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxToxicityScorer {
    /// Load the model and tokenizer from the given directory.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` in `model_dir`.
    /// Run `ember download-models` first if they aren't there.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() || !tokenizer_path.exists() {
            anyhow::bail!(
                "Toxicity model files not found in {}\nRun `ember download-models` to fetch them.",
                model_dir.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded ONNX toxicity model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl ToxicityScorer for OnnxToxicityScorer {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = clip_for_model(text);

        // Tokenization and inference are CPU-bound; keep them off the
        // async runtime.
        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let mut input_ids: Vec<i64> =
                encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mut attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            // Degenerate encodings still need a one-token input.
            if input_ids.is_empty() {
                input_ids.push(PAD_TOKEN_ID);
                attention_mask.push(0);
            }

            let shape = [1i64, input_ids.len() as i64];
            let input_ids_tensor = Tensor::from_array((shape, input_ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
                .context("Failed to create attention_mask tensor")?;

            let toxicity_logit = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [1, MODEL_OUTPUTS] — raw logits (pre-sigmoid)
                let (_shape, logits) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                if logits.len() < MODEL_OUTPUTS {
                    anyhow::bail!(
                        "Unexpected toxicity output width: {} (expected {MODEL_OUTPUTS})",
                        logits.len()
                    );
                }
                logits[0] as f64
            };

            let probability = sigmoid(toxicity_logit);
            let result = verdict(probability);

            debug!(
                toxicity = probability,
                label = %result.label,
                "Scored comment toxicity"
            );

            Ok(result)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Sigmoid activation: maps any real number to (0, 1).
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Turn the toxicity probability into the binary verdict.
fn verdict(probability: f64) -> ClassificationResult {
    if probability >= 0.5 {
        ClassificationResult {
            label: TOXIC_LABEL.to_string(),
            confidence: probability,
        }
    } else {
        ClassificationResult {
            label: BENIGN_LABEL.to_string(),
            confidence: 1.0 - probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_midpoint_is_half() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_saturates_at_extremes() {
        assert!(sigmoid(20.0) > 0.999_999);
        assert!(sigmoid(-20.0) < 1e-6);
    }

    #[test]
    fn verdict_toxic_carries_probability() {
        let v = verdict(0.93);
        assert_eq!(v.label, TOXIC_LABEL);
        assert!((v.confidence - 0.93).abs() < 1e-12);
    }

    #[test]
    fn verdict_benign_carries_complement() {
        let v = verdict(0.2);
        assert_eq!(v.label, BENIGN_LABEL);
        assert!((v.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn verdict_boundary_goes_toxic() {
        assert_eq!(verdict(0.5).label, TOXIC_LABEL);
    }
}
