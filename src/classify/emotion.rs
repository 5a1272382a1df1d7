// Local ONNX emotion classifier (DistilRoBERTa fine-tuned on 7 emotions).
//
// Softmax over the 7 class logits yields the full distribution; the
// aggregator takes the top label downstream. Label order matches the
// model's id2label mapping (alphabetical).
//
// Model: emotion-english-distilroberta-base, ONNX export

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
use super::traits::{ClassificationResult, EmotionClassifier};

/// Labels in the order the model emits them.
const LABEL_ORDER: [&str; 7] = [
    "anger",
    "disgust",
    "fear",
    "joy",
    "neutral",
    "sadness",
    "surprise",
];

/// RoBERTa pad token id.
const PAD_TOKEN_ID: i64 = 1;

/// Local ONNX emotion classifier. Same sharing scheme as the toxicity
/// scorer: Arc for spawn_blocking, Mutex because Session::run is &mut.
pub struct OnnxEmotionClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

impl OnnxEmotionClassifier {
    /// Load the model and tokenizer from the given directory.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() || !tokenizer_path.exists() {
            anyhow::bail!(
                "Emotion model files not found in {}\nRun `ember download-models` to fetch them.",
                model_dir.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!("Loaded ONNX emotion model from {}", model_dir.display());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }
}

#[async_trait]
impl EmotionClassifier for OnnxEmotionClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let text = clip_for_model(text);

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
            if input_ids.is_empty() {
                input_ids.push(PAD_TOKEN_ID);
                attention_mask.push(0);
            }

            let shape = [1i64, input_ids.len() as i64];
            let input_ids_tensor = Tensor::from_array((shape, input_ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [1, 7] — raw class logits
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                if data.len() < LABEL_ORDER.len() {
                    anyhow::bail!(
                        "Unexpected emotion output width: {} (expected {})",
                        data.len(),
                        LABEL_ORDER.len()
                    );
                }
                data[..LABEL_ORDER.len()]
                    .iter()
                    .map(|&l| l as f64)
                    .collect::<Vec<f64>>()
            };

            let probabilities = softmax(&logits);
            let distribution: Vec<ClassificationResult> = LABEL_ORDER
                .iter()
                .zip(probabilities)
                .map(|(label, confidence)| ClassificationResult {
                    label: (*label).to_string(),
                    confidence,
                })
                .collect();

            debug!(
                top = %distribution
                    .iter()
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                    .map(|r| r.label.clone())
                    .unwrap_or_default(),
                "Scored comment emotion"
            );

            Ok(distribution)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// Numerically stable softmax: shift by the max logit before exponentiating.
fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}
