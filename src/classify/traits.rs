// Classifier traits — the swap-ready abstraction.
//
// The adapters in `toxicity` and `emotion` wrap local ONNX models today;
// a hosted inference API could implement the same traits without touching
// the aggregation code. Tests substitute scripted implementations to pin
// down skip rules and failure accounting.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

/// Label the toxicity adapter reports when the model says toxic.
pub const TOXIC_LABEL: &str = "toxic";

/// Label the toxicity adapter reports otherwise.
pub const BENIGN_LABEL: &str = "benign";

/// One label with its confidence, as produced by a classifier adapter.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

/// The fixed emotion category set. Labels outside this set fold into
/// `Neutral` during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Joy,
    Neutral,
    Sadness,
    Surprise,
}

impl Emotion {
    /// Every category, in display order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Joy => "joy",
            Emotion::Neutral => "neutral",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
        }
    }

    /// Map a model label to a category. Unknown labels fold into Neutral
    /// rather than being dropped — every classified comment must land
    /// somewhere in the histogram.
    pub fn from_label(label: &str) -> Emotion {
        match label.to_lowercase().as_str() {
            "anger" => Emotion::Anger,
            "disgust" => Emotion::Disgust,
            "fear" => Emotion::Fear,
            "joy" => Emotion::Joy,
            "neutral" => Emotion::Neutral,
            "sadness" => Emotion::Sadness,
            "surprise" => Emotion::Surprise,
            _ => Emotion::Neutral,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary toxicity classification. Implementations must be Send + Sync —
/// the loaded model is shared for the lifetime of the process.
#[async_trait]
pub trait ToxicityScorer: Send + Sync {
    /// Classify one text. Returns the winning label (`toxic`/`benign`)
    /// with its confidence.
    async fn classify(&self, text: &str) -> Result<ClassificationResult>;
}

/// Multi-class emotion classification.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify one text. Returns the full distribution over emotion
    /// labels; confidences sum to ~1.0.
    async fn classify(&self, text: &str) -> Result<Vec<ClassificationResult>>;
}
