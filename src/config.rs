use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// User agent sent on every Reddit API request when REDDIT_USER_AGENT is unset.
/// Reddit requires a descriptive UA and throttles generic ones aggressively.
pub const DEFAULT_USER_AGENT: &str = "ember/0.1 (comment insight analyzer)";

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the user agent and model directory have defaults — the Reddit
    /// credentials are required for anything beyond `download-models` and `check`.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("EMBER_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::classify::download::default_model_dir());

        Ok(Self {
            reddit_client_id: env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            model_dir,
        })
    }

    /// Check that the Reddit API credentials are configured.
    /// Call this before any operation that talks to the Reddit API —
    /// a missing credential halts startup, nothing runs on a guess.
    pub fn require_reddit(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.reddit_client_id.is_empty() {
            missing.push("REDDIT_CLIENT_ID");
        }
        if self.reddit_client_secret.is_empty() {
            missing.push("REDDIT_CLIENT_SECRET");
        }
        if !missing.is_empty() {
            anyhow::bail!(
                "Reddit API credentials are missing: {}.\n\
                 Add them to your .env file or environment.",
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Validate that both classifier models are on disk.
    /// Call this before any operation that needs classification.
    pub fn require_models(&self) -> Result<()> {
        if !crate::classify::download::models_present(&self.model_dir) {
            anyhow::bail!(
                "ONNX model files not found in {}\n\
                 Run `ember download-models` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}
