// Model download helper for the two ONNX classifiers.
//
// Downloads from HuggingFace:
// 1. unbiased-toxic-roberta — binary toxicity verdict (~126MB)
// 2. emotion-english-distilroberta-base — 7-way emotion distribution (~82MB)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/ember/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the toxicity model.
const TOXICITY_HF_URL: &str =
    "https://huggingface.co/protectai/unbiased-toxic-roberta-onnx/resolve/main";

/// HuggingFace repo for the emotion model (community ONNX export).
const EMOTION_HF_URL: &str =
    "https://huggingface.co/onnx-community/emotion-english-distilroberta-base-ONNX/resolve/main";

/// File names shared by both model directories.
pub const MODEL_FILE: &str = "model_quantized.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// The emotion repo keeps its ONNX export under an onnx/ prefix.
const EMOTION_REMOTE_MODEL_FILE: &str = "onnx/model_quantized.onnx";

/// Returns the default directory for storing model files.
/// Uses the platform data directory: ~/.local/share/ember/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ember")
        .join("models")
}

/// Subdirectory for the toxicity model.
pub fn toxicity_model_dir(base: &Path) -> PathBuf {
    base.join("toxicity")
}

/// Subdirectory for the emotion model.
pub fn emotion_model_dir(base: &Path) -> PathBuf {
    base.join("emotion")
}

fn files_present(dir: &Path) -> bool {
    dir.join(MODEL_FILE).exists() && dir.join(TOKENIZER_FILE).exists()
}

/// Check whether the toxicity model files exist.
pub fn toxicity_files_present(base: &Path) -> bool {
    files_present(&toxicity_model_dir(base))
}

/// Check whether the emotion model files exist.
pub fn emotion_files_present(base: &Path) -> bool {
    files_present(&emotion_model_dir(base))
}

/// Check whether both classifiers are ready to load.
pub fn models_present(base: &Path) -> bool {
    toxicity_files_present(base) && emotion_files_present(base)
}

/// Download both ONNX models.
///
/// Shows progress bars for the large files. Skips files that already exist.
/// Creates directories as needed.
pub async fn download_models(base: &Path) -> Result<()> {
    println!("\nToxicity model (unbiased-toxic-roberta):");
    fetch_model(
        &toxicity_model_dir(base),
        TOXICITY_HF_URL,
        MODEL_FILE,
        "~126 MB",
    )
    .await?;

    println!("\nEmotion model (emotion-english-distilroberta-base):");
    fetch_model(
        &emotion_model_dir(base),
        EMOTION_HF_URL,
        EMOTION_REMOTE_MODEL_FILE,
        "~82 MB",
    )
    .await?;

    Ok(())
}

/// Download one model's tokenizer + weights into `dir`, skipping files
/// already on disk. `remote_model_file` is the path within the HF repo.
async fn fetch_model(
    dir: &Path,
    base_url: &str,
    remote_model_file: &str,
    size_hint: &str,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if tokenizer_path.exists() {
        info!("Tokenizer already exists in {}, skipping", dir.display());
        println!("  {TOKENIZER_FILE} (already exists)");
    } else {
        println!("  Downloading {TOKENIZER_FILE}...");
        download_file(
            &format!("{base_url}/{TOKENIZER_FILE}"),
            &tokenizer_path,
            false,
        )
        .await?;
    }

    let model_path = dir.join(MODEL_FILE);
    if model_path.exists() {
        info!("Model already exists in {}, skipping", dir.display());
        println!("  {MODEL_FILE} (already exists)");
    } else {
        println!("  Downloading {MODEL_FILE} ({size_hint})...");
        download_file(
            &format!("{base_url}/{remote_model_file}"),
            &model_path,
            true,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let total_size = response.content_length();

    let pb = if show_progress {
        let pb = if let Some(size) = total_size {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_dir_is_under_ember() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("ember") && path_str.contains("models"),
            "Expected path containing ember/models, got: {path_str}"
        );
    }

    #[test]
    fn model_dirs_are_distinct_subdirectories() {
        let base = PathBuf::from("/tmp/ember-models");
        assert_eq!(toxicity_model_dir(&base), base.join("toxicity"));
        assert_eq!(emotion_model_dir(&base), base.join("emotion"));
    }

    #[test]
    fn models_present_false_when_empty() {
        let base = std::env::temp_dir().join("ember-test-nonexistent");
        assert!(!toxicity_files_present(&base));
        assert!(!emotion_files_present(&base));
        assert!(!models_present(&base));
    }

    #[test]
    fn models_present_requires_both_models() {
        let base = std::env::temp_dir().join("ember-present-test");
        let tox = toxicity_model_dir(&base);
        std::fs::create_dir_all(&tox).unwrap();
        std::fs::write(tox.join(MODEL_FILE), b"fake").unwrap();
        std::fs::write(tox.join(TOKENIZER_FILE), b"fake").unwrap();

        assert!(toxicity_files_present(&base));
        assert!(!models_present(&base));

        // Cleanup
        std::fs::remove_dir_all(&base).unwrap();
    }
}
