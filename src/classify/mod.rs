// Text classification — trait-based adapters over local ONNX models.
//
// Two pretrained models run per comment: a binary toxicity classifier and a
// 7-way emotion classifier. Both are loaded once per process and shared
// read-only; the traits in `traits` keep the rest of the pipeline ignorant
// of the backend.

pub mod download;
pub mod emotion;
pub mod toxicity;
pub mod traits;

/// Comments at or below this many characters are never classified.
pub const MIN_COMMENT_CHARS: usize = 10;

/// Classifier input is clipped to this many characters before tokenization.
pub const MAX_CLASSIFY_CHARS: usize = 512;

/// Whether a comment is worth sending to the classifiers.
///
/// Empty, whitespace-only, and very short comments are skipped entirely —
/// they carry no signal and the per-comment inference cost isn't free.
pub fn is_classifiable(text: &str) -> bool {
    !text.trim().is_empty() && text.chars().count() > MIN_COMMENT_CHARS
}

/// Clip text to the classifier input bound.
///
/// Char-based, not byte-based, so multi-byte content can't split a
/// codepoint or blow past the bound in chars.
pub fn clip_for_model(text: &str) -> String {
    text.chars().take(MAX_CLASSIFY_CHARS).collect()
}
