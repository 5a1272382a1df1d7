// Per-post aggregation of classifier outputs.
//
// Failure policy differs by classifier on purpose: a comment whose toxicity
// call fails is silently excluded from the toxic list (a miss costs little),
// while an emotion failure still counts as neutral so the histogram total
// always accounts for every comment that was eligible for classification.

use std::collections::BTreeMap;

use tracing::debug;

use crate::classify::is_classifiable;
use crate::classify::traits::{Emotion, EmotionClassifier, ToxicityScorer, TOXIC_LABEL};
use crate::reddit::posts::Post;

use super::wordcloud::WordCloud;

/// A comment is reported toxic only above this confidence (strictly greater).
pub const TOXICITY_THRESHOLD: f64 = 0.8;

/// Reported comment text is clipped to this many characters.
pub const MAX_REPORT_CHARS: usize = 200;

/// One comment that cleared the toxicity bar.
#[derive(Debug, Clone)]
pub struct ToxicComment {
    /// Clipped to MAX_REPORT_CHARS.
    pub text: String,
    pub confidence: f64,
}

/// Counts per emotion category. Every category is always present,
/// zero-defaulted, so rendering never has to special-case gaps.
#[derive(Debug, Clone)]
pub struct EmotionHistogram {
    counts: BTreeMap<Emotion, u32>,
}

impl EmotionHistogram {
    pub fn new() -> Self {
        let counts = Emotion::ALL.iter().map(|&e| (e, 0)).collect();
        Self { counts }
    }

    pub fn record(&mut self, emotion: Emotion) {
        *self.counts.entry(emotion).or_insert(0) += 1;
    }

    pub fn count(&self, emotion: Emotion) -> u32 {
        self.counts.get(&emotion).copied().unwrap_or(0)
    }

    /// Sum over all categories — equals the number of comments that were
    /// actually classified (including failures folded to neutral).
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Iterate categories in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, u32)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.count(e)))
    }
}

impl Default for EmotionHistogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify each eligible comment and keep the ones that cleared the
/// toxicity threshold, in comment order.
///
/// Per-comment failures are excluded without propagating — a single bad
/// comment never aborts the post, let alone the run.
pub async fn analyze_toxicity(
    comments: &[String],
    scorer: &dyn ToxicityScorer,
) -> Vec<ToxicComment> {
    let mut toxic = Vec::new();

    for comment in comments.iter().filter(|c| is_classifiable(c)) {
        match scorer.classify(comment).await {
            Ok(result) => {
                if result.label == TOXIC_LABEL && result.confidence > TOXICITY_THRESHOLD {
                    toxic.push(ToxicComment {
                        text: comment.chars().take(MAX_REPORT_CHARS).collect(),
                        confidence: result.confidence,
                    });
                }
            }
            Err(e) => {
                debug!(error = %e, "Toxicity classification failed, comment excluded");
            }
        }
    }

    toxic
}

/// Classify each eligible comment's emotion and count the top label.
///
/// Labels outside the known set fold into neutral; so do classification
/// failures. Comments below the minimum length are skipped entirely and
/// never appear in the histogram.
pub async fn analyze_emotions(
    comments: &[String],
    classifier: &dyn EmotionClassifier,
) -> EmotionHistogram {
    let mut histogram = EmotionHistogram::new();

    for comment in comments.iter().filter(|c| is_classifiable(c)) {
        match classifier.classify(comment).await {
            Ok(distribution) => {
                let top = distribution
                    .iter()
                    .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
                match top {
                    Some(result) => histogram.record(Emotion::from_label(&result.label)),
                    // An empty distribution is a degenerate success; count
                    // it as neutral rather than dropping the comment.
                    None => histogram.record(Emotion::Neutral),
                }
            }
            Err(e) => {
                debug!(error = %e, "Emotion classification failed, counted as neutral");
                histogram.record(Emotion::Neutral);
            }
        }
    }

    histogram
}

/// Everything the output surface needs to render one post.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub title: String,
    pub score: i64,
    pub url: String,
    pub created_utc: f64,
    pub comment_count: usize,
    pub toxic_comments: Vec<ToxicComment>,
    pub emotions: EmotionHistogram,
    pub wordcloud: Option<WordCloud>,
}

/// Combine one post's classifier outputs into its summary.
pub fn summarize_post(
    post: &Post,
    toxic_comments: Vec<ToxicComment>,
    emotions: EmotionHistogram,
    wordcloud: Option<WordCloud>,
) -> PostSummary {
    PostSummary {
        title: post.title.clone(),
        score: post.score,
        url: post.url.clone(),
        created_utc: post.created_utc,
        comment_count: post.comment_count,
        toxic_comments,
        emotions,
        wordcloud,
    }
}

/// Cross-post statistics, computed once per analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub post_count: usize,
    pub total_comments: usize,
    pub avg_score: f64,
    pub comments_per_post: f64,
}

/// Simple arithmetic reductions over the fetched post list.
/// Zero posts yields zeroed stats — never a division by zero.
pub fn compute_run_stats(posts: &[Post]) -> RunStats {
    let post_count = posts.len();
    let total_comments: usize = posts.iter().map(|p| p.comment_count).sum();

    if post_count == 0 {
        return RunStats {
            post_count: 0,
            total_comments: 0,
            avg_score: 0.0,
            comments_per_post: 0.0,
        };
    }

    let score_sum: i64 = posts.iter().map(|p| p.score).sum();

    RunStats {
        post_count,
        total_comments,
        avg_score: score_sum as f64 / post_count as f64,
        comments_per_post: total_comments as f64 / post_count as f64,
    }
}
