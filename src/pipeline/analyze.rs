// The analysis run: fetch (through the cache) → classify per comment →
// aggregate per post → run statistics.
//
// Strictly sequential by design — posts and comments are processed one at
// a time, and a run always processes its full bounded set once started.
// Past the startup checks, no error here aborts a run: a failed fetch
// becomes a warning and an empty report.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::analysis::aggregate::{
    analyze_emotions, analyze_toxicity, compute_run_stats, summarize_post, PostSummary, RunStats,
};
use crate::analysis::wordcloud::build_wordcloud;
use crate::classify::traits::{EmotionClassifier, ToxicityScorer};
use crate::reddit::cache::FetchParams;
use crate::reddit::posts::{fetch_posts, Post};

use super::AnalysisSession;

/// Everything one analysis run produced.
#[derive(Debug)]
pub struct RunReport {
    pub params: FetchParams,
    pub stats: RunStats,
    pub posts: Vec<PostSummary>,
    /// Set when the community-level fetch failed; the run still completes
    /// with zero posts.
    pub fetch_error: Option<String>,
    /// Whether the posts came from the fetch cache.
    pub from_cache: bool,
}

/// Run one full analysis.
///
/// `refresh` bypasses the fetch cache for this run (the fresh result is
/// still cached for the next one).
pub async fn run(session: &AnalysisSession, params: &FetchParams, refresh: bool) -> RunReport {
    let mut from_cache = false;
    let mut fetch_error = None;

    let cached = if refresh {
        None
    } else {
        session.cache.get(params)
    };

    let posts: Vec<Post> = match cached {
        Some(posts) => {
            info!(subreddit = %params.subreddit, "Using cached fetch result");
            from_cache = true;
            posts
        }
        None => {
            match fetch_posts(
                &session.client,
                &params.subreddit,
                params.sort,
                params.time,
                params.limit,
            )
            .await
            {
                Ok(posts) => {
                    session.cache.insert(params.clone(), posts.clone());
                    posts
                }
                Err(e) => {
                    // Recovered at the fetch boundary: the run proceeds
                    // with zero posts instead of raising into the UI.
                    warn!(
                        subreddit = %params.subreddit,
                        error = %e,
                        "Fetch failed, continuing with zero posts"
                    );
                    fetch_error = Some(e.to_string());
                    Vec::new()
                }
            }
        }
    };

    let stats = compute_run_stats(&posts);
    let summaries = analyze_posts(
        &posts,
        session.toxicity.as_ref(),
        session.emotion.as_ref(),
    )
    .await;

    info!(
        posts = summaries.len(),
        comments = stats.total_comments,
        "Analysis run complete"
    );

    RunReport {
        params: params.clone(),
        stats,
        posts: summaries,
        fetch_error,
        from_cache,
    }
}

/// Classify and aggregate every post, sequentially.
pub async fn analyze_posts(
    posts: &[Post],
    toxicity: &dyn ToxicityScorer,
    emotion: &dyn EmotionClassifier,
) -> Vec<PostSummary> {
    let pb = ProgressBar::new(posts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Analyzing [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let mut summaries = Vec::with_capacity(posts.len());
    for post in posts {
        let toxic = analyze_toxicity(&post.comments, toxicity).await;
        let emotions = analyze_emotions(&post.comments, emotion).await;
        let cloud = build_wordcloud(&post.comments);
        summaries.push(summarize_post(post, toxic, emotions, cloud));
        pb.inc(1);
    }
    pb.finish_and_clear();

    summaries
}
