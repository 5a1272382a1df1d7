// Composition tests: the per-post analysis loop end to end with mock
// classifiers, plus the fetch cache's public behavior.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use ember::analysis::aggregate::compute_run_stats;
use ember::classify::traits::{
    ClassificationResult, Emotion, EmotionClassifier, ToxicityScorer, BENIGN_LABEL, TOXIC_LABEL,
};
use ember::config::Config;
use ember::pipeline::analyze::analyze_posts;
use ember::pipeline::AnalysisSession;
use ember::reddit::cache::{FetchCache, FetchParams};
use ember::reddit::client::RedditClient;
use ember::reddit::posts::{Post, SortKind, TimeWindow};

/// Flags any comment containing "venomous" as toxic at 0.95.
struct KeywordToxicity;

#[async_trait]
impl ToxicityScorer for KeywordToxicity {
    async fn classify(&self, text: &str) -> Result<ClassificationResult> {
        if text.contains("venomous") {
            Ok(ClassificationResult {
                label: TOXIC_LABEL.to_string(),
                confidence: 0.95,
            })
        } else {
            Ok(ClassificationResult {
                label: BENIGN_LABEL.to_string(),
                confidence: 0.9,
            })
        }
    }
}

/// Calls everything joy.
struct AlwaysJoy;

#[async_trait]
impl EmotionClassifier for AlwaysJoy {
    async fn classify(&self, _text: &str) -> Result<Vec<ClassificationResult>> {
        Ok(vec![ClassificationResult {
            label: "joy".to_string(),
            confidence: 0.99,
        }])
    }
}

fn post(title: &str, score: i64, comments: &[&str]) -> Post {
    Post {
        title: title.to_string(),
        score,
        url: format!("https://example.com/{title}"),
        created_utc: 1_700_000_000.0,
        comment_count: comments.len(),
        comments: comments.iter().map(|c| c.to_string()).collect(),
    }
}

#[tokio::test]
async fn analyze_posts_summarizes_every_post() {
    let posts = vec![
        post(
            "busy",
            30,
            &[
                "a venomous comment aimed at someone",
                "a friendly comment about crustaceans",
                "another friendly comment about crustaceans",
            ],
        ),
        post("quiet", 20, &["ok"]),
        post("empty", 10, &[]),
    ];

    let summaries = analyze_posts(&posts, &KeywordToxicity, &AlwaysJoy).await;

    assert_eq!(summaries.len(), 3);

    // Post 1: one toxic comment, three classified, wordcloud present.
    let busy = &summaries[0];
    assert_eq!(busy.toxic_comments.len(), 1);
    assert!(busy.toxic_comments[0].text.contains("venomous"));
    assert_eq!(busy.emotions.total(), 3);
    assert_eq!(busy.emotions.count(Emotion::Joy), 3);
    assert!(busy.wordcloud.is_some());

    // Post 2: its only comment is below the minimum length — skipped
    // everywhere, and too little text for a cloud.
    let quiet = &summaries[1];
    assert!(quiet.toxic_comments.is_empty());
    assert_eq!(quiet.emotions.total(), 0);
    assert!(quiet.wordcloud.is_none());

    // Post 3: nothing to analyze at all.
    let empty = &summaries[2];
    assert!(empty.toxic_comments.is_empty());
    assert_eq!(empty.emotions.total(), 0);
    assert!(empty.wordcloud.is_none());
}

#[tokio::test]
async fn stats_and_summaries_agree() {
    let posts = vec![
        post("a", 10, &["one comment long enough", "two comments here"]),
        post("b", 20, &["three comments in total now"]),
        post("c", 30, &[]),
    ];

    let stats = compute_run_stats(&posts);
    let summaries = analyze_posts(&posts, &KeywordToxicity, &AlwaysJoy).await;

    assert_eq!(stats.post_count, summaries.len());
    let summed: usize = summaries.iter().map(|s| s.comment_count).sum();
    assert_eq!(stats.total_comments, summed);
    assert!((stats.avg_score - 20.0).abs() < 1e-12);
    assert!((stats.comments_per_post - 1.0).abs() < 1e-12);
}

// ============================================================
// Fetch cache — public API behavior
// ============================================================

fn params() -> FetchParams {
    FetchParams {
        subreddit: "rust".to_string(),
        sort: SortKind::Top,
        time: TimeWindow::Week,
        limit: 5,
    }
}

#[test]
fn cache_returns_inserted_posts_within_ttl() {
    let cache = FetchCache::with_ttl(Duration::from_secs(3600));
    cache.insert(params(), vec![post("cached", 1, &[])]);

    let hit = cache.get(&params()).expect("expected a cache hit");
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].title, "cached");
}

#[test]
fn cache_with_zero_ttl_never_hits() {
    let cache = FetchCache::with_ttl(Duration::ZERO);
    cache.insert(params(), vec![post("cached", 1, &[])]);
    assert!(cache.get(&params()).is_none());
}

#[tokio::test]
async fn run_serves_repeat_params_from_cache() {
    let config = Config {
        reddit_client_id: "id".to_string(),
        reddit_client_secret: "secret".to_string(),
        reddit_user_agent: "test-agent".to_string(),
        model_dir: std::env::temp_dir(),
    };
    let client = RedditClient::new(&config).unwrap();
    let session = AnalysisSession::new(client, Box::new(KeywordToxicity), Box::new(AlwaysJoy));

    // A warm cache means the run never touches the network.
    session.cache.insert(
        params(),
        vec![post("cached", 5, &["a friendly comment about crustaceans"])],
    );

    let report = ember::pipeline::analyze::run(&session, &params(), false).await;

    assert!(report.from_cache);
    assert!(report.fetch_error.is_none());
    assert_eq!(report.stats.post_count, 1);
    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.posts[0].title, "cached");
    assert_eq!(report.posts[0].emotions.count(Emotion::Joy), 1);
}

#[test]
fn cache_distinguishes_time_window() {
    let cache = FetchCache::with_ttl(Duration::from_secs(3600));
    cache.insert(params(), vec![post("weekly", 1, &[])]);

    let mut monthly = params();
    monthly.time = TimeWindow::Month;
    assert!(cache.get(&monthly).is_none());
}
