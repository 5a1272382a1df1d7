// Post fetching — listing retrieval plus bounded comment-tree flattening.
//
// One fetch returns up to `limit` posts from a subreddit listing, each
// carrying a flat, capped list of comment bodies. The comment tree is walked
// depth-first; at most one collapsed "more" placeholder is expanded so a
// busy thread can't drag a run into unbounded pagination.

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::RedditClient;
use crate::output::truncate_chars;

/// Hard upper bound on posts per fetch, matching the CLI slider range.
pub const MAX_POST_LIMIT: u32 = 20;

/// Flat comment list cap per post.
pub const MAX_COMMENTS_PER_POST: usize = 50;

/// How many collapsed "load more" placeholders to expand per thread.
pub const MORE_EXPANSIONS: usize = 1;

/// How many comment ids one morechildren call may carry (API maximum is 100).
const MORECHILDREN_BATCH: usize = 100;

/// Listing sort order for a subreddit fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum SortKind {
    Hot,
    Top,
    New,
    Rising,
}

impl SortKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKind::Hot => "hot",
            SortKind::Top => "top",
            SortKind::New => "new",
            SortKind::Rising => "rising",
        }
    }
}

/// Time window for `top` listings. Ignored by every other sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum TimeWindow {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Year => "year",
            TimeWindow::All => "all",
        }
    }
}

/// A fetched post — just the fields Ember needs for analysis.
/// Immutable after the fetch; never persisted.
#[derive(Debug, Clone)]
pub struct Post {
    pub title: String,
    pub score: i64,
    pub url: String,
    pub created_utc: f64,
    /// Flattened top-level-and-below comment bodies, capped at
    /// MAX_COMMENTS_PER_POST.
    pub comments: Vec<String>,
    pub comment_count: usize,
}

/// Fetch up to `limit` posts from a subreddit listing, each with its
/// flattened comment list.
///
/// A post whose comment thread can't be processed is skipped with a warning;
/// the fetch keeps going. A failure at the listing level (unknown subreddit,
/// network error) propagates to the caller, which is expected to recover it
/// at the pipeline boundary rather than abort the run.
pub async fn fetch_posts(
    client: &RedditClient,
    subreddit: &str,
    sort: SortKind,
    time: TimeWindow,
    limit: u32,
) -> Result<Vec<Post>> {
    let limit = limit.clamp(1, MAX_POST_LIMIT);
    let limit_str = limit.to_string();

    let path = format!("/r/{}/{}", subreddit, sort.as_str());
    let mut params: Vec<(&str, &str)> = vec![("limit", &limit_str), ("raw_json", "1")];
    // The time window only means anything for `top`.
    if sort == SortKind::Top {
        params.push(("t", time.as_str()));
    }

    let listing: Listing<PostData> = client
        .get_json(&path, &params)
        .await
        .with_context(|| format!("Failed to fetch r/{subreddit} {} listing", sort.as_str()))?;

    let mut posts = Vec::new();

    for data in listing_posts(listing, limit) {
        match fetch_comments(client, subreddit, &data.id).await {
            Ok(comments) => {
                debug!(
                    post_id = %data.id,
                    comments = comments.len(),
                    "Fetched comment thread"
                );
                posts.push(Post {
                    title: data.title,
                    score: data.score,
                    url: data.url,
                    created_utc: data.created_utc,
                    comment_count: comments.len(),
                    comments,
                });
            }
            Err(e) => {
                warn!(
                    post = %truncate_chars(&data.title, 50),
                    error = %e,
                    "Error processing post, skipping"
                );
            }
        }
    }

    info!(
        count = posts.len(),
        subreddit = subreddit,
        sort = sort.as_str(),
        "Collected posts for analysis"
    );

    Ok(posts)
}

/// Pull at most `limit` post candidates out of a listing. The API usually
/// honors the limit param, but the bound holds here regardless of what the
/// listing carries.
fn listing_posts(listing: Listing<PostData>, limit: u32) -> Vec<PostData> {
    listing
        .data
        .children
        .into_iter()
        .map(|child| child.data)
        .take(limit as usize)
        .collect()
}

/// Fetch and flatten one post's comment thread.
///
/// The comments endpoint returns a two-element array: the post listing and
/// the comment listing. Comment nodes mix `t1` comments with `more`
/// placeholders, and `replies` is either a nested listing or the empty
/// string, so the tree is walked as raw JSON rather than forced into a
/// self-referential serde type.
async fn fetch_comments(
    client: &RedditClient,
    subreddit: &str,
    post_id: &str,
) -> Result<Vec<String>> {
    let path = format!("/r/{subreddit}/comments/{post_id}");
    let thread: Vec<Value> = client
        .get_json(&path, &[("limit", "100"), ("depth", "8"), ("raw_json", "1")])
        .await?;

    let comment_listing = thread
        .get(1)
        .ok_or_else(|| anyhow!("Malformed thread: comment listing missing"))?;

    let mut bodies = Vec::new();
    let mut more_ids = Vec::new();
    collect_comment_bodies(comment_listing, &mut bodies, &mut more_ids);

    // Expand a bounded number of collapsed placeholders. Failures here leave
    // the placeholder collapsed instead of failing the post.
    let mut extra = Vec::new();
    for chunk in more_ids.chunks(MORECHILDREN_BATCH).take(MORE_EXPANSIONS) {
        if bodies.len() + extra.len() >= MAX_COMMENTS_PER_POST {
            break;
        }
        match expand_more(client, post_id, chunk).await {
            Ok(more) => extra.extend(more),
            Err(e) => {
                warn!(post_id = post_id, error = %e, "morechildren expansion failed");
            }
        }
    }

    Ok(cap_thread_comments(bodies, extra))
}

/// Merge expanded bodies into the thread's own and enforce the per-post cap.
fn cap_thread_comments(mut bodies: Vec<String>, extra: Vec<String>) -> Vec<String> {
    bodies.extend(extra);
    bodies.truncate(MAX_COMMENTS_PER_POST);
    bodies
}

/// Walk a comment listing depth-first, collecting `t1` bodies in thread
/// order and recording the ids behind `more` placeholders.
fn collect_comment_bodies(listing: &Value, bodies: &mut Vec<String>, more_ids: &mut Vec<String>) {
    let Some(children) = listing["data"]["children"].as_array() else {
        return;
    };

    for child in children {
        match child["kind"].as_str() {
            Some("t1") => {
                if let Some(body) = child["data"]["body"].as_str() {
                    if !body.is_empty() {
                        bodies.push(body.to_string());
                    }
                }
                // `replies` is "" for leaf comments, a listing otherwise.
                let replies = &child["data"]["replies"];
                if replies.is_object() {
                    collect_comment_bodies(replies, bodies, more_ids);
                }
            }
            Some("more") => {
                if let Some(ids) = child["data"]["children"].as_array() {
                    more_ids.extend(ids.iter().filter_map(|v| v.as_str().map(String::from)));
                }
            }
            _ => {}
        }
    }
}

/// Resolve one batch of collapsed comment ids via /api/morechildren.
async fn expand_more(client: &RedditClient, post_id: &str, ids: &[String]) -> Result<Vec<String>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let link_id = format!("t3_{post_id}");
    let children = ids.join(",");

    let response: Value = client
        .get_json(
            "/api/morechildren",
            &[
                ("api_type", "json"),
                ("link_id", &link_id),
                ("children", &children),
                ("raw_json", "1"),
            ],
        )
        .await?;

    let things = response["json"]["data"]["things"]
        .as_array()
        .ok_or_else(|| anyhow!("Malformed morechildren response"))?;

    let bodies = things
        .iter()
        .filter(|t| t["kind"].as_str() == Some("t1"))
        .filter_map(|t| t["data"]["body"].as_str())
        .filter(|b| !b.is_empty())
        .map(String::from)
        .collect();

    Ok(bodies)
}

// -- Serde types for listing responses --

#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
pub struct ListingData<T> {
    pub children: Vec<Thing<T>>,
}

#[derive(Debug, Deserialize)]
pub struct Thing<T> {
    pub kind: String,
    pub data: T,
}

/// One post from a subreddit listing.
#[derive(Debug, Deserialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_utc: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_deserializes() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t3", "data": {"id": "abc123", "title": "A post", "score": 42,
                     "url": "https://example.com", "created_utc": 1700000000.0}},
                    {"kind": "t3", "data": {"id": "def456", "title": "No optional fields"}}
                ],
                "after": null
            }
        }"#;

        let listing: Listing<PostData> = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.children.len(), 2);
        assert_eq!(listing.data.children[0].data.score, 42);
        // Missing fields fall back to defaults instead of failing the fetch.
        assert_eq!(listing.data.children[1].data.score, 0);
        assert!(listing.data.children[1].data.url.is_empty());
    }

    #[test]
    fn collect_walks_nested_replies_in_thread_order() {
        let listing = json!({
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t1", "data": {
                        "body": "top level",
                        "replies": {"kind": "Listing", "data": {"children": [
                            {"kind": "t1", "data": {"body": "nested reply", "replies": ""}}
                        ]}}
                    }},
                    {"kind": "t1", "data": {"body": "second top level", "replies": ""}}
                ]
            }
        });

        let mut bodies = Vec::new();
        let mut more = Vec::new();
        collect_comment_bodies(&listing, &mut bodies, &mut more);

        assert_eq!(bodies, vec!["top level", "nested reply", "second top level"]);
        assert!(more.is_empty());
    }

    #[test]
    fn collect_records_more_placeholder_ids() {
        let listing = json!({
            "data": {
                "children": [
                    {"kind": "t1", "data": {"body": "visible", "replies": ""}},
                    {"kind": "more", "data": {"children": ["aaa", "bbb"]}}
                ]
            }
        });

        let mut bodies = Vec::new();
        let mut more = Vec::new();
        collect_comment_bodies(&listing, &mut bodies, &mut more);

        assert_eq!(bodies, vec!["visible"]);
        assert_eq!(more, vec!["aaa", "bbb"]);
    }

    #[test]
    fn collect_skips_empty_bodies_and_unknown_kinds() {
        let listing = json!({
            "data": {
                "children": [
                    {"kind": "t1", "data": {"body": "", "replies": ""}},
                    {"kind": "t5", "data": {"body": "not a comment"}},
                    {"kind": "t1", "data": {"body": "kept", "replies": ""}}
                ]
            }
        });

        let mut bodies = Vec::new();
        let mut more = Vec::new();
        collect_comment_bodies(&listing, &mut bodies, &mut more);

        assert_eq!(bodies, vec!["kept"]);
    }

    #[test]
    fn collect_tolerates_malformed_listing() {
        let mut bodies = Vec::new();
        let mut more = Vec::new();
        collect_comment_bodies(&json!({"data": {}}), &mut bodies, &mut more);
        collect_comment_bodies(&json!("not even an object"), &mut bodies, &mut more);
        assert!(bodies.is_empty());
        assert!(more.is_empty());
    }

    #[test]
    fn listing_yields_at_most_limit_posts() {
        let children: Vec<_> = (0..8)
            .map(|i| {
                json!({"kind": "t3", "data": {"id": format!("id{i}"), "title": format!("post {i}")}})
            })
            .collect();
        let listing: Listing<PostData> =
            serde_json::from_value(json!({"kind": "Listing", "data": {"children": children}}))
                .unwrap();

        let posts = listing_posts(listing, 3);
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].id, "id0");
        assert_eq!(posts[2].id, "id2");
    }

    #[test]
    fn listing_smaller_than_limit_is_untouched() {
        let listing: Listing<PostData> = serde_json::from_value(json!({
            "data": {"children": [
                {"kind": "t3", "data": {"id": "only", "title": "the only post"}}
            ]}
        }))
        .unwrap();

        assert_eq!(listing_posts(listing, 20).len(), 1);
    }

    #[test]
    fn comment_cap_holds_after_expansion() {
        let bodies: Vec<String> = (0..45).map(|i| format!("comment {i}")).collect();
        let extra: Vec<String> = (0..20).map(|i| format!("expanded {i}")).collect();

        let capped = cap_thread_comments(bodies, extra);
        assert_eq!(capped.len(), MAX_COMMENTS_PER_POST);
        // Thread-order bodies come first, expansions fill the remainder.
        assert_eq!(capped[44], "comment 44");
        assert_eq!(capped[45], "expanded 0");
    }

    #[test]
    fn comment_cap_leaves_short_threads_alone() {
        let capped = cap_thread_comments(
            vec!["one".to_string()],
            vec!["two".to_string()],
        );
        assert_eq!(capped, vec!["one", "two"]);
    }

    #[test]
    fn sort_and_time_strings_match_api_values() {
        assert_eq!(SortKind::Hot.as_str(), "hot");
        assert_eq!(SortKind::Top.as_str(), "top");
        assert_eq!(SortKind::New.as_str(), "new");
        assert_eq!(SortKind::Rising.as_str(), "rising");
        assert_eq!(TimeWindow::Week.as_str(), "week");
        assert_eq!(TimeWindow::All.as_str(), "all");
    }
}
