// Reddit API access — app-only OAuth client, listing/comment fetching,
// and the TTL fetch cache.

pub mod cache;
pub mod client;
pub mod posts;
