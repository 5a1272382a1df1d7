// Fetch memoization — TTL cache keyed by the full fetch parameters.
//
// One analysis run against unchanged parameters inside the TTL reuses the
// previous posts instead of hitting the API again. The cache is the only
// process-wide mutable state besides the loaded models; it sits behind a
// Mutex and is read-mostly after warm-up.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use super::posts::{Post, SortKind, TimeWindow};

/// How long a fetch result stays valid.
pub const FETCH_CACHE_TTL: Duration = Duration::from_secs(300);

/// Everything that identifies one fetch. Doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub subreddit: String,
    pub sort: SortKind,
    pub time: TimeWindow,
    pub limit: u32,
}

struct CacheEntry {
    fetched_at: Instant,
    posts: Vec<Post>,
}

/// In-process TTL cache for fetch results.
pub struct FetchCache {
    ttl: Duration,
    entries: Mutex<HashMap<FetchParams, CacheEntry>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::with_ttl(FETCH_CACHE_TTL)
    }

    /// Build a cache with a custom TTL. `Duration::ZERO` disables caching.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached posts for `params` if they're still fresh.
    pub fn get(&self, params: &FetchParams) -> Option<Vec<Post>> {
        self.get_at(params, Instant::now())
    }

    /// Store a fetch result, replacing any stale entry for the same key.
    pub fn insert(&self, params: FetchParams, posts: Vec<Post>) {
        self.insert_at(params, posts, Instant::now());
    }

    fn get_at(&self, params: &FetchParams, now: Instant) -> Option<Vec<Post>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(params)?;
        if now.duration_since(entry.fetched_at) < self.ttl {
            debug!(subreddit = %params.subreddit, "Fetch cache hit");
            Some(entry.posts.clone())
        } else {
            None
        }
    }

    fn insert_at(&self, params: FetchParams, posts: Vec<Post>, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            params,
            CacheEntry {
                fetched_at: now,
                posts,
            },
        );
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(subreddit: &str) -> FetchParams {
        FetchParams {
            subreddit: subreddit.to_string(),
            sort: SortKind::Hot,
            time: TimeWindow::Day,
            limit: 5,
        }
    }

    fn one_post(title: &str) -> Vec<Post> {
        vec![Post {
            title: title.to_string(),
            score: 1,
            url: String::new(),
            created_utc: 0.0,
            comments: vec![],
            comment_count: 0,
        }]
    }

    #[test]
    fn hit_within_ttl() {
        let cache = FetchCache::with_ttl(Duration::from_secs(300));
        let t0 = Instant::now();

        cache.insert_at(params("rust"), one_post("cached"), t0);

        let hit = cache.get_at(&params("rust"), t0 + Duration::from_secs(299));
        assert_eq!(hit.unwrap()[0].title, "cached");
    }

    #[test]
    fn miss_after_ttl_expires() {
        let cache = FetchCache::with_ttl(Duration::from_secs(300));
        let t0 = Instant::now();

        cache.insert_at(params("rust"), one_post("cached"), t0);

        assert!(cache
            .get_at(&params("rust"), t0 + Duration::from_secs(300))
            .is_none());
    }

    #[test]
    fn different_params_miss() {
        let cache = FetchCache::with_ttl(Duration::from_secs(300));
        let t0 = Instant::now();

        cache.insert_at(params("rust"), one_post("cached"), t0);

        assert!(cache.get_at(&params("golang"), t0).is_none());

        let mut other_limit = params("rust");
        other_limit.limit = 10;
        assert!(cache.get_at(&other_limit, t0).is_none());

        let mut other_sort = params("rust");
        other_sort.sort = SortKind::Top;
        assert!(cache.get_at(&other_sort, t0).is_none());
    }

    #[test]
    fn reinsert_refreshes_entry() {
        let cache = FetchCache::with_ttl(Duration::from_secs(300));
        let t0 = Instant::now();

        cache.insert_at(params("rust"), one_post("old"), t0);
        let t1 = t0 + Duration::from_secs(400);
        cache.insert_at(params("rust"), one_post("new"), t1);

        let hit = cache.get_at(&params("rust"), t1 + Duration::from_secs(1));
        assert_eq!(hit.unwrap()[0].title, "new");
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = FetchCache::with_ttl(Duration::ZERO);
        cache.insert(params("rust"), one_post("cached"));
        assert!(cache.get(&params("rust")).is_none());
    }
}
