// Analysis pipeline — the once-per-process session object and the run loop.

pub mod analyze;

use crate::classify::traits::{EmotionClassifier, ToxicityScorer};
use crate::reddit::cache::FetchCache;
use crate::reddit::client::RedditClient;

/// Capability object for analysis runs.
///
/// Built once at startup after the expensive pieces are ready: an
/// authenticated Reddit client and both loaded classifier models. The
/// fetch cache is the only mutable state and handles its own locking,
/// so the session is shared by reference.
pub struct AnalysisSession {
    pub client: RedditClient,
    pub toxicity: Box<dyn ToxicityScorer>,
    pub emotion: Box<dyn EmotionClassifier>,
    pub cache: FetchCache,
}

impl AnalysisSession {
    pub fn new(
        client: RedditClient,
        toxicity: Box<dyn ToxicityScorer>,
        emotion: Box<dyn EmotionClassifier>,
    ) -> Self {
        Self {
            client,
            toxicity,
            emotion,
            cache: FetchCache::new(),
        }
    }
}
