// Word-frequency model for one post's comments.
//
// Ember builds the ranked frequency table; laying words out as a raster is
// the presentation layer's problem. Generic English stop words come from
// the stop-words crate, topped up with words that dominate every Reddit
// thread regardless of subject.

use std::collections::{HashMap, HashSet};

use regex_lite::Regex;
use stop_words::{get, LANGUAGE};

/// Below this many joined characters there's no signal worth ranking.
pub const MIN_TEXT_CHARS: usize = 10;

/// Cap on distinct words in the model.
pub const MAX_WORDS: usize = 100;

/// Words common to all Reddit comment threads, excluded on top of the
/// generic English stop list.
const DOMAIN_STOP_WORDS: [&str; 8] = [
    "reddit", "post", "comment", "think", "people", "would", "could", "really",
];

/// One ranked word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordWeight {
    pub word: String,
    pub count: u32,
}

/// Ranked word frequencies, descending by count (ties alphabetical).
#[derive(Debug, Clone)]
pub struct WordCloud {
    pub words: Vec<WordWeight>,
}

impl WordCloud {
    /// The `n` heaviest words.
    pub fn top(&self, n: usize) -> &[WordWeight] {
        &self.words[..self.words.len().min(n)]
    }
}

/// Build the word-frequency model from a post's comments.
///
/// Returns `None` when the joined text is too short or nothing survives
/// stop-word filtering — "no image" rather than an error, so a sparse
/// thread never breaks the rest of the post's summary.
pub fn build_wordcloud(comments: &[String]) -> Option<WordCloud> {
    let text = comments
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.chars().count() < MIN_TEXT_CHARS {
        return None;
    }

    // ASCII-only: regex-lite carries no Unicode character classes, and the
    // stop lists are English. Single-letter tokens carry no ranking signal.
    let word_re = Regex::new(r"[a-z][a-z']+").expect("static pattern");

    let mut stops: HashSet<String> = get(LANGUAGE::English).into_iter().collect();
    stops.extend(DOMAIN_STOP_WORDS.iter().map(|w| w.to_string()));

    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for m in word_re.find_iter(&lowered) {
        let word = m.as_str();
        if stops.contains(word) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    if counts.is_empty() {
        return None;
    }

    let mut words: Vec<WordWeight> = counts
        .into_iter()
        .map(|(word, count)| WordWeight {
            word: word.to_string(),
            count,
        })
        .collect();

    // Deterministic ranking: count descending, then alphabetical.
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(MAX_WORDS);

    Some(WordCloud { words })
}
