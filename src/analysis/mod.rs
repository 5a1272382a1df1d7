// Aggregation — per-comment classifier outputs rolled up into per-post
// summaries and per-run statistics, plus the word-frequency builder.

pub mod aggregate;
pub mod wordcloud;
