// Colored terminal output for analysis runs.
//
// This module handles all terminal-specific formatting: colors, histogram
// bars, previews. It renders the RunReport the pipeline produced — the
// closest thing Ember has to the original dashboard's output surface.

use chrono::DateTime;
use colored::Colorize;

use crate::analysis::aggregate::PostSummary;
use crate::classify::traits::Emotion;
use crate::pipeline::analyze::RunReport;

/// Width of the longest emotion label, for histogram alignment.
const EMOTION_LABEL_WIDTH: usize = 8;

/// Maximum histogram bar width in characters.
const BAR_WIDTH: u32 = 30;

/// Render a full analysis run.
pub fn display_run_report(report: &RunReport) {
    if let Some(error) = &report.fetch_error {
        println!(
            "\n{} {}",
            "Warning:".yellow().bold(),
            format!("fetch failed — {error}").yellow()
        );
    }

    if report.posts.is_empty() {
        println!(
            "No posts found for r/{}. Try a different subreddit or filter.",
            report.params.subreddit
        );
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== r/{} ({}) — {} posts ===",
            report.params.subreddit,
            report.params.sort.as_str(),
            report.stats.post_count
        )
        .bold()
    );
    if report.from_cache {
        println!("{}", "  (served from fetch cache)".dimmed());
    }

    println!("  Total comments:    {}", report.stats.total_comments);
    println!("  Average score:     {:.1}", report.stats.avg_score);
    println!("  Comments per post: {:.1}", report.stats.comments_per_post);

    for (i, summary) in report.posts.iter().enumerate() {
        display_post_summary(i + 1, summary);
    }
}

/// Render one post's summary: toxic comments, emotion histogram, top words.
fn display_post_summary(rank: usize, summary: &PostSummary) {
    println!(
        "\n{}",
        format!("{rank}. {}", super::truncate_chars(&summary.title, 90)).bold()
    );
    println!(
        "   {}",
        format!(
            "score {}  |  {} comments  |  {}",
            summary.score,
            summary.comment_count,
            format_date(summary.created_utc)
        )
        .dimmed()
    );
    if !summary.url.is_empty() {
        println!("   {}", summary.url.dimmed());
    }

    // Toxicity
    if summary.toxic_comments.is_empty() {
        println!("   {}", "No comments above the toxicity threshold".green());
    } else {
        println!(
            "   {}",
            format!("{} toxic comments:", summary.toxic_comments.len())
                .red()
                .bold()
        );
        for (i, comment) in summary.toxic_comments.iter().enumerate() {
            println!(
                "     {}. [{:.2}] {}",
                i + 1,
                comment.confidence,
                super::truncate_chars(&comment.text, 120).dimmed()
            );
        }
    }

    // Emotions
    let classified = summary.emotions.total();
    if classified > 0 {
        println!("   Emotions ({classified} comments classified):");
        let max = summary.emotions.max_count().max(1);
        let width = EMOTION_LABEL_WIDTH;
        for (emotion, count) in summary.emotions.iter() {
            if count == 0 {
                continue;
            }
            let bar_len = (count * BAR_WIDTH).div_ceil(max);
            let bar = "#".repeat(bar_len as usize);
            println!(
                "     {:<width$} {} {}",
                emotion.as_str(),
                colorize_emotion(emotion, &bar),
                count
            );
        }
    } else {
        println!("   {}", "No comments long enough to classify".dimmed());
    }

    // Word frequencies
    match &summary.wordcloud {
        Some(cloud) => {
            let preview: Vec<String> = cloud
                .top(10)
                .iter()
                .map(|w| format!("{}({})", w.word, w.count))
                .collect();
            println!("   Top words: {}", preview.join("  ").cyan());
        }
        None => {
            println!("   {}", "Not enough text for a word cloud".dimmed());
        }
    }
}

fn format_date(created_utc: f64) -> String {
    DateTime::from_timestamp(created_utc as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

fn colorize_emotion(emotion: Emotion, bar: &str) -> colored::ColoredString {
    match emotion {
        Emotion::Anger => bar.red(),
        Emotion::Disgust => bar.green(),
        Emotion::Fear => bar.magenta(),
        Emotion::Joy => bar.yellow(),
        Emotion::Neutral => bar.dimmed(),
        Emotion::Sadness => bar.blue(),
        Emotion::Surprise => bar.cyan(),
    }
}
