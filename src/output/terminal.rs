// Colored terminal output for ranked candidates and id windows.
//
// main.rs delegates all human-readable printing here; `--json` output is
// produced with serde_json directly in main.rs.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::ids::{SourceEmbeddingId, TweetId};
use crate::pipeline::batch::BatchResult;
use crate::scoring::ann::ScoredTweet;
use crate::scoring::stats::StatsSnapshot;
use crate::scoring::window::CandidateWindow;
use crate::scoring::{ScoringAlgorithm, ScoringConfig};
use crate::snowflake;

/// Display the top `limit` candidates for one source.
pub fn display_ranked(
    source_id: &SourceEmbeddingId,
    algorithm: ScoringAlgorithm,
    candidates: &[ScoredTweet],
    limit: usize,
    now: DateTime<Utc>,
) {
    println!(
        "\n{}",
        format!(
            "=== Candidates for {} ({}, {} found) ===",
            source_id,
            algorithm,
            candidates.len()
        )
        .bold()
    );

    if candidates.is_empty() {
        println!("  No candidates. Check the age window and that the source shares clusters with the pool.");
        return;
    }

    println!();
    println!(
        "  {:>4}  {:<20} {:>10}  {:>8}",
        "Rank".dimmed(),
        "Tweet".dimmed(),
        "Score".dimmed(),
        "Age".dimmed(),
    );
    println!("  {}", "-".repeat(48).dimmed());

    let top_score = candidates[0].score;
    for (i, candidate) in candidates.iter().take(limit).enumerate() {
        let score = format!("{:>10.4}", candidate.score);
        let score = colorize_score(&score, candidate.score, top_score);
        println!(
            "  {:>4}. {:<20} {}  {:>8}",
            i + 1,
            candidate.tweet_id,
            score,
            super::format_age(candidate.tweet_id, now),
        );
    }

    if candidates.len() > limit {
        println!(
            "  {}",
            format!("... {} more (use --limit to show more)", candidates.len() - limit).dimmed()
        );
    }
}

/// Display per-source results of a batch run, then the stats summary.
pub fn display_batch(
    results: &[BatchResult],
    algorithm: ScoringAlgorithm,
    stats: StatsSnapshot,
    limit: usize,
    now: DateTime<Utc>,
) {
    for result in results {
        display_ranked(&result.source_id, algorithm, &result.candidates, limit, now);
    }

    println!("\n{}", "=== Batch Summary ===".bold());
    println!("  Sources scored: {}", stats.calls);
    println!(
        "  Candidates found: {} total, {:.1} mean, {} max",
        stats.total,
        stats.mean(),
        stats.max
    );
    let empty = results.iter().filter(|r| r.candidates.is_empty()).count();
    if empty > 0 {
        println!("  {} {} sources with no candidates", "~".yellow(), empty);
    }
}

/// Display the id window a config resolves to as of `now`.
pub fn display_window(window: &CandidateWindow, config: &ScoringConfig, now: DateTime<Utc>) {
    println!("\n{}", format!("=== Candidate Window as of {now} ===").bold());
    println!(
        "  Age: {}h to {}",
        config.min_tweet_candidate_age_hours(),
        if config.unbounded_max_age() {
            "unbounded".to_string()
        } else {
            format!("{}h", config.max_tweet_candidate_age_hours())
        }
    );
    println!(
        "  Earliest id: {:<20} {}",
        window.earliest_allowed_id,
        describe_id(window.earliest_allowed_id).dimmed()
    );
    println!(
        "  Latest id:   {:<20} {}",
        window.latest_allowed_id,
        describe_id(window.latest_allowed_id).dimmed()
    );
    if window.is_empty() {
        println!(
            "  {} min age exceeds max age; no candidate can pass",
            "!".bright_red()
        );
    }
}

fn describe_id(id: TweetId) -> String {
    if id == 0 {
        return "(no lower bound)".to_string();
    }
    snowflake::timestamp_of(id)
        .map(|t| format!("({})", t.format("%Y-%m-%d %H:%M:%S UTC")))
        .unwrap_or_default()
}

/// Color a formatted score by how close it is to the best score.
fn colorize_score(text: &str, score: f64, top_score: f64) -> colored::ColoredString {
    if top_score <= 0.0 {
        return text.normal();
    }
    let ratio = score / top_score;
    if ratio >= 0.75 {
        text.bright_green()
    } else if ratio >= 0.4 {
        text.yellow()
    } else {
        text.dimmed()
    }
}
