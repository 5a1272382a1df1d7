use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use ember::classify::download;
use ember::classify::emotion::OnnxEmotionClassifier;
use ember::classify::toxicity::OnnxToxicityScorer;
use ember::config::Config;
use ember::pipeline::AnalysisSession;
use ember::reddit::cache::FetchParams;
use ember::reddit::client::RedditClient;
use ember::reddit::posts::{SortKind, TimeWindow};

/// Ember: comment insight analysis for Reddit communities.
///
/// Fetches posts and comments from a subreddit, flags toxic comments,
/// counts comment emotions, and ranks the words a thread keeps using.
#[derive(Parser)]
#[command(name = "ember", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts from one or more subreddits and analyze their comments
    Analyze {
        /// Subreddits to analyze (with or without the r/ prefix)
        #[arg(default_value = "AskReddit", num_args = 1..)]
        subreddits: Vec<String>,

        /// Listing sort order
        #[arg(long, value_enum, default_value = "hot")]
        sort: SortKind,

        /// Time window — only meaningful with --sort top
        #[arg(long, value_enum, default_value = "day")]
        time: TimeWindow,

        /// Number of posts to fetch
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=20))]
        limit: u32,

        /// Bypass the fetch cache for this run
        #[arg(long)]
        refresh: bool,
    },

    /// Download the ONNX toxicity and emotion models (~210 MB total)
    DownloadModels,

    /// Check credential and model readiness
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ember=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            subreddits,
            sort,
            time,
            limit,
            refresh,
        } => {
            let config = Config::load()?;
            // Startup checks are the only errors allowed to halt anything;
            // past this point a run always completes.
            config.require_reddit()?;
            config.require_models()?;

            let mut names = Vec::new();
            for raw in &subreddits {
                let name = raw.trim().trim_start_matches("r/").to_string();
                if name.is_empty() {
                    anyhow::bail!("Subreddit name is empty");
                }
                names.push(name);
            }

            let client = RedditClient::new(&config)?;

            println!("Loading classifier models...");
            let toxicity = OnnxToxicityScorer::load(&download::toxicity_model_dir(
                &config.model_dir,
            ))?;
            let emotion = OnnxEmotionClassifier::load(&download::emotion_model_dir(
                &config.model_dir,
            ))?;
            info!("Classifier models ready");

            // One session for the whole invocation: repeated subreddits
            // hit the fetch cache instead of the API.
            let session = AnalysisSession::new(client, Box::new(toxicity), Box::new(emotion));

            for subreddit in names {
                let params = FetchParams {
                    subreddit,
                    sort,
                    time,
                    limit,
                };

                println!(
                    "Analyzing r/{} ({}, {} posts)...",
                    params.subreddit,
                    params.sort.as_str(),
                    params.limit
                );

                let report = ember::pipeline::analyze::run(&session, &params, refresh).await;
                ember::output::terminal::display_run_report(&report);
            }
        }

        Commands::DownloadModels => {
            let config = Config::load()?;

            println!("Downloading ONNX models...");
            println!("  Destination: {}", config.model_dir.display());

            download::download_models(&config.model_dir).await?;

            println!("\n{}", "Models downloaded successfully.".bold());
            println!("You can now run `ember analyze <subreddit>`.");
        }

        Commands::Check => {
            let config = Config::load()?;

            println!("{}", "=== Ember readiness ===".bold());

            let cred_line = |name: &str, set: bool| {
                if set {
                    println!("  {} {name}", "✓".green());
                } else {
                    println!("  {} {name} (not set)", "✗".red());
                }
            };
            cred_line("REDDIT_CLIENT_ID", !config.reddit_client_id.is_empty());
            cred_line(
                "REDDIT_CLIENT_SECRET",
                !config.reddit_client_secret.is_empty(),
            );
            println!("  {} user agent: {}", "·".dimmed(), config.reddit_user_agent);

            println!("  Model directory: {}", config.model_dir.display());
            let model_line = |name: &str, present: bool| {
                if present {
                    println!("  {} {name} model", "✓".green());
                } else {
                    println!(
                        "  {} {name} model missing — run `ember download-models`",
                        "✗".red()
                    );
                }
            };
            model_line(
                "toxicity",
                download::toxicity_files_present(&config.model_dir),
            );
            model_line("emotion", download::emotion_files_present(&config.model_dir));

            if config.require_reddit().is_ok() && config.require_models().is_ok() {
                println!("\n{}", "Ready. Run `ember analyze <subreddit>`.".green());
            }
        }
    }

    Ok(())
}
