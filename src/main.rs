mod demo;

use anyhow::Context;
use clap::{Parser, Subcommand};
use donation_ledger::DonationLedger;
use embedding_engine::{Recommender, TextVectorizer};
use embedding_provider::OpenAiEmbeddingProvider;
use givewise_core::{AppConfig, ErrorExt, ErrorReporter, Post};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "givewise=info,embedding_engine=info,embedding_provider=info,donation_ledger=info";

#[derive(Debug, Parser)]
#[command(name = "givewise", version, about = "Donation-based post recommendations")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "GIVEWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the donation ledger database URL
    #[arg(long, env = "GIVEWISE_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the posts in the catalog
    Posts {
        /// JSON file with an array of posts; defaults to the demo catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Record a donation to a post
    Donate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        post: String,
        #[arg(long)]
        amount: f64,
    },
    /// List a user's donations
    Donations {
        #[arg(long)]
        user: String,
    },
    /// Recommend posts from a user's donation history
    Recommend {
        #[arg(long)]
        user: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print recommendations as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path).map_err(|e| {
            e.log_error();
            anyhow::anyhow!(e.user_friendly_message())
        })?,
        None => AppConfig::default(),
    };

    let database_url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| config.ledger.database_url.clone());
    let mut ledger = DonationLedger::new(database_url);
    if let Err(e) = ledger.connect().await {
        ErrorReporter::new().report_error(&e);
        return Err(e).context("could not open the donation ledger");
    }
    ledger
        .run_migrations()
        .await
        .context("could not prepare the donation ledger")?;

    match cli.command {
        Command::Posts { catalog } => {
            for post in load_catalog(catalog.as_deref())? {
                println!(
                    "{:<14} {:<22} {}",
                    post.id, post.organization_name, post.title
                );
            }
        }
        Command::Donate { user, post, amount } => {
            let record = ledger
                .record_donation(&user, &post, amount)
                .await
                .context("could not record donation")?;
            println!(
                "Recorded ${:.2} from {} to {} ({})",
                record.amount, record.user_id, record.post_id, record.id
            );
        }
        Command::Donations { user } => {
            let donations = ledger
                .user_donations(&user)
                .await
                .context("could not load donations")?;
            if donations.is_empty() {
                println!("{} has not donated yet", user);
            }
            for donation in donations {
                println!(
                    "{}  {:<14} ${:.2}",
                    donation.donated_at.format("%Y-%m-%d %H:%M"),
                    donation.post_id,
                    donation.amount
                );
            }
        }
        Command::Recommend {
            user,
            limit,
            catalog,
            json,
        } => {
            let posts = load_catalog(catalog.as_deref())?;
            let recommender = Recommender::new(build_vectorizer(&config)?, Arc::new(ledger))
                .with_config(&config.recommendations);

            let recommendations = match limit {
                Some(limit) => recommender.get_recommended_posts(&user, &posts, limit).await,
                None => recommender.recommend(&user, &posts).await,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&recommendations)?);
            } else if recommendations.is_empty() {
                println!("No recommendations yet. Donate to a post to personalize them.");
            } else {
                for rec in &recommendations {
                    println!(
                        "{:>5.1}%  {:<14} {}",
                        rec.similarity * 100.0,
                        rec.post.id,
                        rec.post.title
                    );
                }
            }
        }
    }

    Ok(())
}

fn build_vectorizer(config: &AppConfig) -> anyhow::Result<TextVectorizer> {
    match config.embedding.api_key() {
        Ok(api_key) => {
            let provider = OpenAiEmbeddingProvider::new(api_key, &config.embedding)
                .context("could not create the embedding provider")?;
            tracing::info!(
                "Using {} for embeddings via {}",
                config.embedding.model,
                provider.endpoint()
            );
            Ok(TextVectorizer::with_provider(
                Arc::new(provider),
                config.embedding.model.clone(),
            ))
        }
        Err(missing) => {
            missing.log_warn();
            tracing::warn!("No embedding provider configured. Using fallback embeddings.");
            Ok(TextVectorizer::fallback_only())
        }
    }
}

fn load_catalog(path: Option<&Path>) -> anyhow::Result<Vec<Post>> {
    let Some(path) = path else {
        return Ok(demo::demo_posts());
    };

    givewise_core::load_posts(path).map_err(|e| {
        e.log_error();
        anyhow::anyhow!("{} ({})", e.user_friendly_message(), path.display())
    })
}
