mod aggregator;
mod article;
mod config;
mod criteria;
mod decoder;
mod error;
mod export;
mod geocode;
mod metadata;
mod orchestrator;
mod source;
mod sources;
mod web_server;

use crate::aggregator::ResultAggregator;
use crate::config::AppConfig;
use crate::criteria::SearchCriteria;
use crate::decoder::TagDecoder;
use crate::geocode::NominatimResolver;
use crate::orchestrator::{Orchestrator, RunOutcome, RunSource};
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Find news about a person or event from a photograph or search terms
#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search all sources with manual criteria
    Search {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        country: String,
        #[arg(long, default_value = "")]
        keywords: String,
        /// Save results to a .json or .csv file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a photograph's tags and search with them
    Photo {
        path: PathBuf,
        /// Save results to a .json or .csv file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the search API over HTTP
    Serve,
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let adapters = sources::build_adapters(config)?;
    Ok(Orchestrator::new(
        TagDecoder::new(config),
        Arc::new(NominatimResolver::new(config)?),
        ResultAggregator::new(adapters, config.source_timeout()),
        config.source_timeout(),
    ))
}

fn print_outcome(outcome: &RunOutcome) {
    if let Some(metadata) = &outcome.metadata {
        for (key, value) in metadata.display_entries() {
            println!("{}: {}", key, value);
        }
        println!();
    }

    if outcome.articles.is_empty() {
        println!("No articles found.");
    }
    for (i, article) in outcome.articles.iter().enumerate() {
        println!("Article {} ({}):", i + 1, article.source);
        println!("Title: {}", article.title);
        println!("Description: {}", article.description.as_deref().unwrap_or("No Description"));
        println!("{}", article.url);
        println!("{}", "-".repeat(80));
    }

    for diagnostic in &outcome.diagnostics {
        eprintln!("warning: {}: {}", diagnostic.source, diagnostic.message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::new()?;

    // Initialize env_logger based on config.log_level
    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting news_locator");

    let orchestrator = build_orchestrator(&config)?;

    let (source, output) = match cli.command {
        Command::Search { name, city, country, keywords, output } => {
            (RunSource::Criteria(SearchCriteria { name, city, country, keywords }), output)
        }
        Command::Photo { path, output } => (RunSource::Photograph(path), output),
        Command::Serve => {
            web_server::start_web_server(config.web_port, Arc::new(orchestrator)).await?;
            return Ok(());
        }
    };

    let outcome = orchestrator.run(source).await?;
    print_outcome(&outcome);

    if let Some(path) = output {
        export::save_articles(&outcome.articles, &path)?;
        println!("Results saved to {}", path.display());
    }

    info!("news_locator finished");

    Ok(())
}
