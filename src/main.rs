//! Wikiscout main entry point
//!
//! Command-line front end for the wiki crawler and query engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wikiscout::config::load_config;
use wikiscout::query::{QueryEngine, Style, RESULTS_PER_PAGE};
use wikiscout::{ArticleSummary, Config, PreferenceStore, ProfileKind, WikiClient};

/// Wikiscout: crawl, cache, and query a Wikidot-style wiki
///
/// Wikiscout walks the wiki's paginated article listing, keeps a
/// manifest-validated document cache, and answers article lookups the
/// way a chat front end would ask them.
#[derive(Parser, Debug)]
#[command(name = "wikiscout")]
#[command(version = "0.3.0")]
#[command(about = "Crawl, cache, and query a Wikidot-style wiki", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Caller id the profile preference is looked up under
    #[arg(short, long, value_name = "ID", default_value = "local")]
    user: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show a random article
    Random,

    /// Find an article by title (whole-word match)
    Search {
        /// Title words to look for
        #[arg(value_name = "TITLE", required = true)]
        title: Vec<String>,
    },

    /// List articles carrying every given tag
    Tags {
        /// Tags an article must all carry
        #[arg(value_name = "TAG", required = true)]
        tags: Vec<String>,
    },

    /// Search article text and rank matches by occurrence count
    Fullsearch {
        /// Text to search for
        #[arg(value_name = "TEXT", required = true)]
        query: Vec<String>,
    },

    /// Set the caller's endpoint profile
    SetProfile {
        /// Profile name: primary or mirror
        #[arg(value_name = "PROFILE")]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let prefs = PreferenceStore::new(&config.prefs.path);

    match cli.command {
        Command::Random => handle_random(&build_engine(&config, &prefs, &cli.user)?).await,
        Command::Search { title } => {
            handle_search(&build_engine(&config, &prefs, &cli.user)?, &title.join(" ")).await
        }
        Command::Tags { tags } => {
            handle_tags(&build_engine(&config, &prefs, &cli.user)?, &tags).await
        }
        Command::Fullsearch { query } => {
            handle_fullsearch(&build_engine(&config, &prefs, &cli.user)?, &query.join(" ")).await
        }
        Command::SetProfile { profile } => handle_set_profile(&prefs, &cli.user, &profile),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wikiscout=info,warn"),
            1 => EnvFilter::new("wikiscout=debug,info"),
            2 => EnvFilter::new("wikiscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds a query engine on the caller's preferred endpoint profile
fn build_engine(
    config: &Config,
    prefs: &PreferenceStore,
    user: &str,
) -> anyhow::Result<QueryEngine> {
    let profile = prefs.profile_for(user);
    tracing::info!("using profile '{}' for caller {}", profile, user);

    let client = Arc::new(WikiClient::new(config, profile)?);
    Ok(QueryEngine::new(client))
}

/// Handles the `random` command
async fn handle_random(engine: &QueryEngine) -> anyhow::Result<()> {
    match engine.random_page().await? {
        Some(article) => print_article(&article),
        None => println!("The wiki offered no eligible articles."),
    }

    Ok(())
}

/// Handles the `search` command
async fn handle_search(engine: &QueryEngine, title: &str) -> anyhow::Result<()> {
    match engine.find_by_title(title).await? {
        Some(article) => print_article(&article),
        None => println!("Nothing found for '{}'.", title),
    }

    Ok(())
}

/// Handles the `tags` command
async fn handle_tags(engine: &QueryEngine, tags: &[String]) -> anyhow::Result<()> {
    let matches = engine.search_by_tags(tags).await?;

    if matches.is_empty() {
        println!("No articles carry all of: {}", tags.join(", "));
        return Ok(());
    }

    println!("Articles tagged {}:", tags.join(", "));
    for link in &matches {
        println!("  - {} ({})", link.title, link.url);
    }

    Ok(())
}

/// Handles the `fullsearch` command, printing ranked hits in pages
async fn handle_fullsearch(engine: &QueryEngine, query: &str) -> anyhow::Result<()> {
    let hits = engine.full_text_search(query, Style::Markdown).await?;

    if hits.is_empty() {
        println!("Nothing found for '{}'.", query);
        return Ok(());
    }

    let pages = (hits.len() + RESULTS_PER_PAGE - 1) / RESULTS_PER_PAGE;
    for (page, chunk) in hits.chunks(RESULTS_PER_PAGE).enumerate() {
        println!("Page {}/{}", page + 1, pages);
        for hit in chunk {
            println!("  {} ({} matches)", hit.title, hit.score);
            if !hit.snippet.is_empty() {
                println!("    {}", hit.snippet);
            }
            println!("    {}", hit.url);
        }
    }

    Ok(())
}

/// Handles the `set-profile` command
fn handle_set_profile(prefs: &PreferenceStore, user: &str, profile: &str) -> anyhow::Result<()> {
    let kind = match ProfileKind::from_name(profile) {
        Some(kind) => kind,
        None => anyhow::bail!("unknown profile '{}', expected 'primary' or 'mirror'", profile),
    };

    prefs.set_profile(user, kind)?;
    println!("Profile for {} set to {}.", user, kind);

    Ok(())
}

/// Prints one article the way every lookup command shows it
fn print_article(article: &ArticleSummary) {
    println!("{}", article.title);
    match &article.summary {
        Some(summary) => println!("{}", summary),
        None => println!("(no content found)"),
    }
    println!("{}", article.url);
}
