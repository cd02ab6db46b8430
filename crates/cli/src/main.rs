use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{DataIndex, Genre, classify_title};
use server::{LookupForm, LookupService, ResultSession, ServiceConfig, SubmitResponse};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Maximum number of rows printed by `search`
const SEARCH_LIMIT: usize = 20;

/// ShelfRecs - Book Recommendation Resolver
#[derive(Parser)]
#[command(name = "shelf-recs")]
#[command(about = "Genre-aware book recommendations blended with collaborative filtering", long_about = None)]
struct Cli {
    /// Directory holding books.csv and ratings.csv (overrides SHELF_RECS_DATA_DIR)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Predictor model JSON (overrides SHELF_RECS_MODEL_PATH)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend books similar to one you have read
    Recommend {
        /// Title (or part of a title) of a book you have read
        #[arg(long)]
        title: String,

        /// Your rating of that book, from 0 to 10
        #[arg(long, allow_hyphen_values = true)]
        rating: String,

        /// Genre to recommend from
        #[arg(long)]
        genre: String,
    },

    /// Search the catalog by title
    Search {
        /// Title fragment (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Show which genre a title is classified as
    Classify {
        #[arg(long)]
        title: String,
    },

    /// List the accepted genre labels
    Genres,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend { title, rating, genre } => {
            let config = load_config(cli.data_dir, cli.model)?;
            handle_recommend(&config, LookupForm::new(title, rating, genre))?
        }
        Commands::Search { title } => {
            let config = load_config(cli.data_dir, cli.model)?;
            handle_search(&config, &title)?
        }
        Commands::Classify { title } => handle_classify(&title),
        Commands::Genres => handle_genres(),
    }

    Ok(())
}

/// Environment configuration with command-line overrides applied
fn load_config(data_dir: Option<PathBuf>, model: Option<PathBuf>) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_env()?;
    apply_overrides(&mut config, data_dir, model);
    debug!("Using config {:?}", config);
    Ok(config)
}

fn apply_overrides(config: &mut ServiceConfig, data_dir: Option<PathBuf>, model: Option<PathBuf>) {
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    if let Some(model) = model {
        config.model_path = model;
    }
}

/// Handle the 'recommend' command
fn handle_recommend(config: &ServiceConfig, form: LookupForm) -> Result<()> {
    println!("Loading dataset from {}...", config.data_dir.display());
    let start = Instant::now();
    let service = LookupService::load(config)?;
    println!("{} Loaded dataset and model in {:?}", "✓".green(), start.elapsed());

    let mut session = ResultSession::new();
    match service.submit_lookup(&mut session, &form) {
        SubmitResponse::RedirectToResults => print_results(&service, &session),
        SubmitResponse::Error(message) => println!("{} {}", "✗".red(), message.red()),
    }
    Ok(())
}

/// Render the results page
fn print_results(service: &LookupService, session: &ResultSession) {
    let view = service.view_results(session);

    println!("{}", "Book Recommendations".bold().blue());
    if let Some(input_rating) = view.input_rating {
        println!("Your rating: {}", input_rating);
    }

    if let Some(message) = view.message {
        println!("{}", message.yellow());
        return;
    }

    for (rank, (title, score)) in view.recommendations.iter().enumerate() {
        println!("{}. {} - Score: {:.2}", (rank + 1).to_string().green(), title, score);
    }
}

/// Handle the 'search' command
fn handle_search(config: &ServiceConfig, title: &str) -> Result<()> {
    let data_index = DataIndex::load_from_files(&config.data_dir)
        .with_context(|| format!("Failed to load dataset from {}", config.data_dir.display()))?;

    let matches: Vec<_> = sources::find_matches(&data_index, title).collect();
    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("{}", "No matching titles.".yellow());
        return Ok(());
    }

    for book in matches.iter().take(SEARCH_LIMIT) {
        let average = match data_index.get_book_stats(&book.id) {
            Some(stats) => format!("avg {:.2} ({} ratings)", stats.avg_rating, stats.rating_count),
            None => "unrated".to_string(),
        };
        println!("{}: {} [{}] {}", book.id, book.title, book.genre, average);
    }
    if matches.len() > SEARCH_LIMIT {
        println!("... and {} more", matches.len() - SEARCH_LIMIT);
    }
    Ok(())
}

/// Handle the 'classify' command
fn handle_classify(title: &str) {
    println!("{}", classify_title(Some(title)));
}

/// Handle the 'genres' command
fn handle_genres() {
    for genre in Genre::ALL {
        println!("{}", genre);
    }
}
