//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use newsdesk_core::search::{DEFAULT_MIN_SCORE, DEFAULT_RADIUS_KM};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "newsdesk")]
#[command(
    author,
    version,
    about = "Contextual news retrieval with LLM query analysis and summaries"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load articles from a JSON file or a directory of JSON files
    Ingest(IngestArgs),

    /// Show article store status
    Status,

    /// Ask a free-text question; intent decides how articles are retrieved
    Ask(AskArgs),

    /// Latest articles in a category
    Category(CategoryArgs),

    /// Text search over titles and descriptions
    Search(SearchArgs),

    /// Latest articles from a source
    Source(SourceArgs),

    /// Most relevant articles above a score threshold
    Score(ScoreArgs),

    /// Articles near a location
    Nearby(NearbyArgs),

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct IngestArgs {
    /// News data file or directory
    pub path: PathBuf,

    /// Remove existing articles first
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct AskArgs {
    /// Query text
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Latitude of the caller
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the caller
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Number of results (1-20, defaults to query.default_limit)
    #[arg(short = 'n')]
    pub limit: Option<usize>,

    /// Skip generated summaries
    #[arg(long)]
    pub no_summary: bool,

    /// Include query analysis and routing strategy
    #[arg(long)]
    pub analysis: bool,
}

#[derive(Args)]
pub struct CategoryArgs {
    /// Category tag
    pub category: String,

    /// Number of results
    #[arg(short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search text
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Source name or part of it
    pub source: String,

    /// Number of results
    #[arg(short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Minimum relevance score
    #[arg(long = "min", default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: f64,

    /// Number of results
    #[arg(short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct NearbyArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Radius in kilometers
    #[arg(long, default_value_t = DEFAULT_RADIUS_KM)]
    pub radius: f64,

    /// Number of results
    #[arg(short = 'n', default_value = "20")]
    pub limit: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
