use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Srt,
}

#[derive(Parser)]
#[command(
    name = "ytkit",
    about = "YouTube video metadata, caption transcript, and watch-history extractor",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: text (default), json, srt
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Preferred caption language, repeatable, earliest first
    #[arg(short, long, global = true)]
    pub lang: Vec<String>,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Show fetch and output details on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch video metadata for a URL or video ID
    Info {
        /// YouTube video URL or video ID
        target: String,

        /// Skip transcript gathering
        #[arg(long)]
        no_transcript: bool,
    },

    /// Fetch caption transcripts for a URL or video ID
    Transcript {
        /// YouTube video URL or video ID
        target: String,

        /// Stop at the first track that yields a transcript
        #[arg(long)]
        first: bool,
    },

    /// Parse a Takeout watch-history export
    Activity {
        /// Path to the exported HTML file
        file: PathBuf,
    },
}
