//! CLI module for Versify.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Versify - lyrics from uploaded songs
///
/// Keeps a catalog of uploaded songs and generates lyrics for them by
/// transcribing the audio and handing the transcript to a language model.
#[derive(Parser, Debug)]
#[command(name = "versify")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload an audio file into the catalog
    Add {
        /// Audio file to upload
        file: String,

        /// Song title
        #[arg(short, long)]
        title: String,

        /// Artist name
        #[arg(short, long)]
        artist: String,

        /// Genre
        #[arg(short, long)]
        genre: Option<String>,

        /// Language of the vocals
        #[arg(short, long)]
        language: Option<String>,

        /// Id of the uploading user
        #[arg(long)]
        uploader: Option<i64>,

        /// Generate lyrics right after the upload
        #[arg(long)]
        generate: bool,
    },

    /// List songs in the catalog
    List,

    /// Show one song and its lyrics
    Show {
        /// Song id
        id: i64,
    },

    /// Generate (or regenerate) lyrics for a song
    Lyrics {
        /// Song id
        id: i64,

        /// Audio to transcribe instead of the song's stored file
        #[arg(long)]
        audio: Option<String>,
    },

    /// Remove a song from the catalog
    Remove {
        /// Song id
        id: i64,

        /// Leave the uploaded audio file on disk
        #[arg(long)]
        keep_file: bool,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
