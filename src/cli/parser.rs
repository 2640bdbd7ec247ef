//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::config::SummaryConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// recap-rs: summarize long video transcripts.
///
/// Splits a transcript into overlapping chunks, summarizes them
/// concurrently with a shared model, and merges the results.
#[derive(Parser, Debug)]
#[command(name = "recap-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a JSON configuration file.
    ///
    /// Flags given on the command line override values from the file.
    #[arg(short, long, global = true, env = "RECAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a transcript.
    ///
    /// Reads the transcript from a file, from stdin (`-`), or from a
    /// directory of saved transcripts by video id.
    Summarize {
        /// Transcript file, or `-` for stdin.
        #[arg(conflicts_with = "video_id")]
        input: Option<PathBuf>,

        /// Video id to look up in the transcript directory.
        #[arg(long, requires = "transcript_dir")]
        video_id: Option<String>,

        /// Directory of saved transcripts named `<video_id>.txt`.
        #[arg(long, env = "RECAP_TRANSCRIPT_DIR")]
        transcript_dir: Option<PathBuf>,

        /// Inference backend (extractive, openai).
        #[arg(short, long, env = "RECAP_BACKEND")]
        backend: Option<String>,

        /// Include per-chunk results in the output.
        #[arg(short, long)]
        diagnostics: bool,

        /// Also write the summary text to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pipeline settings.
        #[command(flatten)]
        options: ConfigArgs,
    },

    /// Split a transcript into chunks without summarizing.
    Segment {
        /// Transcript file, or `-` for stdin.
        input: PathBuf,

        /// Write each chunk to `<out-dir>/<prefix>_NNNN.txt`.
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// File name prefix for written chunks.
        #[arg(long, default_value = "chunk")]
        prefix: String,

        /// Pipeline settings.
        #[command(flatten)]
        options: ConfigArgs,
    },

    /// Show the effective configuration.
    Config {
        /// Pipeline settings.
        #[command(flatten)]
        options: ConfigArgs,
    },

    /// List available backends and tokenizers.
    Backends,
}

/// Configuration overrides shared by the pipeline commands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArgs {
    /// Maximum words per chunk.
    #[arg(long)]
    pub max_chunk_words: Option<usize>,

    /// Sentences carried from one chunk into the next.
    #[arg(long)]
    pub overlap_sentences: Option<usize>,

    /// Chunks summarized concurrently.
    #[arg(short = 'j', long, env = "RECAP_WORKERS")]
    pub workers: Option<usize>,

    /// Seconds of inactivity before the model is unloaded.
    #[arg(long)]
    pub idle_unload_seconds: Option<u64>,

    /// Joined summary length, in words, above which a second pass runs.
    #[arg(long)]
    pub coherence_threshold_words: Option<usize>,

    /// Second-pass maximum length in words.
    #[arg(long)]
    pub second_stage_max_length: Option<usize>,

    /// Second-pass minimum length in words.
    #[arg(long)]
    pub second_stage_min_length: Option<usize>,

    /// Budget for a single chunk's inference call, in milliseconds.
    #[arg(long)]
    pub per_chunk_timeout_ms: Option<u64>,

    /// Stop starting new chunks after this many milliseconds.
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,

    /// Sentence tokenizer (punctuation, unicode).
    #[arg(long)]
    pub tokenizer: Option<String>,
}

impl ConfigArgs {
    /// Applies the flags that were given on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: SummaryConfig) -> SummaryConfig {
        if let Some(v) = self.max_chunk_words {
            config.max_chunk_words = v;
        }
        if let Some(v) = self.overlap_sentences {
            config.overlap_sentences = v;
        }
        if let Some(v) = self.workers {
            config.worker_count = v;
        }
        if let Some(v) = self.idle_unload_seconds {
            config.idle_unload_seconds = v;
        }
        if let Some(v) = self.coherence_threshold_words {
            config.coherence_threshold_words = v;
        }
        if let Some(v) = self.second_stage_max_length {
            config.second_stage_max_length = v;
        }
        if let Some(v) = self.second_stage_min_length {
            config.second_stage_min_length = v;
        }
        if self.per_chunk_timeout_ms.is_some() {
            config.per_chunk_timeout_ms = self.per_chunk_timeout_ms;
        }
        if self.request_timeout_ms.is_some() {
            config.request_timeout_ms = self.request_timeout_ms;
        }
        if let Some(v) = &self.tokenizer {
            config.tokenizer.clone_from(v);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        // Test that CLI can be created
        Cli::command().debug_assert();
    }

    #[test]
    fn test_summarize_flags() {
        let cli = Cli::try_parse_from([
            "recap-rs",
            "--format",
            "json",
            "summarize",
            "talk.txt",
            "--max-chunk-words",
            "200",
            "-j",
            "6",
            "--diagnostics",
        ])
        .unwrap();

        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Summarize {
                input,
                diagnostics,
                options,
                ..
            } => {
                assert_eq!(input, Some(PathBuf::from("talk.txt")));
                assert!(diagnostics);
                assert_eq!(options.max_chunk_words, Some(200));
                assert_eq!(options.workers, Some(6));
            }
            _ => unreachable!("Expected Summarize command"),
        }
    }

    #[test]
    fn test_video_id_requires_transcript_dir() {
        let result = Cli::try_parse_from(["recap-rs", "summarize", "--video-id", "dQw4w9WgXcQ"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_video_id_conflicts_with_input() {
        let result = Cli::try_parse_from([
            "recap-rs",
            "summarize",
            "talk.txt",
            "--video-id",
            "dQw4w9WgXcQ",
            "--transcript-dir",
            "transcripts",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_args_override_only_given_values() {
        let args = ConfigArgs {
            overlap_sentences: Some(3),
            per_chunk_timeout_ms: Some(2500),
            tokenizer: Some("unicode".to_string()),
            ..ConfigArgs::default()
        };
        let base = SummaryConfig::default().with_max_chunk_words(250);
        let config = args.apply(base);

        assert_eq!(config.max_chunk_words, 250);
        assert_eq!(config.overlap_sentences, 3);
        assert_eq!(config.per_chunk_timeout_ms, Some(2500));
        assert_eq!(config.tokenizer, "unicode");
        assert_eq!(config.worker_count, 4);
    }
}
