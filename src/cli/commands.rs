//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::chunking::available_tokenizers;
use crate::cli::output::{
    OutputFormat, format_backends, format_chunks, format_config, format_summary,
};
use crate::cli::parser::{Cli, Commands, ConfigArgs};
use crate::config::SummaryConfig;
use crate::core::Transcript;
use crate::error::{CommandError, Result};
use crate::io::{DirectoryTranscriptSource, TranscriptSource, read_input, write_chunks, write_file};
use crate::model::{ModelLifecycleManager, available_backends, create_backend};
use crate::pipeline::TranscriptSummarizer;
use std::path::Path;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config_path = cli.config.as_deref();

    match &cli.command {
        Commands::Summarize {
            input,
            video_id,
            transcript_dir,
            backend,
            diagnostics,
            output,
            options,
        } => {
            let mut config = load_config(config_path, options)?;
            if let Some(name) = backend {
                config.backend.clone_from(name);
            }
            let text = read_transcript(
                input.as_deref(),
                video_id.as_deref(),
                transcript_dir.as_deref(),
            )?;
            cmd_summarize(&config, &text, *diagnostics, output.as_deref(), format)
        }
        Commands::Segment {
            input,
            out_dir,
            prefix,
            options,
        } => {
            let config = load_config(config_path, options)?;
            cmd_segment(&config, input, out_dir.as_deref(), prefix, format)
        }
        Commands::Config { options } => {
            let config = load_config(config_path, options)?;
            Ok(format_config(&config, format))
        }
        Commands::Backends => Ok(format_backends(
            &available_backends(),
            &available_tokenizers(),
            format,
        )),
    }
}

/// Resolves configuration: defaults, then the JSON file, then flags.
fn load_config(path: Option<&Path>, options: &ConfigArgs) -> Result<SummaryConfig> {
    let base = match path {
        Some(path) => SummaryConfig::from_file(path)?,
        None => SummaryConfig::default(),
    };
    let config = options.apply(base);
    config.validate()?;
    Ok(config)
}

fn read_transcript(
    input: Option<&Path>,
    video_id: Option<&str>,
    transcript_dir: Option<&Path>,
) -> Result<String> {
    match (input, video_id, transcript_dir) {
        (Some(path), _, _) => read_input(path),
        (None, Some(id), Some(dir)) => DirectoryTranscriptSource::new(dir).fetch(id),
        _ => Err(CommandError::MissingArgument(
            "<INPUT> or --video-id with --transcript-dir".to_string(),
        )
        .into()),
    }
}

fn cmd_summarize(
    config: &SummaryConfig,
    text: &str,
    diagnostics: bool,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let backend = create_backend(&config.backend)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CommandError::ExecutionFailed(format!("failed to start runtime: {e}")))?;

    let result = runtime.block_on(async {
        let manager = ModelLifecycleManager::new(backend, config.lifecycle());
        let _sweeper = manager.spawn_idle_sweeper();
        TranscriptSummarizer::new(manager, config)?
            .summarize_transcript(text)
            .await
    })?;

    if let Some(path) = output {
        write_file(path, &result.text)?;
    }
    Ok(format_summary(&result, diagnostics, format))
}

fn cmd_segment(
    config: &SummaryConfig,
    input: &Path,
    out_dir: Option<&Path>,
    prefix: &str,
    format: OutputFormat,
) -> Result<String> {
    if out_dir.is_some() && (prefix.is_empty() || prefix.contains(['/', '\\'])) {
        return Err(CommandError::InvalidArgument(format!(
            "--prefix must be a plain file name stem, got {prefix:?}"
        ))
        .into());
    }

    let text = read_input(input)?;
    let transcript = Transcript::parse(&text)?;
    let chunks = config.segmenter()?.segment(transcript.as_str());

    let written = match out_dir {
        Some(dir) => write_chunks(dir, &chunks, prefix)?,
        None => Vec::new(),
    };
    Ok(format_chunks(&chunks, &written, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TALK: &str = "Ownership is the core idea. Every value has one owner. \
                        Borrowing lets code use a value without owning it. \
                        The borrow checker enforces these rules at compile time.";

    fn setup() -> (TempDir, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("talk.txt");
        std::fs::write(&path, TALK).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_load_config_precedence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recap.json");
        std::fs::write(&path, r#"{"max_chunk_words": 120, "worker_count": 2}"#).unwrap();

        let options = ConfigArgs {
            workers: Some(8),
            ..ConfigArgs::default()
        };
        let config = load_config(Some(&path), &options).unwrap();
        assert_eq!(config.max_chunk_words, 120);
        assert_eq!(config.worker_count, 8);
    }

    #[test]
    fn test_load_config_rejects_invalid_override() {
        let options = ConfigArgs {
            max_chunk_words: Some(0),
            ..ConfigArgs::default()
        };
        assert!(load_config(None, &options).is_err());
    }

    #[test]
    fn test_read_transcript_requires_a_source() {
        let err = read_transcript(None, None, None).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Command(CommandError::MissingArgument(_))
        ));
    }

    #[test]
    fn test_read_transcript_by_video_id() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("dQw4w9WgXcQ.txt"), TALK).unwrap();

        let text = read_transcript(None, Some("dQw4w9WgXcQ"), Some(temp_dir.path())).unwrap();
        assert_eq!(text, TALK);
    }

    #[test]
    fn test_cmd_summarize() {
        let (_temp_dir, path) = setup();
        let text = read_input(&path).unwrap();
        let output = cmd_summarize(
            &SummaryConfig::default(),
            &text,
            false,
            None,
            OutputFormat::Text,
        )
        .unwrap();
        assert!(output.contains("Ownership is the core idea."));
    }

    #[test]
    fn test_cmd_summarize_writes_output_file() {
        let (temp_dir, path) = setup();
        let text = read_input(&path).unwrap();
        let out = temp_dir.path().join("out").join("summary.txt");

        let config = SummaryConfig::default().with_max_chunk_words(12);
        let output = cmd_summarize(&config, &text, true, Some(&out), OutputFormat::Json).unwrap();

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(json["chunk_diagnostics"].as_array().unwrap().len() > 1);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), json["text"]);
    }

    #[test]
    fn test_cmd_summarize_unknown_backend() {
        let config = SummaryConfig::default().with_backend("t5-small");
        let result = cmd_summarize(&config, TALK, false, None, OutputFormat::Text);
        assert!(result.is_err());
    }

    #[test]
    fn test_cmd_summarize_empty_transcript() {
        let err = cmd_summarize(
            &SummaryConfig::default(),
            "   ",
            false,
            None,
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_cmd_segment_writes_chunks() {
        let (temp_dir, path) = setup();
        let out_dir = temp_dir.path().join("chunks");
        let config = SummaryConfig::default()
            .with_max_chunk_words(12)
            .with_overlap_sentences(0);

        let output = cmd_segment(&config, &path, Some(&out_dir), "part", OutputFormat::Text).unwrap();
        assert!(output.contains("Wrote"));
        assert!(out_dir.join("part_0000.txt").exists());
    }

    #[test]
    fn test_cmd_segment_rejects_path_prefix() {
        let (temp_dir, path) = setup();
        let out_dir = temp_dir.path().join("chunks");
        let result = cmd_segment(
            &SummaryConfig::default(),
            &path,
            Some(&out_dir),
            "../escape",
            OutputFormat::Text,
        );
        assert!(matches!(
            result,
            Err(crate::Error::Command(CommandError::InvalidArgument(_)))
        ));
        assert!(!out_dir.exists());
    }
}
