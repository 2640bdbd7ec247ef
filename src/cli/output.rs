//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::config::SummaryConfig;
use crate::core::{Chunk, ChunkResult, SecondStage, SummaryResult};
use crate::error::Error;
use crate::io::unicode::truncate_graphemes;
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats a summary, optionally with per-chunk diagnostics.
#[must_use]
pub fn format_summary(result: &SummaryResult, diagnostics: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_summary_text(result, diagnostics),
        OutputFormat::Json => {
            if diagnostics {
                format_json(result)
            } else {
                #[derive(Serialize)]
                struct Brief<'a> {
                    text: &'a str,
                    chunks: usize,
                    failed_chunks: usize,
                    elapsed_ms: u64,
                    second_stage: &'a SecondStage,
                }
                format_json(&Brief {
                    text: &result.text,
                    chunks: result.chunk_diagnostics.len(),
                    failed_chunks: result.failed_chunks(),
                    elapsed_ms: u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
                    second_stage: &result.second_stage,
                })
            }
        }
    }
}

fn format_summary_text(result: &SummaryResult, diagnostics: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", result.text);

    if !diagnostics {
        return output;
    }

    output.push('\n');
    output.push_str("Diagnostics\n");
    output.push_str("===========\n\n");
    let _ = writeln!(
        output,
        "  Chunks:        {} ({} failed)",
        result.chunk_diagnostics.len(),
        result.failed_chunks()
    );
    let _ = writeln!(output, "  Elapsed:       {} ms", result.elapsed.as_millis());
    let _ = writeln!(
        output,
        "  Second stage:  {}",
        second_stage_label(&result.second_stage)
    );
    output.push('\n');
    for chunk in &result.chunk_diagnostics {
        output.push_str(&chunk_line(chunk));
    }
    output
}

fn second_stage_label(stage: &SecondStage) -> String {
    match stage {
        SecondStage::NotNeeded => "not needed".to_string(),
        SecondStage::Condensed => "condensed".to_string(),
        SecondStage::Fallback { reason } => format!("fallback ({reason})"),
    }
}

fn chunk_line(result: &ChunkResult) -> String {
    match &result.failure {
        None => format!(
            "  [{:>4}] ok      {}\n",
            result.index,
            truncate(&result.summary_text, 60)
        ),
        Some(failure) => format!("  [{:>4}] FAILED  {failure}\n", result.index),
    }
}

/// Formats the chunks produced by segmentation.
///
/// `written` lists the files chunks were written to, if any.
#[must_use]
pub fn format_chunks(chunks: &[Chunk], written: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_chunks_text(chunks, written),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Segmented<'a> {
                chunks: &'a [Chunk],
                #[serde(skip_serializing_if = "Option::is_none")]
                written: Option<&'a [String]>,
            }
            format_json(&Segmented {
                chunks,
                written: (!written.is_empty()).then_some(written),
            })
        }
    }
}

fn format_chunks_text(chunks: &[Chunk], written: &[String]) -> String {
    if chunks.is_empty() {
        return "No chunks (empty transcript).\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(output, "Chunks: {}", chunks.len());
    let _ = writeln!(
        output,
        "{:<6} {:<10} {:<7} {:<8} Preview",
        "Index", "Sentences", "Words", "Overlap"
    );
    output.push_str(&"-".repeat(72));
    output.push('\n');

    for chunk in chunks {
        let sentences = format!("{}..{}", chunk.sentence_range.start, chunk.sentence_range.end);
        let _ = writeln!(
            output,
            "{:<6} {:<10} {:<7} {:<8} {}",
            chunk.index,
            sentences,
            chunk.word_count,
            chunk.overlap_sentences,
            truncate(&chunk.text, 36)
        );
    }

    if !written.is_empty() {
        let _ = writeln!(output, "\nWrote {} chunk files:", written.len());
        for path in written {
            let _ = writeln!(output, "  {path}");
        }
    }
    output
}

/// Formats the effective configuration.
#[must_use]
pub fn format_config(config: &SummaryConfig, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_config_text(config),
        OutputFormat::Json => format_json(config),
    }
}

fn format_config_text(config: &SummaryConfig) -> String {
    let optional_ms = |ms: Option<u64>| ms.map_or_else(|| "none".to_string(), |v| format!("{v} ms"));

    let mut output = String::new();
    output.push_str("recap-rs Configuration\n");
    output.push_str("======================\n\n");
    let _ = writeln!(output, "  Backend:            {}", config.backend);
    let _ = writeln!(output, "  Tokenizer:          {}", config.tokenizer);
    let _ = writeln!(output, "  Max chunk words:    {}", config.max_chunk_words);
    let _ = writeln!(output, "  Overlap sentences:  {}", config.overlap_sentences);
    let _ = writeln!(output, "  Workers:            {}", config.worker_count);
    let _ = writeln!(output, "  Idle unload:        {} s", config.idle_unload_seconds);
    let _ = writeln!(output, "  Sweep interval:     {} s", config.sweep_interval_seconds);
    let _ = writeln!(
        output,
        "  Coherence threshold: {} words",
        config.coherence_threshold_words
    );
    let _ = writeln!(
        output,
        "  Second stage:       {}..{} words",
        config.second_stage_min_length, config.second_stage_max_length
    );
    let _ = writeln!(
        output,
        "  Chunk timeout:      {}",
        optional_ms(config.per_chunk_timeout_ms)
    );
    let _ = writeln!(
        output,
        "  Request timeout:    {}",
        optional_ms(config.request_timeout_ms)
    );
    output
}

/// Formats the available backends and tokenizers.
#[must_use]
pub fn format_backends(backends: &[&str], tokenizers: &[&str], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "Backends:   {}", backends.join(", "));
            let _ = writeln!(output, "Tokenizers: {}", tokenizers.join(", "));
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "backends": backends,
            "tokenizers": tokenizers,
        })),
    }
}

/// Formats an error for display.
///
/// JSON errors carry a stable `kind` so callers can tell bad input from an
/// unavailable model.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&serde_json::json!({
            "error": error_kind(error),
            "message": error.to_string(),
        })),
    }
}

const fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::Input(_) => "invalid_input",
        Error::Model(crate::error::ModelError::LoadFailed { .. }) => "model_unavailable",
        Error::Model(_) => "model",
        Error::Chunking(_) => "chunking",
        Error::Transcript(_) => "transcript",
        Error::Io(_) => "io",
        Error::Command(_) => "command",
        Error::Config { .. } => "config",
    }
}

fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    let cut = truncate_graphemes(s, max_len);
    if cut.len() == s.len() {
        s.to_string()
    } else {
        format!("{}...", truncate_graphemes(s, max_len.saturating_sub(3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChunkFailure;
    use crate::error::{InputError, ModelError};
    use std::time::Duration;

    fn sample() -> SummaryResult {
        SummaryResult {
            text: "The talk covers ownership.".to_string(),
            chunk_diagnostics: vec![
                ChunkResult::success(0, "Ownership basics.".to_string()),
                ChunkResult::failed(
                    1,
                    ChunkFailure::Inference {
                        reason: "out of memory".to_string(),
                    },
                ),
            ],
            elapsed: Duration::from_millis(42),
            second_stage: SecondStage::NotNeeded,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_format_summary_text() {
        let output = format_summary(&sample(), false, OutputFormat::Text);
        assert_eq!(output, "The talk covers ownership.\n");

        let output = format_summary(&sample(), true, OutputFormat::Text);
        assert!(output.contains("Chunks:        2 (1 failed)"));
        assert!(output.contains("FAILED  inference failed: out of memory"));
        assert!(output.contains("Second stage:  not needed"));
    }

    #[test]
    fn test_format_summary_json() {
        let output = format_summary(&sample(), false, OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["text"], "The talk covers ownership.");
        assert_eq!(json["failed_chunks"], 1);
        assert!(json.get("chunk_diagnostics").is_none());

        let output = format_summary(&sample(), true, OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["chunk_diagnostics"][1]["ok"], false);
        assert_eq!(json["elapsed_ms"], 42);
    }

    #[test]
    fn test_format_chunks() {
        let chunks = vec![Chunk::from_sentences(0, &["One two.", "Three."], 0..2, 0)];
        let output = format_chunks(&chunks, &[], OutputFormat::Text);
        assert!(output.contains("Chunks: 1"));
        assert!(output.contains("One two. Three."));

        let output = format_chunks(&[], &[], OutputFormat::Text);
        assert!(output.contains("No chunks"));

        let output = format_chunks(&chunks, &[], OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["chunks"][0]["word_count"], 3);
        assert!(json.get("written").is_none());
    }

    #[test]
    fn test_format_config() {
        let config = SummaryConfig::default();
        let output = format_config(&config, OutputFormat::Text);
        assert!(output.contains("Max chunk words:    400"));
        assert!(output.contains("Chunk timeout:      none"));

        let output = format_config(&config, OutputFormat::Json);
        let parsed: SummaryConfig = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_format_error() {
        let err: Error = InputError::EmptyTranscript.into();
        assert_eq!(format_error(&err, OutputFormat::Text), "input error: empty transcript");

        let err: Error = ModelError::LoadFailed {
            backend: "openai".to_string(),
            reason: "401".to_string(),
        }
        .into();
        let json: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputFormat::Json)).unwrap();
        assert_eq!(json["error"], "model_unavailable");
    }
}
