//! Extractive summarizer.
//!
//! Scores each sentence by the normalized frequency of its content words and
//! keeps the highest scoring sentences, in their original order, within the
//! requested word budget. Fully deterministic and dependency-free, which makes
//! it the default backend and the one used by the binary's tests.

use crate::error::{ModelError, Result};
use crate::io::unicode::{split_sentences, word_count};
use crate::model::{InferenceBackend, SummaryLength};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "get",
    "got", "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "like", "me", "more", "my", "no", "not", "now", "of", "on", "one",
    "or", "our", "out", "really", "she", "so", "some", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "up", "us", "very", "was", "we", "were",
    "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

/// State built by `load`.
#[derive(Debug)]
struct Vocabulary {
    stopwords: HashSet<&'static str>,
}

impl Vocabulary {
    fn build() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }

    /// Lowercased content words of `sentence`.
    fn content_words(&self, sentence: &str) -> Vec<String> {
        sentence
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty() && !self.stopwords.contains(w.as_str()))
            .collect()
    }
}

/// Deterministic sentence-extraction summarizer.
///
/// Output never exceeds `max_length` words. `min_length` only decides when
/// text is short enough to return untouched; an extract can fall below it
/// when the remaining sentences do not fit the budget.
///
/// # Examples
///
/// ```
/// use recap_rs::model::{ExtractiveBackend, InferenceBackend, SummaryLength};
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let backend = ExtractiveBackend::new();
/// backend.load().await.unwrap();
///
/// let text = "Rust is fast. Rust is safe. Cats sleep. Rust compiles to native code.";
/// let summary = backend.infer(text, SummaryLength::new(6, 2)).await.unwrap();
/// assert_eq!(summary, "Rust is fast. Rust is safe.");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct ExtractiveBackend {
    vocabulary: RwLock<Option<Arc<Vocabulary>>>,
}

impl ExtractiveBackend {
    /// Creates an unloaded backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn vocabulary(&self) -> Result<Arc<Vocabulary>> {
        let guard = self.vocabulary.read().map_err(|e| ModelError::Inference {
            reason: format!("vocabulary lock poisoned: {e}"),
        })?;
        guard.clone().ok_or_else(|| ModelError::NotLoaded.into())
    }

    fn set_vocabulary(&self, vocabulary: Option<Arc<Vocabulary>>) {
        match self.vocabulary.write() {
            Ok(mut guard) => *guard = vocabulary,
            Err(poisoned) => *poisoned.into_inner() = vocabulary,
        }
    }
}

#[async_trait]
impl InferenceBackend for ExtractiveBackend {
    fn name(&self) -> &'static str {
        "extractive"
    }

    fn supports_concurrent_inference(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<()> {
        self.set_vocabulary(Some(Arc::new(Vocabulary::build())));
        Ok(())
    }

    async fn unload(&self) {
        self.set_vocabulary(None);
    }

    async fn infer(&self, text: &str, length: SummaryLength) -> Result<String> {
        let vocabulary = self.vocabulary()?;
        let text = text.trim();
        if word_count(text) <= length.min_length {
            return Ok(text.to_string());
        }
        Ok(extract(&vocabulary, text, length.max_length))
    }
}

#[allow(clippy::cast_precision_loss)]
fn extract(vocabulary: &Vocabulary, text: &str, max_words: usize) -> String {
    let sentences = split_sentences(text);
    let content: Vec<Vec<String>> = sentences
        .iter()
        .map(|s| vocabulary.content_words(s))
        .collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for word in content.iter().flatten() {
        *frequencies.entry(word.as_str()).or_default() += 1;
    }
    let peak = frequencies.values().copied().max().unwrap_or(1) as f64;

    let scores: Vec<f64> = content
        .iter()
        .map(|words| {
            if words.is_empty() {
                return 0.0;
            }
            let total: f64 = words
                .iter()
                .map(|w| frequencies.get(w.as_str()).copied().unwrap_or(0) as f64 / peak)
                .sum();
            total / words.len() as f64
        })
        .collect();

    let mut ranked: Vec<usize> = (0..sentences.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut picked = Vec::new();
    let mut used = 0;
    for &i in &ranked {
        let words = word_count(sentences[i]);
        if used + words <= max_words {
            picked.push(i);
            used += words;
        }
    }

    if picked.is_empty() {
        // Even the best sentence is over budget: cut it at the word limit
        return ranked
            .first()
            .map(|&i| {
                sentences[i]
                    .split_whitespace()
                    .take(max_words)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
    }

    picked.sort_unstable();
    picked
        .iter()
        .map(|&i| sentences[i])
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust is fast. Rust is safe. Cats sleep. Rust compiles to native code.";

    async fn loaded() -> ExtractiveBackend {
        let backend = ExtractiveBackend::new();
        backend.load().await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_infer_requires_load() {
        let backend = ExtractiveBackend::new();
        let err = backend
            .infer(TEXT, SummaryLength::new(6, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Model(ModelError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_picks_highest_scoring_sentences_in_order() {
        let backend = loaded().await;
        let summary = backend
            .infer(TEXT, SummaryLength::new(6, 2))
            .await
            .unwrap();
        assert_eq!(summary, "Rust is fast. Rust is safe.");
    }

    #[tokio::test]
    async fn test_fills_budget_with_lower_ranked_sentences() {
        let backend = loaded().await;
        let summary = backend
            .infer(TEXT, SummaryLength::new(8, 2))
            .await
            .unwrap();
        assert_eq!(summary, "Rust is fast. Rust is safe. Cats sleep.");
    }

    #[tokio::test]
    async fn test_short_text_returned_as_is() {
        let backend = loaded().await;
        let summary = backend
            .infer("  Only a few words here.  ", SummaryLength::new(150, 40))
            .await
            .unwrap();
        assert_eq!(summary, "Only a few words here.");
    }

    #[tokio::test]
    async fn test_oversized_sentence_is_cut_at_budget() {
        let backend = loaded().await;
        let text = format!("{}.", "token ".repeat(60).trim_end());
        let summary = backend
            .infer(&text, SummaryLength::new(10, 5))
            .await
            .unwrap();
        assert_eq!(word_count(&summary), 10);
    }

    #[tokio::test]
    async fn test_summary_respects_max_length() {
        let backend = loaded().await;
        let text = "The compiler checks borrows. Lifetimes annotate references. \
                    Traits describe shared behavior. Enums model variants. \
                    Macros generate code. Cargo builds crates.";
        let summary = backend
            .infer(text, SummaryLength::new(9, 3))
            .await
            .unwrap();
        assert!(word_count(&summary) <= 9);
        assert!(!summary.is_empty());
    }

    #[tokio::test]
    async fn test_max_length_wins_over_min_length() {
        let backend = loaded().await;
        let text = "Rust wins. Memory safety without garbage collection comes from \
                    ownership rules checked at compile time.";
        let summary = backend
            .infer(text, SummaryLength::new(10, 8))
            .await
            .unwrap();
        // The long sentence cannot fit, so the extract stays under min_length
        assert_eq!(summary, "Rust wins.");
    }

    #[tokio::test]
    async fn test_unload_drops_vocabulary() {
        let backend = loaded().await;
        backend.unload().await;
        assert!(backend.infer(TEXT, SummaryLength::new(6, 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_infer_is_deterministic() {
        let backend = loaded().await;
        let a = backend.infer(TEXT, SummaryLength::new(7, 2)).await.unwrap();
        let b = backend.infer(TEXT, SummaryLength::new(7, 2)).await.unwrap();
        assert_eq!(a, b);
    }
}
