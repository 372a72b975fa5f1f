//! Context window policy for the decomposition stage.
//!
//! A Vault longer than `max_chars` is either truncated with an explicit
//! marker, or split into chunks that are analysed one by one. Chunk cuts
//! prefer document headers, then line breaks, and never split a character.

use bidflow_shared::{ContextConfig, ContextStrategy};
use tracing::warn;

/// Start of every document header inside the Vault.
const HEADER_PREFIX: &str = "\n--- SOURCE DOCUMENT:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextPolicy {
    pub max_chars: usize,
    pub strategy: ContextStrategy,
    pub max_chunks: usize,
}

impl From<&ContextConfig> for ContextPolicy {
    fn from(config: &ContextConfig) -> Self {
        Self {
            max_chars: config.max_chars.max(1),
            strategy: config.strategy,
            max_chunks: config.max_chunks.max(1),
        }
    }
}

impl Default for ContextPolicy {
    fn default() -> Self {
        Self::from(&ContextConfig::default())
    }
}

/// The Vault text as it will be shown to the analyst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    /// One entry per analyst pass. Never empty.
    pub chunks: Vec<String>,
    /// Characters of the Vault that no analyst pass will see.
    pub omitted_chars: usize,
}

impl ContextWindow {
    pub fn is_complete(&self) -> bool {
        self.omitted_chars == 0
    }
}

impl ContextPolicy {
    /// Fit `text` into analyst-sized pieces according to the strategy.
    pub fn window(&self, text: &str) -> ContextWindow {
        let (mut chunks, omitted_chars) = match self.strategy {
            ContextStrategy::Truncate => {
                let cut = byte_offset(text, self.max_chars);
                let omitted = text[cut..].chars().count();
                (vec![text[..cut].to_string()], omitted)
            }
            ContextStrategy::Chunked => {
                let mut all = split_chunks(text, self.max_chars);
                let omitted = all
                    .iter()
                    .skip(self.max_chunks)
                    .map(|c| c.chars().count())
                    .sum();
                all.truncate(self.max_chunks);
                (all, omitted)
            }
        };

        if omitted_chars > 0 {
            warn!(
                strategy = %self.strategy,
                max_chars = self.max_chars,
                omitted_chars,
                "tender pack exceeds the context window"
            );
            if let Some(last) = chunks.last_mut() {
                last.push_str(&omission_marker(omitted_chars));
            }
        }

        ContextWindow {
            chunks,
            omitted_chars,
        }
    }
}

/// Marker appended where text was cut off.
pub fn omission_marker(omitted_chars: usize) -> String {
    format!("\n\n[... {omitted_chars} further characters of the tender pack were not included ...]")
}

/// Byte offset of the `n`th character, or the text length.
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map(|(i, _)| i).unwrap_or(text.len())
}

/// Split into pieces of at most `max_chars` characters whose concatenation is `text`.
fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let limit = byte_offset(rest, max_chars);
        if limit == rest.len() {
            chunks.push(rest.to_string());
            break;
        }

        let window = &rest[..limit];
        let min_cut = byte_offset(window, max_chars / 2);
        let cut = window
            .rfind(HEADER_PREFIX)
            .filter(|&i| i >= min_cut && i > 0)
            .or_else(|| window.rfind('\n').map(|i| i + 1).filter(|&i| i >= min_cut))
            .unwrap_or(limit);

        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(strategy: ContextStrategy, max_chars: usize, max_chunks: usize) -> ContextPolicy {
        ContextPolicy {
            max_chars,
            strategy,
            max_chunks,
        }
    }

    #[test]
    fn defaults_follow_config() {
        let p = ContextPolicy::default();
        assert_eq!(p.max_chars, 15_000);
        assert_eq!(p.strategy, ContextStrategy::Chunked);
        assert_eq!(p.max_chunks, 4);
    }

    #[test]
    fn short_text_is_one_untouched_chunk() {
        let w = policy(ContextStrategy::Chunked, 100, 4).window("short tender");
        assert_eq!(w.chunks, vec!["short tender"]);
        assert!(w.is_complete());
    }

    #[test]
    fn empty_text_yields_one_empty_chunk() {
        let w = policy(ContextStrategy::Chunked, 100, 4).window("");
        assert_eq!(w.chunks, vec![""]);
    }

    #[test]
    fn truncate_keeps_prefix_and_marks_cut() {
        let text = "a".repeat(30);
        let w = policy(ContextStrategy::Truncate, 10, 4).window(&text);
        assert_eq!(w.chunks.len(), 1);
        assert!(w.chunks[0].starts_with(&"a".repeat(10)));
        assert!(w.chunks[0].contains("20 further characters"));
        assert_eq!(w.omitted_chars, 20);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(20);
        let w = policy(ContextStrategy::Truncate, 5, 1).window(&text);
        assert!(w.chunks[0].starts_with("ééééé\n"));
        assert_eq!(w.omitted_chars, 15);
    }

    #[test]
    fn chunks_reassemble_to_original() {
        let text = "line one\nline two\nline three\n".repeat(20);
        let chunks = split_chunks(&text, 50);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunk_cuts_prefer_document_headers() {
        let text = format!(
            "\n--- SOURCE DOCUMENT: a.pdf ---\n{}\n--- SOURCE DOCUMENT: b.pdf ---\n{}",
            "x".repeat(40),
            "y".repeat(40)
        );
        let chunks = split_chunks(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("\n--- SOURCE DOCUMENT: b.pdf ---"));
    }

    #[test]
    fn chunks_beyond_limit_are_counted_as_omitted() {
        let text = "z".repeat(100);
        let w = policy(ContextStrategy::Chunked, 30, 2).window(&text);
        assert_eq!(w.chunks.len(), 2);
        assert_eq!(w.omitted_chars, 40);
        assert!(w.chunks[1].contains("40 further characters"));
    }
}
