// src/tokens.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tiktoken_rs::CoreBPE;

use crate::errors::{HarnessError, Result};

pub const DEFAULT_ENCODING: &str = "cl100k_base";
pub const WHITESPACE_ENCODING: &str = "whitespace";

/// Byte-pair encodings bundled with tiktoken-rs.
pub const BPE_ENCODINGS: &[&str] = &["cl100k_base", "o200k_base", "p50k_base", "p50k_edit", "r50k_base"];

/// Counts tokens in text under a named encoding.
///
/// Implementations must be deterministic: the same `(text, encoding)` pair
/// always yields the same count.
pub trait TokenCounter: Send + Sync {
    /// Returns the number of tokens in `text`, or `EncodingUnavailable` if this
    /// counter cannot resolve `encoding`.
    fn count(&self, text: &str, encoding: &str) -> Result<usize>;
}

/// Exact counts using tiktoken's BPE tables. Tables are built on first use and
/// kept for the life of the counter.
#[derive(Default)]
pub struct TiktokenCounter {
    cache: Mutex<HashMap<String, Arc<CoreBPE>>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, encoding: &str) -> Result<Arc<CoreBPE>> {
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(bpe) = cache.get(encoding) {
            return Ok(Arc::clone(bpe));
        }

        let loaded = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
            other => {
                return Err(HarnessError::EncodingUnavailable {
                    encoding: other.to_string(),
                    reason: format!("known encodings are {}", BPE_ENCODINGS.join(", ")),
                });
            }
        };

        let bpe = Arc::new(loaded.map_err(|e| HarnessError::EncodingUnavailable {
            encoding: encoding.to_string(),
            reason: e.to_string(),
        })?);
        log::debug!("Loaded BPE table for {}", encoding);
        cache.insert(encoding.to_string(), Arc::clone(&bpe));
        Ok(bpe)
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str, encoding: &str) -> Result<usize> {
        let bpe = self.resolve(encoding)?;
        // Special-token markup such as <|endoftext|> is counted as plain text.
        Ok(bpe.encode_ordinary(text).len())
    }
}

/// One token per whitespace-separated word. Needs no tables, so it works
/// offline and makes counts easy to predict.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceCounter;

impl TokenCounter for WhitespaceCounter {
    fn count(&self, text: &str, encoding: &str) -> Result<usize> {
        if encoding != WHITESPACE_ENCODING {
            return Err(HarnessError::EncodingUnavailable {
                encoding: encoding.to_string(),
                reason: format!("this counter only supports '{}'", WHITESPACE_ENCODING),
            });
        }
        Ok(text.split_whitespace().count())
    }
}

/// Picks the counter able to handle `encoding`. Unknown names go to the
/// tiktoken counter, which reports them as unavailable.
pub fn counter_for(encoding: &str) -> Box<dyn TokenCounter> {
    match encoding {
        WHITESPACE_ENCODING => Box::new(WhitespaceCounter),
        _ => Box::new(TiktokenCounter::new()),
    }
}
