// src/inspector.rs
use serde::Serialize;
use std::fmt;

use crate::errors::Result;
use crate::payload::EvaluationPayload;
use crate::tokens::TokenCounter;

/// Which part of the payload a count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Citation(usize),
    Context,
    Query,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Citation(i) => write!(f, "citation[{}]", i),
            Field::Context => write!(f, "context"),
            Field::Query => write!(f, "query"),
        }
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCountEntry {
    pub field: Field,
    pub token_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenReport {
    pub encoding: String,
    pub entries: Vec<TokenCountEntry>,
}

impl TokenReport {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.token_count).sum()
    }

    pub fn citation_entries(&self) -> impl Iterator<Item = &TokenCountEntry> {
        self.entries.iter().filter(|e| matches!(e.field, Field::Citation(_)))
    }
}

/// Counts tokens for each citation in order, then the context, then the query.
pub fn inspect(payload: &EvaluationPayload, counter: &dyn TokenCounter, encoding: &str) -> Result<TokenReport> {
    let citations = payload.citations();
    let mut entries = Vec::with_capacity(citations.len() + 2);

    for (i, citation) in citations.iter().enumerate() {
        entries.push(TokenCountEntry {
            field: Field::Citation(i),
            token_count: counter.count(citation, encoding)?,
        });
    }
    entries.push(TokenCountEntry {
        field: Field::Context,
        token_count: counter.count(payload.context(), encoding)?,
    });
    entries.push(TokenCountEntry {
        field: Field::Query,
        token_count: counter.count(payload.query(), encoding)?,
    });

    log::debug!("Counted {} fields under {}", entries.len(), encoding);

    Ok(TokenReport { encoding: encoding.to_string(), entries })
}
