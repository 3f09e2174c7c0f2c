// src/payload.rs
use serde_json::{Map, Value};
use std::path::Path;

use crate::errors::{HarnessError, Result};

/// The document submitted for evaluation.
///
/// The source text is kept byte for byte and is what gets sent, so key order
/// and number formatting reach the endpoint unchanged. The parsed document is
/// only used to read `citations`, `context` and `query`, which are checked for
/// type on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationPayload {
    raw: String,
    document: Map<String, Value>,
}

impl EvaluationPayload {
    /// Reads and validates a payload file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| HarnessError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::with_raw(raw.to_string(), value)
    }

    /// Builds a payload from an already parsed value; the body sent is its
    /// compact serialization.
    pub fn from_value(value: Value) -> Result<Self> {
        Self::with_raw(value.to_string(), value)
    }

    fn with_raw(raw: String, value: Value) -> Result<Self> {
        let Value::Object(document) = value else {
            return Err(HarnessError::InvalidPayload(format!(
                "expected a JSON object at the top level, found {}",
                type_name(&value)
            )));
        };

        let payload = Self { raw, document };
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> Result<()> {
        if let Some((location, list)) = self.citation_list() {
            let Value::Array(items) = list else {
                return Err(HarnessError::InvalidPayload(format!(
                    "'{}' must be an array of strings, found {}",
                    location,
                    type_name(list)
                )));
            };
            if let Some((i, item)) = items.iter().enumerate().find(|(_, v)| !v.is_string()) {
                return Err(HarnessError::InvalidPayload(format!(
                    "'{}[{}]' must be a string, found {}",
                    location,
                    i,
                    type_name(item)
                )));
            }
        }

        for field in ["context", "query"] {
            match self.document.get(field) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(other) => {
                    return Err(HarnessError::InvalidPayload(format!(
                        "'{}' must be a string, found {}",
                        field,
                        type_name(other)
                    )));
                }
            }
        }
        Ok(())
    }

    /// Top-level `citations` wins; otherwise `prediction.citations` is used.
    fn citation_list(&self) -> Option<(&'static str, &Value)> {
        let present = |v: &&Value| !v.is_null();
        if let Some(list) = self.document.get("citations").filter(present) {
            return Some(("citations", list));
        }
        self.document
            .get("prediction")
            .and_then(|p| p.get("citations"))
            .filter(present)
            .map(|list| ("prediction.citations", list))
    }

    /// Citation texts in document order. Empty when absent.
    pub fn citations(&self) -> Vec<&str> {
        match self.citation_list() {
            Some((_, Value::Array(items))) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn context(&self) -> &str {
        self.text_field("context")
    }

    pub fn query(&self) -> &str {
        self.text_field("query")
    }

    fn text_field(&self, name: &str) -> &str {
        self.document.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// The parsed document.
    pub fn as_json(&self) -> &Map<String, Value> {
        &self.document
    }

    /// The request body: the document text exactly as it was read.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
