//! Raw content API payloads
//!
//! These mirror the JSON the API sends. Nothing here is trusted: the view
//! models in `post` are built from them through validating conversions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ContentError;

/// API root document (`GET {api_endpoint}`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    /// The ref that points at the published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .or_else(|| self.refs.iter().find(|r| r.id == "master"))
            .map(|r| r.reference.as_str())
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub total_results_size: Option<u64>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<ApiDocument>,
}

/// A document as returned by the API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ApiDocument {
    /// Required string field; `null` or absent is an error
    pub fn required_str(&self, field: &str) -> Result<String, ContentError> {
        match self.data.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(self.invalid(format!("missing field `{}`", field))),
            Some(other) => Err(self.invalid(format!(
                "field `{}` should be a string, got {}",
                field,
                type_name(other)
            ))),
        }
    }

    /// Optional string field; `null` or absent becomes an empty string
    pub fn optional_str(&self, field: &str) -> Result<String, ContentError> {
        match self.data.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Ok(String::new()),
            Some(other) => Err(self.invalid(format!(
                "field `{}` should be a string, got {}",
                field,
                type_name(other)
            ))),
        }
    }

    pub fn invalid(&self, reason: impl Into<String>) -> ContentError {
        ContentError::invalid(self.uid.as_deref(), reason)
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
