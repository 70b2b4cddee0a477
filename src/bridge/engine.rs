//! Content engine seam
//!
//! The orchestrator talks to the generation engine only through the
//! `ContentEngine` trait, so the process-spawning and HTTP adapters are
//! interchangeable (and replaceable by a stub in tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Failures at the engine boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine could not be reached or did not answer within the timeout
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// The engine started but terminated abnormally or reported failure
    #[error("Engine crashed (exit {code:?}): {diagnostic}")]
    Crashed {
        code: Option<i32>,
        diagnostic: String,
    },

    /// The engine answered but the payload failed shape validation
    #[error("Engine returned malformed payload: {0}")]
    Malformed(String),
}

/// Content difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Fully merged request sent to the engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineRequest {
    pub difficulty: Difficulty,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    /// Role → character name, used to personalize the story
    pub characters: BTreeMap<String, String>,
}

/// Validated engine payload: the id plus the three content documents
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub id: String,
    pub story: Value,
    pub quiz: Value,
    pub summary: Value,
}

impl EngineResponse {
    /// Validate payload shape: a truthy `success` flag and three document
    /// fields that are JSON objects. `fallback_id` covers engines that do
    /// not echo an id back on generation.
    pub fn from_value(value: &Value, fallback_id: Option<&str>) -> Result<Self, BridgeError> {
        if value.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(BridgeError::Malformed(
                "payload missing success=true flag".to_string(),
            ));
        }

        let id = value
            .get("id")
            .or_else(|| value.get("storyId"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| fallback_id.map(str::to_string))
            .ok_or_else(|| BridgeError::Malformed("payload missing content id".to_string()))?;

        let mut documents = [("story", Value::Null), ("quiz", Value::Null), ("summary", Value::Null)];
        for (name, slot) in documents.iter_mut() {
            match value.get(*name) {
                Some(doc) if doc.is_object() => *slot = doc.clone(),
                Some(_) => {
                    return Err(BridgeError::Malformed(format!(
                        "field '{name}' is not a JSON object"
                    )))
                }
                None => {
                    return Err(BridgeError::Malformed(format!("field '{name}' is missing")))
                }
            }
        }
        let [(_, story), (_, quiz), (_, summary)] = documents;

        Ok(Self {
            id,
            story,
            quiz,
            summary,
        })
    }
}

/// Seam to the out-of-process content generator
#[async_trait]
pub trait ContentEngine: Send + Sync {
    /// Run a generation to completion; the single long-latency call
    async fn generate(&self, request: &EngineRequest) -> Result<EngineResponse, BridgeError>;

    /// Look up previously generated content by id; `None` means unknown id
    async fn fetch(&self, id: &str) -> Result<Option<EngineResponse>, BridgeError>;

    /// The most recently generated content, if any
    async fn fetch_latest(&self) -> Result<Option<EngineResponse>, BridgeError>;
}
