use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation transcript.
///
/// Created by the conversation session when the user sends (`Role::User`) or
/// when a reply settles (`Role::Assistant`). Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Backend-classified label of an assistant reply (e.g. `"answer"`).
    pub intent: Option<String>,
    /// Knowledge-base sources the reply was grounded on.
    pub sources: Option<Vec<String>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            intent: None,
            sources: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        intent: Option<String>,
        sources: Option<Vec<String>>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            intent,
            sources,
        }
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub user_id: &'a str,
    pub message: &'a str,
    /// Serialized as `null` on the first turn.
    pub conversation_id: Option<&'a str>,
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub conversation_id: String,
    pub response: String,
    pub intent: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

/// Document chunking parameters used by the backend splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
}

impl ChunkConfig {
    pub const MIN_SIZE: u32 = 100;
    pub const MAX_SIZE: u32 = 5000;
    pub const MIN_OVERLAP: u32 = 0;
    pub const MAX_OVERLAP: u32 = 1000;
    pub const DEFAULT_SIZE: u32 = 1000;
    pub const DEFAULT_OVERLAP: u32 = 200;

    /// Builds a config with both values clamped into their accepted ranges.
    ///
    /// Overlap is not forced below size; the backend owns that judgement.
    pub fn clamped(chunk_size: u32, chunk_overlap: u32) -> Self {
        Self {
            chunk_size: chunk_size.clamp(Self::MIN_SIZE, Self::MAX_SIZE),
            chunk_overlap: chunk_overlap.clamp(Self::MIN_OVERLAP, Self::MAX_OVERLAP),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::DEFAULT_SIZE,
            chunk_overlap: Self::DEFAULT_OVERLAP,
        }
    }
}

/// Body of `POST /api/knowledge/reindex`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReindexRequest {
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    pub confirm: bool,
}

/// Reply of `POST /api/knowledge/chunk-settings`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SettingsAck {
    pub message: String,
    #[serde(default)]
    pub warning: Option<String>,
}

/// Reply of `POST /api/knowledge/reindex`.
///
/// `success: false` arrives with a 2xx status and is a soft failure, not an
/// HTTP error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReindexOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
}

/// Reply of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub file_id: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
    pub chunks_count: u64,
}

/// Reply of `GET /api/knowledge/info`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnowledgeInfo {
    pub document_count: u64,
    #[serde(default)]
    pub collection_name: Option<String>,
}

/// Envelope of `POST /api/knowledge/search`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchEnvelope {
    pub results: Vec<String>,
}

/// Per-user learning progress as reported by the backend.
///
/// A display cache only; the next fetch always replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProgress {
    pub user_id: String,
    #[serde(default)]
    pub current_topic: Option<String>,
    /// Topic name → mastery percentage in `[0, 100]`.
    #[serde(default)]
    pub mastery_level: BTreeMap<String, f64>,
    #[serde(default)]
    pub mastered_topics: BTreeSet<String>,
    #[serde(default)]
    pub weak_points: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Body of `POST /api/progress/{user_id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub topic: String,
    pub score: f64,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// Colour band a mastery percentage falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasteryBand {
    High,
    Medium,
    Low,
}

impl MasteryBand {
    /// `>= 80` is high, `>= 60` medium, anything else low.
    pub fn of(level: f64) -> Self {
        if level >= 80.0 {
            MasteryBand::High
        } else if level >= 60.0 {
            MasteryBand::Medium
        } else {
            MasteryBand::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_config_clamps_both_fields() {
        assert_eq!(ChunkConfig::clamped(50, 2000), ChunkConfig { chunk_size: 100, chunk_overlap: 1000 });
        assert_eq!(ChunkConfig::clamped(9000, 0), ChunkConfig { chunk_size: 5000, chunk_overlap: 0 });
        assert_eq!(ChunkConfig::clamped(800, 150), ChunkConfig { chunk_size: 800, chunk_overlap: 150 });
    }

    #[test]
    fn mastery_band_thresholds() {
        assert_eq!(MasteryBand::of(80.0), MasteryBand::High);
        assert_eq!(MasteryBand::of(79.9), MasteryBand::Medium);
        assert_eq!(MasteryBand::of(60.0), MasteryBand::Medium);
        assert_eq!(MasteryBand::of(12.5), MasteryBand::Low);
    }

    #[test]
    fn progress_decodes_with_missing_optional_fields() {
        let p: UserProgress = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert_eq!(p.user_id, "u1");
        assert!(p.mastery_level.is_empty());
        assert!(p.current_topic.is_none());
    }

    #[test]
    fn chat_request_serializes_null_conversation_id() {
        let body = serde_json::to_value(ChatRequest {
            user_id: "u",
            message: "hi",
            conversation_id: None,
        })
        .unwrap();
        assert!(body["conversation_id"].is_null());
    }
}
