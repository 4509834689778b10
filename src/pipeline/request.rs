//! Request and response envelope types for topic tree generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::tree::{TopicNode, TreeStatistics};

/// Default model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default description length budget in characters.
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: u32 = 500;

/// Bounds enforced by [`TopicTreeRequest::validate`].
pub const MAIN_TOPIC_RANGE: std::ops::RangeInclusive<u32> = 1..=30;
pub const SUBTOPIC_RANGE: std::ops::RangeInclusive<u32> = 0..=20;
pub const CURRICULUM_TOPIC_RANGE: std::ops::RangeInclusive<u32> = 0..=20;
pub const DESCRIPTION_LENGTH_RANGE: std::ops::RangeInclusive<u32> = 50..=2000;

/// Caller input for one topic tree generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTreeRequest {
    /// Overall theme of the tree (e.g. "Physik der Sekundarstufe II").
    pub theme: String,

    /// Number of main topics (1-30).
    #[serde(default = "default_num_main_topics")]
    pub num_main_topics: u32,

    /// Number of subtopics per main topic (0-20).
    #[serde(default = "default_num_subtopics")]
    pub num_subtopics: u32,

    /// Number of curriculum topics per subtopic (0-20).
    #[serde(default = "default_num_curriculum_topics")]
    pub num_curriculum_topics: u32,

    /// Ask for a general-purpose main topic ("Allgemeines") in first place.
    #[serde(default)]
    pub include_general_topic: bool,

    /// Ask for a didactics main topic ("Methodik und Didaktik") in last place.
    #[serde(default)]
    pub include_methodology_topic: bool,

    /// Character budget for generated descriptions (50-2000).
    #[serde(default = "default_max_description_length")]
    pub max_description_length: u32,

    /// Discipline URIs propagated onto every node and hinted in prompts.
    #[serde(default)]
    pub discipline_uris: Vec<String>,

    /// Educational-context URIs propagated onto every node and hinted in
    /// prompts.
    #[serde(default)]
    pub educational_context_uris: Vec<String>,

    /// Chat-completion model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_num_main_topics() -> u32 {
    5
}

fn default_num_subtopics() -> u32 {
    3
}

fn default_num_curriculum_topics() -> u32 {
    2
}

fn default_max_description_length() -> u32 {
    DEFAULT_MAX_DESCRIPTION_LENGTH
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl TopicTreeRequest {
    /// A request for the given theme with every other field at its default.
    pub fn new(theme: impl Into<String>) -> Self {
        Self {
            theme: theme.into(),
            num_main_topics: default_num_main_topics(),
            num_subtopics: default_num_subtopics(),
            num_curriculum_topics: default_num_curriculum_topics(),
            include_general_topic: false,
            include_methodology_topic: false,
            max_description_length: default_max_description_length(),
            discipline_uris: Vec::new(),
            educational_context_uris: Vec::new(),
            model: default_model(),
        }
    }

    /// Check the request against the documented bounds.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.theme.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "theme must not be empty".to_string(),
            ));
        }
        if !MAIN_TOPIC_RANGE.contains(&self.num_main_topics) {
            return Err(GenerationError::InvalidRequest(format!(
                "num_main_topics must be within {}-{}, got {}",
                MAIN_TOPIC_RANGE.start(),
                MAIN_TOPIC_RANGE.end(),
                self.num_main_topics
            )));
        }
        if !SUBTOPIC_RANGE.contains(&self.num_subtopics) {
            return Err(GenerationError::InvalidRequest(format!(
                "num_subtopics must be within {}-{}, got {}",
                SUBTOPIC_RANGE.start(),
                SUBTOPIC_RANGE.end(),
                self.num_subtopics
            )));
        }
        if !CURRICULUM_TOPIC_RANGE.contains(&self.num_curriculum_topics) {
            return Err(GenerationError::InvalidRequest(format!(
                "num_curriculum_topics must be within {}-{}, got {}",
                CURRICULUM_TOPIC_RANGE.start(),
                CURRICULUM_TOPIC_RANGE.end(),
                self.num_curriculum_topics
            )));
        }
        if !DESCRIPTION_LENGTH_RANGE.contains(&self.max_description_length) {
            return Err(GenerationError::InvalidRequest(format!(
                "max_description_length must be within {}-{}, got {}",
                DESCRIPTION_LENGTH_RANGE.start(),
                DESCRIPTION_LENGTH_RANGE.end(),
                self.max_description_length
            )));
        }
        Ok(())
    }
}

/// Metadata echoed back alongside the generated tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Unique id of this generation run.
    pub id: Uuid,
    /// The requested theme.
    pub theme: String,
    /// Model used for every call of the run.
    pub model: String,
    pub num_main_topics: u32,
    pub num_subtopics: u32,
    pub num_curriculum_topics: u32,
    pub max_description_length: u32,
    pub include_general_topic: bool,
    pub include_methodology_topic: bool,
    pub discipline_uris: Vec<String>,
    pub educational_context_uris: Vec<String>,
    /// Generation timestamp.
    pub created_at: DateTime<Utc>,
    /// Generator crate version.
    pub version: String,
}

impl GenerationMetadata {
    /// Build the envelope metadata for a request, stamped now.
    pub fn for_request(request: &TopicTreeRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            theme: request.theme.clone(),
            model: request.model.clone(),
            num_main_topics: request.num_main_topics,
            num_subtopics: request.num_subtopics,
            num_curriculum_topics: request.num_curriculum_topics,
            max_description_length: request.max_description_length,
            include_general_topic: request.include_general_topic,
            include_methodology_topic: request.include_methodology_topic,
            discipline_uris: request.discipline_uris.clone(),
            educational_context_uris: request.educational_context_uris.clone(),
            created_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// The produced artifact: tree plus metadata plus aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTreeResponse {
    pub metadata: GenerationMetadata,
    pub topic_tree: Vec<TopicNode>,
    pub statistics: TreeStatistics,
}
