//! Parser/validator turning raw LLM completions into topic nodes.
//!
//! The model is instructed to answer with a plain JSON array of topic
//! records, but the completion is never trusted structurally: fences are
//! stripped, a bare object is accepted as a singleton array, missing fields
//! are defaulted, and description text is normalized. Any failure along the
//! way yields an *empty* list rather than an error — a branch that cannot
//! be parsed must not abort sibling branches generated concurrently, and
//! the orchestrator consumes the empty list uniformly as "attach zero
//! children".

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::tree::TopicNode;

/// Raw topic record as expected inside the completion's JSON array.
///
/// Every field defaults so that partially filled records still yield a
/// node; the fallbacks below fill the gaps.
#[derive(Debug, Deserialize)]
struct RawTopic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    shorttitle: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl RawTopic {
    fn into_node(self) -> TopicNode {
        let description = clean_description(&self.description);
        let description = if description.is_empty() {
            format!("Beschreibung für {}", self.title)
        } else {
            description
        };
        let keywords = if self.keywords.is_empty() {
            vec![self.title.to_lowercase()]
        } else {
            self.keywords
        };

        TopicNode::new(self.title, self.shorttitle, description, keywords)
    }
}

/// Parse a completion into topic nodes.
///
/// Never fails outward: unparseable input is logged at WARN and becomes an
/// empty list, the orchestrator's soft-failure sentinel.
pub fn parse_topics(raw: &str) -> Vec<TopicNode> {
    match try_parse_topics(raw) {
        Ok(topics) => topics,
        Err(err) => {
            tracing::warn!(error = %err, "Discarding unparseable completion");
            Vec::new()
        }
    }
}

fn try_parse_topics(raw: &str) -> Result<Vec<TopicNode>, serde_json::Error> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&body)?;

    // A single object is accepted as a singleton array.
    let raw_topics: Vec<RawTopic> = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };

    Ok(raw_topics.into_iter().map(RawTopic::into_node).collect())
}

/// Strip one surrounding markdown code fence (```json … ``` or ``` … ```)
/// if present, plus leading/trailing whitespace.
fn strip_code_fences(raw: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?\s*```$").expect("fence pattern is valid")
    });

    let trimmed = raw.trim();
    match fence.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Normalize a generated description into a single clean line.
///
/// Literal two-character `\n` sequences, real newlines, carriage returns
/// and tabs become spaces; leading/trailing quote characters are stripped;
/// whitespace runs collapse to a single space. Idempotent: cleaning a
/// cleaned string is a no-op.
pub fn clean_description(text: &str) -> String {
    let text = text.replace("\\n", " ");
    let text = text.replace(['\n', '\r', '\t'], " ");
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'');
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
