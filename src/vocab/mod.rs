//! Read-only SKOS vocabulary label cache.
//!
//! The openeduhub vocabularies (educational context, discipline) are
//! fetched once at startup and flattened into a URI → preferred-label map
//! that is never mutated afterwards, so concurrent readers need no
//! synchronization. A refresh would build a new cache and swap it
//! wholesale. Labels are only used to enrich prompt context lines; when a
//! vocabulary cannot be fetched the cache stays empty and prompt building
//! falls back to the humanized URI segment.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::error::VocabError;

/// SKOS vocabulary listing the German educational stages.
pub const EDUCATIONAL_CONTEXT_VOCAB_URL: &str =
    "https://vocabs.openeduhub.de/w3id.org/openeduhub/vocabs/educationalContext/index.json";

/// SKOS vocabulary listing the school disciplines.
pub const DISCIPLINE_VOCAB_URL: &str =
    "https://vocabs.openeduhub.de/w3id.org/openeduhub/vocabs/discipline/index.json";

/// Preferred label language.
const LABEL_LANGUAGE: &str = "de";

/// Top-level SKOS concept scheme as served by the vocabulary endpoints.
#[derive(Debug, Deserialize)]
struct ConceptScheme {
    #[serde(default, rename = "hasTopConcept")]
    top_concepts: Vec<Concept>,
}

/// One SKOS concept with its language-tagged labels and narrower concepts.
#[derive(Debug, Deserialize)]
struct Concept {
    id: String,
    #[serde(default, rename = "prefLabel")]
    pref_label: BTreeMap<String, String>,
    #[serde(default)]
    narrower: Vec<Concept>,
}

/// Immutable URI → preferred-label map built once during initialization.
#[derive(Debug, Default)]
pub struct VocabCache {
    labels: HashMap<String, Vec<String>>,
}

impl VocabCache {
    /// An empty cache; lookups miss and callers fall back to URI segments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the cache from the default openeduhub vocabularies.
    ///
    /// A vocabulary that cannot be fetched or parsed is skipped with a
    /// WARN; generation proceeds without its labels.
    pub async fn load_default(http: &reqwest::Client) -> Self {
        let mut cache = Self::empty();
        for url in [EDUCATIONAL_CONTEXT_VOCAB_URL, DISCIPLINE_VOCAB_URL] {
            match fetch_vocab(http, url).await {
                Ok(scheme) => cache.absorb(&scheme),
                Err(err) => {
                    tracing::warn!(url, error = %err, "Skipping unavailable vocabulary");
                }
            }
        }
        tracing::info!(concepts = cache.len(), "Vocabulary cache initialized");
        cache
    }

    /// Preferred labels for a concept URI, if the vocabularies define any.
    pub fn pref_labels(&self, uri: &str) -> Option<&[String]> {
        self.labels.get(uri).map(Vec::as_slice)
    }

    /// Human-readable form of a concept URI: the preferred label when
    /// cached, otherwise the last URI segment with underscores replaced by
    /// spaces.
    pub fn readable_label(&self, uri: &str) -> String {
        if let Some(labels) = self.pref_labels(uri) {
            if let Some(label) = labels.first() {
                return label.clone();
            }
        }
        humanize_uri_segment(uri)
    }

    /// Number of cached concepts.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the cache holds no concepts at all.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn absorb(&mut self, scheme: &ConceptScheme) {
        for concept in &scheme.top_concepts {
            self.absorb_concept(concept);
        }
    }

    fn absorb_concept(&mut self, concept: &Concept) {
        let labels = concept_labels(concept);
        if !labels.is_empty() {
            self.labels.insert(concept.id.clone(), labels);
        }
        for narrower in &concept.narrower {
            self.absorb_concept(narrower);
        }
    }
}

/// German label first, every other language after it.
fn concept_labels(concept: &Concept) -> Vec<String> {
    let mut labels = Vec::new();
    if let Some(german) = concept.pref_label.get(LABEL_LANGUAGE) {
        labels.push(german.clone());
    }
    for (language, label) in &concept.pref_label {
        if language != LABEL_LANGUAGE {
            labels.push(label.clone());
        }
    }
    labels
}

/// Last URI segment with underscores replaced by spaces; the whole string
/// when it has no path structure.
pub fn humanize_uri_segment(uri: &str) -> String {
    match uri.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.replace('_', " "),
        _ => uri.to_string(),
    }
}

async fn fetch_vocab(http: &reqwest::Client, url: &str) -> Result<ConceptScheme, VocabError> {
    tracing::debug!(url, "Fetching vocabulary");
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| VocabError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(VocabError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", status.as_u16()),
        });
    }

    let body = response.text().await.map_err(|e| VocabError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEME: &str = r#"{
        "id": "https://vocabs.openeduhub.de/w3id.org/openeduhub/vocabs/educationalContext/",
        "type": "ConceptScheme",
        "hasTopConcept": [
            {
                "id": "http://w3id.org/openeduhub/vocabs/educationalContext/elementarbereich",
                "prefLabel": {"de": "Elementarbereich", "en": "Elementary Level"}
            },
            {
                "id": "http://w3id.org/openeduhub/vocabs/educationalContext/sekundarstufe_1",
                "prefLabel": {"de": "Sekundarstufe I"},
                "narrower": [
                    {
                        "id": "http://w3id.org/openeduhub/vocabs/educationalContext/klasse_5",
                        "prefLabel": {"de": "Klasse 5"}
                    }
                ]
            }
        ]
    }"#;

    fn cache_from_scheme() -> VocabCache {
        let scheme: ConceptScheme = serde_json::from_str(SCHEME).expect("scheme parses");
        let mut cache = VocabCache::empty();
        cache.absorb(&scheme);
        cache
    }

    #[test]
    fn test_absorb_flattens_narrower_concepts() {
        let cache = cache_from_scheme();
        assert_eq!(cache.len(), 3);
        assert_eq!(
            cache.pref_labels("http://w3id.org/openeduhub/vocabs/educationalContext/klasse_5"),
            Some(&["Klasse 5".to_string()][..])
        );
    }

    #[test]
    fn test_german_label_comes_first() {
        let cache = cache_from_scheme();
        let labels = cache
            .pref_labels("http://w3id.org/openeduhub/vocabs/educationalContext/elementarbereich")
            .expect("cached");
        assert_eq!(labels[0], "Elementarbereich");
        assert_eq!(labels[1], "Elementary Level");
    }

    #[test]
    fn test_readable_label_falls_back_to_uri_segment() {
        let cache = VocabCache::empty();
        assert_eq!(
            cache.readable_label(
                "http://w3id.org/openeduhub/vocabs/educationalContext/sekundarstufe_2"
            ),
            "sekundarstufe 2"
        );
    }

    #[test]
    fn test_humanize_uri_segment_without_path() {
        assert_eq!(humanize_uri_segment("sekundarstufe_2"), "sekundarstufe 2");
        assert_eq!(humanize_uri_segment(""), "");
    }

    #[test]
    fn test_empty_cache() {
        let cache = VocabCache::empty();
        assert!(cache.is_empty());
        assert_eq!(cache.pref_labels("http://example.org/x"), None);
    }
}
