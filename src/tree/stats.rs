//! Descriptive text statistics over generated descriptions.
//!
//! Pure recursive helpers with no external calls: per-description metrics,
//! per-node annotation, and the aggregate min/max/average block included in
//! the response envelope.

use serde::{Deserialize, Serialize};

use super::node::TopicNode;

/// Metrics for a single description text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionStatistics {
    /// Character count excluding whitespace.
    pub character_count: usize,
    /// Word count.
    pub word_count: usize,
    /// Character count including whitespace.
    pub character_count_with_spaces: usize,
}

/// Minimum/maximum pair for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: usize,
    pub max: usize,
}

/// Aggregate statistics over every description in the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeStatistics {
    /// Number of descriptions in the tree.
    pub total_descriptions: usize,
    pub character_count_range: MetricRange,
    pub character_count_average: f64,
    pub word_count_range: MetricRange,
    pub word_count_average: f64,
    pub character_count_with_spaces_range: MetricRange,
    pub character_count_with_spaces_average: f64,
}

/// Compute the metrics for one description text.
pub fn description_statistics(description: &str) -> DescriptionStatistics {
    DescriptionStatistics {
        character_count: description.chars().filter(|c| !c.is_whitespace()).count(),
        word_count: description.split_whitespace().count(),
        character_count_with_spaces: description.chars().count(),
    }
}

/// Collect every description in the tree, depth-first.
pub fn collect_descriptions(nodes: &[TopicNode]) -> Vec<&str> {
    let mut descriptions = Vec::new();
    for node in nodes {
        descriptions.push(node.description.as_str());
        descriptions.extend(collect_descriptions(&node.children));
    }
    descriptions
}

/// Fill the per-node `text_statistics` slot for every node in the tree.
pub fn annotate_statistics(nodes: &mut [TopicNode]) {
    for node in nodes {
        node.properties.text_statistics = Some(description_statistics(&node.description));
        annotate_statistics(&mut node.children);
    }
}

/// Aggregate min/max/average metrics over every description in the tree.
///
/// An empty tree yields the all-zero block.
pub fn aggregate_statistics(nodes: &[TopicNode]) -> TreeStatistics {
    let per_description: Vec<DescriptionStatistics> = collect_descriptions(nodes)
        .into_iter()
        .map(description_statistics)
        .collect();

    if per_description.is_empty() {
        return TreeStatistics::default();
    }

    let characters: Vec<usize> = per_description.iter().map(|s| s.character_count).collect();
    let words: Vec<usize> = per_description.iter().map(|s| s.word_count).collect();
    let with_spaces: Vec<usize> = per_description
        .iter()
        .map(|s| s.character_count_with_spaces)
        .collect();

    TreeStatistics {
        total_descriptions: per_description.len(),
        character_count_range: range_of(&characters),
        character_count_average: average_of(&characters),
        word_count_range: range_of(&words),
        word_count_average: average_of(&words),
        character_count_with_spaces_range: range_of(&with_spaces),
        character_count_with_spaces_average: average_of(&with_spaces),
    }
}

fn range_of(values: &[usize]) -> MetricRange {
    MetricRange {
        min: values.iter().copied().min().unwrap_or(0),
        max: values.iter().copied().max().unwrap_or(0),
    }
}

/// Average rounded to two decimal places.
fn average_of(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: usize = values.iter().sum();
    let average = sum as f64 / values.len() as f64;
    (average * 100.0).round() / 100.0
}
