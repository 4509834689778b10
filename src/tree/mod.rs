//! The generated topic tree: node types, metadata propagation and
//! description statistics.

pub mod node;
pub mod stats;

pub use node::{Properties, TopicNode, TEACHER_ROLE_URI};
pub use stats::{
    aggregate_statistics, annotate_statistics, collect_descriptions, description_statistics,
    DescriptionStatistics, MetricRange, TreeStatistics,
};

/// Finalization pass: rewrite every node's property record from the node's
/// own generated fields plus the request-level URI lists.
///
/// Whatever taxonomy or educational-context URIs a node carried before
/// (always empty straight out of the parser) are replaced wholesale; the
/// generated title, short title, description and keywords are mirrored
/// unchanged. Runs over soft-failed subtrees as well, since those still
/// hold their parent node.
pub fn propagate_request_properties(
    nodes: &mut [TopicNode],
    taxon_ids: &[String],
    educational_context: &[String],
) {
    for node in nodes {
        node.properties = Properties {
            title: vec![node.title.clone()],
            shorttitle: vec![node.shorttitle.clone()],
            description: vec![node.description.clone()],
            keywords: node.keywords.clone(),
            taxon_ids: taxon_ids.to_vec(),
            educational_context: educational_context.to_vec(),
            intended_end_user_role: vec![TEACHER_ROLE_URI.to_string()],
            text_statistics: None,
        };
        propagate_request_properties(&mut node.children, taxon_ids, educational_context);
    }
}
