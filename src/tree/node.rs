//! Topic tree node and its edu-sharing property record.

use serde::{Deserialize, Serialize};

use super::stats::DescriptionStatistics;

/// Intended end-user role written into every generated node.
pub const TEACHER_ROLE_URI: &str =
    "http://w3id.org/openeduhub/vocabs/intendedEndUserRole/teacher";

/// Metadata record attached to every topic node, using the edu-sharing
/// property vocabulary as serialized field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    /// Node title.
    #[serde(rename = "cm:title")]
    pub title: Vec<String>,

    /// Short title (display label, ≤20 characters by prompt instruction).
    #[serde(rename = "ccm:collectionshorttitle")]
    pub shorttitle: Vec<String>,

    /// Cleaned description text.
    #[serde(rename = "cm:description")]
    pub description: Vec<String>,

    /// Keywords; never empty after parsing.
    #[serde(rename = "cclom:general_keyword")]
    pub keywords: Vec<String>,

    /// Discipline (taxonomy) URIs, copied from the request.
    #[serde(rename = "ccm:taxonid")]
    pub taxon_ids: Vec<String>,

    /// Educational-context URIs, copied from the request.
    #[serde(rename = "ccm:educationalcontext")]
    pub educational_context: Vec<String>,

    /// Fixed intended end-user role.
    #[serde(rename = "ccm:educationalintendedenduserrole")]
    pub intended_end_user_role: Vec<String>,

    /// Per-node description text statistics, filled after finalization.
    #[serde(rename = "text_statistics", skip_serializing_if = "Option::is_none")]
    pub text_statistics: Option<DescriptionStatistics>,
}

/// One node of the generated topic tree: a main topic, subtopic or
/// curriculum topic.
///
/// The tree is acyclic by construction: nodes are created childless during
/// parsing and children are only ever appended to an existing parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicNode {
    /// Node title.
    pub title: String,
    /// Short title.
    pub shorttitle: String,
    /// Cleaned description text.
    pub description: String,
    /// Keywords; never empty after parsing.
    pub keywords: Vec<String>,
    /// Edu-sharing metadata record.
    pub properties: Properties,
    /// Child topics, one tree level down.
    #[serde(rename = "subcollections", default)]
    pub children: Vec<TopicNode>,
}

impl TopicNode {
    /// Create a childless node as produced by the response parser:
    /// taxonomy and context URIs are still empty, the end-user role is the
    /// fixed teacher role.
    pub fn new(
        title: impl Into<String>,
        shorttitle: impl Into<String>,
        description: impl Into<String>,
        keywords: Vec<String>,
    ) -> Self {
        let title = title.into();
        let shorttitle = shorttitle.into();
        let description = description.into();
        let properties = Properties {
            title: vec![title.clone()],
            shorttitle: vec![shorttitle.clone()],
            description: vec![description.clone()],
            keywords: keywords.clone(),
            taxon_ids: Vec::new(),
            educational_context: Vec::new(),
            intended_end_user_role: vec![TEACHER_ROLE_URI.to_string()],
            text_statistics: None,
        };

        Self {
            title,
            shorttitle,
            description,
            keywords,
            properties,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TopicNode::node_count)
            .sum::<usize>()
    }
}
