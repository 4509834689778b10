//! Three-phase topic tree generation orchestrator.
//!
//! The orchestrator drives the strictly ordered phases (main topics →
//! subtopics → curriculum topics), fanning out one concurrent generation
//! call per topic inside Phase 2 and one per (main, sub) pair inside
//! Phase 3, each phase ending in a full await-all barrier. Results are
//! bound to their target node by the index captured at submission time, so
//! completion order never affects tree shape. Per-branch failures are
//! absorbed as empty children; only an empty Phase 1 aborts the request.
//!
//! Fan-out width is unbounded: Phase 3 issues `num_main × num_sub`
//! concurrent calls in the worst case. There is no admission control and
//! no global deadline; the HTTP client's per-request timeout is the only
//! bound.

use futures::future::join_all;
use std::sync::Arc;

use crate::error::GenerationError;
use crate::llm::{LlmProvider, OpenAiClient, RetryingClient};
use crate::parser;
use crate::prompts;
use crate::tree::{
    aggregate_statistics, annotate_statistics, propagate_request_properties, TopicNode,
};
use crate::vocab::VocabCache;

use super::request::{GenerationMetadata, TopicTreeRequest, TopicTreeResponse};

/// Drives the three-phase generation against a shared provider.
pub struct TopicTreeOrchestrator {
    provider: Arc<dyn LlmProvider>,
    vocab: Arc<VocabCache>,
}

impl TopicTreeOrchestrator {
    /// Create an orchestrator over an existing provider.
    pub fn new(provider: Arc<dyn LlmProvider>, vocab: Arc<VocabCache>) -> Self {
        Self { provider, vocab }
    }

    /// Create an orchestrator with the environment-configured OpenAI
    /// client behind the default retry policy.
    ///
    /// # Errors
    ///
    /// Fails before any generation call when `OPENAI_API_KEY` is not set.
    pub fn from_env(vocab: Arc<VocabCache>) -> Result<Self, GenerationError> {
        let client = OpenAiClient::from_env()?;
        Ok(Self::new(Arc::new(RetryingClient::new(client)), vocab))
    }

    /// Generate a complete topic tree for the request.
    ///
    /// # Errors
    ///
    /// [`GenerationError::InvalidRequest`] when the request violates the
    /// documented bounds, [`GenerationError::MainTopicsFailed`] when
    /// Phase 1 yields no topics. Subtopic and curriculum failures never
    /// surface here; the affected nodes simply stay childless.
    pub async fn generate_tree(
        &self,
        request: &TopicTreeRequest,
    ) -> Result<TopicTreeResponse, GenerationError> {
        request.validate()?;

        let context = prompts::context_instructions(request, &self.vocab);

        // Phase 1: main topics, a single round trip. The only phase whose
        // failure aborts the request.
        tracing::info!(
            theme = %request.theme,
            count = request.num_main_topics,
            "Generating main topics"
        );
        let mut main_topics = self
            .generate_topics(prompts::build_main_prompt(request, &context), request)
            .await;
        if main_topics.is_empty() {
            return Err(GenerationError::MainTopicsFailed(request.theme.clone()));
        }
        tracing::info!(count = main_topics.len(), "Received main topics");

        self.generate_subtopics(&mut main_topics, request, &context)
            .await;
        self.generate_curriculum_topics(&mut main_topics, request, &context)
            .await;

        // Finalization: one walk rewriting every node's properties with
        // the request-level URIs, then the statistics annotation.
        propagate_request_properties(
            &mut main_topics,
            &request.discipline_uris,
            &request.educational_context_uris,
        );
        annotate_statistics(&mut main_topics);
        let statistics = aggregate_statistics(&main_topics);

        tracing::info!(
            nodes = main_topics.iter().map(TopicNode::node_count).sum::<usize>(),
            descriptions = statistics.total_descriptions,
            "Topic tree assembled"
        );

        Ok(TopicTreeResponse {
            metadata: GenerationMetadata::for_request(request),
            topic_tree: main_topics,
            statistics,
        })
    }

    /// Phase 2: one concurrent call per main topic, awaited together.
    async fn generate_subtopics(
        &self,
        main_topics: &mut [TopicNode],
        request: &TopicTreeRequest,
        context: &str,
    ) {
        if request.num_subtopics == 0 {
            return;
        }

        let main_titles: Vec<String> = main_topics.iter().map(|t| t.title.clone()).collect();
        tracing::info!(
            main_topics = main_titles.len(),
            per_topic = request.num_subtopics,
            "Generating subtopics"
        );

        let calls: Vec<_> = main_topics
            .iter()
            .map(|main| {
                let siblings: Vec<String> = main_titles
                    .iter()
                    .filter(|title| **title != main.title)
                    .cloned()
                    .collect();
                let prompt =
                    prompts::build_subtopic_prompt(request, &main.title, &siblings, context);
                self.generate_topics(prompt, request)
            })
            .collect();

        let results = join_all(calls).await;

        for (main, subtopics) in main_topics.iter_mut().zip(results) {
            if subtopics.is_empty() {
                tracing::warn!(
                    main_topic = %main.title,
                    "Subtopic generation soft-failed; branch stays childless"
                );
            }
            main.children = subtopics;
        }
    }

    /// Phase 3: one concurrent call per (main, sub) pair present in the
    /// tree, awaited together. Each call is bound at submission time to
    /// the indexes of the pair it was generated for.
    async fn generate_curriculum_topics(
        &self,
        main_topics: &mut [TopicNode],
        request: &TopicTreeRequest,
        context: &str,
    ) {
        if request.num_curriculum_topics == 0 {
            return;
        }

        let main_titles: Vec<String> = main_topics.iter().map(|t| t.title.clone()).collect();
        let mut bindings: Vec<(usize, usize)> = Vec::new();
        let mut calls = Vec::new();

        for (main_index, main) in main_topics.iter().enumerate() {
            let sub_titles: Vec<String> = main.children.iter().map(|s| s.title.clone()).collect();
            for (sub_index, sub) in main.children.iter().enumerate() {
                let siblings: Vec<String> = sub_titles
                    .iter()
                    .filter(|title| **title != sub.title)
                    .cloned()
                    .collect();
                let prompt = prompts::build_curriculum_prompt(
                    request,
                    &main.title,
                    &sub.title,
                    &siblings,
                    &main_titles,
                    context,
                );
                bindings.push((main_index, sub_index));
                calls.push(self.generate_topics(prompt, request));
            }
        }

        tracing::info!(
            pairs = bindings.len(),
            per_subtopic = request.num_curriculum_topics,
            "Generating curriculum topics"
        );
        let results = join_all(calls).await;

        for ((main_index, sub_index), curriculum_topics) in bindings.into_iter().zip(results) {
            if curriculum_topics.is_empty() {
                tracing::warn!(
                    main_topic = %main_topics[main_index].title,
                    subtopic = %main_topics[main_index].children[sub_index].title,
                    "Curriculum generation soft-failed; branch stays childless"
                );
            }
            main_topics[main_index].children[sub_index].children = curriculum_topics;
        }
    }

    /// One generate+parse round trip. Every failure is absorbed into an
    /// empty list, the shared soft-failure sentinel.
    async fn generate_topics(&self, prompt: String, request: &TopicTreeRequest) -> Vec<TopicNode> {
        let chat = prompts::completion_request(prompt, &request.model);
        match self.provider.generate(chat).await {
            Ok(response) => match response.first_content() {
                Some(content) => parser::parse_topics(content),
                None => {
                    tracing::warn!("Completion contained no choices");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "Generation call failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationRequest, GenerationResponse, Message, Usage};
    use async_trait::async_trait;

    /// Provider answering from a script keyed on the user prompt, so
    /// concurrent completion order cannot influence the outcome.
    struct ScriptedProvider<F>(F);

    #[async_trait]
    impl<F> LlmProvider for ScriptedProvider<F>
    where
        F: Fn(&str) -> String + Send + Sync,
    {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            let user_prompt = request
                .messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(GenerationResponse {
                id: "mock-id".to_string(),
                model: request.model,
                choices: vec![Choice {
                    index: 0,
                    message: Message::assistant((self.0)(&user_prompt)),
                    finish_reason: "stop".to_string(),
                }],
                usage: Usage {
                    prompt_tokens: 1,
                    completion_tokens: 1,
                    total_tokens: 2,
                },
            })
        }
    }

    fn topics_json(titles: &[&str]) -> String {
        let records: Vec<String> = titles
            .iter()
            .map(|title| {
                format!(
                    r#"{{"title": "{t}", "shorttitle": "{t}", "description": "Beschreibung zu {t}.", "keywords": ["{k}"]}}"#,
                    t = title,
                    k = title.to_lowercase()
                )
            })
            .collect();
        format!("[{}]", records.join(","))
    }

    fn orchestrator<F>(script: F) -> TopicTreeOrchestrator
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        TopicTreeOrchestrator::new(
            Arc::new(ScriptedProvider(script)),
            Arc::new(VocabCache::empty()),
        )
    }

    #[tokio::test]
    async fn test_main_topic_count_matches_request() {
        let orchestrator = orchestrator(|_| topics_json(&["A", "B", "C"]));
        let mut request = TopicTreeRequest::new("Physik");
        request.num_main_topics = 3;
        request.num_subtopics = 0;
        request.num_curriculum_topics = 0;

        let response = orchestrator
            .generate_tree(&request)
            .await
            .expect("generation succeeds");

        assert_eq!(response.topic_tree.len(), 3);
        assert!(response.topic_tree.iter().all(|t| t.children.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_phase_one_is_fatal() {
        let orchestrator = orchestrator(|_| "[]".to_string());
        let request = TopicTreeRequest::new("Physik");

        let result = orchestrator.generate_tree(&request).await;
        assert!(matches!(result, Err(GenerationError::MainTopicsFailed(_))));
    }

    #[tokio::test]
    async fn test_malformed_phase_one_is_fatal() {
        let orchestrator = orchestrator(|_| "kein JSON".to_string());
        let request = TopicTreeRequest::new("Physik");

        let result = orchestrator.generate_tree(&request).await;
        assert!(matches!(result, Err(GenerationError::MainTopicsFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_rejected_before_any_call() {
        let orchestrator = orchestrator(|_| panic!("no call expected"));
        let mut request = TopicTreeRequest::new("Physik");
        request.num_main_topics = 0;

        let result = orchestrator.generate_tree(&request).await;
        assert!(matches!(result, Err(GenerationError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_soft_failure_isolated_to_one_branch() {
        // The subtopic call for Main3 always returns malformed text; every
        // other branch must stay intact.
        let orchestrator = orchestrator(|prompt| {
            if prompt.contains("Hauptthemen für das Thema") {
                topics_json(&["Main1", "Main2", "Main3", "Main4", "Main5"])
            } else if prompt.contains("Hauptthema \"Main3\"") {
                "das ist kein JSON".to_string()
            } else {
                topics_json(&["Sub"])
            }
        });
        let mut request = TopicTreeRequest::new("Physik");
        request.num_main_topics = 5;
        request.num_subtopics = 1;
        request.num_curriculum_topics = 0;

        let response = orchestrator
            .generate_tree(&request)
            .await
            .expect("soft failure must not abort the request");

        let children: Vec<usize> = response
            .topic_tree
            .iter()
            .map(|main| main.children.len())
            .collect();
        assert_eq!(children, vec![1, 1, 0, 1, 1]);
    }

    #[tokio::test]
    async fn test_finalization_rewrites_uris_on_every_node() {
        let orchestrator = orchestrator(|prompt| {
            if prompt.contains("Lehrplanthemen") {
                topics_json(&["Lp"])
            } else if prompt.contains("Unterthemen") {
                topics_json(&["Sub"])
            } else {
                topics_json(&["Main1", "Main2"])
            }
        });
        let mut request = TopicTreeRequest::new("Physik");
        request.num_main_topics = 2;
        request.num_subtopics = 1;
        request.num_curriculum_topics = 1;
        request.discipline_uris =
            vec!["http://w3id.org/openeduhub/vocabs/discipline/460".to_string()];
        request.educational_context_uris = vec![
            "http://w3id.org/openeduhub/vocabs/educationalContext/sekundarstufe_2".to_string(),
        ];

        let response = orchestrator
            .generate_tree(&request)
            .await
            .expect("generation succeeds");

        let mut stack: Vec<&TopicNode> = response.topic_tree.iter().collect();
        let mut visited = 0;
        while let Some(node) = stack.pop() {
            visited += 1;
            assert_eq!(node.properties.taxon_ids, request.discipline_uris);
            assert_eq!(
                node.properties.educational_context,
                request.educational_context_uris
            );
            assert!(node.properties.text_statistics.is_some());
            stack.extend(node.children.iter());
        }
        assert_eq!(visited, 6);
    }

    #[tokio::test]
    async fn test_zero_counts_skip_deeper_phases() {
        let orchestrator = orchestrator(|prompt| {
            assert!(
                !prompt.contains("Unterthemen für"),
                "no subtopic call expected"
            );
            topics_json(&["Main1"])
        });
        let mut request = TopicTreeRequest::new("Physik");
        request.num_main_topics = 1;
        request.num_subtopics = 0;
        request.num_curriculum_topics = 0;

        let response = orchestrator
            .generate_tree(&request)
            .await
            .expect("generation succeeds");
        assert!(response.topic_tree[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_echoes_request() {
        let orchestrator = orchestrator(|_| topics_json(&["Main1"]));
        let mut request = TopicTreeRequest::new("Photosynthese");
        request.num_main_topics = 1;
        request.num_subtopics = 0;
        request.num_curriculum_topics = 0;
        request.model = "gpt-4o".to_string();

        let response = orchestrator
            .generate_tree(&request)
            .await
            .expect("generation succeeds");

        assert_eq!(response.metadata.theme, "Photosynthese");
        assert_eq!(response.metadata.model, "gpt-4o");
        assert_eq!(response.metadata.num_main_topics, 1);
        assert_eq!(response.statistics.total_descriptions, 1);
    }
}
