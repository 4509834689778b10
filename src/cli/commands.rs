//! CLI command definitions for topic-forge.
//!
//! Provides the `generate` command that drives the three-phase pipeline
//! and writes the response envelope as JSON.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::pipeline::{TopicTreeOrchestrator, TopicTreeRequest, DEFAULT_MODEL};
use crate::tree::TopicNode;
use crate::vocab::VocabCache;

/// Topic tree generator for educational collections.
#[derive(Parser)]
#[command(name = "topic-forge")]
#[command(about = "Generate hierarchical topic trees for educational collections via LLM")]
#[command(version)]
#[command(
    long_about = "topic-forge generates three-level topic trees (main topics, subtopics, \
curriculum topics) for an educational theme by orchestrating an OpenAI-compatible \
chat-completion service.\n\nExample usage:\n  topic-forge generate --theme \"Physik der \
Sekundarstufe II\" --num-main-topics 8 --output tree.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a topic tree for a theme.
    #[command(alias = "gen")]
    Generate(GenerateArgs),
}

/// Arguments for `topic-forge generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Overall theme of the topic tree.
    #[arg(short, long)]
    pub theme: String,

    /// Number of main topics (1-30).
    #[arg(long, default_value = "5")]
    pub num_main_topics: u32,

    /// Number of subtopics per main topic (0-20).
    #[arg(long, default_value = "3")]
    pub num_subtopics: u32,

    /// Number of curriculum topics per subtopic (0-20).
    #[arg(long, default_value = "2")]
    pub num_curriculum_topics: u32,

    /// Ask for a general-purpose main topic ("Allgemeines") in first place.
    #[arg(long)]
    pub include_general_topic: bool,

    /// Ask for a didactics main topic ("Methodik und Didaktik") in last place.
    #[arg(long)]
    pub include_methodology_topic: bool,

    /// Character budget for generated descriptions (50-2000).
    #[arg(long, default_value = "500")]
    pub max_description_length: u32,

    /// Discipline URI embedded into every node and hinted in prompts.
    /// Repeat for multiple URIs.
    #[arg(long = "discipline-uri")]
    pub discipline_uris: Vec<String>,

    /// Educational-context URI embedded into every node and hinted in
    /// prompts. Repeat for multiple URIs.
    #[arg(long = "educational-context-uri")]
    pub educational_context_uris: Vec<String>,

    /// Chat-completion model identifier.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Write the JSON envelope to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Skip fetching the vocabulary label caches at startup.
    #[arg(long)]
    pub skip_vocab: bool,
}

impl GenerateArgs {
    fn to_request(&self) -> TopicTreeRequest {
        TopicTreeRequest {
            theme: self.theme.clone(),
            num_main_topics: self.num_main_topics,
            num_subtopics: self.num_subtopics,
            num_curriculum_topics: self.num_curriculum_topics,
            include_general_topic: self.include_general_topic,
            include_methodology_topic: self.include_methodology_topic,
            max_description_length: self.max_description_length,
            discipline_uris: self.discipline_uris.clone(),
            educational_context_uris: self.educational_context_uris.clone(),
            model: self.model.clone(),
        }
    }
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the selected command with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => run_generate_command(args).await,
    }
}

async fn run_generate_command(args: GenerateArgs) -> anyhow::Result<()> {
    let request = args.to_request();

    let vocab = if args.skip_vocab {
        VocabCache::empty()
    } else {
        let http = reqwest::Client::new();
        VocabCache::load_default(&http).await
    };

    let orchestrator = TopicTreeOrchestrator::from_env(Arc::new(vocab))?;
    let response = orchestrator.generate_tree(&request).await?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &json)?;
            info!(path = %path.display(), "Topic tree written");
        }
        None => println!("{}", json),
    }

    info!(
        main_topics = response.topic_tree.len(),
        nodes = response
            .topic_tree
            .iter()
            .map(TopicNode::node_count)
            .sum::<usize>(),
        descriptions = response.statistics.total_descriptions,
        "Generation finished"
    );

    Ok(())
}
