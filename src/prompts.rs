//! Prompt templates and builders for the three generation phases.
//!
//! All prompts are German, matching the target vocabulary of the generated
//! trees. Every call shares the [`BASE_INSTRUCTIONS`] system preamble (the
//! formatting rulebook); the per-phase user prompts embed the theme, the
//! requested count, sibling titles for disambiguation, and optional
//! discipline/educational-context hints.

use crate::llm::{GenerationRequest, Message};
use crate::pipeline::request::TopicTreeRequest;
use crate::vocab::VocabCache;

/// Sampling temperature for every topic generation call.
pub const SAMPLING_TEMPERATURE: f64 = 0.7;

/// Output cap for every topic generation call.
pub const COMPLETION_TOKEN_LIMIT: u32 = 2000;

/// Shared system preamble: the formatting rulebook for every phase.
pub const BASE_INSTRUCTIONS: &str = r#"Du bist ein hilfreicher KI-Assistent für Lehr- und Lernsituationen.
Antworte immer ausschließlich mit purem JSON (keine Code-Fences, kein Markdown).
Falls du nicht antworten kannst, liefere ein leeres JSON-Array.

FORMATIERUNGSREGELN:
1) TITEL: Langformen und Substantive, keine Artikel, keine Sonderzeichen (& / –),
   Adjektive klein, Substantive groß. Jeder Titel muss eindeutig sein.
2) KURZTITEL: maximal 20 Zeichen, nur Buchstaben, Ziffern und Leerzeichen, eindeutig.
3) BESCHREIBUNG: Ansprechender, prägnanter Text in zwei Absätzen, der die Sammlung
   vorstellt und zeigt, wie Lehrende und Lernende sie nutzen können. Kurze Sätze,
   verständliche Sprache, aktive Formulierungen, keine repetitiven Phrasen wie
   "Diese Sammlung..." oder "Dieses Thema...". Halte die maximale Zeichenlänge ein
   (inklusive Leerzeichen). Keine URLs, keine Markennamen.
4) KEYWORDS: Mindestens 3 relevante Schlagworte pro Eintrag.
5) HIERARCHIE: Keine Synonyme oder Redundanzen zwischen Geschwister-Themen.
6) Verstehe Anzahlvorgaben als Höchstgrenzen: weniger, klar trennscharfe Themen
   sind besser als viele schwach differenzierte.

Verwende niemals doppelte title-Werte."#;

/// Expected JSON shape appended to every user prompt.
const OUTPUT_FORMAT: &str = r#"Erwartet wird ein JSON-Array dieser Form:
[
  {
    "title": "Name des Themas",
    "shorttitle": "Kurzer Titel",
    "description": "Ansprechende Beschreibung in zwei Absätzen gemäß den Regeln",
    "keywords": ["Schlagwort1", "Schlagwort2", "Schlagwort3"]
  }
]"#;

/// User prompt for Phase 1 (main topics).
const MAIN_TOPIC_TEMPLATE: &str = r#"Erstelle eine Liste von {count} Hauptthemen für das Thema "{theme}".

{special_instructions}

{context_instructions}

MAXIMALE ZEICHENLÄNGE FÜR BESCHREIBUNGEN: {max_description_length} Zeichen (inkl. Leerzeichen)

{output_format}"#;

/// User prompt for Phase 2 (subtopics of one main topic).
const SUBTOPIC_TEMPLATE: &str = r#"Erstelle eine Liste von {count} Unterthemen für das Hauptthema "{main_topic}" im Kontext "{theme}".

Die anderen Hauptthemen des Themenbaums lauten: {sibling_main_topics}
Die Unterthemen müssen sich klar von diesen Hauptthemen abgrenzen.

{context_instructions}

MAXIMALE ZEICHENLÄNGE FÜR BESCHREIBUNGEN: {max_description_length} Zeichen (inkl. Leerzeichen)

{output_format}"#;

/// User prompt for Phase 3 (curriculum topics of one subtopic).
const CURRICULUM_TOPIC_TEMPLATE: &str = r#"Erstelle eine Liste von {count} Lehrplanthemen für das Unterthema "{subtopic}" des Hauptthemas "{main_topic}" im Kontext "{theme}".

Die anderen Unterthemen von "{main_topic}" lauten: {sibling_subtopics}
Die Hauptthemen des Themenbaums lauten: {main_topics}
Die Lehrplanthemen müssen sich klar von diesen Themen abgrenzen.

{context_instructions}

MAXIMALE ZEICHENLÄNGE FÜR BESCHREIBUNGEN: {max_description_length} Zeichen (inkl. Leerzeichen)

{output_format}"#;

/// Ordering instructions for the two optional fixed main topics.
pub fn special_instructions(request: &TopicTreeRequest) -> String {
    let mut instructions = Vec::new();
    if request.include_general_topic {
        instructions.push("1) Hauptthema 'Allgemeines' an erster Stelle");
    }
    if request.include_methodology_topic {
        instructions.push("2) Hauptthema 'Methodik und Didaktik' an letzter Stelle");
    }
    if instructions.is_empty() {
        "Keine besonderen Anweisungen.".to_string()
    } else {
        instructions.join("\n")
    }
}

/// Discipline and educational-context hint lines, enriched with readable
/// vocabulary labels where the cache has them. Empty when the request
/// carries no URIs.
pub fn context_instructions(request: &TopicTreeRequest, vocab: &VocabCache) -> String {
    let mut lines = Vec::new();
    if !request.discipline_uris.is_empty() {
        lines.push(format!(
            "Fachbereich: {}",
            readable_list(&request.discipline_uris, vocab)
        ));
    }
    if !request.educational_context_uris.is_empty() {
        lines.push(format!(
            "Zielgruppe/Bildungsstufe: {}",
            readable_list(&request.educational_context_uris, vocab)
        ));
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("Kontext-Informationen:\n{}", lines.join("\n"))
    }
}

fn readable_list(uris: &[String], vocab: &VocabCache) -> String {
    uris.iter()
        .map(|uri| vocab.readable_label(uri))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Phase 1 user prompt.
pub fn build_main_prompt(request: &TopicTreeRequest, context_instructions: &str) -> String {
    MAIN_TOPIC_TEMPLATE
        .replace("{count}", &request.num_main_topics.to_string())
        .replace("{theme}", &request.theme)
        .replace("{special_instructions}", &special_instructions(request))
        .replace("{context_instructions}", context_instructions)
        .replace(
            "{max_description_length}",
            &request.max_description_length.to_string(),
        )
        .replace("{output_format}", OUTPUT_FORMAT)
}

/// Phase 2 user prompt for one main topic.
pub fn build_subtopic_prompt(
    request: &TopicTreeRequest,
    main_topic: &str,
    sibling_main_topics: &[String],
    context_instructions: &str,
) -> String {
    SUBTOPIC_TEMPLATE
        .replace("{count}", &request.num_subtopics.to_string())
        .replace("{theme}", &request.theme)
        .replace("{main_topic}", main_topic)
        .replace("{sibling_main_topics}", &title_list(sibling_main_topics))
        .replace("{context_instructions}", context_instructions)
        .replace(
            "{max_description_length}",
            &request.max_description_length.to_string(),
        )
        .replace("{output_format}", OUTPUT_FORMAT)
}

/// Phase 3 user prompt for one (main topic, subtopic) pair.
pub fn build_curriculum_prompt(
    request: &TopicTreeRequest,
    main_topic: &str,
    subtopic: &str,
    sibling_subtopics: &[String],
    main_topics: &[String],
    context_instructions: &str,
) -> String {
    CURRICULUM_TOPIC_TEMPLATE
        .replace("{count}", &request.num_curriculum_topics.to_string())
        .replace("{theme}", &request.theme)
        .replace("{main_topic}", main_topic)
        .replace("{subtopic}", subtopic)
        .replace("{sibling_subtopics}", &title_list(sibling_subtopics))
        .replace("{main_topics}", &title_list(main_topics))
        .replace("{context_instructions}", context_instructions)
        .replace(
            "{max_description_length}",
            &request.max_description_length.to_string(),
        )
        .replace("{output_format}", OUTPUT_FORMAT)
}

fn title_list(titles: &[String]) -> String {
    if titles.is_empty() {
        "keine".to_string()
    } else {
        titles.join(", ")
    }
}

/// Assemble the chat request for one generation call: system preamble plus
/// user prompt, fixed temperature and output cap.
pub fn completion_request(prompt: String, model: &str) -> GenerationRequest {
    GenerationRequest::new(
        model,
        vec![Message::system(BASE_INSTRUCTIONS), Message::user(prompt)],
    )
    .with_temperature(SAMPLING_TEMPERATURE)
    .with_max_tokens(COMPLETION_TOKEN_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TopicTreeRequest {
        TopicTreeRequest::new("Physik")
    }

    #[test]
    fn test_special_instructions_default() {
        assert_eq!(special_instructions(&request()), "Keine besonderen Anweisungen.");
    }

    #[test]
    fn test_special_instructions_both_topics() {
        let mut req = request();
        req.include_general_topic = true;
        req.include_methodology_topic = true;

        let instructions = special_instructions(&req);
        assert!(instructions.contains("'Allgemeines' an erster Stelle"));
        assert!(instructions.contains("'Methodik und Didaktik' an letzter Stelle"));
    }

    #[test]
    fn test_context_instructions_empty_without_uris() {
        assert!(context_instructions(&request(), &VocabCache::empty()).is_empty());
    }

    #[test]
    fn test_context_instructions_humanizes_uris() {
        let mut req = request();
        req.educational_context_uris = vec![
            "http://w3id.org/openeduhub/vocabs/educationalContext/sekundarstufe_2".to_string(),
        ];

        let instructions = context_instructions(&req, &VocabCache::empty());
        assert!(instructions.contains("Zielgruppe/Bildungsstufe: sekundarstufe 2"));
    }

    #[test]
    fn test_main_prompt_embeds_parameters() {
        let mut req = request();
        req.num_main_topics = 7;
        req.max_description_length = 300;

        let prompt = build_main_prompt(&req, "");
        assert!(prompt.contains("7 Hauptthemen"));
        assert!(prompt.contains("\"Physik\""));
        assert!(prompt.contains("300 Zeichen"));
        assert!(prompt.contains("JSON-Array"));
        assert!(!prompt.contains("{count}"));
        assert!(!prompt.contains("{theme}"));
        assert!(!prompt.contains("{output_format}"));
    }

    #[test]
    fn test_subtopic_prompt_names_siblings() {
        let prompt = build_subtopic_prompt(
            &request(),
            "Mechanik",
            &["Optik".to_string(), "Thermodynamik".to_string()],
            "",
        );
        assert!(prompt.contains("Hauptthema \"Mechanik\""));
        assert!(prompt.contains("Optik, Thermodynamik"));
    }

    #[test]
    fn test_curriculum_prompt_names_full_context() {
        let prompt = build_curriculum_prompt(
            &request(),
            "Mechanik",
            "Kinematik",
            &["Dynamik".to_string()],
            &["Mechanik".to_string(), "Optik".to_string()],
            "Kontext-Informationen:\nFachbereich: Physik",
        );
        assert!(prompt.contains("Unterthema \"Kinematik\""));
        assert!(prompt.contains("Hauptthemas \"Mechanik\""));
        assert!(prompt.contains("Dynamik"));
        assert!(prompt.contains("Mechanik, Optik"));
        assert!(prompt.contains("Fachbereich: Physik"));
    }

    #[test]
    fn test_empty_sibling_list_renders_placeholder() {
        let prompt = build_subtopic_prompt(&request(), "Mechanik", &[], "");
        assert!(prompt.contains("lauten: keine"));
    }

    #[test]
    fn test_completion_request_shape() {
        let chat = completion_request("Prompt".to_string(), "gpt-4o-mini");
        assert_eq!(chat.model, "gpt-4o-mini");
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].role, "user");
        assert_eq!(chat.temperature, Some(SAMPLING_TEMPERATURE));
        assert_eq!(chat.max_tokens, Some(COMPLETION_TOKEN_LIMIT));
    }
}
