// Prompt assembly for evidence-grounded answers
use crate::session::ConversationTurn;
use crate::types::{Document, SourceKind};

/// Fixed system prompt sent with every question
pub const SYSTEM_PROMPT: &str = "You are an assistant helping employers evaluate a job candidate from their profile.

Rules:
1. Answer ONLY from the numbered evidence in the user message and the candidate profile summary.
2. Cite the evidence you rely on by its number in square brackets, for example [1] or [2, 3].
3. Mention confidence levels when discussing skills; treat confidence below 0.5 as a caveat.
4. If the evidence does not answer the question, say \"Not found in candidate profile\".
5. Be concise, factual and objective. Never speculate beyond the evidence.";

const SKILL_PREVIEW_CHARS: usize = 200;
const TEXT_PREVIEW_CHARS: usize = 300;

/// Builds the user prompt from retrieved evidence, history and the question
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    skill_preview_chars: usize,
    text_preview_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            skill_preview_chars: SKILL_PREVIEW_CHARS,
            text_preview_chars: TEXT_PREVIEW_CHARS,
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the user prompt.
    ///
    /// Sections, in order: previous conversation (when any), profile summary
    /// (when any), numbered evidence, the question, instructions.
    pub fn build(
        &self,
        question: &str,
        evidence: &[&Document],
        summary: Option<&str>,
        history: &[&ConversationTurn],
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !history.is_empty() {
            parts.push("PREVIOUS CONVERSATION:".to_string());
            parts.push(Self::format_history(history));
            parts.push(String::new());
        }

        if let Some(summary) = summary.map(str::trim).filter(|s| !s.is_empty()) {
            parts.push("CANDIDATE PROFILE SUMMARY:".to_string());
            parts.push(summary.to_string());
            parts.push(String::new());
        }

        parts.push("RELEVANT INFORMATION FROM PROFILE:".to_string());
        for (idx, document) in evidence.iter().enumerate() {
            parts.push(self.format_document(idx + 1, document));
        }
        parts.push(String::new());

        parts.push("EMPLOYER QUESTION:".to_string());
        parts.push(question.trim().to_string());
        parts.push(String::new());

        parts.push("INSTRUCTIONS:".to_string());
        parts.push("Answer using only the information above.".to_string());
        parts.push("- Cite evidence by number, e.g. [1] or [1, 3]".to_string());
        parts.push("- Include confidence levels when discussing skills".to_string());
        parts.push("- If information is missing, state 'Not found in candidate profile'".to_string());
        parts.push(String::new());
        parts.push("ANSWER:".to_string());

        parts.join("\n")
    }

    /// One numbered evidence entry with its source kind and label
    pub fn format_document(&self, index: usize, document: &Document) -> String {
        let metadata = &document.metadata;
        let (header, limit) = match (metadata.source_kind, metadata.confidence) {
            (SourceKind::Skill, Some(confidence)) => (
                format!("[{}] ({}) {} (confidence: {:.2})", index, metadata.source_kind, metadata.label, confidence),
                self.skill_preview_chars,
            ),
            (SourceKind::Skill, None) => (
                format!("[{}] ({}) {}", index, metadata.source_kind, metadata.label),
                self.skill_preview_chars,
            ),
            (kind, _) => (
                format!("[{}] ({}) {}", index, kind, metadata.label),
                self.text_preview_chars,
            ),
        };
        format!("{}\n    {}", header, preview(document.text.trim(), limit))
    }

    /// Raw question/answer pairs, oldest first
    fn format_history(history: &[&ConversationTurn]) -> String {
        history
            .iter()
            .map(|turn| format!("EMPLOYER: {}\nASSISTANT: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// First `max_chars` characters, with an ellipsis when cut
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;
    use crate::types::DocumentInput;

    fn document(text: &str, kind: SourceKind, label: &str, confidence: Option<f32>) -> Document {
        let mut input = DocumentInput::new(text, kind, label);
        input.confidence = confidence;
        Document {
            id: format!("{}-0", kind),
            text: text.to_string(),
            embedding: Vec::new(),
            metadata: input.metadata(),
        }
    }

    #[test]
    fn test_sections_in_order() {
        let go = document("Go services", SourceKind::Skill, "Go", Some(0.9));
        let turn = ConversationTurn::new("Earlier?", "Earlier answer", Vec::new(), ProviderKind::Gemini);
        let prompt = PromptBuilder::new().build(
            "Does this candidate know Go?",
            &[&go],
            Some("Backend engineer"),
            &[&turn],
        );

        let order = [
            "PREVIOUS CONVERSATION:",
            "CANDIDATE PROFILE SUMMARY:",
            "RELEVANT INFORMATION FROM PROFILE:",
            "EMPLOYER QUESTION:",
            "INSTRUCTIONS:",
            "ANSWER:",
        ];
        let positions: Vec<usize> = order.iter().map(|s| prompt.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(prompt.contains("[1] (skill) Go (confidence: 0.90)"));
        assert!(prompt.contains("ASSISTANT: Earlier answer"));
    }

    #[test]
    fn test_optional_sections_omitted() {
        let doc = document("Statement", SourceKind::Statement, "Personal statement", None);
        let prompt = PromptBuilder::new().build("Q?", &[&doc], None, &[]);
        assert!(!prompt.contains("PREVIOUS CONVERSATION:"));
        assert!(!prompt.contains("CANDIDATE PROFILE SUMMARY:"));
        assert!(prompt.contains("[1] (statement) Personal statement"));
    }

    #[test]
    fn test_previews_truncate_by_kind() {
        let long = "x".repeat(500);
        let builder = PromptBuilder::new();

        let skill = builder.format_document(1, &document(&long, SourceKind::Skill, "Rust", None));
        assert!(skill.ends_with(&format!("{}...", "x".repeat(200))));

        let repo = builder.format_document(2, &document(&long, SourceKind::Repository, "repo", None));
        assert!(repo.ends_with(&format!("{}...", "x".repeat(300))));
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo wörld", 4), "héll...");
        assert_eq!(preview("short", 10), "short");
    }
}
