//! Final document assembly.
//!
//! A successful chain run yields one labeled section per agent, in chain
//! order, separated by [`SECTION_DIVIDER`]:
//!
//! ```text
//! ## ⚖️ Legal Agent
//!
//! <legal output>
//!
//! ---
//!
//! ## 🎯 Product Agent
//!
//! <product output>
//! ```

use crate::AgentResult;

/// Separator between sections of the final document and between prior
/// contributions in a prompt.
pub const SECTION_DIVIDER: &str = "\n\n---\n\n";

/// The ordered results of a completed chain run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainDocument {
    results: Vec<AgentResult>,
}

impl ChainDocument {
    /// Wraps completed results, in chain order.
    pub fn new(results: Vec<AgentResult>) -> Self {
        Self { results }
    }

    /// The results, in chain order.
    pub fn results(&self) -> &[AgentResult] {
        &self.results
    }

    /// Renders the document as markdown.
    pub fn render(&self) -> String {
        self.results
            .iter()
            .map(|r| format!("## {} {}\n\n{}", r.emoji, r.agent_name, r.output))
            .collect::<Vec<_>>()
            .join(SECTION_DIVIDER)
    }

    /// Splits a rendered document back into `(heading, body)` pairs.
    ///
    /// Exact inverse of [`ChainDocument::render`] as long as no agent output
    /// itself contains [`SECTION_DIVIDER`].
    pub fn split_sections(rendered: &str) -> Vec<(&str, &str)> {
        if rendered.is_empty() {
            return Vec::new();
        }
        rendered
            .split(SECTION_DIVIDER)
            .map(|section| {
                let section = section.strip_prefix("## ").unwrap_or(section);
                section.split_once("\n\n").unwrap_or((section, ""))
            })
            .collect()
    }
}

impl From<ChainDocument> for String {
    fn from(document: ChainDocument) -> Self {
        document.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentId;

    fn result(id: &str, name: &str, emoji: &str, output: &str) -> AgentResult {
        AgentResult {
            agent_id: AgentId::new(id).unwrap(),
            agent_name: name.into(),
            emoji: emoji.into(),
            output: output.into(),
        }
    }

    #[test]
    fn two_agent_document_has_labeled_sections_in_order() {
        let doc = ChainDocument::new(vec![
            result("legal", "Legal Agent", "⚖️", "X"),
            result("product", "Product Agent", "🎯", "Y"),
        ]);
        let rendered = doc.render();
        assert_eq!(
            rendered,
            "## ⚖️ Legal Agent\n\nX\n\n---\n\n## 🎯 Product Agent\n\nY"
        );
        assert!(rendered.find('X').unwrap() < rendered.find('Y').unwrap());
    }

    #[test]
    fn splitting_on_divider_round_trips_outputs() {
        let doc = ChainDocument::new(vec![
            result("legal", "Legal Agent", "⚖️", "X"),
            result("product", "Product Agent", "🎯", "Y"),
        ]);
        let rendered = doc.render();
        let sections = ChainDocument::split_sections(&rendered);
        assert_eq!(
            sections,
            [("⚖️ Legal Agent", "X"), ("🎯 Product Agent", "Y")]
        );
    }

    #[test]
    fn multi_paragraph_output_survives_split() {
        let doc = ChainDocument::new(vec![result("a", "A", "*", "one\n\ntwo\n- three")]);
        let rendered = doc.render();
        assert_eq!(
            ChainDocument::split_sections(&rendered),
            [("* A", "one\n\ntwo\n- three")]
        );
    }

    #[test]
    fn empty_document_renders_empty() {
        let doc = ChainDocument::default();
        assert_eq!(doc.render(), "");
        assert!(ChainDocument::split_sections("").is_empty());
    }
}
