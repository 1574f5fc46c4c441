//! Prompt composition with context accumulation.
//!
//! Each agent sees the caller's inputs as `key: value` lines. From the second
//! agent on, the prompt also carries every prior agent's output, attributed by
//! name and separated by [`pipeline::SECTION_DIVIDER`].

use pipeline::{AgentResult, Inputs, SECTION_DIVIDER};

/// Heading that introduces the prior-agent block.
pub const CONTRIBUTIONS_HEADER: &str = "Previous agent contributions:";

/// Builds the prompt for the next agent in a chain.
pub fn build_prompt(inputs: &Inputs, prior: &[AgentResult]) -> String {
    let mut prompt = inputs
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");

    if !prior.is_empty() {
        let contributions = prior
            .iter()
            .map(|r| format!("[{}]:\n{}", r.agent_name, r.output))
            .collect::<Vec<_>>()
            .join(SECTION_DIVIDER);
        prompt.push_str("\n\n");
        prompt.push_str(CONTRIBUTIONS_HEADER);
        prompt.push('\n');
        prompt.push_str(&contributions);
    }

    prompt
}
