//! Static agent registry and tool catalog.
//!
//! Both are read-only configuration loaded once at startup and shared via
//! `Arc` without locking. A tool maps to an ordered agent chain plus the form
//! fields it asks the caller for; the registry maps agent identifiers to
//! their role metadata and system instructions.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sanitize::{bound_input, MAX_FIELD_ID_LENGTH};
use crate::{AgentDefinition, AgentId, CopilotError, FieldId, Inputs, ToolId, ValidationReason};

// ---------------------------------------------------------------------------
// Agent registry
// ---------------------------------------------------------------------------

/// Immutable catalog of agents keyed by [`AgentId`].
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Arc<AgentDefinition>>,
}

impl AgentRegistry {
    /// Builds a registry, rejecting duplicate identifiers.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = AgentDefinition>,
    ) -> Result<Self, CopilotError> {
        let mut agents = HashMap::new();
        for definition in definitions {
            let id = definition.id.clone();
            if agents.insert(id.clone(), Arc::new(definition)).is_some() {
                return Err(CopilotError::configuration(format!(
                    "agent '{id}' is defined more than once"
                )));
            }
        }
        Ok(Self { agents })
    }

    /// The four built-in compliance agents.
    pub fn builtin() -> Self {
        let agents = builtin_agents()
            .into_iter()
            .map(|definition| (definition.id.clone(), Arc::new(definition)))
            .collect();
        Self { agents }
    }

    /// Looks up one agent.
    pub fn get(&self, id: &str) -> Option<&Arc<AgentDefinition>> {
        self.agents.get(id)
    }

    /// Resolves an ordered chain of identifiers.
    ///
    /// Fails on the first unknown identifier, before any agent is called.
    /// Chains must contain at least one agent.
    pub fn resolve_chain<S: AsRef<str>>(
        &self,
        chain: &[S],
    ) -> Result<Vec<Arc<AgentDefinition>>, CopilotError> {
        if chain.is_empty() {
            return Err(CopilotError::configuration("agent chain is empty"));
        }
        chain
            .iter()
            .map(|id| {
                let id = id.as_ref();
                self.agents
                    .get(id)
                    .cloned()
                    .ok_or_else(|| CopilotError::UnknownAgent {
                        agent_id: id.to_string(),
                    })
            })
            .collect()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns `true` if no agents are registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tool catalog
// ---------------------------------------------------------------------------

/// How a form field is presented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Textarea,
    /// One of a fixed set of options.
    Select,
}

/// One input field of a tool form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolField {
    /// Field key in the request body.
    pub id: FieldId,
    /// Human-readable label.
    pub label: String,
    /// Presentation hint.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Example value shown in the empty input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Whether the field must be present and non-empty.
    pub required: bool,
    /// Allowed values for [`FieldKind::Select`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// A document generator: an agent chain plus the inputs it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Catalog key (e.g. `"gdpr-docs"`).
    pub id: ToolId,
    /// Display name.
    pub name: String,
    /// Short icon.
    pub emoji: String,
    /// One-line description.
    pub description: String,
    /// Agents to run, in order.
    pub agent_chain: Vec<AgentId>,
    /// Form fields.
    pub input_fields: Vec<ToolField>,
}

impl ToolDefinition {
    /// Returns the first required field that is absent or empty in `inputs`.
    pub fn missing_required(&self, inputs: &Inputs) -> Option<&ToolField> {
        self.input_fields.iter().find(|field| {
            field.required
                && inputs
                    .get(field.id.as_str())
                    .is_none_or(|value| value.is_empty())
        })
    }

    /// Returns the first key in `inputs` that this tool does not declare.
    pub fn undeclared_field<'a>(&self, inputs: &'a Inputs) -> Option<&'a str> {
        inputs
            .keys()
            .map(String::as_str)
            .find(|key| !self.input_fields.iter().any(|field| field.id.as_str() == *key))
    }

    /// Rejects inputs carrying keys outside [`ToolDefinition::input_fields`].
    pub fn check_declared(&self, inputs: &Inputs) -> Result<(), CopilotError> {
        match self.undeclared_field(inputs) {
            Some(key) => Err(CopilotError::Validation {
                field: bound_input(key, MAX_FIELD_ID_LENGTH),
                reason: ValidationReason::UnknownField,
            }),
            None => Ok(()),
        }
    }

    /// [`ToolDefinition::missing_required`] as a validation error.
    pub fn check_required(&self, inputs: &Inputs) -> Result<(), CopilotError> {
        match self.missing_required(inputs) {
            Some(field) => Err(CopilotError::Validation {
                field: field.id.to_string(),
                reason: ValidationReason::MissingField {
                    label: field.label.clone(),
                },
            }),
            None => Ok(()),
        }
    }
}

/// Immutable catalog of tools keyed by [`ToolId`], in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<Arc<ToolDefinition>>,
}

impl ToolCatalog {
    /// Builds a catalog, rejecting duplicate identifiers.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ToolDefinition>,
    ) -> Result<Self, CopilotError> {
        let mut tools: Vec<Arc<ToolDefinition>> = Vec::new();
        for definition in definitions {
            if tools.iter().any(|t| t.id == definition.id) {
                return Err(CopilotError::configuration(format!(
                    "tool '{}' is defined more than once",
                    definition.id
                )));
            }
            tools.push(Arc::new(definition));
        }
        Ok(Self { tools })
    }

    /// The five built-in compliance tools.
    pub fn builtin() -> Self {
        Self {
            tools: builtin_tools().into_iter().map(Arc::new).collect(),
        }
    }

    /// Looks up one tool.
    pub fn get(&self, id: &str) -> Result<&Arc<ToolDefinition>, CopilotError> {
        self.tools
            .iter()
            .find(|tool| tool.id.as_str() == id)
            .ok_or_else(|| CopilotError::UnknownTool {
                tool_id: id.to_string(),
            })
    }

    /// Iterates tools in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ToolDefinition>> {
        self.tools.iter()
    }

    /// Checks that every tool's chain is non-empty and resolves in `registry`.
    pub fn validate_against(&self, registry: &AgentRegistry) -> Result<(), CopilotError> {
        for tool in &self.tools {
            registry
                .resolve_chain(&tool.agent_chain)
                .map_err(|e| {
                    CopilotError::configuration(format!("tool '{}' has an invalid chain: {e}", tool.id))
                })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in data
// ---------------------------------------------------------------------------

fn agent(id: &str, name: &str, emoji: &str, system_prompt: &str) -> AgentDefinition {
    AgentDefinition {
        id: AgentId(id.to_string()),
        name: name.to_string(),
        emoji: emoji.to_string(),
        agent_tag: format!("@{id}"),
        system_prompt: system_prompt.to_string(),
    }
}

fn builtin_agents() -> Vec<AgentDefinition> {
    vec![
        agent(
            "legal",
            "Legal Agent",
            "⚖️",
            "You are a senior compliance attorney specializing in GDPR, CCPA, SOC2, and enterprise \
             data privacy law. Draft precise, legally sound compliance documents. Always cite specific \
             legal articles and regulations. Structure output with clear headings, numbered sections, \
             and professional legal language. IMPORTANT: Always include this disclaimer: \"⚠️ \
             DISCLAIMER: This document is AI-generated for reference purposes only and must be \
             reviewed by a qualified attorney before use.\"",
        ),
        agent(
            "security",
            "Security Agent",
            "🛡️",
            "You are a senior security architect with expertise in cloud security, threat modeling, \
             SOC2, GDPR data flows, and enterprise security controls. Assess security posture and \
             identify gaps with actionable remediation steps. Reference OWASP, NIST, and CIS \
             benchmarks. Output findings with severity levels (Critical/High/Medium/Low).",
        ),
        agent(
            "product",
            "Product Agent",
            "🎯",
            "You are a product strategist who translates complex legal and security requirements \
             into clear, actionable implementation checklists. Make technical content accessible to \
             non-technical founders while preserving accuracy. Output structured checklists with \
             priorities (High/Medium/Low), estimated timelines, and responsible team roles. Build \
             upon prior agents; do not repeat their content, only enhance it.",
        ),
        agent(
            "sales",
            "Sales Agent",
            "📊",
            "You are an enterprise sales specialist who rewrites technical security and compliance \
             content into customer-facing language that builds trust with Fortune 500 buyers. \
             Maintain technical accuracy while making content compelling for enterprise vendor \
             review processes. Build upon previous agents' work to create an executive summary and \
             customer-facing narrative.",
        ),
    ]
}

fn field(id: &str, label: &str, kind: FieldKind, placeholder: &str, required: bool) -> ToolField {
    ToolField {
        id: FieldId(id.to_string()),
        label: label.to_string(),
        kind,
        placeholder: Some(placeholder.to_string()),
        required,
        options: Vec::new(),
    }
}

fn tool(
    id: &str,
    name: &str,
    emoji: &str,
    description: &str,
    chain: &[&str],
    input_fields: Vec<ToolField>,
) -> ToolDefinition {
    ToolDefinition {
        id: ToolId(id.to_string()),
        name: name.to_string(),
        emoji: emoji.to_string(),
        description: description.to_string(),
        agent_chain: chain.iter().map(|a| AgentId(a.to_string())).collect(),
        input_fields,
    }
}

fn builtin_tools() -> Vec<ToolDefinition> {
    use FieldKind::{Text, Textarea};

    let company = || field("companyName", "Company Name", Text, "TechCorp Inc.", true);
    let eu_users = ToolField {
        id: FieldId("euUsers".to_string()),
        label: "Do you have EU users?".to_string(),
        kind: FieldKind::Select,
        placeholder: None,
        required: true,
        options: vec!["Yes".into(), "No".into(), "Planning to".into()],
    };

    vec![
        tool(
            "privacy-policy",
            "Privacy Policy Generator",
            "📜",
            "Generate a GDPR & CCPA compliant privacy policy for your startup.",
            &["legal", "product"],
            vec![
                company(),
                field("website", "Website URL", Text, "https://techcorp.io", true),
                field(
                    "dataCollected",
                    "Data You Collect",
                    Textarea,
                    "Name, email, payment info, usage analytics...",
                    true,
                ),
                field("country", "Primary Country of Operation", Text, "United States", true),
            ],
        ),
        tool(
            "soc2-checklist",
            "SOC2 Readiness Checklist",
            "✅",
            "Get a prioritized SOC2 gap analysis and action plan.",
            &["security", "product"],
            vec![
                company(),
                field("infrastructure", "Cloud Infrastructure", Text, "AWS, GCP, Azure...", true),
                field("teamSize", "Engineering Team Size", Text, "10", true),
                field(
                    "currentControls",
                    "Current Security Controls",
                    Textarea,
                    "MFA enabled, VPN, access reviews...",
                    false,
                ),
            ],
        ),
        tool(
            "gdpr-docs",
            "GDPR Documentation Suite",
            "🇪🇺",
            "Full GDPR documentation including DPA and DPIA templates.",
            &["legal", "security", "product"],
            vec![
                company(),
                eu_users,
                field(
                    "dataTypes",
                    "Types of Personal Data",
                    Textarea,
                    "Email, location, behavioral data...",
                    true,
                ),
                field(
                    "dataProcessors",
                    "Third-party Data Processors",
                    Textarea,
                    "Stripe, AWS, Mixpanel...",
                    false,
                ),
            ],
        ),
        tool(
            "security-arch",
            "Security Architecture Report",
            "🏗️",
            "Enterprise-ready security architecture documentation.",
            &["security", "sales"],
            vec![
                company(),
                field(
                    "infrastructure",
                    "Infrastructure Stack",
                    Textarea,
                    "AWS ECS, RDS PostgreSQL, CloudFront...",
                    true,
                ),
                field("authMethod", "Authentication Method", Text, "JWT, OAuth2, SSO...", true),
                field(
                    "sensitiveData",
                    "Sensitive Data Handled",
                    Textarea,
                    "PII, payment data, health records...",
                    true,
                ),
            ],
        ),
        tool(
            "vendor-risk",
            "Vendor Risk Questionnaire",
            "📋",
            "Complete enterprise vendor security assessments automatically.",
            &["security", "sales", "legal"],
            vec![
                company(),
                field(
                    "productDescription",
                    "Product Description",
                    Textarea,
                    "B2B SaaS platform for...",
                    true,
                ),
                field(
                    "certifications",
                    "Current Certifications",
                    Text,
                    "SOC2 Type I, ISO 27001...",
                    false,
                ),
                field(
                    "incidentHistory",
                    "Security Incident History",
                    Textarea,
                    "No incidents, or describe...",
                    false,
                ),
            ],
        ),
    ]
}
