//! Input sanitization and prompt-injection defense.
//!
//! Every caller-supplied value is cleaned before it can reach an agent:
//! NUL bytes are stripped, surrounding whitespace is trimmed, and the value is
//! truncated to a per-field maximum. The cleaned value is then matched against
//! a fixed, ordered list of injection signatures. Sanitization of a request is
//! all-or-nothing: one tainted field rejects the whole request.
//!
//! Cleaning is idempotent. Truncation can expose trailing whitespace, so the
//! tail is trimmed again after truncating.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::{CopilotError, Inputs, ValidationReason};

/// Maximum length (in characters) for fields without an entry in the table.
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 1000;

/// Maximum length (in characters) of a field name.
pub const MAX_FIELD_ID_LENGTH: usize = 64;

const FIELD_ID_RULE: &str = "field names must be at most 64 characters, without NUL bytes or surrounding whitespace";

/// Ordered injection signatures: `(name, case-insensitive pattern)`.
const INJECTION_SIGNATURES: &[(&str, &str)] = &[
    ("ignore_previous_instructions", r"(?i)ignore\s+(all\s+)?previous\s+instructions"),
    ("role_reassignment", r"(?i)you\s+are\s+now\s+a"),
    ("jailbreak", r"(?i)jailbreak"),
    ("instruction_block", r"(?i)\[INST\].*\[/INST\]"),
    ("system_prompt", r"(?i)system\s*prompt"),
    ("override_system", r"(?i)override\s+system"),
    ("forget_instructions", r"(?i)forget\s+your\s+instructions"),
];

static INJECTION_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    INJECTION_SIGNATURES
        .iter()
        .filter_map(|(name, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((*name, re)),
            Err(e) => {
                warn!(signature = name, error = %e, "injection signature failed to compile");
                None
            }
        })
        .collect()
});

const BUILTIN_FIELD_LIMITS: &[(&str, usize)] = &[
    ("companyName", 100),
    ("website", 254),
    ("dataCollected", 2000),
    ("country", 100),
    ("infrastructure", 500),
    ("teamSize", 10),
    ("currentControls", 2000),
    ("euUsers", 20),
    ("dataTypes", 2000),
    ("dataProcessors", 1000),
    ("authMethod", 200),
    ("sensitiveData", 2000),
    ("productDescription", 2000),
    ("certifications", 500),
    ("incidentHistory", 2000),
];

// ---------------------------------------------------------------------------
// Field limits
// ---------------------------------------------------------------------------

/// Per-field maximum lengths, with a fallback for unrecognised ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLimits {
    limits: HashMap<String, usize>,
    fallback: usize,
}

impl FieldLimits {
    /// Creates an empty table where every field uses `fallback`.
    pub fn new(fallback: usize) -> Self {
        Self {
            limits: HashMap::new(),
            fallback,
        }
    }

    /// Adds or replaces the limit for one field id.
    #[must_use]
    pub fn with_limit(mut self, field_id: impl Into<String>, max_len: usize) -> Self {
        self.limits.insert(field_id.into(), max_len);
        self
    }

    /// Returns the maximum length for `field_id`.
    pub fn max_length_for(&self, field_id: &str) -> usize {
        self.limits.get(field_id).copied().unwrap_or(self.fallback)
    }
}

impl Default for FieldLimits {
    /// The limits for every field the built-in tool catalog declares.
    fn default() -> Self {
        BUILTIN_FIELD_LIMITS
            .iter()
            .fold(Self::new(DEFAULT_MAX_FIELD_LENGTH), |limits, (id, max)| {
                limits.with_limit(*id, *max)
            })
    }
}

// ---------------------------------------------------------------------------
// Sanitized values
// ---------------------------------------------------------------------------

/// A value after cleaning and injection screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedField {
    /// Cleaned value; empty when `injection_detected` is set.
    pub value: String,
    /// Whether the cleaned value matched an injection signature.
    pub injection_detected: bool,
}

/// Returns the name of the first injection signature `text` matches.
pub fn detect_prompt_injection(text: &str) -> Option<&'static str> {
    INJECTION_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
}

/// Strips NUL bytes, trims, and truncates to `max_len` characters.
///
/// No injection screening; used for values that never reach an agent
/// (e.g. registration fields).
pub fn bound_input(raw: &str, max_len: usize) -> String {
    let stripped: String = raw.chars().filter(|c| *c != '\0').collect();
    let trimmed = stripped.trim();
    let truncated = match trimmed.char_indices().nth(max_len) {
        Some((byte_idx, _)) => &trimmed[..byte_idx],
        None => trimmed,
    };
    truncated.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Sanitizer
// ---------------------------------------------------------------------------

/// Cleans agent-facing inputs against a [`FieldLimits`] table.
#[derive(Debug, Clone, Default)]
pub struct InputSanitizer {
    limits: FieldLimits,
}

impl InputSanitizer {
    /// Creates a sanitizer using `limits`.
    pub fn new(limits: FieldLimits) -> Self {
        Self { limits }
    }

    /// Cleans and screens one value.
    pub fn sanitize_field(&self, raw: &str, field_id: &str) -> SanitizedField {
        let clean = bound_input(raw, self.limits.max_length_for(field_id));
        if let Some(signature) = detect_prompt_injection(&clean) {
            warn!(field = field_id, signature, "prompt injection signature matched");
            return SanitizedField {
                value: String::new(),
                injection_detected: true,
            };
        }
        SanitizedField {
            value: clean,
            injection_detected: false,
        }
    }

    /// Cleans every field, or rejects the request on the first tainted one.
    ///
    /// Field names reach the prompt too, so they must already be clean: a
    /// name that cleaning would change, or that matches a signature, rejects
    /// the request. Field order is preserved.
    pub fn sanitize_inputs(&self, raw: &Inputs) -> Result<Inputs, CopilotError> {
        let mut sanitized = Inputs::with_capacity(raw.len());
        for (field_id, value) in raw {
            check_field_id(field_id)?;
            let field = self.sanitize_field(value, field_id);
            if field.injection_detected {
                return Err(CopilotError::Validation {
                    field: field_id.clone(),
                    reason: ValidationReason::InjectionDetected,
                });
            }
            sanitized.insert(field_id.clone(), field.value);
        }
        Ok(sanitized)
    }
}

fn check_field_id(field_id: &str) -> Result<(), CopilotError> {
    let bounded = bound_input(field_id, MAX_FIELD_ID_LENGTH);
    if bounded != field_id {
        return Err(CopilotError::Validation {
            field: bounded,
            reason: ValidationReason::Malformed {
                message: FIELD_ID_RULE.to_string(),
            },
        });
    }
    if let Some(signature) = detect_prompt_injection(field_id) {
        warn!(signature, "prompt injection signature matched in a field name");
        return Err(CopilotError::Validation {
            field: bounded,
            reason: ValidationReason::InjectionDetected,
        });
    }
    Ok(())
}
