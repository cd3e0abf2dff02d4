//! Repair triage: turns a model's structured repair analysis into the next
//! step offered to the tenant.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub const DISPATCH_MESSAGE: &str =
    "It seems your issue is rather complex, would you like for me to dispatch a contractor to your address?";
pub const MISSING_QUESTIONS_MESSAGE: &str =
    "I need more information to help you, but no specific questions were provided.";
pub const MISSING_INSTRUCTIONS_MESSAGE: &str =
    "I should provide repair instructions, but none were generated.";

const REQUIRED_FIELDS: [&str; 3] = ["parts_needed", "complexity_level", "further_inquiry"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Complexity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown complexity level '{raw}'"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairAssessment {
    pub parts_needed: bool,
    pub complexity_level: Complexity,
    pub further_inquiry: bool,
    #[serde(default)]
    pub further_questions: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub description_of_issue: String,
}

impl RepairAssessment {
    pub fn decide(&self) -> TriageDecision {
        if self.parts_needed || self.complexity_level == Complexity::High {
            return TriageDecision::DispatchContractor {
                message: DISPATCH_MESSAGE.to_string(),
            };
        }

        if self.further_inquiry {
            if self.further_questions.trim().is_empty() {
                warn!("further inquiry requested without questions");
                return TriageDecision::AskFollowUp {
                    questions: MISSING_QUESTIONS_MESSAGE.to_string(),
                };
            }
            return TriageDecision::AskFollowUp {
                questions: self.further_questions.clone(),
            };
        }

        if self.instructions.trim().is_empty() {
            warn!("self-repair selected without instructions");
            return TriageDecision::SelfRepair {
                instructions: MISSING_INSTRUCTIONS_MESSAGE.to_string(),
            };
        }
        TriageDecision::SelfRepair {
            instructions: self.instructions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TriageDecision {
    DispatchContractor { message: String },
    AskFollowUp { questions: String },
    SelfRepair { instructions: String },
    /// The analyst answered in prose; shown to the tenant as-is.
    Passthrough { text: String },
}

impl TriageDecision {
    pub fn message(&self) -> &str {
        match self {
            Self::DispatchContractor { message } => message,
            Self::AskFollowUp { questions } => questions,
            Self::SelfRepair { instructions } => instructions,
            Self::Passthrough { text } => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriageError {
    #[error("repair analysis is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("repair analysis is malformed: {0}")]
    Malformed(String),
    #[error("repair analyst failed: {0}")]
    Analyst(String),
}

/// Interpret raw analyst output. JSON objects are validated and decided on;
/// anything that is not JSON is passed through unchanged.
pub fn interpret(raw: &str) -> Result<TriageDecision, TriageError> {
    let body = strip_code_fence(raw);
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            return Ok(TriageDecision::Passthrough {
                text: raw.trim().to_string(),
            })
        }
    };

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| value.get(**field).is_none())
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(TriageError::MissingFields(missing));
    }

    let assessment: RepairAssessment =
        serde_json::from_value(value).map_err(|err| TriageError::Malformed(err.to_string()))?;
    let decision = assessment.decide();
    info!(
        parts_needed = assessment.parts_needed,
        complexity = ?assessment.complexity_level,
        further_inquiry = assessment.further_inquiry,
        "repair triage decided"
    );
    Ok(decision)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Model that looks at a tenant's description (and photos) and returns its
/// repair analysis as text.
pub trait RepairAnalyst: Send + Sync {
    fn analyze(&self, description: &str, photo_urls: &[String]) -> Result<String, TriageError>;
}

pub struct RepairTriageService<A> {
    analyst: Arc<A>,
}

impl<A> RepairTriageService<A>
where
    A: RepairAnalyst,
{
    pub fn new(analyst: Arc<A>) -> Self {
        Self { analyst }
    }

    pub fn triage(
        &self,
        description: &str,
        photo_urls: &[String],
    ) -> Result<TriageDecision, TriageError> {
        let raw = self.analyst.analyze(description, photo_urls)?;
        interpret(&raw)
    }
}
