//! SOP document data model.
//!
//! `SopContent` is the structured shape the generation pipeline produces and
//! the document store persists. Optional fields stay optional end to end;
//! presence is checked explicitly, never probed at runtime.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Created with a placeholder title, no content yet.
    Draft,
    /// A generation request has claimed the document.
    Generating,
    /// Content was written; further edits are manual.
    Complete,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Generating => "generating",
            DocumentStatus::Complete => "complete",
        }
    }
}

/// Tags applied when a draft is created.
pub const DRAFT_TAGS: &[&str] = &["Draft"];

/// Tags that replace the draft set once generation succeeds.
pub const GENERATED_TAGS: &[&str] = &["Generated", "AI"];

/// Placeholder title a draft carries until generation fills it in.
pub const DRAFT_TITLE: &str = "Processing...";

/// One step of a procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopStep {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

/// The generated document body.
///
/// `title` and `steps` are the required essentials; the parser rejects
/// responses missing either. `purpose` defaults to empty rather than
/// failing the whole response over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub steps: Vec<SopStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary: Option<Vec<GlossaryEntry>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(DocumentStatus::Draft.as_str(), "draft");
        assert_eq!(DocumentStatus::Generating.as_str(), "generating");
        assert_eq!(DocumentStatus::Complete.as_str(), "complete");
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let content = SopContent {
            title: "SOP-001".to_string(),
            purpose: "Test".to_string(),
            scope: None,
            prerequisites: None,
            roles: None,
            steps: vec![SopStep {
                title: "Step 1".to_string(),
                description: "Do the thing".to_string(),
                warning: None,
                checklist: None,
            }],
            glossary: None,
        };

        let json = serde_json::to_string(&content).unwrap();
        assert!(!json.contains("scope"));
        assert!(!json.contains("warning"));
        assert!(!json.contains("glossary"));
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let content = SopContent {
            title: "SOP-002: Shutdown".to_string(),
            purpose: "Safely power down".to_string(),
            scope: Some("Operators".to_string()),
            prerequisites: Some(vec!["Badge access".to_string()]),
            roles: Some(vec!["Operator".to_string(), "Supervisor".to_string()]),
            steps: vec![SopStep {
                title: "Confirm idle".to_string(),
                description: "Check the panel".to_string(),
                warning: Some("Do not skip".to_string()),
                checklist: Some(vec!["Panel green".to_string()]),
            }],
            glossary: Some(vec![GlossaryEntry {
                term: "Panel".to_string(),
                definition: "The main control surface".to_string(),
            }]),
        };

        let json = serde_json::to_string(&content).unwrap();
        let parsed: SopContent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, content);
    }
}
