//! Defensive parsing of model output.
//!
//! The model is asked for raw JSON but may wrap it in markdown fences or
//! surrounding prose. The candidate span is everything from the first `{` to
//! the last `}`, inclusive. A parse that succeeds but lacks the essential
//! fields (title, steps) is still a parse failure; partial structures are
//! never persisted.

use tracing::warn;

use crate::sop::SopContent;

use super::error::GenerateError;

/// Slice out the first balanced-looking `{...}` span.
fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Parse a raw model response into validated SOP content.
pub fn parse_response(raw: &str) -> Result<SopContent, GenerateError> {
    let span = extract_json_span(raw).ok_or_else(|| {
        warn!("Model response contained no JSON object span");
        GenerateError::ParseError("response contains no JSON object")
    })?;

    let content: SopContent = serde_json::from_str(span).map_err(|e| {
        warn!("Model response JSON did not parse: {}", e);
        GenerateError::ParseError("response is not valid JSON")
    })?;

    if content.title.trim().is_empty() {
        return Err(GenerateError::ParseError("response is missing a title"));
    }
    if content.steps.is_empty() {
        return Err(GenerateError::ParseError("response has no steps"));
    }

    Ok(content)
}
