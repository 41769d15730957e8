//! Fixed-format instruction prompt for SOP generation.
//!
//! The transcript is embedded verbatim; the schema description is the output
//! contract the parser later enforces. The trailing no-markdown instruction
//! is a request, not a guarantee; the parser still strips fences.

pub fn build_prompt(transcript: &str) -> String {
    format!(
        r#"You are an expert business process consultant. Convert this process transcript into a professional, clear, and actionable Standard Operating Procedure (SOP).

TRANSCRIPT:
"{transcript}"

GUIDELINES:
- Tone: Professional, authoritative, and direct (ISO Standard style).
- Format: Action-oriented steps (start with verbs).
- Structure: Comprehensive business document.

The Output MUST be valid JSON with the following schema:
{{
    "title": "Professional Title (e.g., 'SOP-001: Procedure Name')",
    "purpose": "Clear statement of what this SOP achieves",
    "scope": "Who and what this SOP applies to",
    "prerequisites": ["List of tools, permissions, or conditions needed before starting"],
    "roles": ["List of roles responsible for this process"],
    "steps": [
        {{
            "title": "Step Title",
            "description": "Clear, detailed instruction",
            "warning": "Critical safety or compliance warning (optional)",
            "checklist": ["Sub-steps", "Verification points"]
        }}
    ],
    "glossary": [
        {{ "term": "Term", "definition": "Definition" }}
    ]
}}

Do not include markdown formatting (like ```json). Just return the raw JSON."#
    )
}
