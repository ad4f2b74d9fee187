//! The JSON contract between A19 and the generation service: what we ask for,
//! and how much of what comes back we are willing to trust.

use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;

use crate::ai::SessionConfig;
use crate::error::SubmitError;
use crate::state::GeneratedArtifact;

pub const SYSTEM_INSTRUCTION: &str = "\
You are A19, an expert web developer AI. You build complete websites from a \
user's description, an attached image, or an attached text brief.

Always respond with a single JSON object with exactly these string fields:
- \"html\": the markup that goes inside <body> (no <html>, <head> or <body> tags, no <style> or <script> blocks)
- \"css\": the complete stylesheet
- \"javascript\": the complete script (an empty string if none is needed)
- \"explanation\": a short, friendly description of what you built or changed, in markdown

Rules:
1. On the first request, produce complete, self-contained source. Format all \
code with consistent indentation so a human can read and edit it.
2. When the user asks for a change, return the ENTIRE regenerated html, css and \
javascript, never a diff or a fragment.
3. When the user asks a question instead of requesting a change, return the \
previous html, css and javascript unchanged and answer in \"explanation\".
4. Never wrap the JSON in markdown code fences and never add text outside the JSON object.";

const RESPONSE_FIELDS: [&str; 4] = ["html", "css", "javascript", "explanation"];

/// Schema in the generation service's OpenAPI subset
pub fn response_schema() -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = RESPONSE_FIELDS
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": RESPONSE_FIELDS,
    })
}

/// Session settings for the website generator conversation
pub fn session_config() -> SessionConfig {
    SessionConfig {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        response_mime_type: "application/json".to_string(),
        response_schema: response_schema(),
    }
}

/// Code fields may be null or missing on a conversational reply
#[derive(Deserialize)]
struct RawReply {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    css: Option<String>,
    #[serde(default)]
    javascript: Option<String>,
    explanation: String,
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```$").expect("fence pattern is valid")
    })
}

/// Validate a raw reply body against the contract.
///
/// Schema enforcement on the service side is a hint, so field presence and
/// types are checked here. A stray markdown fence around the object is tolerated.
pub fn parse_reply(body: &str) -> Result<GeneratedArtifact, SubmitError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::EmptyResponse);
    }

    let json_text = fence_pattern()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or(trimmed);

    let value: serde_json::Value = serde_json::from_str(json_text)
        .map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;

    if !value.is_object() {
        return Err(SubmitError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    }

    let raw: RawReply =
        serde_json::from_value(value).map_err(|e| SubmitError::MalformedResponse(e.to_string()))?;

    Ok(GeneratedArtifact {
        html: raw.html.unwrap_or_default(),
        css: raw.css.unwrap_or_default(),
        javascript: raw.javascript.unwrap_or_default(),
        explanation: raw.explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "OBJECT");
        for field in RESPONSE_FIELDS {
            assert_eq!(schema["properties"][field]["type"], "STRING");
        }
        assert_eq!(
            schema["required"],
            json!(["html", "css", "javascript", "explanation"])
        );
    }

    #[test]
    fn test_session_config_uses_json_mime_type() {
        let config = session_config();
        assert_eq!(config.response_mime_type, "application/json");
        assert!(config.system_instruction.contains("Never wrap the JSON"));
    }

    #[test]
    fn test_parse_full_reply() {
        let artifact = parse_reply(
            r#"{"html":"<h1>Calc</h1>","css":"h1{}","javascript":"let x = 1;","explanation":"Built it"}"#,
        )
        .unwrap();
        assert_eq!(artifact.html, "<h1>Calc</h1>");
        assert_eq!(artifact.javascript, "let x = 1;");
        assert_eq!(artifact.explanation, "Built it");
        assert!(artifact.has_source());
    }

    #[test]
    fn test_parse_conversational_reply() {
        let artifact = parse_reply(r#"{"html":"","css":null,"explanation":"Flexbox centers things."}"#).unwrap();
        assert!(!artifact.has_source());
        assert_eq!(artifact.explanation, "Flexbox centers things.");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let body = "```json\n{\"html\":\"<p></p>\",\"css\":\"p{}\",\"javascript\":\"\",\"explanation\":\"ok\"}\n```";
        let artifact = parse_reply(body).unwrap();
        assert_eq!(artifact.css, "p{}");
    }

    #[test]
    fn test_parse_empty_body() {
        assert!(matches!(parse_reply("  \n"), Err(SubmitError::EmptyResponse)));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_reply("Sure! Here is your website."),
            Err(SubmitError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(
            parse_reply(r#"["html", "css"]"#),
            Err(SubmitError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_explanation() {
        let err = parse_reply(r#"{"html":"<p></p>","css":"p{}"}"#).unwrap_err();
        assert!(err.to_string().contains("explanation"));
    }

    #[test]
    fn test_parse_rejects_wrong_field_type() {
        assert!(matches!(
            parse_reply(r#"{"html":42,"css":"","javascript":"","explanation":"x"}"#),
            Err(SubmitError::MalformedResponse(_))
        ));
    }
}
