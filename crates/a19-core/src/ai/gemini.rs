use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatSession, GenerationClient, GenerationError, MessagePart, SessionConfig};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn with_role(role: &str, parts: Vec<GeminiPart>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
    /// Set on reasoning summaries, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
}

impl GeminiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            ..Default::default()
        }
    }
}

impl From<MessagePart> for GeminiPart {
    fn from(part: MessagePart) -> Self {
        match part {
            MessagePart::Text(text) => GeminiPart::text(text),
            MessagePart::InlineData { mime_type, data } => GeminiPart {
                inline_data: Some(GeminiInlineData { mime_type, data }),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    code: Option<u32>,
    message: String,
    status: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_endpoint(api_key, model, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, GenerationError> {
        debug!(
            model = %self.model,
            contents = request.contents.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::InvalidEnvelope(e.to_string()))?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(%reason, "prompt blocked by generation service");
            return Err(GenerationError::Api(format!("Prompt was blocked: {}", reason)));
        }

        let text = parsed
            .candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|part| part.thought != Some(true))
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        Ok(text)
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "gemini-2.5-flash".to_string(),
            "gemini-2.5-pro".to_string(),
            "gemini-2.5-flash-lite".to_string(),
            "gemini-2.0-flash".to_string(),
        ]
    }
}

impl GenerationClient for GeminiClient {
    fn start_chat(&self, config: SessionConfig) -> Box<dyn ChatSession> {
        Box::new(GeminiChat::new(self.clone(), config))
    }
}

/// Map a non-2xx reply to an error, preferring Gemini's own error body
fn classify_error(status: StatusCode, body: &str) -> GenerationError {
    if let Ok(GeminiResponse { error: Some(error), .. }) = serde_json::from_str::<GeminiResponse>(body) {
        let code = error.code.unwrap_or(status.as_u16() as u32);
        let error_status = error.status.as_deref().unwrap_or("");

        if code == 401
            || code == 403
            || error_status == "UNAUTHENTICATED"
            || error_status == "PERMISSION_DENIED"
            || error.message.contains("API key not valid")
        {
            return GenerationError::AuthFailed(error.message);
        }

        return GenerationError::Api(error.message);
    }

    GenerationError::Api(format!("Gemini API error {}: {}", status, body))
}

/// A Gemini conversation. The REST API is stateless, so the session keeps the
/// transcript itself and replays it with every request.
pub struct GeminiChat {
    client: GeminiClient,
    system_instruction: GeminiContent,
    generation_config: GenerationConfig,
    history: Vec<GeminiContent>,
}

impl GeminiChat {
    pub fn new(client: GeminiClient, config: SessionConfig) -> Self {
        Self {
            client,
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(config.system_instruction)],
            },
            generation_config: GenerationConfig {
                response_mime_type: config.response_mime_type,
                response_schema: config.response_schema,
            },
            history: Vec::new(),
        }
    }

    /// Number of stored contents (user and model), two per completed exchange
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send_message(&mut self, parts: Vec<MessagePart>) -> Result<String, GenerationError> {
        let user_content =
            GeminiContent::with_role("user", parts.into_iter().map(GeminiPart::from).collect());

        let mut contents = self.history.clone();
        contents.push(user_content.clone());

        let request = GenerateContentRequest {
            system_instruction: self.system_instruction.clone(),
            contents,
            generation_config: self.generation_config.clone(),
        };

        let text = self.client.generate(&request).await?;

        // Only completed exchanges become context for the next turn
        if !text.is_empty() {
            self.history.push(user_content);
            self.history
                .push(GeminiContent::with_role("model", vec![GeminiPart::text(text.clone())]));
        }

        Ok(text)
    }
}
