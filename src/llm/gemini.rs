use async_trait::async_trait;
use log::{ debug, info };
use serde::{ Deserialize, Serialize };
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use url::Url;

use super::{
    Candidate,
    GenerationError,
    GenerativeModel,
    InlineData,
    LlmConfig,
    Modality,
    ModelRequest,
    ModelResponse,
    Part,
    DEFAULT_BASE_URL,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn to_wire_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text(text) => GeminiPart { text: Some(text.clone()), ..Default::default() },
        Part::InlineData(data) =>
            GeminiPart {
                inline_data: Some(GeminiInlineData {
                    mime_type: data.mime_type.clone(),
                    data: data.data.clone(),
                }),
                ..Default::default()
            },
    }
}

fn from_wire_part(part: GeminiPart) -> Option<Part> {
    if let Some(data) = part.inline_data {
        return Some(
            Part::InlineData(InlineData {
                mime_type: data.mime_type,
                data: data.data,
            })
        );
    }
    part.text.map(Part::Text)
}

fn modality_name(modality: Modality) -> &'static str {
    match modality {
        Modality::Image => "IMAGE",
    }
}

fn build_payload(request: &ModelRequest) -> GenerateContentRequest {
    let generation_config = if
        request.response_schema.is_some() ||
        !request.response_modalities.is_empty()
    {
        Some(GenerationConfig {
            response_mime_type: request.response_schema.as_ref().map(|_| "application/json"),
            response_schema: request.response_schema.clone(),
            response_modalities: request.response_modalities
                .iter()
                .map(|m| modality_name(*m))
                .collect(),
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: request.parts.iter().map(to_wire_part).collect(),
        }],
        generation_config,
    }
}

fn parse_response(body: &str) -> Result<ModelResponse, GenerationError> {
    let envelope: GoogleResponse = serde_json
        ::from_str(body)
        .map_err(|e| GenerationError::Transport(format!("unreadable response envelope: {}", e)))?;

    let candidates = envelope.candidates
        .into_iter()
        .map(|c| Candidate {
            parts: c.content
                .map(|content| content.parts.into_iter().filter_map(from_wire_part).collect())
                .unwrap_or_default(),
        })
        .collect();

    Ok(ModelResponse { candidates })
}

fn service_error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(envelope) =>
            match envelope.error.status {
                Some(code) => format!("{} ({}): {}", status, code, envelope.error.message),
                None => format!("{}: {}", status, envelope.error.message),
            }
        Err(_) => format!("{}: {}", status, body.trim()),
    }
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let mut raw = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = Url::parse(&raw).map_err(|e|
            format!("Invalid Gemini base URL '{}': {}", raw, e)
        )?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| "Gemini API key is required for GeminiClient".to_string())?;
        Self::new(api_key, config.base_url.clone())
    }

    fn endpoint(&self, model: &str) -> Result<Url, GenerationError> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", model))
            .map_err(|e| GenerationError::Transport(format!("invalid endpoint for model '{}': {}", model, e)))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, GenerationError> {
        let url = self.endpoint(&request.model)?;
        info!(
            "GeminiClient::generate() → model={} parts={} structured={}",
            request.model,
            request.parts.len(),
            request.response_schema.is_some()
        );

        let payload = build_payload(&request);
        let resp = self.http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!("Gemini responded with status {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(GenerationError::Transport(service_error_message(status, &body)));
        }
        parse_response(&body)
    }
}
