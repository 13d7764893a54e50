pub mod error;
pub mod fence;
pub mod gemini;
pub mod schema;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use serde_json::Value as JsonValue;
use std::error::Error as StdError;
use std::sync::Arc;

use self::gemini::GeminiClient;
pub use self::error::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub image_model: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            text_model: None,
            image_model: None,
        }
    }
}

impl LlmConfig {
    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(DEFAULT_TEXT_MODEL)
    }

    pub fn image_model(&self) -> &str {
        self.image_model.as_deref().filter(|m| !m.trim().is_empty()).unwrap_or(DEFAULT_IMAGE_MODEL)
    }
}

/// Binary payload carried inline in a request or response, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

impl InlineData {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, GenerationError> {
        STANDARD.decode(self.data.as_bytes()).map_err(|e|
            GenerationError::Decode(format!("image payload is not valid base64: {}", e))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub parts: Vec<Part>,
    pub response_schema: Option<JsonValue>,
    pub response_modalities: Vec<Modality>,
}

impl ModelRequest {
    pub fn text(model: &str, prompt: impl Into<String>) -> Self {
        Self::with_parts(model, vec![Part::Text(prompt.into())])
    }

    pub fn with_parts(model: &str, parts: Vec<Part>) -> Self {
        Self {
            model: model.to_string(),
            parts,
            response_schema: None,
            response_modalities: Vec::new(),
        }
    }

    pub fn json_schema(mut self, schema: JsonValue) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn image_output(mut self) -> Self {
        self.response_modalities = vec![Modality::Image];
        self
    }

    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineData(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModelResponse {
    pub candidates: Vec<Candidate>,
}

impl ModelResponse {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { candidates: vec![Candidate { parts }] }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_parts(vec![Part::Text(text.into())])
    }

    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Result<String, GenerationError> {
        let candidate = self.candidates
            .first()
            .ok_or_else(|| GenerationError::Decode("model returned no candidates".to_string()))?;
        Ok(
            candidate.parts
                .iter()
                .filter_map(|p| match p {
                    Part::Text(t) => Some(t.as_str()),
                    Part::InlineData(_) => None,
                })
                .collect::<String>()
        )
    }

    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .parts.iter()
            .find_map(|p| match p {
                Part::InlineData(data) => Some(data),
                Part::Text(_) => None,
            })
    }
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, GenerationError>;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn GenerativeModel>, Box<dyn StdError + Send + Sync>> {
    let client = GeminiClient::from_config(config)?;
    Ok(Arc::new(client))
}
