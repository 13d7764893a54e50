use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The model service could not be reached or refused the call.
    #[error("Generation request failed: {0}")]
    Transport(String),

    /// The service answered but the payload does not fit the expected shape.
    #[error("Model returned an unusable payload: {0}")]
    Decode(String),

    #[error("No image was generated by the model")]
    NoImageProduced,
}

impl GenerationError {
    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, GenerationError::Decode(_) | GenerationError::NoImageProduced)
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Decode(err.to_string())
    }
}
