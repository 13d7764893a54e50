use async_trait::async_trait;
use std::sync::Mutex;

use super::{ GenerationError, GenerativeModel, ModelRequest, ModelResponse };

type Responder = Box<dyn Fn(&ModelRequest) -> Result<ModelResponse, GenerationError> + Send + Sync>;

/// Model double that answers from a closure and records every request.
pub(crate) struct StubModel {
    responder: Responder,
    requests: Mutex<Vec<ModelRequest>>,
}

impl StubModel {
    pub(crate) fn new<F>(responder: F) -> Self
        where F: Fn(&ModelRequest) -> Result<ModelResponse, GenerationError> + Send + Sync + 'static
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(ModelResponse::from_text(text.clone())))
    }

    pub(crate) fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(GenerationError::Transport(message.clone())))
    }

    pub(crate) fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for StubModel {
    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, GenerationError> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        result
    }
}
