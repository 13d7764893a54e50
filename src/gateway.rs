use futures::try_join;
use log::{ error, info, warn };
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::prompt::{ BindMode, PromptTemplate };
use crate::llm::fence::strip_code_fence;
use crate::llm::{
    schema,
    GenerationError,
    GenerativeModel,
    InlineData,
    LlmConfig,
    ModelRequest,
    ModelResponse,
    Part,
};
use crate::models::study::{ Flashcard, QuizQuestion, StudyPack, QUIZ_OPTION_COUNT };

/// Labeled diagram and its description, produced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnatomyView {
    pub image: InlineData,
    pub description: String,
}

fn parse_json<T: DeserializeOwned>(raw: &str, shape: &str) -> Result<T, GenerationError> {
    serde_json
        ::from_str(raw)
        .map_err(|e| {
            warn!("Model output is not a valid {}: {}", shape, e);
            GenerationError::Decode(format!("{} did not match the expected shape: {}", shape, e))
        })
}

fn check_quiz(questions: &[QuizQuestion]) -> Result<(), GenerationError> {
    for (index, question) in questions.iter().enumerate() {
        if question.options.len() != QUIZ_OPTION_COUNT {
            warn!(
                "Quiz question {} has {} options instead of {}",
                index + 1,
                question.options.len(),
                QUIZ_OPTION_COUNT
            );
        }
        if !question.answer_is_listed() {
            return Err(
                GenerationError::Decode(
                    format!(
                        "quiz question {} names '{}' as correct but it is not among its options",
                        index + 1,
                        question.correct_answer
                    )
                )
            );
        }
    }
    Ok(())
}

pub fn decode_flashcards(raw: &str) -> Result<Vec<Flashcard>, GenerationError> {
    parse_json(raw.trim(), "flashcard list")
}

pub fn decode_quiz(raw: &str) -> Result<Vec<QuizQuestion>, GenerationError> {
    let questions: Vec<QuizQuestion> = parse_json(raw.trim(), "quiz")?;
    check_quiz(&questions)?;
    Ok(questions)
}

/// Accepts the study pack bare or wrapped in a Markdown code fence.
pub fn decode_study_pack(raw: &str) -> Result<StudyPack, GenerationError> {
    let pack: StudyPack = parse_json(strip_code_fence(raw), "study pack")?;
    check_quiz(&pack.quiz)?;
    Ok(pack)
}

/// Typed entry points to the generative model, one per result shape.
#[derive(Clone)]
pub struct GenerationGateway {
    model: Arc<dyn GenerativeModel>,
    text_model: String,
    image_model: String,
}

impl GenerationGateway {
    pub fn new(model: Arc<dyn GenerativeModel>, config: &LlmConfig) -> Self {
        Self {
            model,
            text_model: config.text_model().to_string(),
            image_model: config.image_model().to_string(),
        }
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    async fn call(&self, request: ModelRequest, operation: &str) -> Result<ModelResponse, GenerationError> {
        info!("{} → model={}", operation, request.model);
        self.model.generate(request).await.map_err(|e| {
            error!("Error during {}: {}", operation, e);
            e
        })
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ModelRequest::text(&self.text_model, prompt);
        self.call(request, "generate_text").await?.text()
    }

    pub async fn generate_flashcards(
        &self,
        template: &PromptTemplate,
        content: &str
    ) -> Result<Vec<Flashcard>, GenerationError> {
        let prompt = template.bind(BindMode::Concatenation, content);
        let request = ModelRequest::text(&self.text_model, prompt).json_schema(schema::flashcards());
        let raw = self.call(request, "generate_flashcards").await?.text()?;
        decode_flashcards(&raw)
    }

    pub async fn generate_quiz(
        &self,
        template: &PromptTemplate,
        content: &str
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let prompt = template.bind(BindMode::Concatenation, content);
        let request = ModelRequest::text(&self.text_model, prompt).json_schema(schema::quiz());
        let raw = self.call(request, "generate_quiz").await?.text()?;
        decode_quiz(&raw)
    }

    pub async fn generate_study_pack(
        &self,
        template: &PromptTemplate,
        topic: &str
    ) -> Result<StudyPack, GenerationError> {
        let prompt = template.bind(BindMode::Substitution, topic);
        let request = ModelRequest::text(&self.text_model, prompt).json_schema(schema::study_pack());
        let raw = self.call(request, "generate_study_pack").await?.text()?;
        decode_study_pack(&raw)
    }

    pub async fn generate_anatomy_image(
        &self,
        template: &PromptTemplate,
        body_part: &str
    ) -> Result<InlineData, GenerationError> {
        let prompt = template.bind(BindMode::Substitution, body_part);
        let request = ModelRequest::text(&self.image_model, prompt).image_output();
        let response = self.call(request, "generate_anatomy_image").await?;
        response.first_inline_data().cloned().ok_or_else(|| {
            warn!("Image model answered without an image part for '{}'", body_part);
            GenerationError::NoImageProduced
        })
    }

    pub async fn analyze_image(
        &self,
        prompt: &str,
        image: &InlineData
    ) -> Result<String, GenerationError> {
        let request = ModelRequest::with_parts(
            &self.image_model,
            vec![Part::InlineData(image.clone()), Part::Text(prompt.to_string())]
        );
        self.call(request, "analyze_image").await?.text()
    }

    /// Diagram and description are requested concurrently; if either fails
    /// the whole view fails.
    pub async fn generate_anatomy_view(
        &self,
        template: &PromptTemplate,
        body_part: &str
    ) -> Result<AnatomyView, GenerationError> {
        let description_prompt = template.bind(BindMode::Substitution, body_part);
        let (image, description) = try_join!(
            self.generate_anatomy_image(template, body_part),
            self.generate_text(&description_prompt)
        )?;
        Ok(AnatomyView { image, description })
    }
}
