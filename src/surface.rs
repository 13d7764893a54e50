//! A page surface binds one page of the table to the gateway. It accepts
//! one request at a time and turns every failure into a message for the
//! user.

use log::{ info, warn };
use std::path::PathBuf;
use std::sync::atomic::{ AtomicBool, Ordering };
use std::sync::Arc;
use thiserror::Error;

use crate::config::pages::{ LegalNotice, OrientationPath, Page, PageKind };
use crate::config::prompt::{ BindMode, PromptError, PromptTemplate };
use crate::gateway::{ AnatomyView, GenerationGateway };
use crate::history::{ ChatError, ChatSession, RoleLabels };
use crate::input::{ self, InputError };
use crate::llm::GenerationError;
use crate::models::chat::ConversationMessage;
use crate::models::study::{ Flashcard, QuizQuestion, StudyPack };

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceInput {
    Nothing,
    Text(String),
    TextFile(PathBuf),
    ImageFile(PathBuf),
    Transcript(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutput {
    Text(String),
    Flashcards(Vec<Flashcard>),
    Quiz(Vec<QuizQuestion>),
    StudyPack(StudyPack),
    Anatomy(AnatomyView),
    Paths(&'static [OrientationPath]),
    Notice(LegalNotice),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Please wait for the current request to finish.")]
    Busy,

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    MissingTemplate(#[from] PromptError),
}

impl SurfaceError {
    /// The single line shown next to the form that failed.
    pub fn display_message(&self) -> String {
        match self {
            SurfaceError::Chat(ChatError::Generation(e)) => e.to_string(),
            other => other.to_string(),
        }
    }
}

struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SurfaceError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(SurfaceError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn text_input(submitted: SurfaceInput, empty_message: &'static str) -> Result<String, InputError> {
    let text = match submitted {
        SurfaceInput::Text(text) | SurfaceInput::Transcript(text) => text,
        SurfaceInput::TextFile(path) => input::read_text_file(&path)?,
        SurfaceInput::Nothing => String::new(),
        SurfaceInput::ImageFile(_) => {
            return Err(InputError::NotAccepted("images"));
        }
    };
    input::require_text(&text, empty_message)?;
    Ok(text)
}

pub struct PageSurface {
    page: &'static Page,
    gateway: Arc<GenerationGateway>,
    pending: AtomicBool,
}

impl PageSurface {
    pub fn new(page: &'static Page, gateway: Arc<GenerationGateway>) -> Self {
        Self {
            page,
            gateway,
            pending: AtomicBool::new(false),
        }
    }

    pub fn page(&self) -> &'static Page {
        self.page
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn submit(&self, submitted: SurfaceInput) -> Result<PageOutput, SurfaceError> {
        let _guard = PendingGuard::acquire(&self.pending)?;
        info!("Submitting page '{}'", self.page.id);
        let result = self.dispatch(submitted).await;
        if let Err(e) = &result {
            warn!("Page '{}' failed: {}", self.page.id, e);
        }
        result
    }

    async fn dispatch(&self, submitted: SurfaceInput) -> Result<PageOutput, SurfaceError> {
        let gateway = &self.gateway;
        let output = match &self.page.kind {
            PageKind::Orientation { paths } => PageOutput::Paths(*paths),
            PageKind::Legal(notice) => PageOutput::Notice(*notice),
            PageKind::StudyPack { template } => {
                let topic = text_input(submitted, "Please enter a topic.")?;
                PageOutput::StudyPack(gateway.generate_study_pack(template, &topic).await?)
            }
            PageKind::SystemOverview { template, systems: options } |
            PageKind::ExamGenerator { template, years: options } => {
                let raw = text_input(submitted, "Please make a selection.")?;
                let choice = input::require_option(&raw, *options)?;
                let prompt = self.bind(template, choice)?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::Lookup { template } => {
                let query = text_input(submitted, "Please enter a search term.")?;
                let prompt = self.bind(template, &query)?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::Briefing { template } => {
                let prompt = self.bind(template, "")?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::Flashcards { template } => {
                let content = text_input(submitted, "Please enter some text or upload a file.")?;
                PageOutput::Flashcards(gateway.generate_flashcards(template, &content).await?)
            }
            PageKind::Quiz { template } => {
                let content = text_input(submitted, "Please enter some text or upload a file.")?;
                PageOutput::Quiz(gateway.generate_quiz(template, &content).await?)
            }
            PageKind::FileAnalysis { template } => {
                let path = match submitted {
                    SurfaceInput::TextFile(path) => path,
                    SurfaceInput::Nothing => {
                        return Err(InputError::Empty("Please upload a file.").into());
                    }
                    _ => {
                        return Err(InputError::NotAccepted("anything but a .txt or .csv file").into());
                    }
                };
                let content = input::read_text_file(&path)?;
                let prompt = self.bind(template, &content)?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::VoiceNote { template } => {
                let transcript = text_input(submitted, "No speech detected to process.")?;
                let prompt = self.bind(template, &transcript)?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::AskAnything { template } => {
                let question = text_input(submitted, "Please enter a question.")?;
                let prompt = self.bind(template, &question)?;
                PageOutput::Text(gateway.generate_text(&prompt).await?)
            }
            PageKind::ImageAnalysis { template } => {
                let image = match submitted {
                    SurfaceInput::ImageFile(path) => input::read_image_file(&path)?,
                    _ => {
                        return Err(InputError::Empty("Please upload an image first.").into());
                    }
                };
                PageOutput::Text(gateway.analyze_image(template.as_str(), &image).await?)
            }
            PageKind::Anatomy { template, body_parts } => {
                let raw = text_input(submitted, "Please choose a body part.")?;
                let part = input::require_option(&raw, *body_parts)?;
                PageOutput::Anatomy(gateway.generate_anatomy_view(template, part).await?)
            }
            PageKind::CaseSimulator { .. } | PageKind::DocDav { .. } => {
                return Err(InputError::NotAccepted("one-off requests; start a chat instead").into());
            }
        };
        Ok(output)
    }

    fn bind_mode(&self) -> Result<BindMode, PromptError> {
        self.page.bind_mode().ok_or_else(|| PromptError::TemplateNotFound(self.page.id.to_string()))
    }

    fn bind(&self, template: &PromptTemplate, input: &str) -> Result<String, PromptError> {
        Ok(template.bind(self.bind_mode()?, input))
    }

    /// New, empty conversation for a chat page.
    pub fn open_chat(&self) -> Result<ChatSession, SurfaceError> {
        let labels = match &self.page.kind {
            PageKind::CaseSimulator { .. } => RoleLabels::CASE_SIMULATOR,
            PageKind::DocDav { .. } => RoleLabels::DOC_DAV,
            _ => {
                return Err(InputError::NotAccepted("chat messages").into());
            }
        };
        let template = self.page
            .template()
            .cloned()
            .ok_or_else(|| PromptError::TemplateNotFound(self.page.id.to_string()))?;
        let mode = self.bind_mode()?;
        let session = ChatSession::new(template, mode, labels);
        info!("Opened chat session {} on page '{}'", session.id(), self.page.id);
        Ok(session)
    }

    pub async fn send_chat(
        &self,
        session: &mut ChatSession,
        message: &str
    ) -> Result<ConversationMessage, SurfaceError> {
        let _guard = PendingGuard::acquire(&self.pending)?;
        let reply = session.send(&self.gateway, message).await?;
        Ok(reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::pages::find_page;
    use crate::history::SessionState;
    use crate::llm::testing::StubModel;
    use crate::llm::{
        GenerationError,
        GenerativeModel,
        InlineData,
        LlmConfig,
        Modality,
        ModelRequest,
        ModelResponse,
        Part,
    };
    use async_trait::async_trait;
    use std::io::Write;
    use tokio::sync::Notify;

    /// Holds every request until the gate is opened.
    struct GatedModel {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl GenerativeModel for GatedModel {
        async fn generate(&self, _request: ModelRequest) -> Result<ModelResponse, GenerationError> {
            self.gate.notified().await;
            Ok(ModelResponse::from_text("Right-to-left flow bypassing the lungs."))
        }
    }

    fn surface(id: &str, model: Arc<StubModel>) -> PageSurface {
        let gateway = Arc::new(GenerationGateway::new(model, &LlmConfig::default()));
        PageSurface::new(find_page(id).unwrap(), gateway)
    }

    #[tokio::test]
    async fn drug_lookup_substitutes_query() {
        let model = Arc::new(StubModel::replying("Metformin lowers hepatic glucose output."));
        let output = surface("drug-info", model.clone())
            .submit(SurfaceInput::Text("Metformin".into())).await
            .unwrap();
        assert_eq!(output, PageOutput::Text("Metformin lowers hepatic glucose output.".into()));
        assert!(model.requests()[0].prompt_text().starts_with("Describe the drug 'Metformin'."));
    }

    #[tokio::test]
    async fn briefing_sends_template_alone() {
        let model = Arc::new(StubModel::replying("Be on time."));
        let page = find_page("clinical-orientation").unwrap();
        surface("clinical-orientation", model.clone()).submit(SurfaceInput::Nothing).await.unwrap();
        assert_eq!(model.requests()[0].prompt_text(), page.template().unwrap().as_str());
    }

    #[tokio::test]
    async fn empty_input_never_reaches_the_model() {
        let model = Arc::new(StubModel::replying("unused"));
        let err = surface("study-pack-generator", model.clone())
            .submit(SurfaceInput::Text("   ".into())).await
            .unwrap_err();
        assert_eq!(err.display_message(), "Please enter a topic.");
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn unsupported_upload_never_reaches_the_model() {
        let model = Arc::new(StubModel::replying("unused"));
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = surface("lab-interpretation", model.clone())
            .submit(SurfaceInput::TextFile(file.path().to_path_buf())).await
            .unwrap_err();
        assert!(matches!(err, SurfaceError::Input(InputError::UnsupportedFileType { .. })));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn lab_upload_is_concatenated_after_template() {
        let model = Arc::new(StubModel::replying("Hyperkalemia."));
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "K,6.1").unwrap();
        let surface = surface("lab-interpretation", model.clone());
        surface.submit(SurfaceInput::TextFile(file.path().to_path_buf())).await.unwrap();
        let template = surface.page().template().unwrap();
        assert_eq!(model.requests()[0].prompt_text(), format!("{}\n\nK,6.1", template));
    }

    #[tokio::test]
    async fn physiology_rejects_unknown_system() {
        let model = Arc::new(StubModel::replying("unused"));
        let err = surface("human-physiology", model)
            .submit(SurfaceInput::Text("Skeletal".into())).await
            .unwrap_err();
        assert!(matches!(err, SurfaceError::Input(InputError::NotAnOption { .. })));
    }

    #[tokio::test]
    async fn anatomy_heart_with_failing_description_fails_whole_view() {
        let model = Arc::new(
            StubModel::new(|request| {
                if request.response_modalities.contains(&Modality::Image) {
                    Ok(ModelResponse::from_parts(vec![Part::InlineData(InlineData::from_bytes("image/png", b"png"))]))
                } else {
                    Err(GenerationError::Transport("503 Service Unavailable".into()))
                }
            })
        );
        let err = surface("anatomy-viewer", model.clone())
            .submit(SurfaceInput::Text("Heart".into())).await
            .unwrap_err();
        assert_eq!(err.display_message(), "Generation request failed: 503 Service Unavailable");

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].prompt_text(), requests[1].prompt_text());
        assert!(requests[0].prompt_text().contains("diagram of the Heart."));
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let gate = Arc::new(Notify::new());
        let model = Arc::new(GatedModel { gate: gate.clone() });
        let gateway = Arc::new(GenerationGateway::new(model, &LlmConfig::default()));
        let surface = Arc::new(PageSurface::new(find_page("ask-anything").unwrap(), gateway));

        let first = tokio::spawn({
            let surface = surface.clone();
            async move { surface.submit(SurfaceInput::Text("What is a shunt?".into())).await }
        });
        while !surface.is_pending() {
            tokio::task::yield_now().await;
        }

        let err = surface.submit(SurfaceInput::Text("What is dead space?".into())).await.unwrap_err();
        assert!(matches!(err, SurfaceError::Busy));

        gate.notify_one();
        assert_eq!(
            first.await.unwrap().unwrap(),
            PageOutput::Text("Right-to-left flow bypassing the lungs.".into())
        );
        assert!(!surface.is_pending());
    }

    #[tokio::test]
    async fn prompts_follow_each_page_declared_bind_mode() {
        let cases = [
            ("human-physiology", "Renal"),
            ("exam-generator", "3"),
            ("disease-analysis", "Sepsis"),
            ("ask-anything", "What is BNP?"),
            ("voice-to-note", "Patient is stable."),
            ("flashcard-generator", "The heart has four chambers."),
            ("quiz-creator", "The heart has four chambers."),
            ("study-pack-generator", "Asthma"),
            ("anatomy-viewer", "Heart"),
        ];
        for (id, input) in cases {
            let model = Arc::new(StubModel::replying("[]"));
            let surface = surface(id, model.clone());
            let _ = surface.submit(SurfaceInput::Text(input.into())).await;

            let page = surface.page();
            let expected = page.template().unwrap().bind(page.bind_mode().unwrap(), input);
            assert_eq!(model.requests()[0].prompt_text(), expected, "page {}", id);
        }
    }

    #[tokio::test]
    async fn surface_is_released_after_failure() {
        let model = Arc::new(StubModel::failing("timeout"));
        let surface = surface("ask-anything", model);
        assert!(surface.submit(SurfaceInput::Text("Q".into())).await.is_err());
        assert!(!surface.is_pending());
    }

    #[tokio::test]
    async fn static_pages_do_not_call_the_model() {
        let model = Arc::new(StubModel::replying("unused"));
        let output = surface("copyright", model.clone()).submit(SurfaceInput::Nothing).await.unwrap();
        assert_eq!(output, PageOutput::Notice(LegalNotice::Copyright));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn case_simulator_chat_runs_through_surface() {
        let model = Arc::new(StubModel::replying("A 54-year-old man presents..."));
        let surface = surface("case-simulator", model.clone());
        assert!(surface.submit(SurfaceInput::Text("MI".into())).await.is_err());

        let mut session = surface.open_chat().unwrap();
        let reply = surface
            .send_chat(&mut session, &crate::history::opening_case_line("Myocardial Infarction")).await
            .unwrap();
        assert_eq!(reply, ConversationMessage::assistant("A 54-year-old man presents..."));
        assert!(
            model.requests()[0].prompt_text().contains("based on this topic: Start a case about Myocardial Infarction.")
        );
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn doc_dav_chat_failure_is_reported_once() {
        let model = Arc::new(StubModel::failing("403 Forbidden"));
        let surface = surface("discussion-forum", model);
        let mut session = surface.open_chat().unwrap();
        let err = surface.send_chat(&mut session, "What is BNP?").await.unwrap_err();
        assert_eq!(err.display_message(), "Generation request failed: 403 Forbidden");
        assert_eq!(session.messages().len(), 1);
        assert!(!surface.is_pending());
    }

    #[test]
    fn non_chat_page_cannot_open_chat() {
        let model = Arc::new(StubModel::replying("unused"));
        assert!(surface("drug-info", model).open_chat().is_err());
    }
}
