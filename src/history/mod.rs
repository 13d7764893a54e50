//! In-memory chat sessions for the dialogue pages. The model keeps no state
//! between calls, so each turn re-sends the whole conversation as a
//! transcript.

use log::{ info, warn };
use thiserror::Error;
use uuid::Uuid;

use crate::config::prompt::{ BindMode, PromptTemplate };
use crate::gateway::GenerationGateway;
use crate::llm::GenerationError;
use crate::models::chat::{ ConversationMessage, Sender };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLabels {
    pub user: &'static str,
    pub assistant: &'static str,
}

impl RoleLabels {
    pub const CASE_SIMULATOR: RoleLabels = RoleLabels { user: "Student", assistant: "Tutor" };
    pub const DOC_DAV: RoleLabels = RoleLabels { user: "Student", assistant: "Doc Dav" };

    fn label(&self, sender: Sender) -> &'static str {
        match sender {
            Sender::User => self.user,
            Sender::Assistant => self.assistant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("A reply is still being generated")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub fn format_history(messages: &[ConversationMessage], labels: RoleLabels) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", labels.label(m.sender), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Context sent with a new user line: the bare input on the first turn,
/// otherwise the labelled history followed by the new line.
pub fn transcript(messages: &[ConversationMessage], new_input: &str, labels: RoleLabels) -> String {
    if messages.is_empty() {
        return new_input.to_string();
    }
    format!("{}\n{}: {}", format_history(messages, labels), labels.user, new_input)
}

pub fn opening_case_line(topic: &str) -> String {
    format!("Start a case about {}.", topic.trim())
}

/// Prompt for a turn that has begun and is waiting on the model.
#[derive(Debug)]
pub struct PendingTurn {
    pub prompt: String,
}

pub struct ChatSession {
    id: Uuid,
    template: PromptTemplate,
    bind_mode: BindMode,
    labels: RoleLabels,
    messages: Vec<ConversationMessage>,
    state: SessionState,
}

impl ChatSession {
    pub fn new(template: PromptTemplate, bind_mode: BindMode, labels: RoleLabels) -> Self {
        Self {
            id: Uuid::new_v4(),
            template,
            bind_mode,
            labels,
            messages: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn labels(&self) -> RoleLabels {
        self.labels
    }

    /// Records the user line and builds the prompt for it.
    pub fn begin_turn(&mut self, input: &str) -> Result<PendingTurn, ChatError> {
        if self.state == SessionState::AwaitingResponse {
            return Err(ChatError::Busy);
        }
        if input.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let content = transcript(&self.messages, input, self.labels);
        let prompt = self.template.bind(self.bind_mode, &content);
        self.messages.push(ConversationMessage::user(input));
        self.state = SessionState::AwaitingResponse;
        Ok(PendingTurn { prompt })
    }

    pub fn complete_turn(
        &mut self,
        result: Result<String, GenerationError>
    ) -> Result<&ConversationMessage, ChatError> {
        self.state = SessionState::Idle;
        match result {
            Ok(reply) => {
                self.messages.push(ConversationMessage::assistant(reply));
                info!("Chat session {} now holds {} messages", self.id, self.messages.len());
                Ok(&self.messages[self.messages.len() - 1])
            }
            Err(e) => {
                warn!("Chat session {} turn failed: {}", self.id, e);
                Err(ChatError::Generation(e))
            }
        }
    }

    pub async fn send(
        &mut self,
        gateway: &GenerationGateway,
        input: &str
    ) -> Result<&ConversationMessage, ChatError> {
        let turn = self.begin_turn(input)?;
        let result = gateway.generate_text(&turn.prompt).await;
        self.complete_turn(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::StubModel;
    use crate::llm::LlmConfig;
    use std::sync::Arc;

    fn case_session() -> ChatSession {
        ChatSession::new(
            PromptTemplate::new("Simulate a case on: {userInput}"),
            BindMode::Substitution,
            RoleLabels::CASE_SIMULATOR
        )
    }

    #[test]
    fn transcript_of_empty_history_is_input() {
        assert_eq!(transcript(&[], "C", RoleLabels::CASE_SIMULATOR), "C");
    }

    #[test]
    fn transcript_labels_each_turn() {
        let messages = vec![ConversationMessage::user("A"), ConversationMessage::assistant("B")];
        assert_eq!(
            transcript(&messages, "C", RoleLabels::CASE_SIMULATOR),
            "Student: A\nTutor: B\nStudent: C"
        );
        assert_eq!(
            transcript(&messages, "C", RoleLabels::DOC_DAV),
            "Student: A\nDoc Dav: B\nStudent: C"
        );
    }

    #[test]
    fn second_turn_is_rejected_while_awaiting() {
        let mut session = case_session();
        let turn = session.begin_turn(&opening_case_line("sepsis")).unwrap();
        assert_eq!(turn.prompt, "Simulate a case on: Start a case about sepsis.");
        assert_eq!(session.state(), SessionState::AwaitingResponse);
        assert!(matches!(session.begin_turn("again"), Err(ChatError::Busy)));
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn empty_message_leaves_session_untouched() {
        let mut session = case_session();
        assert!(matches!(session.begin_turn("  "), Err(ChatError::EmptyMessage)));
        assert!(session.messages().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn successful_turns_accumulate_history() {
        let model = Arc::new(StubModel::replying("B"));
        let gateway = GenerationGateway::new(model.clone(), &LlmConfig::default());
        let mut session = case_session();

        session.send(&gateway, "A").await.unwrap();
        let reply = session.send(&gateway, "C").await.unwrap();
        assert_eq!(reply, &ConversationMessage::assistant("B"));

        let prompts: Vec<String> = model.requests().iter().map(|r| r.prompt_text()).collect();
        assert_eq!(prompts, vec![
            "Simulate a case on: A".to_string(),
            "Simulate a case on: Student: A\nTutor: B\nStudent: C".to_string()
        ]);
        assert_eq!(session.messages().len(), 4);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn failed_turn_keeps_user_message_without_reply() {
        let model = Arc::new(StubModel::failing("network down"));
        let gateway = GenerationGateway::new(model, &LlmConfig::default());
        let mut session = ChatSession::new(
            PromptTemplate::new("You are Doc Dav."),
            BindMode::Concatenation,
            RoleLabels::DOC_DAV
        );

        let err = session.send(&gateway, "What is troponin?").await.unwrap_err();
        assert!(matches!(err, ChatError::Generation(GenerationError::Transport(_))));
        assert_eq!(session.messages(), &[ConversationMessage::user("What is troponin?")]);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.begin_turn("Retry").is_ok());
    }

    #[test]
    fn concatenation_session_appends_transcript_to_persona() {
        let mut session = ChatSession::new(
            PromptTemplate::new("You are Doc Dav."),
            BindMode::Concatenation,
            RoleLabels::DOC_DAV
        );
        let turn = session.begin_turn("What is troponin?").unwrap();
        assert_eq!(turn.prompt, "You are Doc Dav.\n\nWhat is troponin?");
    }
}
