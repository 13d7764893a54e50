//! Dictation fed by a speech recognizer. Recognizers report interim guesses
//! and final phrases; only final phrases reach the transcript.

use futures::{ Stream, StreamExt };
use log::{ debug, info, warn };
use std::pin::Pin;
use std::sync::{ Arc, Mutex };
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Chunk {
        text: String,
        is_final: bool,
    },
    Error(String),
}

impl SpeechEvent {
    pub fn final_text(text: impl Into<String>) -> Self {
        SpeechEvent::Chunk { text: text.into(), is_final: true }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        SpeechEvent::Chunk { text: text.into(), is_final: false }
    }
}

pub type SpeechStream = Pin<Box<dyn Stream<Item = SpeechEvent> + Send>>;

#[derive(Default)]
struct Shared {
    transcript: String,
    last_error: Option<String>,
}

struct Listener {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct Dictation {
    locale: String,
    shared: Arc<Mutex<Shared>>,
    listener: Option<Listener>,
}

impl Dictation {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            shared: Arc::new(Mutex::new(Shared::default())),
            listener: None,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().map_or(false, |l| !l.task.is_finished())
    }

    pub fn transcript(&self) -> String {
        self.shared.lock().map(|s| s.transcript.clone()).unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().ok().and_then(|s| s.last_error.clone())
    }

    /// Starts consuming `events`, clearing the previous transcript. Does
    /// nothing while already listening.
    pub fn start(&mut self, mut events: SpeechStream) {
        if self.is_listening() {
            debug!("Dictation already listening; start ignored");
            return;
        }
        if let Ok(mut shared) = self.shared.lock() {
            shared.transcript.clear();
            shared.last_error = None;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = events.next() => {
                        match event {
                            Some(SpeechEvent::Chunk { text, is_final: true }) => {
                                if let Ok(mut s) = shared.lock() {
                                    s.transcript.push_str(&text);
                                }
                            }
                            Some(SpeechEvent::Chunk { is_final: false, .. }) => {}
                            Some(SpeechEvent::Error(message)) => {
                                warn!("Speech recognition error: {}", message);
                                if let Ok(mut s) = shared.lock() {
                                    s.last_error = Some(message);
                                }
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }
        });
        info!("Dictation started (locale={})", self.locale);
        self.listener = Some(Listener { stop: stop_tx, task });
    }

    /// Stops listening and returns the transcript. Safe to call repeatedly.
    pub async fn stop(&mut self) -> String {
        if let Some(listener) = self.listener.take() {
            let _ = listener.stop.send(());
            if let Err(e) = listener.task.await {
                warn!("Dictation task ended abnormally: {}", e);
            }
            info!("Dictation stopped");
        }
        self.transcript()
    }

    /// Waits for the recognizer stream to end on its own.
    pub async fn finish(&mut self) -> String {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = listener.task.await {
                warn!("Dictation task ended abnormally: {}", e);
            }
        }
        self.transcript()
    }
}

impl Drop for Dictation {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            let _ = listener.stop.send(());
        }
    }
}
