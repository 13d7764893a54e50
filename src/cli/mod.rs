use clap::{ Parser, Subcommand };
use std::path::PathBuf;

use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL };
use crate::speech::DEFAULT_LOCALE;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Generation Service Args ---
    /// API key for the generation service. Requests fail without one.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the generation service
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Model used for text and structured generation
    #[arg(long, env = "TEXT_MODEL", default_value = DEFAULT_TEXT_MODEL)]
    pub text_model: String,

    /// Model used for image generation
    #[arg(long, env = "IMAGE_MODEL", default_value = DEFAULT_IMAGE_MODEL)]
    pub image_model: String,

    // --- General App Args ---
    /// Recognition locale reported to speech input
    #[arg(long, env = "SPEECH_LOCALE", default_value = DEFAULT_LOCALE)]
    pub locale: String,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every hub and page
    Pages,

    /// Submit one request to a page and print the result
    Run {
        /// Page id, e.g. study-pack-generator
        page: String,

        /// Topic, question, selection or pasted text
        #[arg(long, conflicts_with = "file")]
        input: Option<String>,

        /// A .txt/.csv upload, or an image for the image analyzer
        #[arg(long)]
        file: Option<PathBuf>,

        /// Where to write a generated image
        #[arg(long, default_value = "anatomy.png")]
        image_out: PathBuf,

        /// Answer generated quiz questions on stdin and get a score
        #[arg(long, default_value = "false")]
        take_quiz: bool,
    },

    /// Hold a conversation with a chat page; one message per line
    Chat {
        page: String,

        /// Case topic sent as the opening line
        #[arg(long)]
        topic: Option<String>,
    },

    /// Dictate from stdin, one final phrase per line, then submit the transcript
    Dictate {
        #[arg(default_value = "voice-to-note")]
        page: String,

        /// Where to write a generated image
        #[arg(long, default_value = "anatomy.png")]
        image_out: PathBuf,
    },
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.api_key.clone(),
            base_url: Some(self.base_url.clone()),
            text_model: Some(self.text_model.clone()),
            image_model: Some(self.image_model.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_parses_with_defaults() {
        let args = Args::try_parse_from([
            "study-agent",
            "--api-key",
            "k",
            "run",
            "drug-info",
            "--input",
            "Metformin",
        ]).unwrap();
        assert_eq!(args.text_model, DEFAULT_TEXT_MODEL);
        match args.command {
            Command::Run { page, input, file, .. } => {
                assert_eq!(page, "drug-info");
                assert_eq!(input.as_deref(), Some("Metformin"));
                assert!(file.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn llm_config_carries_models() {
        let args = Args::try_parse_from([
            "study-agent",
            "--image-model",
            "custom-image",
            "pages",
        ]).unwrap();
        let config = args.llm_config();
        assert_eq!(config.image_model(), "custom-image");
        assert_eq!(config.base_url.as_deref(), Some(DEFAULT_BASE_URL));
    }

    #[test]
    fn dictate_defaults_to_voice_note_page() {
        let args = Args::try_parse_from(["study-agent", "dictate"]).unwrap();
        assert!(matches!(args.command, Command::Dictate { ref page, .. } if page == "voice-to-note"));
    }

    #[test]
    fn input_and_file_cannot_be_combined() {
        let err = Args::try_parse_from([
            "study-agent",
            "run",
            "lab-interpretation",
            "--input",
            "K 6.1",
            "--file",
            "labs.csv",
        ]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
