pub mod cli;
pub mod config;
pub mod gateway;
pub mod history;
pub mod input;
pub mod llm;
pub mod models;
pub mod speech;
pub mod surface;

use cli::{ Args, Command };
use config::pages::{ find_page, hubs, suggest_page, Page, PageKind };
use gateway::GenerationGateway;
use log::{ error, info };
use models::study::{ score, QuizQuestion };
use speech::{ Dictation, SpeechEvent };
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use surface::{ PageOutput, PageSurface, SurfaceInput };
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Base URL: {}", args.base_url);
    info!("Text Model: {}", args.text_model);
    info!("Image Model: {}", args.image_model);
    info!("Speech Locale: {}", args.locale);
    info!("API Key Set: {}", args.api_key.as_deref().map_or(false, |k| !k.trim().is_empty()));
    info!("-------------------------");

    if let Command::Pages = args.command {
        print_pages();
        return Ok(());
    }

    let config = args.llm_config();
    let model = llm::new_client(&config)?;
    let gateway = Arc::new(GenerationGateway::new(model, &config));
    info!("Gateway ready (text={}, image={})", gateway.text_model(), gateway.image_model());

    match args.command.clone() {
        Command::Pages => {}
        Command::Run { page, input, file, image_out, take_quiz } => {
            let page = lookup(&page)?;
            let surface = PageSurface::new(page, gateway);
            if page.is_chat() {
                return chat(surface, input).await;
            }
            let submitted = match (file, input) {
                (Some(path), _) if matches!(page.kind, PageKind::ImageAnalysis { .. }) =>
                    SurfaceInput::ImageFile(path),
                (Some(path), _) => SurfaceInput::TextFile(path),
                (None, Some(text)) => SurfaceInput::Text(text),
                (None, None) => SurfaceInput::Nothing,
            };
            let output = surface.submit(submitted).await.map_err(|e| e.display_message())?;
            render(output, &image_out, take_quiz).await?;
        }
        Command::Chat { page, topic } => {
            let page = lookup(&page)?;
            if !page.is_chat() {
                return Err(format!("Page '{}' is not a chat; use `run {}`", page.id, page.id).into());
            }
            chat(PageSurface::new(page, gateway), topic).await?;
        }
        Command::Dictate { page, image_out } => {
            let surface = PageSurface::new(lookup(&page)?, gateway);
            let transcript = dictate(&args.locale).await;
            info!("Dictated {} characters", transcript.len());
            let output = surface
                .submit(SurfaceInput::Transcript(transcript)).await
                .map_err(|e| e.display_message())?;
            render(output, &image_out, false).await?;
        }
    }

    Ok(())
}

fn lookup(id: &str) -> Result<&'static Page, Box<dyn Error + Send + Sync>> {
    match find_page(id) {
        Some(page) => Ok(page),
        None =>
            Err(match suggest_page(id) {
                Some(suggestion) => format!("Unknown page '{}'. Did you mean '{}'?", id, suggestion),
                None => format!("Unknown page '{}'. Run `pages` to list them.", id),
            }.into()),
    }
}

fn print_pages() {
    for hub in hubs() {
        println!("{}", hub.title);
        for page in &hub.pages {
            let marker = if page.is_chat() { " (chat)" } else { "" };
            println!("  {:<22} {}{}", page.id, page.description, marker);
            if let Some(choices) = page.choices() {
                println!("  {:<22} choices: {}", "", choices.join(", "));
            }
        }
    }
}

async fn render(
    output: PageOutput,
    image_out: &Path,
    take_quiz: bool
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match output {
        PageOutput::Text(text) => println!("{}", text),
        PageOutput::Flashcards(cards) => {
            for (i, card) in cards.iter().enumerate() {
                println!("{}. Q: {}\n   A: {}", i + 1, card.question, card.answer);
            }
        }
        PageOutput::Quiz(quiz) => present_quiz(&quiz, take_quiz).await?,
        PageOutput::StudyPack(pack) => {
            println!("Summary\n{}\n", pack.summary);
            println!("Flashcards");
            for card in &pack.flashcards {
                println!("- {} :: {}", card.question, card.answer);
            }
            println!("\nQuiz");
            present_quiz(&pack.quiz, take_quiz).await?;
            println!("\nCase Study\n{}", pack.case_study);
        }
        PageOutput::Anatomy(view) => {
            let bytes = view.image.decode()?;
            tokio::fs::write(image_out, &bytes).await?;
            println!("Image ({}) written to {}", view.image.mime_type, image_out.display());
            println!("{}", view.description);
        }
        PageOutput::Paths(paths) => {
            for path in paths {
                println!("{}: {} (page: {})", path.name, path.description, path.page_id);
            }
        }
        PageOutput::Notice(notice) => println!("{}\n\n{}", notice.title(), notice.text()),
    }
    Ok(())
}

fn print_question(number: usize, question: &QuizQuestion) {
    println!("{}. {}", number, question.question);
    for (letter, option) in ('A'..='Z').zip(&question.options) {
        println!("   {}) {}", letter, option);
    }
}

fn print_answer_key(quiz: &[QuizQuestion]) {
    for (i, question) in quiz.iter().enumerate() {
        println!("{}. {}: {}", i + 1, question.correct_answer, question.explanation);
    }
}

/// Pairs each question with the typed line at the same position.
fn collect_answers(quiz: &[QuizQuestion], typed: &[String]) -> Vec<Option<String>> {
    quiz.iter()
        .enumerate()
        .map(|(i, q)| {
            typed
                .get(i)
                .and_then(|line| q.resolve_choice(line))
                .map(str::to_string)
        })
        .collect()
}

async fn present_quiz(quiz: &[QuizQuestion], take_quiz: bool) -> Result<(), Box<dyn Error + Send + Sync>> {
    if !take_quiz {
        for (i, question) in quiz.iter().enumerate() {
            print_question(i + 1, question);
        }
        println!("\nAnswer key");
        print_answer_key(quiz);
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut typed = Vec::with_capacity(quiz.len());
    for (i, question) in quiz.iter().enumerate() {
        print_question(i + 1, question);
        match lines.next_line().await? {
            Some(line) => typed.push(line),
            None => break,
        }
    }
    let answers = collect_answers(quiz, &typed);
    println!("\nScore: {}/{}", score(quiz, &answers), quiz.len());
    print_answer_key(quiz);
    Ok(())
}

async fn chat(surface: PageSurface, topic: Option<String>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut session = surface.open_chat().map_err(|e| e.display_message())?;
    let labels = session.labels();

    if let Some(topic) = topic {
        let opening = history::opening_case_line(&topic);
        match surface.send_chat(&mut session, &opening).await {
            Ok(reply) => println!("{}: {}", labels.assistant, reply.text),
            Err(e) => error!("{}", e.display_message()),
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match surface.send_chat(&mut session, &line).await {
            Ok(reply) => println!("{}: {}", labels.assistant, reply.text),
            Err(e) => error!("{}", e.display_message()),
        }
    }
    info!("Chat session {} closed after {} messages", session.id(), session.messages().len());
    Ok(())
}

/// Feeds stdin lines to a dictation as final phrases until EOF.
async fn dictate(locale: &str) -> String {
    let (tx, rx) = mpsc::channel(16);
    let mut dictation = Dictation::new(locale);
    dictation.start(Box::pin(ReceiverStream::new(rx)));
    info!("Listening on stdin (locale={}); end with EOF", dictation.locale());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(SpeechEvent::final_text(format!("{}\n", line))).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(SpeechEvent::Error(e.to_string())).await;
                break;
            }
        }
    }
    drop(tx);

    let transcript = dictation.finish().await;
    if let Some(e) = dictation.last_error() {
        error!("Speech input stopped: {}", e);
    }
    transcript
}
