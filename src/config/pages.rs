//! Static navigation table: hubs of pages, each page carrying the prompt
//! template and parameters of the surface that renders it.

use once_cell::sync::Lazy;

use super::prompt::{ BindMode, PromptTemplate };

pub const SUGGESTION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientationPath {
    pub name: &'static str,
    pub description: &'static str,
    pub page_id: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalNotice {
    Privacy,
    Copyright,
}

impl LegalNotice {
    pub fn title(&self) -> &'static str {
        match self {
            LegalNotice::Privacy => "Privacy Policy",
            LegalNotice::Copyright => "Copyright Notice",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            LegalNotice::Privacy =>
                "This app is password-protected to ensure the privacy and security of our users. Only verified users can access the full range of features. We are committed to protecting your data and will not share it with third parties. All user-generated content is processed securely.",
            LegalNotice::Copyright =>
                "All content, features, and intellectual property within the Dav Med App are © David Niyonzima. Unauthorized use, reproduction, or distribution of any part of this application is strictly prohibited and may result in legal action.",
        }
    }
}

#[derive(Debug, Clone)]
pub enum PageKind {
    Orientation {
        paths: &'static [OrientationPath],
    },
    StudyPack {
        template: PromptTemplate,
    },
    SystemOverview {
        template: PromptTemplate,
        systems: &'static [&'static str],
    },
    Flashcards {
        template: PromptTemplate,
    },
    Quiz {
        template: PromptTemplate,
    },
    ExamGenerator {
        template: PromptTemplate,
        years: &'static [&'static str],
    },
    /// Lab results, notes or grades uploaded as a text file.
    FileAnalysis {
        template: PromptTemplate,
    },
    VoiceNote {
        template: PromptTemplate,
    },
    AskAnything {
        template: PromptTemplate,
    },
    /// Fixed guidance generated from the template alone.
    Briefing {
        template: PromptTemplate,
    },
    CaseSimulator {
        template: PromptTemplate,
    },
    DocDav {
        persona: PromptTemplate,
    },
    Lookup {
        template: PromptTemplate,
    },
    Anatomy {
        template: PromptTemplate,
        body_parts: &'static [&'static str],
    },
    ImageAnalysis {
        template: PromptTemplate,
    },
    Legal(LegalNotice),
}

#[derive(Debug, Clone)]
pub struct Page {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: PageKind,
}

impl Page {
    pub fn template(&self) -> Option<&PromptTemplate> {
        match &self.kind {
            PageKind::StudyPack { template } |
            PageKind::SystemOverview { template, .. } |
            PageKind::Flashcards { template } |
            PageKind::Quiz { template } |
            PageKind::ExamGenerator { template, .. } |
            PageKind::FileAnalysis { template } |
            PageKind::VoiceNote { template } |
            PageKind::AskAnything { template } |
            PageKind::Briefing { template } |
            PageKind::CaseSimulator { template } |
            PageKind::Lookup { template } |
            PageKind::Anatomy { template, .. } |
            PageKind::ImageAnalysis { template } => Some(template),
            PageKind::DocDav { persona } => Some(persona),
            PageKind::Orientation { .. } | PageKind::Legal(_) => None,
        }
    }

    /// How this page joins user input to its template. `None` for pages that
    /// never call the model, and for image analysis which sends the template
    /// verbatim next to the image.
    pub fn bind_mode(&self) -> Option<BindMode> {
        match &self.kind {
            PageKind::StudyPack { .. } |
            PageKind::SystemOverview { .. } |
            PageKind::ExamGenerator { .. } |
            PageKind::Briefing { .. } |
            PageKind::CaseSimulator { .. } |
            PageKind::Lookup { .. } |
            PageKind::Anatomy { .. } => Some(BindMode::Substitution),
            PageKind::Flashcards { .. } |
            PageKind::Quiz { .. } |
            PageKind::FileAnalysis { .. } |
            PageKind::VoiceNote { .. } |
            PageKind::AskAnything { .. } |
            PageKind::DocDav { .. } => Some(BindMode::Concatenation),
            PageKind::ImageAnalysis { .. } | PageKind::Orientation { .. } | PageKind::Legal(_) =>
                None,
        }
    }

    /// Fixed list the user picks from, for selection pages.
    pub fn choices(&self) -> Option<&'static [&'static str]> {
        match &self.kind {
            PageKind::SystemOverview { systems, .. } => Some(*systems),
            PageKind::ExamGenerator { years, .. } => Some(*years),
            PageKind::Anatomy { body_parts, .. } => Some(*body_parts),
            _ => None,
        }
    }

    pub fn is_chat(&self) -> bool {
        matches!(self.kind, PageKind::CaseSimulator { .. } | PageKind::DocDav { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Hub {
    pub id: &'static str,
    pub title: &'static str,
    pub pages: Vec<Page>,
}

static ORIENTATION_PATHS: &[OrientationPath] = &[
    OrientationPath {
        name: "Preclinical",
        description: "Focus on foundational sciences, flashcards, and quizzes.",
        page_id: "study-pack-generator",
    },
    OrientationPath {
        name: "Clinical",
        description: "Dive into case simulations, clinical guides, and drug info.",
        page_id: "clinical-orientation",
    },
    OrientationPath {
        name: "Exam Prep",
        description: "Generate mock exams and intensive quizzes for boards.",
        page_id: "study-pack-generator",
    },
    OrientationPath {
        name: "Internship",
        description: "Access support tools, checklists, and orientation guides.",
        page_id: "internship-support",
    },
];

static PHYSIOLOGY_SYSTEMS: &[&str] = &[
    "Cardiovascular",
    "Respiratory",
    "Renal",
    "Endocrine",
    "Gastrointestinal",
    "Nervous",
];

static EXAM_YEARS: &[&str] = &["1", "2", "3", "4", "5", "6"];

static BODY_PARTS: &[&str] = &[
    "Brain",
    "Heart",
    "Lungs",
    "Liver",
    "Kidneys",
    "Stomach",
    "Knee Joint",
    "Shoulder Joint",
];

fn page(id: &'static str, title: &'static str, description: &'static str, kind: PageKind) -> Page {
    Page { id, title, description, kind }
}

fn build_hubs() -> Vec<Hub> {
    vec![
        Hub {
            id: "orientation",
            title: "Orientation",
            pages: vec![
                page(
                    "choose-path",
                    "Choose Your Path",
                    "Select your current stage for a tailored experience.",
                    PageKind::Orientation { paths: ORIENTATION_PATHS }
                )
            ],
        },
        Hub {
            id: "study",
            title: "Study Tools Hub",
            pages: vec![
                page(
                    "study-pack-generator",
                    "Module & Topic Generator",
                    "Enter a topic to generate a complete study pack.",
                    PageKind::StudyPack {
                        template: "Generate study materials for this medical topic: {userInput}. Include a concise summary, flashcards (question/answer), quiz questions (question, 4 options, correct answer, explanation), and a brief clinical case study.".into(),
                    }
                ),
                page(
                    "human-physiology",
                    "Human Physiology",
                    "Get an overview of major human physiological systems.",
                    PageKind::SystemOverview {
                        template: "Explain the normal human physiology of the {userInput} system. Include key concepts, functions, and regulatory mechanisms. Use clear, concise language for medical students.".into(),
                        systems: PHYSIOLOGY_SYSTEMS,
                    }
                ),
                page(
                    "flashcard-generator",
                    "Flashcard Generator",
                    "Turn your notes into question and answer flashcards.",
                    PageKind::Flashcards {
                        template: "Create concise flashcards from the following study material. Each flashcard must have a question and an answer focused on high-yield facts for medical students.".into(),
                    }
                ),
                page(
                    "quiz-creator",
                    "Quiz Creator",
                    "Generate a multiple-choice quiz from your study material.",
                    PageKind::Quiz {
                        template: "Create multiple-choice quiz questions from the following study material. Each question must have exactly 4 options, a correct answer that matches one option exactly, and a short explanation.".into(),
                    }
                ),
                page(
                    "exam-generator",
                    "Exam Generator",
                    "Generate a mock exam for your year of study.",
                    PageKind::ExamGenerator {
                        template: "Generate a mock exam for a year {userInput} medical student. Include 10 multiple-choice questions covering the core subjects of that year, followed by an answer key with brief explanations.".into(),
                        years: EXAM_YEARS,
                    }
                ),
                page(
                    "note-organizer",
                    "Note Organizer",
                    "Upload lecture notes and get a structured outline.",
                    PageKind::FileAnalysis {
                        template: "Organize the following lecture notes into a clear, structured study outline with headings, key points, and a short summary at the end.".into(),
                    }
                ),
                page(
                    "voice-to-note",
                    "Voice to Note",
                    "Dictate a patient encounter and get a SOAP note.",
                    PageKind::VoiceNote {
                        template: "Convert the following dictated clinical encounter into a well-structured SOAP note (Subjective, Objective, Assessment, Plan).".into(),
                    }
                ),
                page(
                    "ask-anything",
                    "Ask Anything",
                    "Ask any medical question and get a clear answer.",
                    PageKind::AskAnything {
                        template: "You are a medical education assistant. Answer the following question from a medical student clearly and accurately.".into(),
                    }
                )
            ],
        },
        Hub {
            id: "clinical",
            title: "Clinical Practice",
            pages: vec![
                page(
                    "clinical-orientation",
                    "Clinical Orientation",
                    "Tips, checklists, and etiquette for clinical rotations.",
                    PageKind::Briefing {
                        template: "Provide a comprehensive guide for a medical student starting clinical orientation. Include key tips on ward behavior, effective documentation (e.g., SOAP notes), patient interaction etiquette, and common pitfalls to avoid.".into(),
                    }
                ),
                page(
                    "internship-support",
                    "Internship Support",
                    "Rotation planner, stress tips, and daily checklists.",
                    PageKind::Briefing {
                        template: "Offer detailed advice and practical tools for a medical intern. Cover topics like managing rotation schedules, coping with stress and long hours, and provide a daily checklist for common tasks.".into(),
                    }
                ),
                page(
                    "case-simulator",
                    "Case Simulator",
                    "Simulate patient cases to practice clinical reasoning.",
                    PageKind::CaseSimulator {
                        template: "Simulate a realistic patient case for a medical student based on this topic: {userInput}. Include patient history, symptoms, physical exam findings, and lab results. Then, ask the user to provide a differential diagnosis and suggest a management plan. Wait for the user's response before revealing the correct diagnosis and plan.".into(),
                    }
                ),
                page(
                    "lab-interpretation",
                    "Lab Interpretation",
                    "Upload lab results for an interpretation.",
                    PageKind::FileAnalysis {
                        template: "Interpret the following laboratory results for a medical student. Flag abnormal values, explain their clinical significance, and list possible differential diagnoses.".into(),
                    }
                ),
                page(
                    "image-analyzer",
                    "Image Analyzer",
                    "Upload a medical image for a guided description.",
                    PageKind::ImageAnalysis {
                        template: "Analyze this medical image for a medical student. Describe the visible structures, notable findings, and their possible clinical significance.".into(),
                    }
                )
            ],
        },
        Hub {
            id: "community",
            title: "Community & Discussion",
            pages: vec![
                page(
                    "discussion-forum",
                    "Discussion Forum",
                    "Post questions, share answers, and learn with peers.",
                    PageKind::DocDav {
                        persona: "You are Doc Dav, a friendly and knowledgeable AI assistant for medical students. Answer this question clearly, accurately, and in a student-friendly way using current medical knowledge.".into(),
                    }
                )
            ],
        },
        Hub {
            id: "intelligence",
            title: "Disease & Drug Intelligence",
            pages: vec![
                page(
                    "disease-analysis",
                    "Disease Analysis",
                    "Get a summary of a disease's pathophysiology.",
                    PageKind::Lookup {
                        template: "Explain the pathophysiology of {userInput}. Include causes, progression, and clinical signs in a clear, structured format suitable for a medical student.".into(),
                    }
                ),
                page(
                    "drug-info",
                    "Drug Info Screen",
                    "Look up a drug's mechanism, dosage, and side effects.",
                    PageKind::Lookup {
                        template: "Describe the drug '{userInput}'. Include its mechanism of action, indications, contraindications, common side effects, and standard dosage guidelines.".into(),
                    }
                )
            ],
        },
        Hub {
            id: "anatomy",
            title: "Anatomy Atlas",
            pages: vec![
                page(
                    "anatomy-viewer",
                    "Anatomy Viewer",
                    "View labeled images and descriptions of body systems.",
                    PageKind::Anatomy {
                        template: "Generate a medically accurate, clearly labeled diagram of the {userInput}. Include brief descriptions for each key structure shown.".into(),
                        body_parts: BODY_PARTS,
                    }
                )
            ],
        },
        Hub {
            id: "performance",
            title: "Performance Advisor",
            pages: vec![
                page(
                    "study-guidance",
                    "Study Guidance",
                    "Get personalized advice by uploading grades or progress.",
                    PageKind::FileAnalysis {
                        template: "Based on the following performance data, analyze the student's strengths and weaknesses. Suggest personalized study strategies, recommend specific topics to focus on, and provide actionable advice for improvement.".into(),
                    }
                )
            ],
        },
        Hub {
            id: "legal",
            title: "Privacy & Copyright",
            pages: vec![
                page(
                    "privacy",
                    "Privacy",
                    "Our commitment to your data privacy.",
                    PageKind::Legal(LegalNotice::Privacy)
                ),
                page(
                    "copyright",
                    "Copyright",
                    "Content usage and copyright information.",
                    PageKind::Legal(LegalNotice::Copyright)
                )
            ],
        }
    ]
}

static HUBS: Lazy<Vec<Hub>> = Lazy::new(build_hubs);

pub fn hubs() -> &'static [Hub] {
    &HUBS
}

pub fn pages() -> impl Iterator<Item = &'static Page> {
    HUBS.iter().flat_map(|hub| hub.pages.iter())
}

pub fn find_page(id: &str) -> Option<&'static Page> {
    pages().find(|p| p.id == id)
}

/// Closest page id to a mistyped one.
pub fn suggest_page(id: &str) -> Option<&'static str> {
    let needle = id.trim().to_lowercase();
    let mut best: Option<&'static str> = None;
    let mut best_score = 0.0;
    for page in pages() {
        let score = strsim::jaro_winkler(&needle, page.id);
        if score > best_score {
            best_score = score;
            best = Some(page.id);
        }
    }
    if best_score >= SUGGESTION_THRESHOLD {
        best
    } else {
        None
    }
}
