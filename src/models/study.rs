use serde::{ Deserialize, Serialize };

pub const QUIZ_OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn answer_is_listed(&self) -> bool {
        self.options.iter().any(|o| o == &self.correct_answer)
    }

    pub fn is_correct(&self, choice: &str) -> bool {
        choice == self.correct_answer
    }

    /// Maps a typed answer to one of the options: either its letter
    /// (`b`, `B)`) or the option text, ignoring case.
    pub fn resolve_choice(&self, typed: &str) -> Option<&str> {
        let typed = typed.trim().trim_end_matches(|c: char| c == ')' || c == '.');
        let mut letters = typed.chars();
        if let (Some(letter), None) = (letters.next(), letters.next()) {
            if letter.is_ascii_alphabetic() {
                let index = (letter.to_ascii_uppercase() as usize) - ('A' as usize);
                return self.options.get(index).map(String::as_str);
            }
        }
        self.options
            .iter()
            .find(|o| o.eq_ignore_ascii_case(typed))
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPack {
    pub summary: String,
    pub flashcards: Vec<Flashcard>,
    pub quiz: Vec<QuizQuestion>,
    pub case_study: String,
}

/// Number of answered questions that match the key, as shown after a quiz.
pub fn score(quiz: &[QuizQuestion], answers: &[Option<String>]) -> usize {
    quiz.iter()
        .zip(answers)
        .filter(|(q, a)| a.as_deref().map_or(false, |choice| q.is_correct(choice)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuizQuestion {
        QuizQuestion {
            question: "Which valve sits between the left atrium and ventricle?".into(),
            options: vec!["Mitral".into(), "Tricuspid".into(), "Aortic".into(), "Pulmonary".into()],
            correct_answer: "Mitral".into(),
            explanation: "The mitral valve is the left atrioventricular valve.".into(),
        }
    }

    #[test]
    fn quiz_question_uses_camel_case_keys() {
        let value = serde_json::to_value(question()).unwrap();
        assert_eq!(value["correctAnswer"], "Mitral");
        assert!(value.get("correct_answer").is_none());
    }

    #[test]
    fn detects_answer_missing_from_options() {
        let mut q = question();
        assert!(q.answer_is_listed());
        q.correct_answer = "Bicuspid".into();
        assert!(!q.answer_is_listed());
    }

    #[test]
    fn resolves_letters_and_option_text() {
        let q = question();
        assert_eq!(q.resolve_choice("a"), Some("Mitral"));
        assert_eq!(q.resolve_choice(" C) "), Some("Aortic"));
        assert_eq!(q.resolve_choice("tricuspid"), Some("Tricuspid"));
        assert_eq!(q.resolve_choice("E"), None);
        assert_eq!(q.resolve_choice("Bicuspid"), None);
    }

    #[test]
    fn score_counts_matching_answers_only() {
        let quiz = vec![question(), question(), question()];
        let answers = vec![Some("Mitral".to_string()), Some("Aortic".to_string()), None];
        assert_eq!(score(&quiz, &answers), 1);
    }
}
