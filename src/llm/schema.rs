//! Response schemas handed to the model for structured output, in the
//! OpenAPI subset the Gemini API accepts.

use serde_json::{ json, Value as JsonValue };

fn flashcard_item() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "answer": { "type": "STRING" }
        },
        "required": ["question", "answer"]
    })
}

fn quiz_item() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "options": {
                "type": "ARRAY",
                "description": "An array of 4 potential answers.",
                "items": { "type": "STRING" }
            },
            "correctAnswer": { "type": "STRING" },
            "explanation": { "type": "STRING" }
        },
        "required": ["question", "options", "correctAnswer", "explanation"]
    })
}

pub fn flashcards() -> JsonValue {
    json!({ "type": "ARRAY", "items": flashcard_item() })
}

pub fn quiz() -> JsonValue {
    json!({ "type": "ARRAY", "items": quiz_item() })
}

pub fn study_pack() -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING", "description": "A concise summary of the topic." },
            "flashcards": {
                "type": "ARRAY",
                "description": "An array of flashcards with a question and an answer.",
                "items": flashcard_item()
            },
            "quiz": {
                "type": "ARRAY",
                "description": "An array of multiple-choice quiz questions.",
                "items": quiz_item()
            },
            "caseStudy": {
                "type": "STRING",
                "description": "A brief clinical case study related to the topic."
            }
        },
        "required": ["summary", "flashcards", "quiz", "caseStudy"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_pack_requires_every_section() {
        let schema = study_pack();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, ["summary", "flashcards", "quiz", "caseStudy"]);
        assert_eq!(schema["properties"]["quiz"]["items"], quiz()["items"]);
    }
}
