//! JSON schemas of the structured replies.

use serde_json::{json, Value};

use crate::quiz::OPTIONS_PER_QUESTION;

pub fn curriculum() -> Value {
    json!({
        "type": "object",
        "properties": {
            "lessons": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "content": { "type": "string" },
                        "questions": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "questionText": { "type": "string" },
                                    "answerText": { "type": "string" }
                                },
                                "required": ["questionText", "answerText"]
                            }
                        }
                    },
                    "required": ["title", "content", "questions"]
                }
            }
        },
        "required": ["lessons"]
    })
}

pub fn quiz() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "question": { "type": "string" },
                "options": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": OPTIONS_PER_QUESTION,
                    "maxItems": OPTIONS_PER_QUESTION
                },
                "correctAnswer": { "type": "string" }
            },
            "required": ["question", "options", "correctAnswer"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiz_options_are_fixed_at_four() {
        let schema = quiz();
        assert_eq!(schema["items"]["properties"]["options"]["minItems"], 4);
        assert_eq!(schema["items"]["properties"]["options"]["maxItems"], 4);
    }

    #[test]
    fn curriculum_requires_every_field() {
        let schema = curriculum();
        let lesson = &schema["properties"]["lessons"]["items"];
        assert_eq!(lesson["required"], json!(["title", "content", "questions"]));
        assert_eq!(
            lesson["properties"]["questions"]["items"]["required"],
            json!(["questionText", "answerText"])
        );
    }
}
