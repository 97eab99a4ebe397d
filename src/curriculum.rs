use serde::{Deserialize, Serialize};

/// Lessons extracted from an uploaded document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub lessons: Vec<Lesson>,
}

impl Curriculum {
    pub fn new(lessons: Vec<Lesson>) -> Self {
        Self { lessons }
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    /// Short summary of the lesson, not the full text.
    pub content: String,
    pub questions: Vec<QaPair>,
}

impl Lesson {
    pub fn new(title: String, content: String, questions: Vec<QaPair>) -> Self {
        Self {
            title,
            content,
            questions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPair {
    pub question_text: String,
    pub answer_text: String,
}

impl QaPair {
    pub fn new(question_text: String, answer_text: String) -> Self {
        Self {
            question_text,
            answer_text,
        }
    }
}
