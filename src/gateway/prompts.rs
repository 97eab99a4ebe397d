use serde_json::Value;

/// The exact sentence the model must reply with when the document has no answer.
pub const NOT_FOUND_ANSWER: &str =
    "I could not find an answer to this question in the provided curriculum.";

fn language_clause(language: Option<&str>) -> String {
    match language {
        Some(language) => format!("Write every title, summary, question and answer in {}.", language),
        None => "Write every title, summary, question and answer in the same language as the curriculum."
            .to_string(),
    }
}

pub fn structure_curriculum(document: &str, language: Option<&str>) -> String {
    format!(
        "Analyse the following curriculum and structure it as JSON.
        The JSON object must have a single key \"lessons\", which is an array.
        Every element of \"lessons\" must contain:
        1. \"title\": the title of the lesson.
        2. \"content\": a short summary of the lesson.
        3. \"questions\": an array of review and general questions about the lesson.
           Every question must contain \"questionText\" and \"answerText\".

        Make sure the answers are accurate and taken directly from the provided content.
        {}

        Curriculum:
        ---
        {}
        ---",
        language_clause(language),
        document
    )
}

pub fn generate_quiz(document: &str, amount: usize, language: Option<&str>) -> String {
    format!(
        "Based on the following curriculum, create a fun and varied multiple-choice quiz of {} questions.
        The questions must cover different topics of the curriculum.
        Reply with JSON only: an array of question objects.
        Every question object must contain:
        1. \"question\": the text of the question.
        2. \"options\": an array of 4 text options, one of which is the correct answer.
        3. \"correctAnswer\": the exact text of the correct answer, copied from the options.
        {}

        Curriculum:
        ---
        {}
        ---",
        amount,
        language_clause(language),
        document
    )
}

pub fn answer_question(document: &str, question: &str) -> String {
    format!(
        "As a study assistant, answer the user's question using **only** the provided curriculum.
        Do not use any outside information.
        If the answer is not in the curriculum, reply exactly: \"{}\"

        Curriculum:
        ---
        {}
        ---

        User question:
        \"{}\"",
        NOT_FOUND_ANSWER, document, question
    )
}

/// Appended to a prompt when the backend cannot enforce a response schema itself.
pub fn json_instruction(schema: &Value) -> String {
    format!(
        "Respond with raw JSON only, without markdown or commentary. The JSON must match this JSON schema:\n{}",
        schema
    )
}

pub fn is_not_found(answer: &str) -> bool {
    answer.trim().trim_matches('"') == NOT_FOUND_ANSWER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_the_document() {
        let doc = "Chapter 1: Water boils at 100 degrees.";
        assert!(structure_curriculum(doc, None).contains(doc));
        assert!(generate_quiz(doc, 5, None).contains(doc));
        assert!(answer_question(doc, "When does water boil?").contains(doc));
    }

    #[test]
    fn language_defaults_to_the_documents_own() {
        let prompt = structure_curriculum("doc", None);
        assert!(prompt.contains("same language as the curriculum"));

        let prompt = generate_quiz("doc", 5, Some("Arabic"));
        assert!(prompt.contains("in Arabic"));
    }

    #[test]
    fn recognises_the_sentinel() {
        assert!(is_not_found(NOT_FOUND_ANSWER));
        assert!(is_not_found(&format!("\"{}\"\n", NOT_FOUND_ANSWER)));
        assert!(!is_not_found("Water boils at 100 degrees."));
    }
}
