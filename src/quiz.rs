use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of questions requested for every game.
pub const QUIZ_LENGTH: usize = 5;
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl QuizQuestion {
    pub fn new(question: String, options: Vec<String>, correct_answer: String) -> Self {
        Self {
            question,
            options,
            correct_answer,
        }
    }

    pub fn is_correct(&self, option: &str) -> bool {
        option == self.correct_answer
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Whether the question is well formed: the expected amount of options,
    /// exactly one of which is the correct answer.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() == OPTIONS_PER_QUESTION
            && self.options.iter().filter(|o| self.is_correct(o)).count() == 1
    }

    /// Options in a fresh random order, so the correct one isn't always in the same place.
    pub fn shuffled_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut options = self.options.clone();
        options.shuffle(rng);
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("the current question has already been answered")]
    AlreadyAnswered,
    #[error("the value is not one of the options")]
    NotAnOption,
    #[error("the quiz is over")]
    Finished,
}

/// What happened after moving past an answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion,
    Results,
}

/// Progress through one generated quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
    pub current_question: usize,
    pub score: usize,
    selected: Option<String>,
    show_results: bool,
}

impl Quiz {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            current_question: 0,
            score: 0,
            selected: None,
            show_results: false,
        }
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.show_results {
            return None;
        }
        self.questions.get(self.current_question)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.show_results
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question + 1 >= self.questions.len()
    }

    /// Locks in an answer for the current question. Returns whether it was correct.
    pub fn select(&mut self, option: &str) -> Result<bool, SelectError> {
        let question = self.current().ok_or(SelectError::Finished)?;
        if self.selected.is_some() {
            return Err(SelectError::AlreadyAnswered);
        }
        if !question.has_option(option) {
            return Err(SelectError::NotAnOption);
        }

        let correct = question.is_correct(option);
        if correct {
            self.score += 1;
        }
        self.selected = Some(option.to_string());
        Ok(correct)
    }

    /// Moves past an answered question. `None` if there is nothing to move past.
    pub fn advance(&mut self) -> Option<Advance> {
        if self.show_results || self.selected.is_none() {
            return None;
        }
        if self.is_last_question() {
            self.show_results = true;
            return Some(Advance::Results);
        }
        self.current_question += 1;
        self.selected = None;
        Some(Advance::NextQuestion)
    }

    /// Score as a rounded percentage of the total.
    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        (self.score as f64 / self.questions.len() as f64 * 100.0).round() as u32
    }

    pub fn reset(&mut self) {
        self.current_question = 0;
        self.score = 0;
        self.selected = None;
        self.show_results = false;
    }
}
