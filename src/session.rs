//! Per-chat session state machine.
//!
//! A [`Session`] starts in [`View::Upload`] and only changes through
//! [`Session::dispatch`]. Gateway calls are awaited inside `dispatch`; the loading
//! message is set before the call and cleared on every way out of it.

use crate::curriculum::Curriculum;
use crate::gateway::{Gateway, GatewayError};
use crate::quiz::Quiz;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Upload,
    Menu,
    Lessons,
    Game,
    Qa,
}

/// User facing errors kept on the session until the next transition clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("There are no lessons to show yet. Please upload a curriculum file first.")]
    NoCurriculum,
    #[error("There is no curriculum content yet. Please upload a curriculum file first.")]
    NoDocument,
    #[error("Something went wrong while analysing the file. Please make sure it contains clear curriculum content.")]
    StructuringFailed,
    #[error("We couldn't create the game. There may be a connection problem or an issue with the file content.")]
    QuizFailed,
    #[error("Sorry, something went wrong while looking for an answer. Please try again.")]
    AnswerFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SubmitDocument(String),
    OpenLessons,
    StartGame,
    OpenQa,
    AskQuestion(String),
    SelectOption(String),
    NextQuestion,
    PlayAgain,
    Back,
    Reset,
}

impl Event {
    /// What to tell the user while the gateway call behind this event runs.
    pub fn loading_message(&self) -> Option<&'static str> {
        match self {
            Event::SubmitDocument(_) => Some("Analysing the curriculum and organising the lessons..."),
            Event::StartGame | Event::PlayAgain => Some("Preparing a fun game from the curriculum..."),
            Event::AskQuestion(question) if !question.trim().is_empty() => {
                Some("Looking for the answer in the curriculum...")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event was applied.
    Changed,
    /// A guard failed; the error is set and the view is unchanged.
    Guarded,
    /// The event means nothing in the current view.
    Ignored,
}

/// The last question asked in the QA view and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    view: View,
    document: Option<String>,
    curriculum: Option<Curriculum>,
    quiz: Option<Quiz>,
    loading: Option<&'static str>,
    error: Option<SessionError>,
    exchange: Option<Exchange>,
}

impl Session {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn curriculum(&self) -> Option<&Curriculum> {
        self.curriculum.as_ref()
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn loading_message(&self) -> Option<&'static str> {
        self.loading
    }

    pub fn error(&self) -> Option<SessionError> {
        self.error
    }

    pub fn exchange(&self) -> Option<&Exchange> {
        self.exchange.as_ref()
    }

    /// The loading message for `event`, if dispatching it now would call the gateway.
    pub fn pending_message(&self, event: &Event) -> Option<&'static str> {
        let calls_gateway = match (self.view, event) {
            (View::Upload, Event::SubmitDocument(_)) => true,
            (View::Menu | View::Game, Event::StartGame)
            | (View::Game, Event::PlayAgain)
            | (View::Qa, Event::AskQuestion(_)) => self.document.is_some(),
            _ => false,
        };
        if calls_gateway {
            event.loading_message()
        } else {
            None
        }
    }

    pub async fn dispatch(&mut self, event: Event, gateway: &Gateway) -> Outcome {
        log::debug!("{:?} <- {:?}", self.view, EventName(&event));

        let outcome = match (self.view, event) {
            (_, Event::Reset) => {
                *self = Session::default();
                Outcome::Changed
            }
            (View::Upload, Event::SubmitDocument(text)) => self.submit_document(text, gateway).await,
            (View::Menu, Event::OpenLessons) => self.open_lessons(),
            (View::Menu | View::Game, Event::StartGame) => self.start_game(gateway).await,
            (View::Menu, Event::OpenQa) => self.open_qa(),
            (View::Qa, Event::AskQuestion(question)) => self.ask_question(question, gateway).await,
            (View::Game, Event::SelectOption(option)) => self.select_option(&option),
            (View::Game, Event::NextQuestion) => self.next_question(),
            (View::Game, Event::PlayAgain) => {
                if let Some(quiz) = self.quiz.as_mut() {
                    quiz.reset();
                }
                self.start_game(gateway).await
            }
            (View::Lessons | View::Game | View::Qa, Event::Back) => {
                self.error = None;
                self.quiz = None;
                self.exchange = None;
                self.view = View::Menu;
                Outcome::Changed
            }
            _ => Outcome::Ignored,
        };

        log::debug!("-> {:?} ({:?})", self.view, outcome);
        outcome
    }

    async fn submit_document(&mut self, text: String, gateway: &Gateway) -> Outcome {
        self.error = None;
        self.curriculum = None;
        self.loading = Event::SubmitDocument(String::new()).loading_message();

        let result = gateway.structure_curriculum(&text).await;
        self.document = Some(text);
        self.loading = None;

        match result {
            Ok(curriculum) => {
                log::info!("Curriculum ready with {} lessons", curriculum.lessons.len());
                self.curriculum = Some(curriculum);
                self.view = View::Menu;
            }
            Err(err) => {
                log_failure("structure the curriculum", &err);
                // The document stays, a new upload replaces it
                self.error = Some(SessionError::StructuringFailed);
                self.view = View::Upload;
            }
        }
        Outcome::Changed
    }

    fn open_lessons(&mut self) -> Outcome {
        if self.curriculum.is_none() {
            self.error = Some(SessionError::NoCurriculum);
            return Outcome::Guarded;
        }
        self.error = None;
        self.view = View::Lessons;
        Outcome::Changed
    }

    async fn start_game(&mut self, gateway: &Gateway) -> Outcome {
        let Some(document) = self.document.as_deref() else {
            self.error = Some(SessionError::NoDocument);
            return Outcome::Guarded;
        };

        self.quiz = None;
        self.error = None;
        self.loading = Event::StartGame.loading_message();

        let result = gateway.generate_quiz(document).await;
        self.loading = None;

        match result {
            Ok(questions) => {
                log::info!("Quiz ready with {} questions", questions.len());
                self.quiz = Some(Quiz::new(questions));
                self.view = View::Game;
            }
            Err(err) => {
                log_failure("generate a quiz", &err);
                self.error = Some(SessionError::QuizFailed);
                self.view = View::Menu;
            }
        }
        Outcome::Changed
    }

    fn open_qa(&mut self) -> Outcome {
        if self.document.is_none() {
            self.error = Some(SessionError::NoDocument);
            return Outcome::Guarded;
        }
        self.error = None;
        self.exchange = None;
        self.view = View::Qa;
        Outcome::Changed
    }

    async fn ask_question(&mut self, question: String, gateway: &Gateway) -> Outcome {
        let question = question.trim();
        if question.is_empty() {
            return Outcome::Ignored;
        }
        let Some(document) = self.document.as_deref() else {
            self.error = Some(SessionError::NoDocument);
            return Outcome::Guarded;
        };

        self.error = None;
        self.exchange = None;
        self.loading = Event::AskQuestion(question.to_string()).loading_message();

        let result = gateway.answer_general_question(document, question).await;
        self.loading = None;

        match result {
            Ok(answer) => {
                self.exchange = Some(Exchange {
                    question: question.to_string(),
                    answer,
                });
            }
            Err(err) => {
                log_failure("answer a question", &err);
                self.error = Some(SessionError::AnswerFailed);
            }
        }
        Outcome::Changed
    }

    fn select_option(&mut self, option: &str) -> Outcome {
        let Some(quiz) = self.quiz.as_mut() else {
            return Outcome::Ignored;
        };
        match quiz.select(option) {
            Ok(correct) => {
                log::debug!("Answered question {}: correct = {}", quiz.current_question + 1, correct);
                Outcome::Changed
            }
            Err(err) => {
                log::debug!("Selection ignored: {}", err);
                Outcome::Ignored
            }
        }
    }

    fn next_question(&mut self) -> Outcome {
        match self.quiz.as_mut().and_then(Quiz::advance) {
            Some(_) => Outcome::Changed,
            None => Outcome::Ignored,
        }
    }
}

fn log_failure(action: &str, err: &GatewayError) {
    match err.raw_response() {
        Some(raw) => log::error!("Failed to {}: {}\nRaw response: {}", action, err, raw),
        None => log::error!("Failed to {}: {}", action, err),
    }
}

/// Logs an event without the document or question text it may carry.
struct EventName<'a>(&'a Event);

impl std::fmt::Debug for EventName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Event::SubmitDocument(text) => write!(f, "SubmitDocument({} bytes)", text.len()),
            Event::AskQuestion(_) => f.write_str("AskQuestion"),
            Event::SelectOption(_) => f.write_str("SelectOption"),
            other => write!(f, "{:?}", other),
        }
    }
}
