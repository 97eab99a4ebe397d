//! Turns a [`Session`] into chat messages and reply keyboards.

use rand::Rng;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use teloxide::utils::html;

use crate::curriculum::{Curriculum, Lesson};
use crate::gateway::prompts;
use crate::quiz::Quiz;
use crate::session::{Session, View};

/// Telegram's limit for the text of one message.
pub const MESSAGE_LIMIT: usize = 4096;

pub const PLAY_GAME: &str = "🎲 Play a quiz";
pub const SHOW_LESSONS: &str = "📚 Lessons";
pub const ASK_QUESTION: &str = "❓ Ask about the curriculum";
pub const NEW_CURRICULUM: &str = "📄 Upload a new curriculum";
pub const BACK: &str = "⬅️ Back to menu";
pub const NEXT_QUESTION: &str = "Next question";
pub const SHOW_RESULTS: &str = "Show results";
pub const PLAY_AGAIN: &str = "🔁 Play again";

const UPLOAD_TEXT: &str = "Start your learning journey! Send me your curriculum as a text file (.txt or .md) and I will turn it into lessons, a quiz and a place to ask questions.";
const QA_TEXT: &str = "Ask any question about the curriculum and I will look for the answer in the content you uploaded.";

/// One message to send, with the keyboard to show under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    pub buttons: Vec<Vec<String>>,
    pub html: bool,
}

impl Screen {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
            html: false,
        }
    }

    fn html(text: impl Into<String>) -> Self {
        Self {
            html: true,
            ..Self::plain(text)
        }
    }

    fn with_buttons(mut self, buttons: Vec<Vec<String>>) -> Self {
        self.buttons = buttons;
        self
    }

    /// The keyboard, or a request to hide the current one if there are no buttons.
    pub fn markup(&self) -> ReplyMarkup {
        if self.buttons.is_empty() {
            return ReplyMarkup::KeyboardRemove(KeyboardRemove::new());
        }
        let rows = self
            .buttons
            .iter()
            .map(|row| row.iter().map(|b| KeyboardButton::new(b.clone())).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard(true))
    }
}

fn rows(labels: &[&str]) -> Vec<Vec<String>> {
    labels.iter().map(|l| vec![l.to_string()]).collect()
}

fn with_error(text: &str, session: &Session) -> String {
    match session.error() {
        Some(err) => format!("{}\n\n⚠️ {}", text, err),
        None => text.to_string(),
    }
}

pub fn render(session: &Session) -> Vec<Screen> {
    render_with(session, &mut rand::thread_rng())
}

pub fn render_with<R: Rng + ?Sized>(session: &Session, rng: &mut R) -> Vec<Screen> {
    if let Some(loading) = session.loading_message() {
        return vec![Screen::plain(loading)];
    }
    match session.view() {
        View::Upload => vec![Screen::plain(with_error(UPLOAD_TEXT, session))],
        View::Menu => vec![menu(session)],
        View::Lessons => vec![lessons(session.curriculum())],
        View::Game => vec![game(session.quiz(), rng)],
        View::Qa => qa(session),
    }
}

fn menu(session: &Session) -> Screen {
    let mut text = "Welcome! Choose an activity to start.".to_string();
    if let Some(curriculum) = session.curriculum() {
        text.push_str(&format!("\nYour curriculum has {} lessons.", curriculum.lessons.len()));
    }
    Screen::plain(with_error(&text, session)).with_buttons(rows(&[
        PLAY_GAME,
        SHOW_LESSONS,
        ASK_QUESTION,
        NEW_CURRICULUM,
    ]))
}

pub fn lesson_label(index: usize, lesson: &Lesson) -> String {
    format!("{}. {}", index + 1, lesson.title)
}

/// Finds the lesson picked by its button label or by its number.
pub fn parse_lesson_choice(curriculum: &Curriculum, text: &str) -> Option<usize> {
    let text = text.trim();
    if let Some(index) = curriculum
        .lessons
        .iter()
        .enumerate()
        .position(|(i, lesson)| lesson_label(i, lesson) == text)
    {
        return Some(index);
    }
    match text.parse::<usize>() {
        Ok(number) if number >= 1 && number <= curriculum.lessons.len() => Some(number - 1),
        _ => None,
    }
}

fn lessons_keyboard(curriculum: &Curriculum) -> Vec<Vec<String>> {
    let mut buttons: Vec<Vec<String>> = curriculum
        .lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| vec![lesson_label(i, lesson)])
        .collect();
    buttons.push(vec![BACK.to_string()]);
    buttons
}

fn lessons(curriculum: Option<&Curriculum>) -> Screen {
    let curriculum = match curriculum {
        Some(curriculum) if !curriculum.is_empty() => curriculum,
        _ => {
            return Screen::plain(
                "No lessons were found in the file. Please make sure the file is well organised.",
            )
            .with_buttons(rows(&[BACK]))
        }
    };

    let list = curriculum
        .lessons
        .iter()
        .enumerate()
        .map(|(i, lesson)| lesson_label(i, lesson))
        .collect::<Vec<_>>()
        .join("\n");
    Screen::plain(format!("Curriculum lessons:\n\n{}\n\nChoose a lesson to read it.", list))
        .with_buttons(lessons_keyboard(curriculum))
}

/// The full text of one lesson with its review questions and answers.
pub fn lesson(curriculum: &Curriculum, index: usize) -> Option<Screen> {
    let lesson = curriculum.lessons.get(index)?;

    let mut text = format!("{}\n\n{}", lesson_label(index, lesson), lesson.content);
    if !lesson.questions.is_empty() {
        text.push_str("\n\nReview questions:");
        for pair in &lesson.questions {
            text.push_str(&format!("\n\n❓ {}\n💬 {}", pair.question_text, pair.answer_text));
        }
    }
    Some(Screen::plain(text).with_buttons(lessons_keyboard(curriculum)))
}

fn game<R: Rng + ?Sized>(quiz: Option<&Quiz>, rng: &mut R) -> Screen {
    let Some(quiz) = quiz else {
        return Screen::plain("Loading the game...").with_buttons(rows(&[BACK]));
    };

    if quiz.is_finished() {
        let text = format!(
            "<b>Game over!</b>\nYour score: <b>{}</b> of <b>{}</b> ({}%)",
            quiz.score,
            quiz.total(),
            quiz.percentage()
        );
        return Screen::html(text).with_buttons(rows(&[PLAY_AGAIN, BACK]));
    }

    let Some(question) = quiz.current() else {
        return Screen::plain("This quiz has no questions.").with_buttons(rows(&[PLAY_AGAIN, BACK]));
    };

    match quiz.selected() {
        None => {
            let text = format!(
                "Question {} of {}\n\n<b>{}</b>",
                quiz.current_question + 1,
                quiz.total(),
                html::escape(&question.question)
            );
            let mut buttons: Vec<Vec<String>> = question
                .shuffled_options(rng)
                .into_iter()
                .map(|option| vec![option])
                .collect();
            buttons.push(vec![BACK.to_string()]);
            Screen::html(text).with_buttons(buttons)
        }
        Some(selected) => {
            let text = if question.is_correct(selected) {
                "✅ Correct!".to_string()
            } else {
                format!(
                    "❌ Wrong. The correct answer is: <b>{}</b>",
                    html::escape(&question.correct_answer)
                )
            };
            let next = if quiz.is_last_question() {
                SHOW_RESULTS
            } else {
                NEXT_QUESTION
            };
            Screen::html(text).with_buttons(rows(&[next, BACK]))
        }
    }
}

fn qa(session: &Session) -> Vec<Screen> {
    let back = rows(&[BACK]);
    match session.exchange() {
        Some(exchange) => {
            let heading = if prompts::is_not_found(&exchange.answer) {
                "No answer in the curriculum:"
            } else {
                "Answer:"
            };
            vec![
                Screen::plain(format!("{}\n{}", heading, exchange.answer)).with_buttons(back),
            ]
        }
        None => vec![Screen::plain(with_error(QA_TEXT, session)).with_buttons(back)],
    }
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Splits text into chunks of at most `limit` UTF-16 units, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split('\n') {
        let separator = usize::from(!current.is_empty());
        if utf16_len(&current) + separator + utf16_len(line) <= limit {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        // A single line longer than the limit is cut by characters
        for c in line.chars() {
            if utf16_len(&current) + c.len_utf16() > limit {
                chunks.push(std::mem::take(&mut current));
            }
            current.push(c);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks.retain(|chunk| !chunk.trim().is_empty());
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::QaPair;
    use crate::gateway::fake::ScriptedGenerator;
    use crate::gateway::Gateway;
    use crate::session::Event;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    const LESSONS: &str = r#"{"lessons":[
        {"title":"Water","content":"States of water","questions":[{"questionText":"When does water boil?","answerText":"At 100 degrees."}]},
        {"title":"Air","content":"What air is made of","questions":[]},
        {"title":"Soil","content":"Layers of soil","questions":[]}
    ]}"#;
    const QUIZ: &str = r#"[
        {"question":"Is 1 < 2?","options":["yes","no","maybe","never"],"correctAnswer":"yes"},
        {"question":"Q2","options":["a","b","c","d"],"correctAnswer":"b"}
    ]"#;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn texts(screen: &Screen) -> Vec<&str> {
        screen.buttons.iter().flatten().map(|b| b.as_str()).collect()
    }

    async fn session_with(replies: &[&str], events: Vec<Event>) -> Session {
        let generator = Arc::new(ScriptedGenerator::replying(replies.iter().copied()));
        let gateway = Gateway::new(generator, None);
        let mut session = Session::default();
        for event in events {
            session.dispatch(event, &gateway).await;
        }
        session
    }

    #[test]
    fn upload_screen_hides_the_keyboard() {
        let screens = render_with(&Session::default(), &mut rng());
        assert_eq!(screens.len(), 1);
        assert!(screens[0].buttons.is_empty());
        assert!(matches!(screens[0].markup(), ReplyMarkup::KeyboardRemove(_)));
    }

    #[tokio::test]
    async fn upload_screen_shows_the_error() {
        let session = session_with(&["nope"], vec![Event::SubmitDocument("doc".into())]).await;
        let screens = render_with(&session, &mut rng());
        assert!(screens[0].text.contains("⚠️"));
    }

    #[tokio::test]
    async fn menu_offers_every_activity() {
        let session = session_with(&[LESSONS], vec![Event::SubmitDocument("doc".into())]).await;
        let screens = render_with(&session, &mut rng());

        assert_eq!(texts(&screens[0]), [PLAY_GAME, SHOW_LESSONS, ASK_QUESTION, NEW_CURRICULUM]);
        assert!(screens[0].text.contains("3 lessons"));
    }

    #[tokio::test]
    async fn lessons_are_listed_in_order() {
        let session = session_with(
            &[LESSONS],
            vec![Event::SubmitDocument("doc".into()), Event::OpenLessons],
        )
        .await;
        let screens = render_with(&session, &mut rng());

        assert_eq!(texts(&screens[0]), ["1. Water", "2. Air", "3. Soil", BACK]);
    }

    #[test]
    fn empty_curriculum_has_a_notice() {
        let screen = lessons(Some(&Curriculum::default()));
        assert!(screen.text.contains("No lessons"));
        assert_eq!(texts(&screen), [BACK]);
    }

    #[test]
    fn lesson_choice_by_label_or_number() {
        let curriculum = Curriculum::new(vec![
            Lesson::new("Water".into(), "c".into(), vec![]),
            Lesson::new("Air".into(), "c".into(), vec![]),
        ]);
        assert_eq!(parse_lesson_choice(&curriculum, "2. Air"), Some(1));
        assert_eq!(parse_lesson_choice(&curriculum, " 1 "), Some(0));
        assert_eq!(parse_lesson_choice(&curriculum, "3"), None);
        assert_eq!(parse_lesson_choice(&curriculum, "0"), None);
        assert_eq!(parse_lesson_choice(&curriculum, "Air"), None);
    }

    #[test]
    fn lesson_shows_its_questions_and_answers() {
        let curriculum = Curriculum::new(vec![Lesson::new(
            "Water".into(),
            "States of water".into(),
            vec![QaPair::new("When does water boil?".into(), "At 100 degrees.".into())],
        )]);

        let screen = lesson(&curriculum, 0).unwrap();
        assert!(screen.text.starts_with("1. Water\n\nStates of water"));
        assert!(screen.text.contains("❓ When does water boil?\n💬 At 100 degrees."));
        assert!(lesson(&curriculum, 1).is_none());
    }

    #[tokio::test]
    async fn question_offers_every_option_and_back() {
        let session = session_with(
            &[LESSONS, QUIZ],
            vec![Event::SubmitDocument("doc".into()), Event::StartGame],
        )
        .await;
        let screen = &render_with(&session, &mut rng())[0];

        assert!(screen.html);
        assert!(screen.text.starts_with("Question 1 of 2"));
        assert!(screen.text.contains("Is 1 &lt; 2?"));
        let mut options = texts(screen);
        assert_eq!(options.pop(), Some(BACK));
        options.sort();
        assert_eq!(options, ["maybe", "never", "no", "yes"]);
    }

    #[tokio::test]
    async fn wrong_answer_reveals_the_correct_one() {
        let session = session_with(
            &[LESSONS, QUIZ],
            vec![
                Event::SubmitDocument("doc".into()),
                Event::StartGame,
                Event::SelectOption("no".into()),
            ],
        )
        .await;
        let screen = &render_with(&session, &mut rng())[0];

        assert!(screen.text.contains("<b>yes</b>"));
        assert_eq!(texts(screen), [NEXT_QUESTION, BACK]);
    }

    #[tokio::test]
    async fn last_question_leads_to_results() {
        let session = session_with(
            &[LESSONS, QUIZ],
            vec![
                Event::SubmitDocument("doc".into()),
                Event::StartGame,
                Event::SelectOption("yes".into()),
                Event::NextQuestion,
                Event::SelectOption("b".into()),
            ],
        )
        .await;
        assert_eq!(texts(&render_with(&session, &mut rng())[0]), [SHOW_RESULTS, BACK]);
    }

    #[test]
    fn results_show_score_total_and_percentage() {
        let questions = (0..5)
            .map(|i| {
                crate::quiz::QuizQuestion::new(
                    format!("Q{}", i),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    "a".into(),
                )
            })
            .collect();
        let mut quiz = Quiz::new(questions);
        for option in ["a", "a", "b", "a", "a"] {
            quiz.select(option).unwrap();
            quiz.advance();
        }

        let screen = game(Some(&quiz), &mut rng());
        assert!(screen.text.contains("<b>4</b> of <b>5</b> (80%)"));
        assert_eq!(texts(&screen), [PLAY_AGAIN, BACK]);
    }

    #[tokio::test]
    async fn qa_shows_the_answer() {
        let session = session_with(
            &[LESSONS, "At 100 degrees."],
            vec![
                Event::SubmitDocument("doc".into()),
                Event::OpenQa,
                Event::AskQuestion("When does water boil?".into()),
            ],
        )
        .await;
        let screens = render_with(&session, &mut rng());

        assert_eq!(screens[0].text, "Answer:\nAt 100 degrees.");
        assert_eq!(texts(&screens[0]), [BACK]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello\nworld", 100), ["hello\nworld"]);
        assert!(split_message("", 100).is_empty());
    }

    #[test]
    fn splits_on_line_breaks() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 9), ["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn long_lines_are_cut() {
        let line = "x".repeat(25);
        let chunks = split_message(&line, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| utf16_len(c) <= 10));
        assert_eq!(chunks.concat(), line);
    }

    #[test]
    fn chunks_never_exceed_the_limit() {
        let text = "🎲 emoji line\n".repeat(500) + &"ض".repeat(5000);
        for chunk in split_message(&text, MESSAGE_LIMIT) {
            assert!(utf16_len(&chunk) <= MESSAGE_LIMIT);
        }
    }
}
