mod config;
mod curriculum;
mod gateway;
mod quiz;
mod screen;
mod session;
mod upload;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use gateway::{chatgpt::ChatGptGenerator, Gateway};
use screen::Screen;
use session::{Event, Outcome, Session, View};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    net::Download,
    prelude::*,
    types::{ChatAction, Document, KeyboardRemove, ParseMode},
    utils::command::BotCommands,
};

type CurriculumDialogue = Dialogue<Session, InMemStorage<Session>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "show where you are.")]
    Start,
    #[command(description = "forget the curriculum and start over.")]
    Reset,
    #[command(description = "display this text.")]
    Help,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if dotenv().is_err() {
        println!("No .env file found, reading settings from the environment");
    }

    pretty_env_logger::init();
    log::info!("Starting curriculum tutor bot...");

    let config = Config::from_env()?;
    log::info!(
        "Using model {} with a {}s timeout",
        config.model,
        config.request_timeout.as_secs()
    );

    let generator = ChatGptGenerator::new(&config)?;
    let gateway = Arc::new(Gateway::new(
        Arc::new(generator),
        config.curriculum_language.clone(),
    ));
    let config = Arc::new(config);

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<Session>, Session>()
            .branch(dptree::entry().filter_command::<Command>().endpoint(command))
            .branch(
                dptree::filter(|session: Session| session.view() == View::Upload)
                    .endpoint(receive_document),
            )
            .branch(
                dptree::filter(|session: Session| session.view() == View::Menu)
                    .endpoint(receive_menu_choice),
            )
            .branch(
                dptree::filter(|session: Session| session.view() == View::Lessons)
                    .endpoint(browse_lessons),
            )
            .branch(
                dptree::filter(|session: Session| session.view() == View::Game)
                    .endpoint(play_quiz),
            )
            .branch(
                dptree::filter(|session: Session| session.view() == View::Qa)
                    .endpoint(ask_question),
            ),
    )
    .dependencies(dptree::deps![InMemStorage::<Session>::new(), gateway, config])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

async fn command(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    session: Session,
    msg: Message,
    cmd: Command,
) -> HandlerResult {
    match cmd {
        Command::Start => show(&bot, msg.chat.id, screen::render(&session)).await,
        Command::Reset => {
            transition(&bot, &dialogue, &gateway, session, msg.chat.id, Event::Reset).await
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
    }
}

async fn receive_document(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    config: Arc<Config>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let Some(document) = msg.document() else {
        return show(&bot, msg.chat.id, screen::render(&session)).await;
    };

    let text = match fetch_document(&bot, document, config.max_document_bytes).await? {
        Ok(text) => text,
        Err(err) => {
            log::debug!("Rejected upload {:?}: {}", document.file_name, err);
            bot.send_message(msg.chat.id, err.to_string()).await?;
            return Ok(());
        }
    };

    let event = Event::SubmitDocument(text);
    transition(&bot, &dialogue, &gateway, session, msg.chat.id, event).await
}

/// Downloads an uploaded curriculum. The inner result carries problems with the file itself.
async fn fetch_document(
    bot: &Bot,
    document: &Document,
    max_bytes: u32,
) -> Result<Result<String, upload::ValidationError>, Box<dyn std::error::Error + Send + Sync>> {
    let mime_type = document.mime_type.as_ref().map(|m| m.essence_str());
    if let Err(err) = upload::check_document(
        document.file_name.as_deref(),
        mime_type,
        document.file.size,
        max_bytes,
    ) {
        return Ok(Err(err));
    }

    let file = bot.get_file(&document.file.id).await?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;

    Ok(upload::decode_document(bytes))
}

async fn receive_menu_choice(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let event = match msg.text() {
        Some(screen::PLAY_GAME) => Event::StartGame,
        Some(screen::SHOW_LESSONS) => Event::OpenLessons,
        Some(screen::ASK_QUESTION) => Event::OpenQa,
        Some(screen::NEW_CURRICULUM) => Event::Reset,
        _ => return show(&bot, msg.chat.id, screen::render(&session)).await,
    };

    transition(&bot, &dialogue, &gateway, session, msg.chat.id, event).await
}

async fn browse_lessons(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    if text == screen::BACK {
        return transition(&bot, &dialogue, &gateway, session, msg.chat.id, Event::Back).await;
    }

    // Reading a lesson doesn't change the session
    let lesson = session
        .curriculum()
        .and_then(|curriculum| {
            screen::parse_lesson_choice(curriculum, text).and_then(|i| screen::lesson(curriculum, i))
        });
    match lesson {
        Some(lesson) => show(&bot, msg.chat.id, vec![lesson]).await,
        None => show(&bot, msg.chat.id, screen::render(&session)).await,
    }
}

async fn play_quiz(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please choose one of the options")
            .await?;
        return Ok(());
    };

    let event = match text {
        screen::BACK => Event::Back,
        screen::PLAY_AGAIN => Event::PlayAgain,
        screen::NEXT_QUESTION | screen::SHOW_RESULTS => Event::NextQuestion,
        option => Event::SelectOption(option.to_string()),
    };

    transition(&bot, &dialogue, &gateway, session, msg.chat.id, event).await
}

async fn ask_question(
    bot: Bot,
    dialogue: CurriculumDialogue,
    gateway: Arc<Gateway>,
    session: Session,
    msg: Message,
) -> HandlerResult {
    let event = match msg.text() {
        Some(screen::BACK) => Event::Back,
        Some(question) if !question.trim().is_empty() => Event::AskQuestion(question.to_string()),
        _ => {
            bot.send_message(msg.chat.id, "Please type your question (as text)")
                .await?;
            return Ok(());
        }
    };

    transition(&bot, &dialogue, &gateway, session, msg.chat.id, event).await
}

/// Applies an event to the chat's session, stores the result and shows the new screen.
async fn transition(
    bot: &Bot,
    dialogue: &CurriculumDialogue,
    gateway: &Gateway,
    mut session: Session,
    chat_id: ChatId,
    event: Event,
) -> HandlerResult {
    if let Some(loading) = session.pending_message(&event) {
        bot.send_message(chat_id, loading)
            .reply_markup(KeyboardRemove::new())
            .await?;
        // We don't really care if this fails, it's only a nicety
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
    }

    let outcome = session.dispatch(event, gateway).await;
    if outcome == Outcome::Ignored {
        log::debug!("Ignored input in {:?} for chat {}", session.view(), chat_id.0);
    }

    dialogue.update(session.clone()).await?;
    show(bot, chat_id, screen::render(&session)).await
}

async fn show(bot: &Bot, chat_id: ChatId, screens: Vec<Screen>) -> HandlerResult {
    for screen in screens {
        let chunks = screen::split_message(&screen.text, screen::MESSAGE_LIMIT);
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut request = bot.send_message(chat_id, chunk);
            if screen.html {
                request = request.parse_mode(ParseMode::Html);
            }
            if i == last {
                request = request.reply_markup(screen.markup());
            }
            request.await?;
        }
    }
    Ok(())
}
