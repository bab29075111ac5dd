mod agent;
mod catalog;
mod config;
mod dispatch;
mod feedback;
mod llm;
mod prompts;
mod quiz;
#[cfg(test)]
mod testing;
mod tools;

use std::sync::Arc;

use dotenv::dotenv;
use log::{debug, error, info, warn};
use teloxide::{
    dispatching::{
        dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
        UpdateHandler,
    },
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup},
};

use config::Config;
use feedback::FeedbackStore;
use llm::{chatgpt::ChatGptGenerator, Mode, TextGenerator};
use prompts::Category;
use quiz::{QuizError, QuizState};
use tools::{truncate_chars, web::DuckDuckGoSearch, wikipedia::WikipediaClient};

type BuddyDialogue = Dialogue<State, ErasedStorage<State>>;
type DialogueStorage = Arc<ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Assistant = Arc<dispatch::Dispatcher>;

/// Telegram caps messages at 4096 characters.
const MESSAGE_CHUNK_CHARS: usize = 4000;
const STORED_RESPONSE_CHARS: usize = 600;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
}

/// Per-chat preferences, carried through every dialogue state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    pub category: Category,
    pub mode: Mode,
    pub language: String,
    pub use_tools: bool,
    pub last: Option<Exchange>,
}

impl Settings {
    fn from_config(config: &Config) -> Self {
        Self {
            category: Category::Default,
            mode: Mode::Think,
            language: config.default_language.clone(),
            use_tools: config.use_tools,
            last: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExamAction {
    Syllabus,
    StudyTips,
    AskQuestion,
}

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    Chatting {
        settings: Settings,
    },
    ChooseLanguage {
        settings: Settings,
    },
    QuizReceiveExam {
        settings: Settings,
    },
    QuizReceiveSubject {
        settings: Settings,
        exam: String,
    },
    QuizAwaitingAnswer {
        settings: Settings,
        quiz: QuizState,
    },
    ExamPanelReceiveExam {
        settings: Settings,
        action: ExamAction,
    },
    ExamPanelReceiveSubject {
        settings: Settings,
        action: ExamAction,
        exam: String,
    },
    ExamPanelReceiveQuestion {
        settings: Settings,
        exam: String,
        subject: String,
    },
    RegionalReceiveRegion {
        settings: Settings,
    },
    RegionalReceiveState {
        settings: Settings,
        region: String,
    },
    RegionalReceiveTopic {
        settings: Settings,
        state: String,
    },
    FeedbackReceiveRating {
        settings: Settings,
    },
}

const MODE_BUTTON: &str = "🧠 Toggle mode";
const TOOLS_BUTTON: &str = "🛠 Toggle tools";
const TRENDING_BUTTON: &str = "🔥 Trending";
const EXAMPLES_BUTTON: &str = "💡 Examples";
const QUIZ_BUTTON: &str = "📝 Quiz";
const SYLLABUS_BUTTON: &str = "📘 Syllabus";
const STUDY_TIPS_BUTTON: &str = "🎯 Study tips";
const EXAM_QA_BUTTON: &str = "❓ Ask about an exam";
const REGIONAL_BUTTON: &str = "🗺 Regional explorer";
const RATE_BUTTON: &str = "⭐ Rate last answer";
const STATS_BUTTON: &str = "📊 Feedback stats";
const LANGUAGE_BUTTON: &str = "🌐 Language";
const BACK_BUTTON: &str = "⬅️ Back";
const NEXT_QUESTION_BUTTON: &str = "🔁 Next question";
const FINISH_QUIZ_BUTTON: &str = "🏁 Finish quiz";
const CATEGORY_PREFIX: &str = "📂 ";

const GREETING_TEXT: &str = "Namaste! I am Bharat AI Buddy, your study companion for Indian exams, culture, maths and code. Ask me anything, in English or your own language.";

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();

    if let Err(err) = run().await {
        error!("Bot stopped: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> HandlerResult {
    let config = Arc::new(Config::from_env()?);
    info!("Starting Bharat AI Buddy bot...");

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.dialogue_db.display());
    let storage: DialogueStorage =
        SqliteStorage::open(&config.dialogue_db.to_string_lossy(), Json)
            .await?
            .erase();

    let http = tools::http_client(config.http_timeout)?;
    let generator: Arc<dyn TextGenerator> = Arc::new(ChatGptGenerator::new(
        &config.chatgpt_api_key,
        config.engine,
        config.llm_timeout,
    )?);
    let assistant: Assistant = Arc::new(
        dispatch::Dispatcher::new(
            generator,
            Arc::new(WikipediaClient::new(http.clone())),
            Arc::new(DuckDuckGoSearch::new(http.clone())),
            http,
        )
        .with_wiki_language(config.wikipedia_language.clone()),
    );
    let feedback = Arc::new(FeedbackStore::open(config.feedback_file.clone())?);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![storage, assistant, feedback, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

fn schema() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::Chatting { settings }].endpoint(chatting))
        .branch(dptree::case![State::ChooseLanguage { settings }].endpoint(choose_language))
        .branch(dptree::case![State::QuizReceiveExam { settings }].endpoint(quiz_receive_exam))
        .branch(
            dptree::case![State::QuizReceiveSubject { settings, exam }]
                .endpoint(quiz_receive_subject),
        )
        .branch(
            dptree::case![State::QuizAwaitingAnswer { settings, quiz }]
                .endpoint(quiz_awaiting_answer),
        )
        .branch(
            dptree::case![State::ExamPanelReceiveExam { settings, action }]
                .endpoint(exam_panel_receive_exam),
        )
        .branch(
            dptree::case![State::ExamPanelReceiveSubject {
                settings,
                action,
                exam
            }]
            .endpoint(exam_panel_receive_subject),
        )
        .branch(
            dptree::case![State::ExamPanelReceiveQuestion {
                settings,
                exam,
                subject
            }]
            .endpoint(exam_panel_receive_question),
        )
        .branch(
            dptree::case![State::RegionalReceiveRegion { settings }]
                .endpoint(regional_receive_region),
        )
        .branch(
            dptree::case![State::RegionalReceiveState { settings, region }]
                .endpoint(regional_receive_state),
        )
        .branch(
            dptree::case![State::RegionalReceiveTopic { settings, state }]
                .endpoint(regional_receive_topic),
        )
        .branch(
            dptree::case![State::FeedbackReceiveRating { settings }]
                .endpoint(feedback_receive_rating),
        )
}

fn main_keyboard() -> KeyboardMarkup {
    let categories = Category::ALL
        .iter()
        .map(|category| KeyboardButton::new(format!("{}{}", CATEGORY_PREFIX, category.label())))
        .collect::<Vec<_>>();
    let mut rows: Vec<Vec<KeyboardButton>> = categories
        .chunks(3)
        .map(|row| row.to_vec())
        .collect();
    rows.extend([
        vec![
            KeyboardButton::new(MODE_BUTTON),
            KeyboardButton::new(TOOLS_BUTTON),
            KeyboardButton::new(LANGUAGE_BUTTON),
        ],
        vec![
            KeyboardButton::new(TRENDING_BUTTON),
            KeyboardButton::new(EXAMPLES_BUTTON),
            KeyboardButton::new(QUIZ_BUTTON),
        ],
        vec![
            KeyboardButton::new(SYLLABUS_BUTTON),
            KeyboardButton::new(STUDY_TIPS_BUTTON),
            KeyboardButton::new(EXAM_QA_BUTTON),
        ],
        vec![
            KeyboardButton::new(REGIONAL_BUTTON),
            KeyboardButton::new(RATE_BUTTON),
            KeyboardButton::new(STATS_BUTTON),
        ],
    ]);
    KeyboardMarkup::new(rows)
}

/// One button per option, `per_row` to a row, with a back button last.
fn choice_keyboard<'a>(options: impl IntoIterator<Item = &'a str>, per_row: usize) -> KeyboardMarkup {
    let buttons = options
        .into_iter()
        .map(KeyboardButton::new)
        .collect::<Vec<_>>();
    let mut rows: Vec<Vec<KeyboardButton>> = buttons
        .chunks(per_row.max(1))
        .map(|row| row.to_vec())
        .collect();
    rows.push(vec![KeyboardButton::new(BACK_BUTTON)]);
    KeyboardMarkup::new(rows)
}

fn quiz_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        ["A", "B", "C", "D"].map(KeyboardButton::new).to_vec(),
        vec![
            KeyboardButton::new(NEXT_QUESTION_BUTTON),
            KeyboardButton::new(FINISH_QUIZ_BUTTON),
        ],
    ])
}

/// Splits on line breaks where possible so no piece exceeds `limit` characters.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > limit {
        let head = truncate_chars(rest, limit);
        let cut = match head.rfind('\n') {
            Some(idx) if idx > 0 => idx,
            _ => head.len(),
        };
        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches('\n');
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

async fn send_long(bot: &Bot, chat_id: ChatId, text: &str, keyboard: KeyboardMarkup) -> HandlerResult {
    for chunk in split_message(text, MESSAGE_CHUNK_CHARS) {
        bot.send_message(chat_id, chunk)
            .reply_markup(keyboard.clone())
            .await?;
    }
    Ok(())
}

async fn typing(bot: &Bot, chat_id: ChatId) {
    // Purely cosmetic, so a failure here is ignored.
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
}

async fn back_to_chat(bot: &Bot, dialogue: &BuddyDialogue, msg: &Message, settings: Settings) -> HandlerResult {
    bot.send_message(msg.chat.id, "What would you like to ask next?")
        .reply_markup(main_keyboard())
        .await?;
    dialogue.update(State::Chatting { settings }).await?;
    Ok(())
}

async fn start(bot: Bot, dialogue: BuddyDialogue, msg: Message, config: Arc<Config>) -> HandlerResult {
    let settings = Settings::from_config(&config);
    let hint = catalog::native_language_hint(&settings.language);
    bot.send_message(msg.chat.id, format!("{}\n\n{}", GREETING_TEXT, hint))
        .reply_markup(main_keyboard())
        .await?;
    dialogue.update(State::Chatting { settings }).await?;
    Ok(())
}

async fn chatting(
    bot: Bot,
    dialogue: BuddyDialogue,
    mut settings: Settings,
    msg: Message,
    assistant: Assistant,
    feedback: Arc<FeedbackStore>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send your question as text.")
            .await?;
        return Ok(());
    };

    if let Some(label) = text.strip_prefix(CATEGORY_PREFIX) {
        settings.category = Category::from_label(label);
        let examples = catalog::examples(settings.category);
        let mut reply = format!("Category set to {}.", settings.category.label());
        if !examples.is_empty() {
            reply.push_str(&format!("\n\nTry:\n• {}", examples.join("\n• ")));
        }
        bot.send_message(msg.chat.id, reply)
            .reply_markup(main_keyboard())
            .await?;
        dialogue.update(State::Chatting { settings }).await?;
        return Ok(());
    }

    match text {
        "/start" => {
            bot.send_message(msg.chat.id, GREETING_TEXT)
                .reply_markup(main_keyboard())
                .await?;
        }
        MODE_BUTTON => {
            settings.mode = settings.mode.toggled();
            bot.send_message(msg.chat.id, format!("Answers are now {}.", settings.mode.label()))
                .await?;
            dialogue.update(State::Chatting { settings }).await?;
        }
        TOOLS_BUTTON => {
            settings.use_tools = !settings.use_tools;
            let status = if settings.use_tools { "on" } else { "off" };
            bot.send_message(msg.chat.id, format!("Research tools are {}.", status))
                .await?;
            dialogue.update(State::Chatting { settings }).await?;
        }
        EXAMPLES_BUTTON => {
            let trending = catalog::TRENDING;
            let examples = match catalog::examples(settings.category) {
                [] => &trending[..],
                examples => examples,
            };
            bot.send_message(
                msg.chat.id,
                format!(
                    "Examples for {}:\n• {}",
                    settings.category.label(),
                    examples.join("\n• ")
                ),
            )
            .await?;
        }
        TRENDING_BUTTON => {
            let query = catalog::random_trending();
            bot.send_message(msg.chat.id, format!("🔥 {}", query)).await?;
            answer_question(&bot, &dialogue, &msg, settings, &assistant, query).await?;
        }
        QUIZ_BUTTON => {
            bot.send_message(msg.chat.id, "Which exam should the quiz cover?")
                .reply_markup(choice_keyboard(catalog::EXAMS, 3))
                .await?;
            dialogue.update(State::QuizReceiveExam { settings }).await?;
        }
        SYLLABUS_BUTTON | STUDY_TIPS_BUTTON | EXAM_QA_BUTTON => {
            let action = match text {
                SYLLABUS_BUTTON => ExamAction::Syllabus,
                STUDY_TIPS_BUTTON => ExamAction::StudyTips,
                _ => ExamAction::AskQuestion,
            };
            bot.send_message(msg.chat.id, "Choose an exam.")
                .reply_markup(choice_keyboard(catalog::EXAMS, 3))
                .await?;
            dialogue
                .update(State::ExamPanelReceiveExam { settings, action })
                .await?;
        }
        REGIONAL_BUTTON => {
            bot.send_message(msg.chat.id, "Which part of India would you like to explore?")
                .reply_markup(choice_keyboard(catalog::REGIONS.iter().map(|(name, _)| *name), 2))
                .await?;
            dialogue.update(State::RegionalReceiveRegion { settings }).await?;
        }
        RATE_BUTTON => {
            if settings.last.is_none() {
                bot.send_message(msg.chat.id, "There is no answer to rate yet.")
                    .await?;
                return Ok(());
            }
            bot.send_message(
                msg.chat.id,
                "How helpful was the last answer? Pick 1 to 5, optionally followed by a comment (e.g. \"4 clear explanation\").",
            )
            .reply_markup(choice_keyboard(["1", "2", "3", "4", "5"], 5))
            .await?;
            dialogue.update(State::FeedbackReceiveRating { settings }).await?;
        }
        STATS_BUTTON => {
            let reply = match feedback.stats().await {
                Ok(stats) => stats.render(),
                Err(err) => {
                    warn!("Could not read feedback stats: {}", err);
                    "Feedback statistics are unavailable right now.".to_string()
                }
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        LANGUAGE_BUTTON => {
            bot.send_message(msg.chat.id, "Choose your preferred language.")
                .reply_markup(choice_keyboard(
                    catalog::LANGUAGES.iter().map(|(name, _)| *name),
                    2,
                ))
                .await?;
            dialogue.update(State::ChooseLanguage { settings }).await?;
        }
        query => {
            answer_question(&bot, &dialogue, &msg, settings, &assistant, query).await?;
        }
    }
    Ok(())
}

async fn answer_question(
    bot: &Bot,
    dialogue: &BuddyDialogue,
    msg: &Message,
    mut settings: Settings,
    assistant: &Assistant,
    query: &str,
) -> HandlerResult {
    typing(bot, msg.chat.id).await;

    let request = dispatch::Request {
        category: settings.category,
        query: query.to_string(),
        mode: settings.mode,
        language: settings.language.clone(),
        use_tools: settings.use_tools,
    };
    debug!("Answering {:?} in chat {}", request, msg.chat.id);
    let reply = assistant.answer(&request).await;

    send_long(bot, msg.chat.id, &reply, main_keyboard()).await?;

    settings.last = Some(Exchange {
        prompt: query.to_string(),
        response: truncate_chars(&reply, STORED_RESPONSE_CHARS).to_string(),
    });
    dialogue.update(State::Chatting { settings }).await?;
    Ok(())
}

async fn choose_language(bot: Bot, dialogue: BuddyDialogue, mut settings: Settings, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(label) => match catalog::language_code(label) {
            Some(code) => {
                settings.language = code.to_string();
                bot.send_message(
                    msg.chat.id,
                    format!(
                        "Language set to {}.\n{}",
                        catalog::language_name(code),
                        catalog::native_language_hint(code)
                    ),
                )
                .reply_markup(main_keyboard())
                .await?;
                dialogue.update(State::Chatting { settings }).await?;
                Ok(())
            }
            None => {
                bot.send_message(msg.chat.id, "Please pick a language from the keyboard.")
                    .await?;
                Ok(())
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please pick a language from the keyboard.")
                .await?;
            Ok(())
        }
    }
}

async fn quiz_receive_exam(bot: Bot, dialogue: BuddyDialogue, settings: Settings, msg: Message) -> HandlerResult {
    let exam = match msg.text() {
        Some(BACK_BUTTON) => return back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => catalog::find_exam(text),
        None => None,
    };
    let Some(exam) = exam else {
        bot.send_message(msg.chat.id, "Please choose one of the exams.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Pick a subject.")
        .reply_markup(choice_keyboard(catalog::subjects(exam).iter().copied(), 2))
        .await?;
    dialogue
        .update(State::QuizReceiveSubject {
            settings,
            exam: exam.to_string(),
        })
        .await?;
    Ok(())
}

async fn ask_quiz_question(
    bot: &Bot,
    dialogue: &BuddyDialogue,
    msg: &Message,
    settings: Settings,
    assistant: &Assistant,
    exam: &str,
    subject: &str,
) -> HandlerResult {
    typing(bot, msg.chat.id).await;

    match quiz::start(assistant.generator(), exam, subject, &settings.language).await {
        Ok(quiz) => {
            send_long(bot, msg.chat.id, &quiz.question, quiz_keyboard()).await?;
            dialogue
                .update(State::QuizAwaitingAnswer { settings, quiz })
                .await?;
        }
        Err(QuizError::MissingAnswerKey) => {
            bot.send_message(
                msg.chat.id,
                "Sorry, the generated question came without an answer key, so it could not be graded. Please try again.",
            )
            .reply_markup(main_keyboard())
            .await?;
            dialogue.update(State::Chatting { settings }).await?;
        }
        Err(err) => {
            error!("Quiz generation failed: {}", err);
            bot.send_message(msg.chat.id, format!("Sorry, I could not create a question: {}", err))
                .reply_markup(main_keyboard())
                .await?;
            dialogue.update(State::Chatting { settings }).await?;
        }
    }
    Ok(())
}

async fn quiz_receive_subject(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, exam): (Settings, String),
    msg: Message,
    assistant: Assistant,
) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => match catalog::find_subject(&exam, text) {
            Some(subject) => {
                ask_quiz_question(&bot, &dialogue, &msg, settings, &assistant, &exam, subject).await
            }
            None => {
                bot.send_message(msg.chat.id, "Please choose one of the subjects.")
                    .await?;
                Ok(())
            }
        },
        None => Ok(()),
    }
}

async fn quiz_awaiting_answer(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, quiz): (Settings, QuizState),
    msg: Message,
    assistant: Assistant,
) -> HandlerResult {
    match msg.text() {
        Some(FINISH_QUIZ_BUTTON) | Some(BACK_BUTTON) => {
            back_to_chat(&bot, &dialogue, &msg, settings).await
        }
        Some(NEXT_QUESTION_BUTTON) => {
            ask_quiz_question(
                &bot,
                &dialogue,
                &msg,
                settings,
                &assistant,
                &quiz.exam,
                &quiz.subject,
            )
            .await
        }
        Some(answer) => {
            let verdict = quiz.submit(answer);
            bot.send_message(msg.chat.id, verdict.to_string())
                .reply_markup(quiz_keyboard())
                .await?;
            Ok(())
        }
        None => {
            bot.send_message(msg.chat.id, "Answer with A, B, C or D.")
                .await?;
            Ok(())
        }
    }
}

async fn exam_panel_receive_exam(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, action): (Settings, ExamAction),
    msg: Message,
) -> HandlerResult {
    let exam = match msg.text() {
        Some(BACK_BUTTON) => return back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => catalog::find_exam(text),
        None => None,
    };
    let Some(exam) = exam else {
        bot.send_message(msg.chat.id, "Please choose one of the exams.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Pick a subject.")
        .reply_markup(choice_keyboard(catalog::subjects(exam).iter().copied(), 2))
        .await?;
    dialogue
        .update(State::ExamPanelReceiveSubject {
            settings,
            action,
            exam: exam.to_string(),
        })
        .await?;
    Ok(())
}

async fn exam_panel_receive_subject(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, action, exam): (Settings, ExamAction, String),
    msg: Message,
    assistant: Assistant,
) -> HandlerResult {
    let subject = match msg.text() {
        Some(BACK_BUTTON) => return back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => match catalog::find_subject(&exam, text) {
            Some(subject) => subject,
            None => {
                bot.send_message(msg.chat.id, "Please choose one of the subjects.")
                    .await?;
                return Ok(());
            }
        },
        None => return Ok(()),
    };

    let reply = match action {
        ExamAction::AskQuestion => {
            bot.send_message(
                msg.chat.id,
                format!("What would you like to know about {} {}?", exam, subject),
            )
            .await?;
            dialogue
                .update(State::ExamPanelReceiveQuestion {
                    settings,
                    exam,
                    subject: subject.to_string(),
                })
                .await?;
            return Ok(());
        }
        ExamAction::Syllabus => {
            typing(&bot, msg.chat.id).await;
            assistant.syllabus_overview(&exam, subject).await
        }
        ExamAction::StudyTips => {
            typing(&bot, msg.chat.id).await;
            assistant.study_tips(&exam, subject).await
        }
    };

    send_long(&bot, msg.chat.id, &reply, main_keyboard()).await?;
    dialogue.update(State::Chatting { settings }).await?;
    Ok(())
}

async fn exam_panel_receive_question(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, exam, subject): (Settings, String, String),
    msg: Message,
    assistant: Assistant,
) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(question) => {
            typing(&bot, msg.chat.id).await;
            let reply = assistant
                .exam_qa(&exam, &subject, question, &settings.language)
                .await;
            send_long(&bot, msg.chat.id, &reply, main_keyboard()).await?;
            dialogue.update(State::Chatting { settings }).await?;
            Ok(())
        }
        None => {
            bot.send_message(msg.chat.id, "Please type your question.")
                .await?;
            Ok(())
        }
    }
}

async fn regional_receive_region(bot: Bot, dialogue: BuddyDialogue, settings: Settings, msg: Message) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(region) if !catalog::states(region).is_empty() => {
            bot.send_message(msg.chat.id, "Which state?")
                .reply_markup(choice_keyboard(catalog::states(region).iter().copied(), 2))
                .await?;
            dialogue
                .update(State::RegionalReceiveState {
                    settings,
                    region: region.to_string(),
                })
                .await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the regions.")
                .await?;
            Ok(())
        }
    }
}

async fn regional_receive_state(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, region): (Settings, String),
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(state) if catalog::states(&region).contains(&state) => {
            let topics = catalog::REGIONAL_TOPICS
                .iter()
                .map(|(topic, description)| format!("• {}: {}", topic, description))
                .collect::<Vec<_>>()
                .join("\n");
            bot.send_message(
                msg.chat.id,
                format!("What about {} interests you?\n\n{}", state, topics),
            )
            .reply_markup(choice_keyboard(
                catalog::REGIONAL_TOPICS.iter().map(|(topic, _)| *topic),
                3,
            ))
            .await?;
            dialogue
                .update(State::RegionalReceiveTopic {
                    settings,
                    state: state.to_string(),
                })
                .await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the states.")
                .await?;
            Ok(())
        }
    }
}

async fn regional_receive_topic(
    bot: Bot,
    dialogue: BuddyDialogue,
    (settings, state): (Settings, String),
    msg: Message,
    assistant: Assistant,
) -> HandlerResult {
    match msg.text() {
        Some(BACK_BUTTON) => back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => {
            typing(&bot, msg.chat.id).await;
            // A listed topic asks for an overview; anything else is treated as the question itself.
            let (topic, prompt) = match catalog::REGIONAL_TOPICS.iter().find(|(topic, _)| *topic == text) {
                Some((topic, _)) => (*topic, ""),
                None => ("Culture", text),
            };
            let reply = assistant
                .regional_query(&state, topic, &settings.language, prompt)
                .await;
            send_long(&bot, msg.chat.id, &reply, main_keyboard()).await?;
            dialogue.update(State::Chatting { settings }).await?;
            Ok(())
        }
        None => Ok(()),
    }
}

fn parse_rating(text: &str) -> Option<(u8, Option<&str>)> {
    let text = text.trim();
    let (rating, comment) = match text.split_once(char::is_whitespace) {
        Some((rating, comment)) => (rating, Some(comment.trim()).filter(|c| !c.is_empty())),
        None => (text, None),
    };
    rating
        .parse::<u8>()
        .ok()
        .filter(|r| (1..=5).contains(r))
        .map(|r| (r, comment))
}

async fn feedback_receive_rating(
    bot: Bot,
    dialogue: BuddyDialogue,
    settings: Settings,
    msg: Message,
    feedback: Arc<FeedbackStore>,
) -> HandlerResult {
    let text = match msg.text() {
        Some(BACK_BUTTON) => return back_to_chat(&bot, &dialogue, &msg, settings).await,
        Some(text) => text,
        None => return Ok(()),
    };
    let Some((rating, comment)) = parse_rating(text) else {
        bot.send_message(msg.chat.id, "Please send a number from 1 to 5.")
            .await?;
        return Ok(());
    };

    let reply = match &settings.last {
        Some(last) => match feedback
            .save(&last.prompt, &last.response, &settings.language, rating, comment)
            .await
        {
            Ok(()) => "🙏 Thank you for your feedback!".to_string(),
            Err(err) => {
                error!("Could not save feedback: {}", err);
                "Sorry, your feedback could not be saved.".to_string()
            }
        },
        None => "There is no answer to rate yet.".to_string(),
    };
    bot.send_message(msg.chat.id, reply)
        .reply_markup(main_keyboard())
        .await?;
    dialogue.update(State::Chatting { settings }).await?;
    Ok(())
}
