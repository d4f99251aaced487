use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use math_quiz::config::BotConfig;
use math_quiz::quiz::scaling_quiz::{ScalingAdvance, ScalingPhase, ScalingQuiz, ScalingSummary, Selection};
use math_quiz::quiz::strategy_quiz::{Advance, Phase, StrategyQuiz, Summary, POINTS_PER_QUESTION};
use math_quiz::quiz::QuizError;
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode, ReplyMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveGameChoice,
    StrategyQuiz {
        quiz: StrategyQuiz,
    },
    ScalingQuiz {
        quiz: ScalingQuiz,
    },
}

type StateStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    // The .env file is optional, the variables may come from the environment
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting math quiz bot...");

    let config = Arc::new(BotConfig::from_env());
    log::debug!("Configuration: {:?}", config);

    let bot = Bot::from_env();
    let storage: StateStorage = InMemStorage::<State>::new().erase();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveGameChoice].endpoint(receive_game_choice))
            .branch(dptree::case![State::StrategyQuiz { quiz }].endpoint(strategy_quiz))
            .branch(dptree::case![State::ScalingQuiz { quiz }].endpoint(scaling_quiz)),
    )
    .dependencies(dptree::deps![storage, config])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str = "Hi! I'm the mental math bot. Let's practise some multiplication tricks and powers of ten!";
const STRATEGY_GAME: &str = "🧮 Mental math strategies";
const SCALING_GAME: &str = "🔟 Powers of ten & fractions";
const HINT_BUTTON: &str = "💡 Strategy Hint";
const NEXT_BUTTON: &str = "Next ➡️";
const START_BUTTON: &str = "Start ▶️";
const PLAY_AGAIN_BUTTON: &str = "Play Again!";
const CHANGE_GAME_BUTTON: &str = "Choose another game";

fn game_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(STRATEGY_GAME)],
        vec![KeyboardButton::new(SCALING_GAME)],
    ])
}

fn game_over_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(PLAY_AGAIN_BUTTON),
        KeyboardButton::new(CHANGE_GAME_BUTTON),
    ]])
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT).await?;
    offer_games(&bot, &dialogue, msg.chat.id).await
}

async fn offer_games(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId) -> HandlerResult {
    bot.send_message(chat_id, "Which game would you like to play?")
        .reply_markup(game_keyboard())
        .await?;
    dialogue.update(State::ReceiveGameChoice).await?;
    Ok(())
}

async fn receive_game_choice(
    config: Arc<BotConfig>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    match msg.text() {
        Some(STRATEGY_GAME) => {
            let quiz = StrategyQuiz::with_max_problems(config.strategy_problems, &mut rand::thread_rng());
            log::info!("Chat {} started the strategy quiz", msg.chat.id.0);
            send_strategy_problem(&bot, msg.chat.id, &quiz).await?;
            dialogue.update(State::StrategyQuiz { quiz }).await?;
        }
        Some(SCALING_GAME) => {
            let quiz = ScalingQuiz::generate(config.scaling_questions, &mut rand::thread_rng());
            log::info!("Chat {} picked the scaling quiz", msg.chat.id.0);
            send_scaling_intro(&bot, msg.chat.id, &quiz).await?;
            dialogue.update(State::ScalingQuiz { quiz }).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the games")
                .reply_markup(game_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn send_strategy_problem(bot: &Bot, chat_id: ChatId, quiz: &StrategyQuiz) -> HandlerResult {
    let text = format!(
        "<b>{}</b>\n{}\n\n<b>{} = ?</b>\n\nType your answer.",
        quiz.score_text(),
        quiz.progress_text(),
        quiz.problem().question
    );
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(answer_markup(quiz))
        .await?;
    Ok(())
}

/// Offers the hint button until the hint for the current problem is shown.
fn answer_markup(quiz: &StrategyQuiz) -> ReplyMarkup {
    if quiz.hint_revealed() {
        ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
    } else {
        ReplyMarkup::Keyboard(KeyboardMarkup::new(vec![vec![KeyboardButton::new(HINT_BUTTON)]]))
    }
}

fn strategy_summary_text(summary: &Summary) -> String {
    format!(
        "<b>Game Over!</b>\n\n{}\n\nYour Final Score: <b>{} out of {}</b>\nPercentage: <b>{}</b>",
        summary.celebration.message(),
        summary.score,
        summary.max_score,
        summary.percentage_text()
    )
}

async fn strategy_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    quiz: StrategyQuiz,
    msg: Message,
) -> HandlerResult {
    let mut quiz = quiz;
    let chat_id = msg.chat.id;
    let text = match msg.text() {
        Some(text) => text.trim(),
        None => {
            bot.send_message(chat_id, "Please answer with text").await?;
            return Ok(());
        }
    };

    match quiz.phase() {
        Phase::Active { .. } if text == HINT_BUTTON => {
            let hint = quiz.hint()?;
            bot.send_message(chat_id, format!("<b>Strategy: {}</b>\n{}", hint.strategy, hint.text))
                .parse_mode(ParseMode::Html)
                .reply_markup(answer_markup(&quiz))
                .await?;
        }
        Phase::Active { .. } => {
            let grade = match quiz.submit(text) {
                Ok(grade) => grade,
                Err(err @ QuizError::InvalidInput(_)) => {
                    // Nothing changes, the same problem stays open
                    bot.send_message(chat_id, err.to_string()).await?;
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            let problem = quiz.problem();
            let feedback = if grade.correct {
                format!(
                    "✅ Correct! You used a great strategy to get {}! (+{} points)",
                    problem.answer, POINTS_PER_QUESTION
                )
            } else {
                format!(
                    "❌ Incorrect. The correct answer is {}. Try using the <b>{}</b> strategy next time.",
                    problem.answer, problem.strategy
                )
            };
            bot.send_message(chat_id, format!("{}\n\n{}", feedback, quiz.score_text()))
                .parse_mode(ParseMode::Html)
                .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(NEXT_BUTTON)]]))
                .await?;
        }
        // Any message moves on once the answer has been graded
        Phase::Graded { .. } => {
            let advance = quiz.advance(&mut rand::thread_rng())?;
            match advance {
                Advance::Next => send_strategy_problem(&bot, chat_id, &quiz).await?,
                Advance::Ended(summary) => {
                    log::info!("Chat {} finished the strategy quiz: {}", chat_id.0, summary.score);
                    bot.send_message(chat_id, strategy_summary_text(&summary))
                        .parse_mode(ParseMode::Html)
                        .reply_markup(game_over_keyboard())
                        .await?;
                }
            }
        }
        Phase::Ended => match text {
            PLAY_AGAIN_BUTTON => {
                quiz.restart(&mut rand::thread_rng())?;
                send_strategy_problem(&bot, chat_id, &quiz).await?;
            }
            CHANGE_GAME_BUTTON => return offer_games(&bot, &dialogue, chat_id).await,
            _ => {
                bot.send_message(chat_id, "Please pick one of the options")
                    .reply_markup(game_over_keyboard())
                    .await?;
                return Ok(());
            }
        },
    }

    dialogue.update(State::StrategyQuiz { quiz }).await?;
    Ok(())
}

async fn send_scaling_intro(bot: &Bot, chat_id: ChatId, quiz: &ScalingQuiz) -> HandlerResult {
    let text = format!(
        "I've prepared {} questions about multiplying and dividing by powers of ten. Pick the right answer each time!",
        quiz.total()
    );
    bot.send_message(chat_id, text)
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(START_BUTTON)]]))
        .await?;
    Ok(())
}

async fn send_scaling_question(bot: &Bot, chat_id: ChatId, quiz: &ScalingQuiz) -> HandlerResult {
    let (index, question) = match (quiz.current_index(), quiz.current_question()) {
        (Some(index), Some(question)) => (index, question),
        _ => return Ok(()),
    };
    let text = format!(
        "Question {} of {} (score: {})\n\n<b>{}</b>",
        index + 1,
        quiz.total(),
        quiz.score(),
        question.text()
    );
    let keyboard = question
        .options
        .chunks(2)
        .map(|row| row.iter().map(|o| KeyboardButton::new(o.clone())).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(KeyboardMarkup::new(keyboard))
        .await?;
    Ok(())
}

async fn send_scaling_summary(bot: &Bot, chat_id: ChatId, summary: ScalingSummary) -> HandlerResult {
    bot.send_message(
        chat_id,
        format!(
            "Quiz complete! You scored <b>{} out of {}</b>.",
            summary.score, summary.total
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(game_over_keyboard())
    .await?;
    Ok(())
}

async fn scaling_quiz(
    config: Arc<BotConfig>,
    bot: Bot,
    dialogue: QuizDialogue,
    quiz: ScalingQuiz,
    msg: Message,
) -> HandlerResult {
    let mut quiz = quiz;
    let chat_id = msg.chat.id;
    let text = match msg.text() {
        Some(text) => text.trim(),
        None => {
            bot.send_message(chat_id, "Please answer with text").await?;
            return Ok(());
        }
    };

    match quiz.phase() {
        ScalingPhase::Idle => {
            if text != START_BUTTON {
                send_scaling_intro(&bot, chat_id, &quiz).await?;
                return Ok(());
            }
            quiz.start()?;
            if quiz.phase() == ScalingPhase::Finished {
                send_scaling_summary(&bot, chat_id, quiz.finish()).await?;
            } else {
                send_scaling_question(&bot, chat_id, &quiz).await?;
            }
        }
        ScalingPhase::InProgress { index, .. } => {
            match quiz.current_question() {
                Some(question) if question.options.iter().any(|o| o == text) => {}
                Some(_) => {
                    // Show the question again in case it never arrived
                    bot.send_message(chat_id, "Please pick one of the options").await?;
                    send_scaling_question(&bot, chat_id, &quiz).await?;
                    return Ok(());
                }
                None => return Ok(()),
            }
            let grade = match quiz.select(text)? {
                Selection::Graded(grade) => grade,
                // The next question is already on its way
                Selection::Ignored => return Ok(()),
            };
            let solution = quiz
                .current_question()
                .map(|q| q.solution_text())
                .unwrap_or_default();

            // Save the graded state before the delayed advance can read it
            dialogue.update(State::ScalingQuiz { quiz }).await?;

            // The advance must not depend on the feedback reaching the chat
            schedule_advance(bot.clone(), dialogue, config.advance_delay, index);
            if config.feedback_cues {
                play_cue(bot.clone(), chat_id, grade.correct);
            }

            let feedback = if grade.correct {
                format!("✅ Correct! {}", solution)
            } else {
                format!("❌ Not quite. {}", solution)
            };
            if let Err(err) = bot.send_message(chat_id, feedback).await {
                log::warn!("Could not send scaling feedback to {}: {}", chat_id.0, err);
            }
            return Ok(());
        }
        ScalingPhase::Finished => match text {
            PLAY_AGAIN_BUTTON => {
                quiz.restart();
                send_scaling_intro(&bot, chat_id, &quiz).await?;
            }
            CHANGE_GAME_BUTTON => return offer_games(&bot, &dialogue, chat_id).await,
            _ => {
                bot.send_message(chat_id, "Please pick one of the options")
                    .reply_markup(game_over_keyboard())
                    .await?;
                return Ok(());
            }
        },
    }

    dialogue.update(State::ScalingQuiz { quiz }).await?;
    Ok(())
}

/// Sends a short correctness cue. Failures are logged and otherwise ignored.
fn play_cue(bot: Bot, chat_id: ChatId, correct: bool) {
    let cue = if correct { "🎉" } else { "🙈" };
    tokio::spawn(async move {
        if let Err(err) = bot.send_message(chat_id, cue).await {
            log::warn!("Could not send feedback cue to {}: {}", chat_id.0, err);
        }
    });
}

/// Shows the next scaling question after `delay`. Not cancelable.
fn schedule_advance(bot: Bot, dialogue: QuizDialogue, delay: Duration, index: usize) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(err) = advance_scaling(&bot, &dialogue, index).await {
            log::error!("Failed to advance the scaling quiz for {}: {}", dialogue.chat_id().0, err);
        }
    });
}

async fn advance_scaling(bot: &Bot, dialogue: &QuizDialogue, index: usize) -> HandlerResult {
    let mut quiz = match dialogue.get().await? {
        Some(State::ScalingQuiz { quiz }) => quiz,
        _ => {
            log::debug!("Chat {} left the scaling quiz before the advance", dialogue.chat_id().0);
            return Ok(());
        }
    };
    // The user restarted or moved on in the meantime
    if quiz.current_index() != Some(index) {
        return Ok(());
    }

    let advance = quiz.advance()?;
    dialogue.update(State::ScalingQuiz { quiz: quiz.clone() }).await?;

    let chat_id = dialogue.chat_id();
    match advance {
        ScalingAdvance::Next => send_scaling_question(bot, chat_id, &quiz).await,
        ScalingAdvance::Finished(summary) => {
            log::info!("Chat {} finished the scaling quiz: {}/{}", chat_id.0, summary.score, summary.total);
            send_scaling_summary(bot, chat_id, summary).await
        }
    }
}
