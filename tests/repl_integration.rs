//! Integration tests - REPL mode
//!
//! Command parsing, lane navigation and the loop's failure handling.

use async_trait::async_trait;
use pensionbot::{
    chat::{ChatEngine, ChatMode, LaneKey, SessionManager, Speaker},
    config::{ChatConfig, Config},
    errors::{BotError, Result},
    providers::{ChatCompletion, ChatMessage},
    repl::{
        commands::{is_command, Command, CommandHandler},
        input::InputHandler,
        ReplSession,
    },
};
use std::sync::Arc;
use tempfile::TempDir;

struct ScriptedCompletion;

#[async_trait]
impl ChatCompletion for ScriptedCompletion {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let prompt = &messages.last().map(|m| m.content.clone()).unwrap_or_default();
        if prompt.contains("timeout") {
            return Err(BotError::Timeout { duration_ms: 300_000 });
        }
        Ok(format!("{} says: {}", model, prompt.len()))
    }
}

fn models() -> Vec<String> {
    ChatConfig::default().models
}

fn plain_engine() -> ChatEngine {
    ChatEngine::plain_only(Arc::new(ScriptedCompletion), ChatConfig::default(), "index not configured")
}

fn quiet_repl() -> ReplSession {
    let mut repl = ReplSession::new(&models()).unwrap();
    repl.configure(false, false);
    repl
}

// Command parsing

#[test]
fn test_every_documented_command_parses() {
    let handler = CommandHandler::new();
    let cases = [
        ("/help", Command::Help),
        ("/lanes", Command::Lanes),
        ("/lane 2", Command::Lane { number: 2 }),
        ("/mode augmented", Command::Mode { mode: Some(ChatMode::Augmented) }),
        ("/model o1-preview", Command::Model { name: "o1-preview".to_string() }),
        ("/history 3", Command::History { limit: Some(3) }),
        ("/compare What is PBGC?", Command::Compare { query: "What is PBGC?".to_string() }),
        ("/reference off", Command::Reference { enable: false }),
        ("/reset", Command::Reset),
        ("/status", Command::Status),
        ("/clear", Command::Clear),
        ("/exit", Command::Exit),
        ("/QUIT", Command::Exit),
    ];

    for (input, expected) in cases {
        assert!(is_command(input));
        assert_eq!(handler.parse(input), expected, "parsing {}", input);
    }
}

#[test]
fn test_session_from_empty_model_list_is_usable() {
    let mut handler = CommandHandler::new();
    let mut session = SessionManager::new(&[]);

    assert_eq!(session.active_key(), &LaneKey::new(ChatMode::Plain, "gpt-4o"));
    assert!(handler.execute(Command::Lanes, &mut session).unwrap());
}

#[test]
fn test_questions_are_not_commands() {
    assert!(!is_command("What is a DB plan?"));
    assert!(!is_command("plan assets / liabilities"));
}

// Lane navigation

#[test]
fn test_lane_switching_through_commands() {
    let mut handler = CommandHandler::new();
    let mut session = SessionManager::new(&models());

    handler.execute(Command::Lane { number: 2 }, &mut session).unwrap();
    assert_eq!(session.active_key(), &LaneKey::new(ChatMode::Augmented, "gpt-4o"));

    handler
        .execute(Command::Model { name: "o1-preview".to_string() }, &mut session)
        .unwrap();
    assert_eq!(session.active_key(), &LaneKey::new(ChatMode::Augmented, "o1-preview"));

    handler
        .execute(Command::Mode { mode: Some(ChatMode::Plain) }, &mut session)
        .unwrap();
    assert_eq!(session.active_index(), 2);
}

// Loop behaviour

#[tokio::test]
async fn test_conversation_accumulates_in_active_lane() {
    let mut repl = quiet_repl();
    let engine = plain_engine();

    for question in ["What is a DB plan?", "And a cash balance plan?", "Compare them"] {
        assert!(repl.handle_input(&engine, question).await.unwrap());
    }

    let history = &repl.session().active_lane().history;
    assert_eq!(history.pairs().len(), 3);
    assert_eq!(history.turns()[0].speaker, Speaker::You);
    assert_eq!(history.turns()[1].speaker, Speaker::Assistant);
    assert_eq!(history.turns()[4].text, "Compare them");
}

#[tokio::test]
async fn test_timeout_is_reported_and_loop_continues() {
    let mut repl = quiet_repl();
    let engine = plain_engine();

    assert!(repl.handle_input(&engine, "this will timeout").await.unwrap());
    assert!(repl.handle_input(&engine, "second try").await.unwrap());
    assert_eq!(repl.session().reply_count(), 1);
}

#[tokio::test]
async fn test_switching_lanes_isolates_histories() {
    let mut repl = quiet_repl();
    let engine = plain_engine();

    repl.handle_input(&engine, "first on gpt-4o").await.unwrap();
    repl.handle_input(&engine, "/lane 3").await.unwrap();
    repl.handle_input(&engine, "first on o1").await.unwrap();

    let gpt = repl.session().history(&LaneKey::new(ChatMode::Plain, "gpt-4o")).unwrap();
    let o1 = repl.session().history(&LaneKey::new(ChatMode::Plain, "o1-preview")).unwrap();
    assert_eq!(gpt.turns()[0].text, "first on gpt-4o");
    assert_eq!(o1.turns()[0].text, "first on o1");
    assert_eq!(gpt.len(), 2);
    assert_eq!(o1.len(), 2);
}

#[tokio::test]
async fn test_clear_then_reset_then_exit() {
    let mut repl = quiet_repl();
    let engine = plain_engine();

    repl.handle_input(&engine, "question").await.unwrap();
    assert!(repl.has_context());

    assert!(repl.handle_input(&engine, "/clear").await.unwrap());
    assert!(repl.has_context());

    assert!(repl.handle_input(&engine, "/reset").await.unwrap());
    assert!(!repl.has_context());

    assert!(!repl.handle_input(&engine, "/q").await.unwrap());
}

// Input history

#[test]
fn test_history_file_under_state_dir() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.paths.state_dir = temp_dir.path().join("state").to_string_lossy().to_string();

    let path = config.history_file();
    assert!(path.ends_with("state/history"));

    let mut handler = InputHandler::with_history(path.clone()).unwrap();
    handler.save_history().unwrap();
    assert!(path.parent().unwrap().is_dir());
}
