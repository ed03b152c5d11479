//! REPL (Read-Eval-Print Loop) module for the interactive terminal
//!
//! Every line is either a slash command or a question for the active lane.
//! A failed turn is reported and the loop carries on.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;

use crate::chat::{ChatEngine, SessionManager};
use crate::repl::commands::{is_command, Command, CommandHandler};
pub use crate::repl::display::DisplayManager;
pub use crate::repl::input::{InputEvent, InputHandler};

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    session_manager: SessionManager,
    display_manager: DisplayManager,
}

impl ReplSession {
    /// Create REPL session with lanes for `models`
    pub fn new(models: &[String]) -> Result<Self> {
        Ok(Self::assemble(InputHandler::new()?, models))
    }

    /// Create REPL session with persistent input history
    pub fn with_history(models: &[String], history_path: PathBuf) -> Result<Self> {
        Ok(Self::assemble(InputHandler::with_history(history_path)?, models))
    }

    fn assemble(input_handler: InputHandler, models: &[String]) -> Self {
        let mut repl = ReplSession {
            input_handler,
            command_handler: CommandHandler::new(),
            session_manager: SessionManager::new(models),
            display_manager: DisplayManager::new(),
        };
        repl.sync_prompt();
        repl
    }

    /// Apply output preferences
    pub fn configure(&mut self, show_progress: bool, show_reference: bool) {
        self.display_manager = DisplayManager::new().with_progress(show_progress);
        self.command_handler = CommandHandler::new().with_reference(show_reference);
    }

    /// Make `model`'s lane of the current mode active
    pub fn select_model(&mut self, model: &str) {
        self.session_manager.set_model(model);
        self.sync_prompt();
    }

    pub fn show_welcome(&self, version: &str, retrieval_available: bool) {
        self.display_manager
            .show_banner(version, self.session_manager.active_key(), retrieval_available);
    }

    /// Read a line of input from user
    pub fn read_input(&mut self) -> Result<InputEvent> {
        self.input_handler.read_line()
    }

    /// Handle user input (command or question)
    ///
    /// Returns true if session should continue, false to exit
    pub async fn handle_input(&mut self, engine: &ChatEngine, input: &str) -> Result<bool> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(true);
        }

        if !is_command(input) {
            self.ask(engine, input).await;
            return Ok(true);
        }

        let command = self.command_handler.parse(input);
        let keep_going = match command {
            Command::Compare { query } => {
                self.compare(engine, &query).await;
                true
            }
            other => self.command_handler.execute(other, &mut self.session_manager)?,
        };
        self.sync_prompt();
        Ok(keep_going)
    }

    /// Ask the active lane
    pub async fn ask(&mut self, engine: &ChatEngine, query: &str) {
        let lane = self.session_manager.active_key().clone();
        self.display_manager.start_waiting(&lane);

        match engine.run_turn(&mut self.session_manager, &lane, query).await {
            Ok(outcome) => {
                let show_reference = self.command_handler.shows_reference();
                self.display_manager.show_reply(&outcome, show_reference);
            }
            Err(e) => {
                tracing::error!(lane = %lane, error = %e, "turn failed");
                self.display_manager.show_error(&e.to_string());
            }
        }
    }

    /// Plain and augmented answers from the active model
    pub async fn compare(&mut self, engine: &ChatEngine, query: &str) {
        let lane = self.session_manager.active_key().clone();
        self.display_manager.start_waiting(&lane);

        let comparison = engine.compare(&mut self.session_manager, &lane.model, query).await;
        let show_reference = self.command_handler.shows_reference();
        self.display_manager.show_comparison(&comparison, show_reference);
    }

    fn sync_prompt(&mut self) {
        let prompt = DisplayManager::prompt_for(self.session_manager.active_key());
        self.input_handler.set_prompt(prompt);
    }

    pub fn session(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display_manager
    }

    pub fn display_mut(&mut self) -> &mut DisplayManager {
        &mut self.display_manager
    }

    /// Save input history
    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }

    pub fn has_context(&self) -> bool {
        self.session_manager.has_context()
    }
}
