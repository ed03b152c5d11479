//! Command handler for REPL built-in commands
//!
//! Lane navigation, history display and session housekeeping. `/compare`
//! is parsed here but run by the REPL loop, since it needs the chat engine.

use anyhow::Result;
use colored::*;
use crossterm::{
    cursor,
    execute,
    terminal::{Clear, ClearType},
};
use std::io;

use crate::chat::{ChatMode, SessionManager, Speaker};

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Lanes,
    /// 1-based lane number
    Lane { number: usize },
    /// `None` toggles between plain and augmented
    Mode { mode: Option<ChatMode> },
    Model { name: String },
    History { limit: Option<usize> },
    Compare { query: String },
    Reference { enable: bool },
    Reset,
    Status,
    Clear,
    Exit,
    /// Known command, bad arguments
    Invalid { message: String },
    Unknown { input: String },
}

/// Command handler for parsing and executing REPL commands
pub struct CommandHandler {
    show_reference: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler { show_reference: false }
    }

    /// Start with reference display on or off
    pub fn with_reference(mut self, enable: bool) -> Self {
        self.show_reference = enable;
        self
    }

    /// Parse input string into a command
    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();

        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown { input: input.to_string() };
        };

        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        if name.is_empty() {
            return Command::Unknown { input: input.to_string() };
        }

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "lanes" => Command::Lanes,
            "lane" => match rest.parse::<usize>() {
                Ok(number) if number > 0 => Command::Lane { number },
                _ => Command::Invalid { message: "usage: /lane <n> (see /lanes)".to_string() },
            },
            "mode" => {
                if rest.is_empty() {
                    Command::Mode { mode: None }
                } else {
                    match rest.parse::<ChatMode>() {
                        Ok(mode) => Command::Mode { mode: Some(mode) },
                        Err(message) => Command::Invalid { message },
                    }
                }
            }
            "model" => {
                if rest.is_empty() {
                    Command::Invalid { message: "usage: /model <name>".to_string() }
                } else {
                    Command::Model { name: rest.to_string() }
                }
            }
            "history" => {
                let limit = rest.split_whitespace().next().and_then(|s| s.parse().ok());
                Command::History { limit }
            }
            "compare" | "cmp" => {
                if rest.is_empty() {
                    Command::Invalid { message: "usage: /compare <question>".to_string() }
                } else {
                    Command::Compare { query: rest.to_string() }
                }
            }
            "reference" | "ref" => match rest.to_lowercase().as_str() {
                "" | "on" | "1" | "true" => Command::Reference { enable: true },
                "off" | "0" | "false" => Command::Reference { enable: false },
                _ => Command::Invalid { message: "usage: /reference on|off".to_string() },
            },
            "reset" => Command::Reset,
            "status" => Command::Status,
            "clear" | "cls" => Command::Clear,
            _ => Command::Unknown { input: input.to_string() },
        }
    }

    /// Execute a command
    ///
    /// Returns true if REPL should continue, false if should exit
    pub fn execute(&mut self, command: Command, session: &mut SessionManager) -> Result<bool> {
        match command {
            Command::Help => {
                self.show_help();
                Ok(true)
            }
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                Ok(false)
            }
            Command::Lanes => {
                self.show_lanes(session);
                Ok(true)
            }
            Command::Lane { number } => {
                if session.select(number - 1) {
                    println!("{} {}", "Switched to".cyan(), session.active_key().title().bold());
                } else {
                    println!(
                        "{}",
                        format!("No lane {} (there are {})", number, session.lanes().len()).red()
                    );
                }
                Ok(true)
            }
            Command::Mode { mode } => {
                let mode = mode.unwrap_or_else(|| session.active_key().mode.toggled());
                session.set_mode(mode);
                println!("{} {}", "Switched to".cyan(), session.active_key().title().bold());
                Ok(true)
            }
            Command::Model { name } => {
                session.set_model(&name);
                println!("{} {}", "Switched to".cyan(), session.active_key().title().bold());
                Ok(true)
            }
            Command::History { limit } => {
                self.show_history(session, limit.unwrap_or(10));
                Ok(true)
            }
            // Run by the REPL loop
            Command::Compare { .. } => Ok(true),
            Command::Reference { enable } => {
                self.show_reference = enable;
                let status = if enable { "shown" } else { "hidden" };
                println!("{}", format!("Retrieved references will be {}", status).cyan());
                Ok(true)
            }
            Command::Reset => {
                session.reset();
                println!("{}", "Session reset. All lane histories cleared.".yellow());
                Ok(true)
            }
            Command::Status => {
                self.show_status(session);
                Ok(true)
            }
            Command::Clear => {
                execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))?;
                Ok(true)
            }
            Command::Invalid { message } => {
                println!("{}", message.red());
                Ok(true)
            }
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
                Ok(true)
            }
        }
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/lanes", "List lanes, active one marked"),
            ("/lane <n>", "Switch to lane n"),
            ("/mode [plain|augmented]", "Switch mode (toggle when omitted)"),
            ("/model <name>", "Switch model, keeping the mode"),
            ("/history [n]", "Show last n turns of this lane (default: 10)"),
            ("/compare <question>", "Ask plain and augmented side by side"),
            ("/reference [on|off]", "Show retrieved passage after augmented replies"),
            ("/status", "Show session status"),
            ("/reset", "Clear every lane's history"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit REPL"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<26} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type your question directly (no / prefix) to ask the active lane");
        println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
        println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }

    fn show_lanes(&self, session: &SessionManager) {
        println!("\n{}", "Lanes:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        for (i, lane) in session.lanes().iter().enumerate() {
            let marker = if i == session.active_index() { "*".green().bold() } else { " ".normal() };
            let turns = format!("({} replies)", lane.history.pairs().len()).dimmed();
            println!("  {} {}. {} {}", marker, (i + 1).to_string().cyan(), lane.key.title(), turns);
        }
        println!();
    }

    fn show_history(&self, session: &SessionManager, limit: usize) {
        let lane = session.active_lane();
        let turns = lane.history.recent(limit);

        if turns.is_empty() {
            println!("{}", format!("No turns in {} yet.", lane.key.title()).yellow());
            return;
        }

        println!(
            "\n{}",
            format!("{} (last {} turns):", lane.key.title(), turns.len()).bold().cyan()
        );
        println!("{}", "=".repeat(60).cyan());

        for turn in turns {
            let speaker = match turn.speaker {
                Speaker::You => "You:".blue().bold(),
                Speaker::Assistant => "Assistant:".green().bold(),
            };
            let at = turn.at.format("%H:%M:%S").to_string().dimmed();
            println!("{} {} {}", at, speaker, turn.text);
        }
        println!();
    }

    fn show_status(&self, session: &SessionManager) {
        println!("\n{}", "Session Status:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let duration = session.session_duration();
        let hours = duration / 3600;
        let minutes = (duration % 3600) / 60;
        let seconds = duration % 60;

        let duration_str = if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        };

        println!("  Session:          {}", session.id().to_string().dimmed());
        println!("  Active Lane:      {}", session.active_key().title().green());
        println!("  Lanes:            {}", session.lanes().len().to_string().green());
        println!("  Replies:          {}", session.reply_count().to_string().green());
        println!("  Session Duration: {}", duration_str.green());
        println!(
            "  References:       {}",
            if self.show_reference { "Shown".green() } else { "Hidden".red() }
        );
        println!();
    }

    /// Whether augmented replies are followed by their reference passage
    pub fn shows_reference(&self) -> bool {
        self.show_reference
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}
