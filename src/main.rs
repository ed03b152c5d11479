//! PensionBot CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use pensionbot::{
    chat::{ChatEngine, ChatMode, LaneKey, SessionManager},
    cli::{Args, Commands, Verbosity},
    config::{mask_secret, Config},
    doctor::Doctor,
    logging::{init_logging, LoggingConfig},
    repl::{DisplayManager, InputEvent, ReplSession},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_logging(LoggingConfig::from_verbosity(args.verbosity()))?;

    let config = Config::load(args.config.clone()).context("Failed to load configuration")?;
    tracing::debug!(top_k = config.retrieval.top_k, models = ?config.chat.models, "configuration loaded");

    match &args.command {
        None | Some(Commands::Start) => run_repl(&args, &config).await?,
        Some(Commands::Ask { query, mode, model }) => {
            run_ask(&args, &config, query, *mode, model.as_deref()).await?
        }
        Some(Commands::Compare { query, model }) => {
            run_compare(&args, &config, query, model.as_deref()).await?
        }
        Some(Commands::Doctor) => run_doctor(&config).await?,
        Some(Commands::Config) => show_config(&args, &config)?,
    }

    Ok(())
}

async fn run_repl(args: &Args, config: &Config) -> Result<()> {
    let engine = ChatEngine::from_config(config)?;
    let verbosity = args.verbosity();

    let mut repl_session = ReplSession::with_history(&config.chat.models, config.history_file())?;
    repl_session.configure(verbosity.show_progress(), verbosity.show_reference());
    repl_session.select_model(&config.chat.default_model);

    if let Some(reason) = engine.retrieval_unavailable_reason() {
        repl_session.display().show_warning(&format!(
            "Retrieval unavailable, augmented lanes will fail: {}",
            reason
        ));
    }
    repl_session.show_welcome(VERSION, engine.retrieval_available());

    loop {
        match repl_session.read_input()? {
            InputEvent::Line(input) => {
                if input.is_empty() {
                    continue;
                }
                match repl_session.handle_input(&engine, &input).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => repl_session.display_mut().show_error(&e.to_string()),
                }
            }
            InputEvent::Interrupted => {
                println!("\nUse /exit or Ctrl-D to quit");
            }
            InputEvent::Eof => break,
        }
    }

    if let Err(e) = repl_session.save() {
        tracing::warn!(error = %e, "could not save input history");
    }
    tracing::info!(
        session = %repl_session.session().id(),
        replies = repl_session.session().reply_count(),
        "session ended"
    );

    Ok(())
}

async fn run_ask(
    args: &Args,
    config: &Config,
    query: &str,
    mode: ChatMode,
    model: Option<&str>,
) -> Result<()> {
    let engine = ChatEngine::from_config(config)?;
    let verbosity = args.verbosity();
    let lane = LaneKey::new(mode, model.unwrap_or(&config.chat.default_model));

    let mut display = DisplayManager::new().with_progress(verbosity.show_progress());
    display.start_waiting(&lane);

    match engine.respond(&lane, query).await {
        Ok(outcome) => {
            if verbosity == Verbosity::Quiet {
                display.finish_current();
                println!("{}", outcome.reply);
            } else {
                display.show_reply(&outcome, verbosity.show_reference());
            }
            Ok(())
        }
        Err(e) => {
            display.finish_current();
            Err(e.into())
        }
    }
}

async fn run_compare(args: &Args, config: &Config, query: &str, model: Option<&str>) -> Result<()> {
    let engine = ChatEngine::from_config(config)?;
    let verbosity = args.verbosity();
    let model = model.unwrap_or(&config.chat.default_model);

    let mut session = SessionManager::new(&config.chat.models);
    let mut display = DisplayManager::new().with_progress(verbosity.show_progress());
    display.start_waiting(&LaneKey::new(ChatMode::Augmented, model));

    let comparison = engine.compare(&mut session, model, query).await;
    display.show_comparison(&comparison, verbosity.show_reference());

    if comparison.plain.is_err() && comparison.augmented.is_err() {
        anyhow::bail!("both lanes failed");
    }
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(config.clone());
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("\n{}\n", "PensionBot Configuration".bold().cyan());

    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);

    println!("{}", "Secrets:".bold());
    let key_line = |env: &str, value: pensionbot::Result<String>| match value {
        Ok(v) => println!("  {:<22} {}", env, mask_secret(&v).green()),
        Err(_) => println!("  {:<22} {}", env, "not set".red()),
    };
    key_line(&config.openai.api_key_env, config.openai_api_key());
    key_line(&config.pinecone.api_key_env, config.pinecone_api_key());
    println!();

    println!("{}", "Paths:".bold());
    println!("  State directory:  {}", config.state_dir().display());
    println!("  Input history:    {}", config.history_file().display());
    println!("  Verbosity:        {}", args.verbosity().as_str());
    println!();

    Ok(())
}
