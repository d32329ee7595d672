//! profilerag - command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use profilerag::cli::{render, Args, Commands, Verbosity};
use profilerag::index::MetadataFilter;
use profilerag::{logging, AnswerEngine, Config, ProfileInput, ProviderKind, RagError};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(&args).await {
        match err.downcast_ref::<RagError>() {
            Some(rag) => eprintln!("{}", rag.report().red()),
            None => eprintln!("{} {:#}", "error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let verbosity = args.verbosity();
    logging::init(verbosity.log_level().unwrap_or(config.logging.level.as_str()));

    match &args.command {
        Commands::Ask {
            question,
            profile,
            provider,
            no_evidence,
            json,
            timeout_secs,
            filter,
        } => {
            let filter = filter
                .as_deref()
                .map(|raw| -> Result<MetadataFilter> {
                    let value: serde_json::Value =
                        serde_json::from_str(raw).context("--filter is not valid JSON")?;
                    Ok(MetadataFilter::from_json(&value)?)
                })
                .transpose()?;
            let engine = AnswerEngine::new(&config)?;
            let profile_id = load_profile(&engine, profile).await?;
            let deadline = Duration::from_secs(
                timeout_secs.unwrap_or(config.providers.request_timeout_secs * 2),
            );

            let result = engine
                .ask_with_deadline(
                    &profile_id,
                    question,
                    provider.as_deref(),
                    !no_evidence,
                    filter.as_ref(),
                    deadline,
                )
                .await?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render::answer(&result, verbosity.show_scores()));
            }
        }
        Commands::Chat { profile, provider } => {
            let engine = AnswerEngine::new(&config)?;
            let profile_id = load_profile(&engine, profile).await?;
            let provider = match provider {
                Some(name) => name.parse::<ProviderKind>()?,
                None => engine.default_provider(),
            };
            run_chat(&engine, &profile_id, provider, verbosity).await?;
        }
        Commands::Providers => {
            let engine = AnswerEngine::new(&config)?;
            let infos = engine.providers().await?;
            print!("{}", render::providers(&infos, engine.default_provider()));
        }
        Commands::Config => {
            match args.config.clone().or_else(Config::default_path) {
                Some(path) if path.exists() => {
                    println!("{} {}", "# loaded from".dimmed(), path.display())
                }
                _ => println!("{}", "# built-in defaults".dimmed()),
            }
            print!("{}", config.redacted().to_toml()?);
        }
    }

    Ok(())
}

async fn load_profile(engine: &AnswerEngine, path: &Path) -> Result<String> {
    let profile = ProfileInput::from_json_file(path)
        .with_context(|| format!("failed to load profile {}", path.display()))?;
    let profile_id = profile.profile_id.clone();
    let stats = engine.index(profile).await?;
    tracing::debug!(documents = stats.documents, "profile ready");
    Ok(profile_id)
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".profilerag").join("history"))
}

async fn run_chat(
    engine: &AnswerEngine,
    profile_id: &str,
    mut provider: ProviderKind,
    verbosity: Verbosity,
) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    println!(
        "{} {} {}",
        "profilerag".bold().cyan(),
        format!("profile {} | provider {}", profile_id, provider).dimmed(),
        "(/provider <name>, /reset, /stats, /quit)".dimmed()
    );

    loop {
        let line = match editor.readline(&format!("{}> ", provider)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        if let Some(command) = input.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("quit") | Some("exit"), _) => break,
                (Some("reset"), _) => {
                    engine.reset_conversation(profile_id).await?;
                    println!("{}", "conversation cleared".green());
                }
                (Some("stats"), _) => {
                    print!("{}", render::stats(&engine.stats(profile_id).await?));
                }
                (Some("provider"), Some(name)) => match name.parse::<ProviderKind>() {
                    Ok(kind) => {
                        provider = kind;
                        println!("{} {}", "switched to".green(), provider);
                    }
                    Err(err) => eprintln!("{}", err.report().red()),
                },
                (Some("provider"), None) => println!("current provider: {}", provider),
                _ => eprintln!("{} {}", "unknown command:".yellow(), input),
            }
            continue;
        }

        match engine
            .ask(profile_id, input, Some(provider.as_str()), true)
            .await
        {
            Ok(result) => println!("{}", render::answer(&result, verbosity.show_scores())),
            Err(err) => eprintln!("{}", err.report().red()),
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.save_history(path);
    }
    Ok(())
}
