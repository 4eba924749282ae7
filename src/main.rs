use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use supportsage::actions::{self, ActionRegistry};
use supportsage::chat::{ChatApp, ChatBackend, LocalBackend, RetryPolicy, WebhookClient};
use supportsage::config::{Config, IdStrategy};
use supportsage::fallback::{FallbackOptions, FallbackResponder, Reply};
use supportsage::scaffold::{self, ResetOutcome, ScaffoldOptions};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "supportsage")]
#[command(about = "Customer-support assistant toolkit for Rasa-compatible backends", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the backend from the terminal
    Chat {
        /// Backend base URL
        #[arg(long)]
        url: Option<String>,
        /// Answer from the local knowledge base instead of a backend
        #[arg(long)]
        local: bool,
        /// Knowledge base CSV for --local
        #[arg(long)]
        knowledge_base: Option<PathBuf>,
    },
    /// Run the custom action server with the similarity fallback
    Actions {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        knowledge_base: Option<PathBuf>,
    },
    /// Generate a backend project from a question/answer CSV
    Scaffold {
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Output project directory
        #[arg(long)]
        out: Option<PathBuf>,
        /// Derive identifiers from question text instead of row position
        #[arg(long)]
        stable_ids: bool,
        /// Leave the custom fallback action out of the project
        #[arg(long)]
        no_fallback_action: bool,
    },
    /// Look up a question in the knowledge base and show the scores
    Ask {
        text: String,
        /// How many candidates to list
        #[arg(long, default_value_t = 3)]
        top: usize,
        #[arg(long)]
        knowledge_base: Option<PathBuf>,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Chat { .. } | Commands::Ask { .. } => "warn",
        _ => "info",
    };
    init_tracing(default_level);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat {
            url,
            local,
            knowledge_base,
        } => {
            if let Some(url) = url {
                config.backend.url = url;
            }
            if let Some(path) = knowledge_base {
                config.knowledge_base.path = path;
            }
            chat(&config, local).await
        }
        Commands::Actions {
            bind,
            knowledge_base,
        } => {
            if let Some(bind) = bind {
                config.actions.bind = bind;
            }
            if let Some(path) = knowledge_base {
                config.knowledge_base.path = path;
            }
            let responder = Arc::new(load_responder(&config));
            let registry = Arc::new(ActionRegistry::with_defaults(responder));
            actions::serve(&config.actions.bind, registry).await
        }
        Commands::Scaffold {
            csv,
            out,
            stable_ids,
            no_fallback_action,
        } => {
            if let Some(csv) = csv {
                config.scaffold.csv = csv;
            }
            if let Some(out) = out {
                config.scaffold.project_dir = out;
            }
            if stable_ids {
                config.scaffold.id_strategy = IdStrategy::Hashed;
            }
            if no_fallback_action {
                config.scaffold.fallback_action = false;
            }
            run_scaffold(&ScaffoldOptions::from(&config))
        }
        Commands::Ask {
            text,
            top,
            knowledge_base,
        } => {
            if let Some(path) = knowledge_base {
                config.knowledge_base.path = path;
            }
            ask(&config, &text, top);
            Ok(())
        }
    }
}

fn load_responder(config: &Config) -> FallbackResponder {
    FallbackResponder::load(&config.knowledge_base.path, FallbackOptions::from(config))
}

async fn chat(config: &Config, local: bool) -> Result<()> {
    let backend: Box<dyn ChatBackend> = if local {
        Box::new(LocalBackend::new(Arc::new(load_responder(config))))
    } else {
        Box::new(WebhookClient::new(Duration::from_secs(
            config.backend.timeout_secs,
        ))?)
    };

    let mut app = ChatApp::new(
        backend,
        &config.backend.url,
        RetryPolicy::from(&config.retry),
        config.chat.bot_name.clone(),
        config.chat.export_dir.clone(),
    );
    app.run().await
}

fn run_scaffold(options: &ScaffoldOptions) -> Result<()> {
    info!("Starting project generation in {}", options.project_dir.display());
    let report = scaffold::run(options)?;

    match &report.reset {
        ResetOutcome::Absent => {}
        ResetOutcome::Removed | ResetOutcome::RemovedAfterPermissionFix => {
            println!("Removed old '{}' directory.", report.project_dir.display())
        }
        ResetOutcome::MovedAside(backup) => {
            println!("Renamed old directory to '{}'.", backup.display())
        }
    }
    println!(
        "Generated {} intents from {} rows ({} skipped).",
        report.intents, report.rows_read, report.skipped
    );

    println!("\nValidating YAML files...");
    for check in &report.validation.checks {
        match &check.error {
            None => println!("✅ {} is valid", check.path.display()),
            Some(e) => println!("❌ {}: {}", check.path.display(), e),
        }
    }

    if !report.validation.is_valid() {
        bail!("Some generated files are invalid");
    }

    println!(
        "\n{}",
        "✅ Project generation complete! All YAML files are valid.".bright_green()
    );
    println!("\nTo train your model, run:");
    println!("cd {}", report.project_dir.display());
    println!("rasa train");
    Ok(())
}

fn ask(config: &Config, text: &str, top: usize) {
    let responder = load_responder(config);

    match responder.respond(text) {
        Reply::Answer {
            text,
            question,
            score,
        } => {
            println!("{} {}", "Matched:".bright_green(), question);
            println!("{} {:.3}", "Score:".bright_black(), score);
            println!("{}", text);
        }
        reply => println!("{}", reply.text()),
    }

    let candidates = responder.top_matches(text, top);
    if candidates.is_empty() {
        return;
    }
    println!(
        "\n{}",
        format!("Top candidates (threshold {:.2}):", responder.threshold()).bright_black()
    );
    for candidate in candidates {
        println!("  {:.3}  {}", candidate.score, candidate.pair.question);
    }
}
