//! Command-line driver for the reply assistant.

use anyhow::{bail, Context, Result};
use assistant_core::{
    Config, JsonFileSettingsStore, OptionLabel, ReplyAssistant, ReplyResult, SettingKey, Settings,
    SuggestionRequest,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::StreamExt;
use openrouter_client::OpenRouterClient;
use page_extraction::{ExtractionOrchestrator, HtmlDocument};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "assistant")]
#[command(about = "Extract thread content and stream reply suggestions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the post snapshot as JSON
    Snapshot {
        /// Saved page HTML
        html: PathBuf,

        /// Page URL (used for the channel and page type)
        #[arg(long)]
        url: Option<String>,
    },

    /// List the comments found on the page
    Comments {
        html: PathBuf,

        #[arg(long)]
        url: Option<String>,
    },

    /// Stream reply suggestions for the post or one comment
    Suggest {
        html: PathBuf,

        #[arg(long)]
        url: Option<String>,

        /// Reply to the Nth comment (1-based) instead of the post
        #[arg(long)]
        comment: Option<usize>,

        /// Extra requirements for this reply (also saved for next time)
        #[arg(long)]
        requirements: Option<String>,
    },

    /// Translate and explain the post or one comment
    Translate {
        html: PathBuf,

        #[arg(long)]
        url: Option<String>,

        /// Translate the Nth comment (1-based) instead of the post
        #[arg(long)]
        comment: Option<usize>,
    },

    /// Show or change stored settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print every setting (the API key is redacted)
    Show,

    /// Store one setting
    Set {
        /// api-key, prompt-template, translation-prompt or additional-requirements
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,assistant_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let store = Arc::new(JsonFileSettingsStore::new(&config.settings_path));
    let mut settings = Settings::load(store).context("Failed to load settings")?;
    if let Some(key) = config.api_key.clone() {
        settings.override_api_key(key);
    }

    let orchestrator = ExtractionOrchestrator::default();

    match cli.command {
        Commands::Snapshot { html, url } => {
            let doc = load_document(&html, url.as_deref())?;
            let snapshot = orchestrator.snapshot(&doc);

            let mut json = serde_json::to_value(&snapshot)?;
            json["fingerprint"] = snapshot.fingerprint().into();
            json["postDetailPage"] = orchestrator.is_post_detail_page(&doc).into();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }

        Commands::Comments { html, url } => {
            let doc = load_document(&html, url.as_deref())?;
            let comments = orchestrator.find_comments(&doc);

            if comments.is_empty() {
                println!("{}", "No comments found".yellow());
            }
            for (i, comment) in comments.into_iter().enumerate() {
                let text = orchestrator.extract_comment(&doc, comment);
                println!(
                    "{} {}",
                    format!("[{}]", i + 1).bright_cyan(),
                    text.value_or("(no text found)")
                );
            }
        }

        Commands::Suggest {
            html,
            url,
            comment,
            requirements,
        } => {
            let doc = load_document(&html, url.as_deref())?;
            let snapshot = orchestrator.snapshot(&doc);
            print_post_header(&snapshot);

            let mut request = SuggestionRequest::for_post(&snapshot);
            if let Some(n) = comment {
                request = request.replying_to(comment_text(&orchestrator, &doc, n)?);
            }
            if let Some(requirements) = requirements.filter(|r| !r.trim().is_empty()) {
                let requirements = requirements.trim().to_string();
                settings
                    .set_additional_requirements(&requirements)
                    .context("Failed to save requirements")?;
                request = request.with_requirements(requirements);
            }

            let assistant = ReplyAssistant::new(client(&config), settings, &config.model);
            let mut replies = match assistant.suggest(&request).await {
                Ok(replies) => replies,
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red().bold(), e);
                    std::process::exit(1);
                }
            };

            let mut last: Option<ReplyResult> = None;
            while let Some(update) = replies.next().await {
                match update {
                    Ok(result) => {
                        render_progress(&result);
                        last = Some(result);
                    }
                    Err(e) => {
                        eprintln!();
                        eprintln!("{} {}", "Error:".bright_red().bold(), e);
                        std::process::exit(1);
                    }
                }
            }
            eprintln!();

            match last {
                Some(result) => render_options(&result),
                None => bail!("No reply received"),
            }
        }

        Commands::Translate { html, url, comment } => {
            let doc = load_document(&html, url.as_deref())?;
            let content = match comment {
                Some(n) => comment_text(&orchestrator, &doc, n)?,
                None => orchestrator.snapshot(&doc).original_post(),
            };
            if content.trim().is_empty() {
                bail!("Nothing to translate");
            }

            let assistant = ReplyAssistant::new(client(&config), settings, &config.model);
            let mut text = match assistant.translate(&content).await {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("{} {}", "Error:".bright_red().bold(), e);
                    std::process::exit(1);
                }
            };

            let mut printed = 0;
            let mut stdout = std::io::stdout();
            while let Some(update) = text.next().await {
                let full = match update {
                    Ok(full) => full,
                    Err(e) => {
                        eprintln!();
                        eprintln!("{} {}", "Translation error:".bright_red().bold(), e);
                        std::process::exit(1);
                    }
                };
                write!(stdout, "{}", &full[printed..])?;
                stdout.flush()?;
                printed = full.len();
            }
            println!();
        }

        Commands::Settings(SettingsCommand::Show) => {
            for key in SettingKey::ALL {
                println!("{}", key.storage_name().bright_cyan().bold());
                let value = settings.display_value(key);
                if value.is_empty() {
                    println!("  {}", "(not set)".dimmed());
                } else {
                    for line in value.lines() {
                        println!("  {}", line);
                    }
                }
            }
        }

        Commands::Settings(SettingsCommand::Set { key, value }) => {
            let key: SettingKey = key.parse()?;
            settings.set(key, &value)?;
            println!("{} {}", "✓ Saved".bright_green(), key);
        }
    }

    Ok(())
}

fn load_document(path: &Path, url: Option<&str>) -> Result<HtmlDocument> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = HtmlDocument::parse(&html);
    match url {
        Some(url) => doc.with_url(url).with_context(|| format!("Invalid URL: {}", url)),
        None => Ok(doc),
    }
}

fn comment_text(orchestrator: &ExtractionOrchestrator, doc: &HtmlDocument, n: usize) -> Result<String> {
    let comments = orchestrator.find_comments(doc);
    let Some(comment) = n.checked_sub(1).and_then(|i| comments.get(i).copied()) else {
        bail!("Comment {} not found ({} on page)", n, comments.len());
    };

    match orchestrator.extract_comment(doc, comment).value {
        Some(text) => Ok(text),
        None => bail!("Comment {} has no readable text", n),
    }
}

fn client(config: &Config) -> OpenRouterClient {
    OpenRouterClient::new().with_base_url(&config.base_url)
}

fn print_post_header(snapshot: &page_extraction::PostSnapshot) {
    eprintln!(
        "{} {}",
        "Post:".bright_blue().bold(),
        snapshot.title.value_or("(no title found)")
    );
    eprintln!(
        "{} r/{}  {} {}  {} {}",
        "Channel:".bright_blue(),
        snapshot.channel.value_or("?"),
        "Comments:".bright_blue(),
        snapshot.metrics.comment_count.value_or("Unknown"),
        "Upvoted:".bright_blue(),
        snapshot.metrics.upvote_ratio.value_or("Unknown"),
    );
}

fn render_progress(result: &ReplyResult) {
    let chars: usize = result.options.iter().map(|o| o.text.chars().count()).sum();
    let labels: Vec<_> = result.options.iter().map(|o| o.label.title()).collect();
    eprint!(
        "\r{} {} ({} chars)   ",
        "Generating…".dimmed(),
        labels.join(", "),
        chars
    );
}

fn render_options(result: &ReplyResult) {
    for (i, option) in result.options.iter().enumerate() {
        let heading = match option.label {
            OptionLabel::Single => option.label.title().to_string(),
            label => format!("Option {}: {}", i + 1, label),
        };
        println!("{}", heading.bright_green().bold());
        println!("{}", option.text);
        println!();
    }
}
