//! Nexus CLI - terminal chat client for the streaming router.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use nexus_core::{Attachment, Conversation, PersonalityMode, Role};
use nexus_router::{classify, Router, RouterConfig};

/// Nexus CLI - chat with text, vision and image backends
#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "Terminal chat client for Nexus", long_about = None)]
struct Cli {
    /// Personality (conversational, academic, brainrot, roast-master, formal, zesty)
    #[arg(short, long, default_value = "conversational")]
    personality: PersonalityMode,

    /// Base URL of an OpenAI-compatible API (overrides NEXUS_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// File to attach to the first message (repeatable)
    #[arg(short, long = "attach")]
    attachments: Vec<PathBuf>,

    /// Prompt to send; without one, read prompts from stdin
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout carries only the reply
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let api_base = cli.api_base;
    let config = RouterConfig::from_lookup(move |key| match (key, &api_base) {
        ("NEXUS_API_BASE", Some(base)) => Some(base.clone()),
        _ => std::env::var(key).ok(),
    });
    let router = Router::new(config);

    let mut attachments = Vec::with_capacity(cli.attachments.len());
    for path in &cli.attachments {
        attachments.push(load_attachment(path)?);
    }

    let mut conversation = Conversation::with_greeting();
    println!("{}\n", nexus_core::GREETING);

    if let Some(prompt) = cli.prompt {
        send(&router, &mut conversation, cli.personality, prompt, attachments).await?;
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = attachments;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let attachments = std::mem::take(&mut pending);
        send(&router, &mut conversation, cli.personality, line.to_string(), attachments).await?;
    }

    Ok(())
}

/// Send one user turn and print the reply as it streams in.
async fn send(
    router: &Router,
    conversation: &mut Conversation,
    personality: PersonalityMode,
    prompt: String,
    attachments: Vec<Attachment>,
) -> Result<(), Box<dyn std::error::Error>> {
    conversation.push_user(prompt, attachments);
    let pending = conversation
        .last()
        .map(|turn| classify(turn).pending_role())
        .unwrap_or(Role::Typing);
    let mut updates = router.stream_reply(conversation.messages(), personality);
    let reply_id = conversation.begin_reply(pending);
    if let Some(indicator) = pending.indicator() {
        eprintln!("{}", indicator);
    }

    let mut stdout = std::io::stdout();
    let mut renderer = ReplyRenderer::default();
    while let Some(update) = updates.next().await {
        conversation.apply_update(&reply_id, &update)?;

        if update.error {
            error!(message = %update.text, "Reply failed");
            eprintln!("\n{}", update.text);
            break;
        }

        write!(stdout, "{}", renderer.render(&update.text))?;
        stdout.flush()?;

        if update.is_complete {
            break;
        }
    }
    println!("\n");

    debug!(messages = conversation.messages().len(), "Turn finished");
    Ok(())
}

/// Turns cumulative reply snapshots into terminal output.
///
/// A snapshot that extends the previous one prints only the new part. Any
/// other snapshot replaces the reply, so it goes on a fresh line in full.
#[derive(Debug, Default)]
struct ReplyRenderer {
    shown: String,
}

impl ReplyRenderer {
    fn render(&mut self, text: &str) -> String {
        let output = match text.strip_prefix(self.shown.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{}", text),
        };
        self.shown = text.to_string();
        output
    }
}

/// Read a file from disk as an attachment.
fn load_attachment(path: &Path) -> Result<Attachment, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Attachment::from_file(name, mime_type(path), &bytes))
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "text/plain",
    }
}
