//! Prompt Enhancer - rewrite selected prompts through a webhook
//!
//! Command-line driver for the enhancement pipeline and its settings.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prompt_enhancer::config::{
    install_defaults, Config, JsonFileStore, SettingsStore, Transport, KEY_ENABLED,
    KEY_SHOW_NOTIFICATIONS, KEY_WEBHOOK_URL, SETTINGS_KEYS,
};
use prompt_enhancer::core::RequesterOptions;
use prompt_enhancer::document::{Document, MemoryDocument};
use prompt_enhancer::pipeline::{PageEvent, PromptEnhancer};
use prompt_enhancer::relay::create_relay;
use prompt_enhancer::shared;
use prompt_enhancer::status::{check_connection, static_status, test_connection};
use prompt_enhancer::trigger::ClickTarget;
use prompt_enhancer::utils::is_valid_url;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enhance a piece of text through the configured webhook
    Enhance {
        /// Text to enhance
        #[arg(short, long)]
        text: String,

        /// Call the webhook directly instead of going through the background relay
        #[arg(long)]
        direct: bool,
    },

    /// Show the connection status
    Status,

    /// Send a test request to the webhook
    TestConnection,

    /// Read or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print the current settings
    Show,

    /// Change one setting
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    // Setup logging
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::open_default()?);
    install_defaults(store.as_ref())?;

    match args.command {
        Command::Enhance { text, direct } => run_enhance(config, store, &text, direct).await,
        Command::Status => {
            let settings = store.settings()?;
            println!("Webhook: {}", settings.webhook_url);
            println!("Status:  {}", static_status(&settings));
            let status = check_connection(&settings).await;
            match status.detail() {
                Some(detail) => println!("Check:   {} ({})", status, detail),
                None => println!("Check:   {}", status),
            }
            Ok(())
        }
        Command::TestConnection => {
            let settings = store.settings()?;
            let status = test_connection(&settings).await;
            match status.detail() {
                Some(detail) => bail!("Connection failed: {}", detail),
                None => {
                    println!("Connection successful! ✅");
                    Ok(())
                }
            }
        }
        Command::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = store.settings()?;
                println!("{}", serde_json::to_string_pretty(&settings)?);
                Ok(())
            }
            SettingsAction::Set { key, value } => {
                let value = parse_setting(&key, &value)?;
                store.set(&key, value)?;
                println!("Settings saved successfully!");
                Ok(())
            }
        },
    }
}

async fn run_enhance(
    mut config: Config,
    store: Arc<dyn SettingsStore>,
    text: &str,
    direct: bool,
) -> Result<()> {
    if direct {
        config.transport = Transport::Direct;
    }
    let handle = create_relay(&config, store)?;

    let mut doc = MemoryDocument::with_text(&[text]);
    doc.select_all();
    let anchor = doc
        .selection()
        .and_then(|s| s.rect)
        .map(|r| r.anchor(&doc.viewport()))
        .unwrap_or_default();

    let options = RequesterOptions {
        page_url: config.page_url.clone(),
        tab_id: None,
        relay_timeout: config.relay_timeout_secs.map(Duration::from_secs),
    };
    let enhancer = PromptEnhancer::new(shared(doc), handle.relay.clone(), options);

    enhancer.dispatch(PageEvent::PointerRelease(anchor)).await?;
    if enhancer.tracker().lock().map(|t| t.snapshot().is_none()).unwrap_or(true) {
        bail!("Text is too short to enhance");
    }

    let report = enhancer
        .dispatch(PageEvent::Click(ClickTarget::Control))
        .await?
        .context("Enhancement did not start")?;
    info!("Activation finished: {:?}", report.result);

    let notice = enhancer
        .feedback()
        .lock()
        .ok()
        .and_then(|mut f| f.current().map(|n| format!("[{}] {}", n.kind, n.message)));
    if let Some(notice) = notice {
        eprintln!("{}", notice);
    }

    if !report.result.is_success() {
        bail!("No enhanced text");
    }
    let document = enhancer
        .document()
        .lock()
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .text();
    println!("{}", document);
    Ok(())
}

fn parse_setting(key: &str, raw: &str) -> Result<Value> {
    match key {
        KEY_ENABLED | KEY_SHOW_NOTIFICATIONS => {
            let flag: bool = raw
                .parse()
                .with_context(|| format!("'{}' expects true or false", key))?;
            Ok(Value::Bool(flag))
        }
        KEY_WEBHOOK_URL => {
            if !is_valid_url(raw) {
                bail!("webhook URL must be http(s): {}", raw);
            }
            Ok(Value::String(raw.to_string()))
        }
        other => bail!(
            "Unknown setting '{}'. Known settings: {}",
            other,
            SETTINGS_KEYS.join(", ")
        ),
    }
}
