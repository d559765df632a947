//! Shinogramma bot bootstrap
//!
//! Loads and completes the bot's settings file before anything else runs.
//!
//! # Startup Flow
//!
//! ```text
//!   schema (app.rs) + components (notify, monitor)
//!        │
//!        ▼
//!   ┌──────────────┐   missing required value   ┌────────────┐
//!   │  fill pass   │ ─────────────────────────▶ │  operator  │
//!   │              │ ◀───────────────────────── │  (stdin)   │
//!   └──────┬───────┘                            └────────────┘
//!          │ write config.ini
//!          ▼
//!   ┌──────────────┐
//!   │populate pass │  coerce every value to its declared type
//!   └──────┬───────┘
//!          ▼
//!   Arc<Settings>  →  log level switch  →  bot components
//! ```
//!
//! Any settings error is fatal: the process exits before contacting the
//! chat service or the recorder.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use shinogramma::app;
use shinogramma::components::notify::WebhookConfig;
use shinogramma::observability::logging::init_logging;
use shinogramma::settings::{
    load_settings, ConsolePrompter, NoPrompt, Prompter, ReconcileOptions, Settings,
    SettingsError,
};

#[derive(Parser)]
#[command(name = "shinogramma")]
#[command(about = "Telegram front end for the Shinobi video recorder", long_about = None)]
struct Cli {
    /// Settings file, created on first run.
    #[arg(short, long, default_value = app::CONFIG_FILE)]
    config: PathBuf,

    /// Fail instead of asking for missing required values.
    #[arg(long)]
    no_prompt: bool,

    /// Ignore invalid optional values instead of aborting.
    #[arg(long)]
    lenient: bool,

    /// Write defaults of absent entries into the settings file.
    #[arg(long)]
    write_defaults: bool,

    /// Log file, appended to on every run.
    #[arg(long, default_value = app::LOG_FILE)]
    log_file: PathBuf,

    /// Log to the console only.
    #[arg(long)]
    no_log_file: bool,

    /// Print the resolved settings and exit.
    #[arg(long, value_enum)]
    print: Option<PrintFormat>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PrintFormat {
    Json,
    Env,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    let mut logging = init_logging(app::DEFAULT_LOG_LEVEL, log_file);

    tracing::info!("shinogramma v{} starting", env!("CARGO_PKG_VERSION"));

    let options = ReconcileOptions {
        strict_optional: !cli.lenient,
        write_defaults: cli.write_defaults,
    };
    let mut prompter: Box<dyn Prompter> = if cli.no_prompt {
        Box::new(NoPrompt)
    } else {
        Box::new(ConsolePrompter::new())
    };

    let components = app::components();
    let settings = app::schema()
        .map_err(SettingsError::from)
        .and_then(|schema| {
            load_settings(&cli.config, &schema, &components, prompter.as_mut(), options)
        });
    let settings = match settings {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Error building and/or retrieving settings from config file, exiting"
            );
            return Err(e.into());
        }
    };

    logging.apply(app::log_level(&settings));

    if app::allowed_chats(&settings).is_empty() {
        tracing::warn!("Chat_id not defined, this could be very dangerous, continuing");
    }

    if let Some(webhook) = WebhookConfig::from_settings(&settings, "WEBHOOK") {
        tracing::info!(
            enabled = webhook.enabled,
            port = webhook.port,
            trusted = webhook.trustlist.len(),
            rate_limit = webhook.rate_limit,
            "Webhook settings"
        );
    }

    if let Some(format) = cli.print {
        print_settings(&settings, format)?;
        return Ok(());
    }

    tracing::info!(source = %settings.source().display(), "Settings ready");
    Ok(())
}

fn print_settings(settings: &Settings, format: PrintFormat) -> Result<(), serde_json::Error> {
    match format {
        PrintFormat::Json => println!("{}", serde_json::to_string_pretty(settings)?),
        PrintFormat::Env => {
            for (name, value) in settings.flatten() {
                println!("{}={}", name, value);
            }
        }
    }
    Ok(())
}
