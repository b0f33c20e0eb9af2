use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use voxkb::console::{self, ConsoleCaptureEngine, ConsoleSpeechEngine, ConsoleView};
use voxkb::knowledge::source_for;
use voxkb::voice::{SpeechOutput, Utterance};
use voxkb::{
    Components, Config, CredentialStore, FileCredentialStore, HttpCompletionClient,
    KnowledgeStore, QueryOutcome, QueryPipeline, Session,
};

/// voxkb - Ask a knowledge base out loud
#[derive(Parser)]
#[command(name = "voxkb", version, about)]
struct Cli {
    /// Locale to answer and speak in (e.g., "hu-HU", "en-US")
    #[arg(short, long)]
    locale: Option<String>,

    /// Knowledge base path or URL
    #[arg(short, long)]
    knowledge: Option<String>,

    /// Chat-completions endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session: each line typed is one spoken question
    Run,
    /// Answer a single question and exit
    Ask {
        /// The question
        question: String,
    },
    /// Manage the API token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store a token (prompts when no value is given)
    Set {
        /// Token value
        value: Option<String>,
    },
    /// Remove the stored token
    Clear,
    /// Show whether a token is configured
    Status,
}

/// Grace period for runtime shutdown; a blocked stdin read is abandoned after it
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Log to stderr so answers on stdout stay clean
    let filter = match cli.verbose {
        0 => "warn,voxkb=info",
        1 => "info,voxkb=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    };

    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    code
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, &cli)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(config).await,
        Command::Ask { question } => cmd_ask(config, &question).await,
        Command::Token { action } => cmd_token(&config, action).map(|()| ExitCode::SUCCESS),
        Command::Config => {
            print_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Command-line flags win over environment and config file
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(locale) = &cli.locale {
        config.locale = locale.parse()?;
    }
    if let Some(knowledge) = &cli.knowledge {
        config.knowledge.clone_from(knowledge);
    }
    if let Some(endpoint) = &cli.endpoint {
        config.completion.endpoint.clone_from(endpoint);
    }
    if let Some(model) = &cli.model {
        config.completion.model.clone_from(model);
    }
    Ok(())
}

async fn load_store(config: &Config) -> anyhow::Result<KnowledgeStore> {
    let source = source_for(&config.knowledge)?;
    Ok(KnowledgeStore::load_or_empty(source.as_ref()).await)
}

fn completion_client(config: &Config) -> anyhow::Result<Arc<HttpCompletionClient>> {
    let client = HttpCompletionClient::new(
        &config.completion.endpoint,
        &config.completion.model,
        config.completion.timeout,
    )?;
    Ok(Arc::new(client))
}

/// Interactive console session
async fn cmd_run(config: Config) -> anyhow::Result<ExitCode> {
    tracing::info!(
        locale = %config.locale,
        knowledge = %config.knowledge,
        model = %config.completion.model,
        "starting voxkb"
    );

    let store = load_store(&config).await?;
    let credentials = config.credential_store();
    let capture = Arc::new(ConsoleCaptureEngine::new());

    let session = Session::new(Components {
        locale: config.locale,
        voice: config.voice_settings(),
        store,
        completion: completion_client(&config)?,
        credentials: Arc::clone(&credentials),
        capture: capture.clone(),
        speech: Arc::new(ConsoleSpeechEngine),
        view: Arc::new(ConsoleView::new(config.locale)),
    });

    let (triggers, trigger_rx) = mpsc::channel(8);
    let reader = console::spawn_stdin_reader(capture, credentials, triggers);

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        tracing::info!("interrupted");
        interrupt.cancel();
    });

    session.run(trigger_rx, shutdown).await;

    reader.abort();
    Ok(ExitCode::SUCCESS)
}

/// One question, one answer
async fn cmd_ask(config: Config, question: &str) -> anyhow::Result<ExitCode> {
    let view = Arc::new(ConsoleView::new(config.locale));
    let speech = SpeechOutput::new(Arc::new(ConsoleSpeechEngine), config.voice_settings());

    let pipeline = QueryPipeline::new(
        config.locale,
        load_store(&config).await?,
        completion_client(&config)?,
        config.credential_store(),
        speech.clone(),
        view,
    );

    let outcome = pipeline.handle(question).await;

    if let QueryOutcome::Answered(reply) = &outcome {
        let voice = config.voice_settings();
        let playback = ConsoleSpeechEngine::playback_time(&Utterance {
            text: reply.clone(),
            lang: voice.lang,
            rate: voice.rate,
            pitch: voice.pitch,
        });
        if tokio::time::timeout(playback + Duration::from_secs(1), speech.wait_silent())
            .await
            .is_err()
        {
            tracing::warn!("speech did not finish in time");
        }
    }
    speech.cancel();

    Ok(match outcome {
        QueryOutcome::Answered(_) => ExitCode::SUCCESS,
        QueryOutcome::MissingCredential | QueryOutcome::Failed => ExitCode::FAILURE,
    })
}

/// Manage the stored token
fn cmd_token(config: &Config, action: TokenAction) -> anyhow::Result<()> {
    let store = FileCredentialStore::new(config.credential.file.clone());

    match action {
        TokenAction::Set { value } => {
            let token = match value {
                Some(v) => v,
                None => dialoguer::Password::new()
                    .with_prompt("API token")
                    .interact()?,
            };
            store.set(&token)?;
            println!("Token saved to {}", store.path().display());
            if config.credential.token.is_some() {
                println!("Note: VOXKB_TOKEN is set and takes precedence");
            }
        }
        TokenAction::Clear => {
            store.clear()?;
            println!("Token removed from {}", store.path().display());
        }
        TokenAction::Status => {
            if config.credential.token.is_some() {
                println!("Token: set (VOXKB_TOKEN)");
            } else if store.get().is_some() {
                println!("Token: set ({})", store.path().display());
            } else {
                println!("Token: not set");
            }
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    let config_file = voxkb::config::file::config_file_path()
        .map_or_else(|| "(unavailable)".to_string(), |p| p.display().to_string());

    println!("config file:     {config_file}");
    println!("locale:          {}", config.locale);
    println!("knowledge:       {}", config.knowledge);
    println!("endpoint:        {}", config.completion.endpoint);
    println!("model:           {}", config.completion.model);
    println!("timeout:         {}s", config.completion.timeout.as_secs());
    println!("credential file: {}", config.credential.file.display());
    println!("speech rate:     {}", config.speech.rate);
    println!("speech pitch:    {}", config.speech.pitch);
}
