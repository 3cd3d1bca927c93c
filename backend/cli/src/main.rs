mod chat_cmd;
mod status_cmd;
mod terminal_output;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use chatrelay_chat::{ChatOrchestrator, ChatSettings, MemorySessionStore};
use chatrelay_completion::build_client;
use chatrelay_config::{ChatRelayConfig, ValidationReport};
use chatrelay_core::ChatError;
use chatrelay_gateway::{start_server, GatewayState, SessionSigner};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(about = "Web chat relay for streaming LLM completions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Query a running server's health endpoint
    Status {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Chat with a running server from the terminal
    Chat {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, report) = chatrelay_config::load();

    chatrelay_logging::init_logger(&config.log_settings());

    match cli.command {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            log_report(&report);
            if !report.is_valid() {
                bail!("invalid configuration ({} errors)", report.errors.len());
            }
            run_server(config).await?;
        }
        Commands::Status { url } => status_cmd::run(&url).await?,
        Commands::Chat { url } => chat_cmd::run(&url).await?,
    }

    Ok(())
}

fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    for err in &report.errors {
        error!(path = %err.path, "{}", err.message);
    }
}

fn chat_settings(config: &ChatRelayConfig) -> ChatSettings {
    let defaults = ChatSettings::default();
    ChatSettings {
        system_prompt: config
            .chat
            .system_prompt
            .clone()
            .unwrap_or(defaults.system_prompt),
        model: config.provider.model.clone(),
        temperature: config.provider.temperature,
        max_tokens: config.provider.max_tokens,
        relay_buffer: defaults.relay_buffer,
    }
}

async fn run_server(config: ChatRelayConfig) -> Result<()> {
    info!(
        config = %chatrelay_config::redact(&config),
        "Starting chatrelay"
    );

    let client = match build_client(config.provider.api_key.as_deref(), &config.provider.base_url) {
        Ok(client) => {
            info!(
                provider = client.name(),
                model = %config.provider.model,
                "Completion provider ready"
            );
            Some(client)
        }
        Err(ChatError::Unconfigured) => {
            warn!("GROQ_API_KEY not set; chat requests will receive an error reply");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let store = Arc::new(MemorySessionStore::new(config.session.ttl()));
    let orchestrator = ChatOrchestrator::new(client, store, chat_settings(&config));
    let signer = SessionSigner::from_secret(config.session.secret_key.as_deref())?;

    start_server(&config.listen_address(), GatewayState::new(orchestrator, signer)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "chatrelay", "serve", "--port", "9000", "--bind", "127.0.0.1",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve { port, bind } => {
                assert_eq!(port, Some(9000));
                assert_eq!(bind.as_deref(), Some("127.0.0.1"));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn settings_follow_config() {
        let mut config = ChatRelayConfig::default();
        config.provider.model = "other-model".into();
        config.provider.temperature = 0.2;
        assert_eq!(chat_settings(&config).model, "other-model");
        assert_eq!(
            chat_settings(&config).system_prompt,
            chatrelay_chat::DEFAULT_SYSTEM_PROMPT
        );

        config.chat.system_prompt = Some("Be terse.".into());
        let settings = chat_settings(&config);
        assert_eq!(settings.system_prompt, "Be terse.");
        assert_eq!(settings.temperature, 0.2);
    }
}
