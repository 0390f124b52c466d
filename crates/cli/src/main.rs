use clap::{Parser, Subcommand};
use lib::dialogflow::{DetectIntentRequest, SessionClient};

#[derive(Parser)]
#[command(name = "counselor-relay")]
#[command(about = "Relay client agent messages to the counselor agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the fulfillment webhook. Messages classified as SendMessageToCounselor are forwarded to the counselor session.
    Serve {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.counselor-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message straight to the counselor session and print its reply (diagnostics).
    Send {
        /// Message text
        text: String,

        /// Config file path (default: RELAY_CONFIG_PATH or ~/.counselor-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Intent to force on the counselor side (default from config)
        #[arg(long, value_name = "NAME")]
        intent: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("counselor-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            text,
            config,
            intent,
        }) => {
            if let Err(e) = run_send(config, text, intent).await {
                log::error!("send failed: {:#}", e);
                eprintln!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    lib::gateway::run_gateway(config, path).await
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    text: String,
    intent: Option<String>,
) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    let client = lib::gateway::counselor_client(&config, &path)?;
    let intent = intent.unwrap_or_else(|| config.counselor.intent.clone());
    let request = DetectIntentRequest::new(client.session().clone(), text)
        .with_language_code(config.counselor.language_code.as_str())
        .with_forced_intent(intent);
    let result = client.detect_intent(&request).await?;
    println!("< {}", result.fulfillment_text.trim());
    Ok(())
}
