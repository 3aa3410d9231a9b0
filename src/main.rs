//! agent-starter CLI entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agent_starter::agent::{Agent, ProviderRegistry};
use agent_starter::config::{self, Config, LoopMode};

#[derive(Parser)]
#[command(name = "agent-starter")]
#[command(about = "Minimal Sense -> Plan -> Act -> Reflect agent over a local LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Chat with the agent
    Agent {
        /// Message to send to the agent
        #[arg(short, long)]
        message: Option<String>,

        /// Run the full plan/act/reflect cycle instead of the configured mode
        #[arg(long)]
        cycle: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_starter=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                println!("Config already exists at {:?} (use --force to overwrite)", path);
            } else {
                config::save(&Config::default())?;
                println!("✓ Wrote default config to {:?}", path);
            }
        }

        Commands::Agent { message, cycle } => {
            let config = config::load()?;
            let mode = if cycle { LoopMode::Cycle } else { config.mode };
            let agent = Agent::from_config(&config)?;

            if let Some(msg) = message {
                let answer = agent.respond(&msg, mode).await?;
                println!("{}", answer.summary);
                for citation in &answer.citations {
                    println!("  - {}", citation);
                }
            } else {
                println!("Interactive mode ({:?}); type 'exit' to quit\n", mode);
                run_interactive(&agent, mode).await?;
            }
        }

        Commands::Serve { host, port } => {
            let mut config = config::load()?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            agent_starter::api::serve(config).await?;
        }

        Commands::Status => {
            let config = config::load()?;
            let supported = ProviderRegistry::available().contains(&config.provider.as_str());

            println!("Config file: {:?}", config::config_path());
            println!(
                "Provider: {}{}",
                config.provider,
                if supported { "" } else { " (unsupported)" }
            );
            println!("Model: {}", config.model);
            println!("Base URL: {}", config.base_url);
            println!("Mode: {:?}", config.mode);
            println!("Allowed tools: {}", config.allowed_tools.join(", "));
            println!("Memory window: {}", config.memory_window);
            println!("Listen: {}", config.bind_addr());
            println!("Max sessions: {}", config.max_sessions);
        }
    }

    Ok(())
}

async fn run_interactive(agent: &Agent, mode: LoopMode) -> Result<()> {
    use std::io::{self, Write};

    loop {
        print!("\x1b[1;34mYou\x1b[0m: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Bye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        match agent.respond(input, mode).await {
            Ok(answer) => println!("\n\x1b[1;32mAgent\x1b[0m: {}\n", answer.summary),
            Err(e) => println!("\n\x1b[1;31mError\x1b[0m: {}\n", e),
        }
    }

    Ok(())
}
