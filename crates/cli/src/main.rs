use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "line-relay")]
#[command(about = "LINE webhook relay answering messages with Gemini", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory with a default config and editable prompt files (PERSONA.md, KNOWLEDGE.md).
    Init {
        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook server. Secrets come from LINE_CHANNEL_ACCESS_TOKEN, LINE_CHANNEL_SECRET and GEMINI_API_KEY (or the config file).
    Serve {
        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default: PORT env, then config, then 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the full prompt that would be sent to Gemini for a message.
    Prompt {
        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// User message to append after the persona and knowledge context.
        #[arg(default_value = "")]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("line-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Prompt { config, message }) => {
            if let Err(e) = run_prompt(config, &message) {
                log::error!("prompt failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    config.gateway.port = port.unwrap_or_else(|| lib::config::resolve_port(&config));
    log::info!("starting webhook server on {}:{}", config.gateway.bind, config.gateway.port);
    lib::gateway::run_gateway(config, path).await
}

fn run_prompt(config_path: Option<std::path::PathBuf>, message: &str) -> anyhow::Result<()> {
    let (config, path) = lib::config::load_config(config_path)?;
    let prompt_dir = lib::config::resolve_prompt_dir(&config, &path);
    let ctx = lib::prompt::load_prompt_context(Some(prompt_dir.as_path()));
    let builder = lib::prompt::PromptBuilder::new(&ctx);
    println!("{}", builder.build(message));
    Ok(())
}
