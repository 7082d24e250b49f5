//! parley CLI: terminal chat shell over a conversation store

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use parley_engine::{
    config_path, exchange, format_relative, resolve_data_dir, store_dir, Config, Conversation,
    ConversationStore, FileStore, HttpReplyClient, Reaction, RevealHandle,
};
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PARLEY_LOG";

type CliResult = Result<(), Box<dyn Error>>;

/// Chat shell with persistent conversations and a typing reveal
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory (defaults to $PARLEY_HOME or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// List conversations, most recent first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a conversation (the current one by default)
    Show {
        #[arg(long)]
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start a new conversation and select it
    New,

    /// Delete a conversation
    Delete { id: String },

    /// Rename a conversation
    Rename { id: String, title: String },

    /// Toggle a reaction on an assistant message
    React {
        id: String,
        message_id: String,
        reaction: ReactionArg,
    },

    /// Send a message and print the reply
    Send {
        message: String,

        /// Conversation to send to (the current one by default)
        #[arg(long)]
        id: Option<String>,

        /// Print the reply at once instead of revealing it
        #[arg(long)]
        no_typing: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigAction {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ReactionArg {
    Up,
    Down,
}

impl From<ReactionArg> for Reaction {
    fn from(arg: ReactionArg) -> Self {
        match arg {
            ReactionArg::Up => Reaction::Up,
            ReactionArg::Down => Reaction::Down,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir.as_deref());
    let command = cli.command.unwrap_or(Commands::Tui);

    init_logging(&data_dir, command == Commands::Tui);
    info!(data_dir = %data_dir.display(), "Starting parley");

    if let Err(e) = run(command, &data_dir) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the log subscriber. The TUI owns the screen, so it logs to a file.
fn init_logging(data_dir: &Path, to_file: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        let file = std::fs::create_dir_all(data_dir).and_then(|()| {
            File::options()
                .create(true)
                .append(true)
                .open(data_dir.join("parley.log"))
        });
        if let Ok(file) = file {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(command: Commands, data_dir: &Path) -> CliResult {
    let config = Config::load_or_default(&config_path(data_dir))?;

    match command {
        Commands::Tui => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(parley_tui::run_tui(data_dir, config))
        }
        Commands::List { json } => cmd_list(data_dir, &config, json),
        Commands::Show { id, json } => cmd_show(data_dir, &config, id.as_deref(), json),
        Commands::New => cmd_new(data_dir, &config),
        Commands::Delete { id } => {
            let mut store = open_store(data_dir, &config)?;
            if !store.delete(&id) {
                return Err(format!("No conversation with id {id}").into());
            }
            println!("Deleted {id}");
            Ok(())
        }
        Commands::Rename { id, title } => {
            let mut store = open_store(data_dir, &config)?;
            if !store.rename(&id, title.as_str()) {
                return Err(format!("No conversation with id {id}").into());
            }
            println!("Renamed {id} to \"{title}\"");
            Ok(())
        }
        Commands::React {
            id,
            message_id,
            reaction,
        } => {
            let mut store = open_store(data_dir, &config)?;
            match store.toggle_reaction(&id, &message_id, reaction.into()) {
                Some(Some(r)) => println!("Reaction set to {}", r.emoji()),
                Some(None) => println!("Reaction cleared"),
                None => return Err(format!("No assistant message {message_id} in {id}").into()),
            }
            Ok(())
        }
        Commands::Send {
            message,
            id,
            no_typing,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cmd_send(data_dir, &config, &message, id, no_typing))
        }
        Commands::Config { action } => cmd_config(data_dir, &config, &action),
    }
}

fn open_store(
    data_dir: &Path,
    config: &Config,
) -> Result<ConversationStore<FileStore>, Box<dyn Error>> {
    let backend = FileStore::new(store_dir(data_dir))?;
    let mut store = ConversationStore::with_key(backend, config.storage_key.clone());
    let bootstrap = store.initialize();
    info!(?bootstrap, "Conversation store ready");
    Ok(store)
}

fn cmd_list(data_dir: &Path, config: &Config, json: bool) -> CliResult {
    let store = open_store(data_dir, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(store.conversations())?);
        return Ok(());
    }

    let now = Utc::now();
    for convo in store.conversations() {
        let marker = if store.current_id() == Some(convo.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {}  {}  ({}, {})",
            convo.id,
            convo.title,
            message_count(convo),
            format_relative(convo.updated_at, now)
        );
    }
    Ok(())
}

fn cmd_show(data_dir: &Path, config: &Config, id: Option<&str>, json: bool) -> CliResult {
    let store = open_store(data_dir, config)?;
    let convo = match id {
        Some(id) => store
            .get(id)
            .ok_or_else(|| format!("No conversation with id {id}"))?,
        None => store.current().ok_or("No current conversation")?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(convo)?);
        return Ok(());
    }

    println!("{} ({})\n", convo.title, message_count(convo));
    let now = Utc::now();
    for message in &convo.messages {
        let reaction = message
            .reaction
            .map(|r| format!("  {}", r.emoji()))
            .unwrap_or_default();
        println!(
            "{} · {}{reaction}  [{}]",
            message.role.label(),
            format_relative(message.timestamp, now),
            message.id
        );
        println!("{}\n", message.content);
    }
    Ok(())
}

fn cmd_new(data_dir: &Path, config: &Config) -> CliResult {
    let mut store = open_store(data_dir, config)?;
    let id = store.create_new();
    println!("{id}");
    Ok(())
}

async fn cmd_send(
    data_dir: &Path,
    config: &Config,
    message: &str,
    id: Option<String>,
    no_typing: bool,
) -> CliResult {
    let mut store = open_store(data_dir, config)?;
    let conversation_id = match id {
        Some(id) => id,
        None => store
            .current_id()
            .map(str::to_string)
            .ok_or("No current conversation")?,
    };
    let client = HttpReplyClient::from_config(config)?;

    let reply = exchange(&mut store, &client, &conversation_id, message)
        .await
        .ok_or_else(|| format!("No conversation with id {conversation_id}"))?;

    if reply.is_typing && !no_typing {
        reveal(&reply.content, config).await?;
    } else {
        println!("{}", reply.content);
    }

    if reply.is_typing {
        store.finish_typing(&conversation_id, &reply.id);
    }
    Ok(())
}

/// Print `text` as the reveal publishes it.
async fn reveal(text: &str, config: &Config) -> io::Result<()> {
    let mut handle = RevealHandle::spawn(text, config.typing_interval());
    let mut stdout = io::stdout();
    let mut printed = 0;

    while let Some(frame) = handle.changed().await {
        if let Some(fresh) = frame.revealed.get(printed..) {
            stdout.write_all(fresh.as_bytes())?;
            stdout.flush()?;
        }
        printed = frame.revealed.len();
        if !frame.in_progress {
            break;
        }
    }

    // A reveal cut short still ends with the whole reply on screen
    if let Some(rest) = text.get(printed..) {
        stdout.write_all(rest.as_bytes())?;
    }
    writeln!(stdout)
}

fn cmd_config(data_dir: &Path, config: &Config, action: &ConfigAction) -> CliResult {
    let path = config_path(data_dir);
    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                Config::default().save(&path)?;
                println!("Wrote default config to {}", path.display());
            }
        }
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

fn message_count(convo: &Conversation) -> String {
    match convo.messages.len() {
        1 => "1 message".to_string(),
        n => format!("{n} messages"),
    }
}
