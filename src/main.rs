use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use coldmail_lib::history::ALL_PLATFORMS;
use coldmail_lib::{db, logging, Commands, HistoryRecord};

#[derive(Parser)]
#[command(name = "coldmail", version, about = "Cold outreach message generator")]
struct App {
    /// SQLite database (defaults to $COLDMAIL_DB or ./coldmail.sqlite)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate three outreach messages
    Generate {
        #[arg(long)]
        niche: String,
        /// linkedin, email, upwork or instagram
        #[arg(long)]
        platform: String,
        #[arg(long)]
        offer: String,
        #[arg(long)]
        client_name: Option<String>,
        /// Save the message at this position (1-3) to history
        #[arg(long)]
        save: Option<usize>,
    },
    /// List saved messages
    History {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = ALL_PLATFORMS)]
        platform: String,
    },
    /// Delete a saved message
    Delete { id: String },
    /// Delete all saved messages
    Clear,
    /// Print history as JSON
    Export,
    /// Show counts by platform and niche
    Stats,
    /// View or modify settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Get { key: String },
    Set { key: String, value: String },
    List,
}

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();
    logging::init_tracing(app.verbose);

    let db_path = app.db.clone().unwrap_or_else(db::default_path);
    let commands = match Commands::open(&db_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to open {}: {}", db_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(app.command, &commands).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, commands: &Commands) -> Result<(), String> {
    match command {
        Command::Generate { niche, platform, offer, client_name, save } => {
            let (request, messages) = commands
                .generate(&niche, &platform, &offer, client_name.as_deref())
                .await?;

            for (i, message) in messages.iter().enumerate() {
                println!("[{}] {}\n", i + 1, message.tone);
                println!("{}\n", message.content);
                println!("{}", "-".repeat(60));
            }

            if let Some(position) = save {
                let message = position
                    .checked_sub(1)
                    .and_then(|i| messages.get(i))
                    .ok_or_else(|| format!("--save must be between 1 and {}", messages.len()))?;
                match commands.save(&request, message) {
                    Some(record) => println!("Saved as {}", record.id),
                    None => return Err("Failed to save message".to_string()),
                }
            }
        }
        Command::History { search, platform } => {
            let records = commands.search_and_filter(&search, &platform);
            print_records(&records);
        }
        Command::Delete { id } => {
            commands.delete_from_history(&id);
            println!("Deleted {}", id);
        }
        Command::Clear => {
            commands.clear_history();
            println!("History cleared");
        }
        Command::Export => {
            println!("{}", commands.export_history());
        }
        Command::Stats => {
            let stats = commands.history_stats();
            println!("Total: {}", stats.total);
            println!("\nBy platform:");
            for (platform, count) in &stats.by_platform {
                println!("  {:<12} {}", platform, count);
            }
            println!("\nBy niche:");
            for (niche, count) in &stats.by_niche {
                println!("  {:<30} {}", niche, count);
            }
        }
        Command::Config { action } => match action {
            ConfigAction::Get { key } => match commands.get_setting(&key)? {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            },
            ConfigAction::Set { key, value } => {
                commands.set_setting(&key, &value)?;
                println!("{} updated", key);
            }
            ConfigAction::List => {
                for setting in commands.get_settings()? {
                    let value = if setting.key == "api_key" { "********".to_string() } else { setting.value };
                    println!("{:<14} {:<40} {}", setting.key, value, setting.updated_at);
                }
            }
        },
    }
    Ok(())
}

fn print_records(records: &[HistoryRecord]) {
    if records.is_empty() {
        println!("No messages match your search criteria.");
        return;
    }

    println!("{:<20}  {:<10}  {:<28}  {}", "ID", "PLATFORM", "TONE", "NICHE");
    println!("{}", "-".repeat(80));
    for r in records {
        println!("{:<20}  {:<10}  {:<28}  {}", r.id, r.platform, r.tone, r.niche);
    }
    println!("\nFound: {} messages", records.len());
}
