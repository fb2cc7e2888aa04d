use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vigil_hw::Camera;
use vigil_store::WatchlistStore;

#[derive(Parser)]
#[command(name = "vigil", about = "Vigil watch terminal CLI")]
struct Cli {
    /// Database path (defaults to $VIGIL_DB_PATH, then the XDG data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recent alerts, newest first
    Alerts {
        /// Maximum number of alerts to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the watchlist roster
    Roster {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Summarize terminal state
    Status,
    /// List available camera devices
    Devices,
}

/// Same resolution order as the daemon, so both tools see one database.
fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("VIGIL_DB_PATH") {
        return PathBuf::from(path);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("vigil")
        .join("vigil.db")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db_path = cli.db.clone().unwrap_or_else(default_db_path);

    match cli.command {
        Commands::Alerts { limit, json } => {
            let store = WatchlistStore::open(&db_path).await?;
            let alerts = store.recent_alerts(limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else if alerts.is_empty() {
                println!("No alerts recorded.");
            } else {
                for alert in alerts {
                    println!(
                        "{:>5}  {}  {:<24}  {:<12}  {}",
                        alert.id,
                        alert.observed_at.format("%Y-%m-%d %H:%M:%S"),
                        alert.name,
                        alert.terminal_id,
                        alert.evidence_path.as_deref().unwrap_or("(no image)"),
                    );
                }
            }
        }
        Commands::Roster { json } => {
            let store = WatchlistStore::open(&db_path).await?;
            let roster = store.roster().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&roster)?);
            } else if roster.is_empty() {
                println!("Roster is empty.");
            } else {
                for identity in roster {
                    println!(
                        "{:>5}  {:<24}  {} encoding(s)  {}",
                        identity.id,
                        identity.name,
                        identity.encodings,
                        identity.description.as_deref().unwrap_or(""),
                    );
                }
            }
        }
        Commands::Status => {
            let store = WatchlistStore::open(&db_path).await?;
            let roster = store.roster().await?;
            let encodings: i64 = roster.iter().map(|r| r.encodings).sum();
            let latest = store.recent_alerts(1).await?;

            println!("database:   {}", db_path.display());
            println!("identities: {}", roster.len());
            println!("encodings:  {encodings}");
            match latest.first() {
                Some(alert) => println!(
                    "last alert: {} ({}, {})",
                    alert.observed_at.format("%Y-%m-%d %H:%M:%S"),
                    alert.name,
                    alert.terminal_id,
                ),
                None => println!("last alert: none"),
            }
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No capture devices found.");
            } else {
                for dev in devices {
                    println!("{}  {} ({})", dev.path, dev.name, dev.driver);
                }
            }
        }
    }

    Ok(())
}
