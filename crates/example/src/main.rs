//! Example directory client CLI.
//!
//! Reads `TETHER_BASE_URL` (and optionally `TETHER_TOKEN`, `TETHER_LOG`,
//! `TETHER_LOG_FORMAT`) from the environment or a `.env` file.
//!
//! # Usage
//!
//! ```bash
//! directory profile
//! directory users
//! directory set-theme <theme>
//! ```

use example::{DirectoryRepository, Settings};
use tether_http::SessionConfig;
use tether_telemetry::TracingConfig;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let tracing_config = TracingConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    tracing_config.init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: <profile|users|set-theme <theme>>");
        std::process::exit(1);
    }

    let config = SessionConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let token = std::env::var("TETHER_TOKEN").ok();
    let repository = DirectoryRepository::connect(config, token.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let result = match (args[1].as_str(), args.get(2)) {
        ("profile", _) => repository.load().await.map(|(profile, settings)| {
            println!("{} (#{}), theme: {}", profile.name, profile.id, settings.theme);
        }),
        ("users", _) => repository.all_users().await.map(|users| {
            for user in users {
                println!("{:>6}  {}", user.id, user.name);
            }
        }),
        ("set-theme", Some(theme)) => match repository.load().await {
            Ok(_) => {
                let update = Settings {
                    theme: theme.clone(),
                };
                repository.settings.set(update).await
            }
            Err(e) => Err(e),
        },
        (command, _) => {
            eprintln!("Unknown command: {command}");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
