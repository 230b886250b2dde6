//! LevelUp Player - terminal chat client.
//!
//! Lines starting with `/` are commands; anything else is sent as a message.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use levelup_domain::{LevelId, Role};
use levelup_player::infrastructure::{ProxyHttpClient, SystemClock};
use levelup_player::ports::outbound::{Notification, NotificationKind, NotificationPort};
use levelup_player::{PlayerConfig, ProgressionController, ProgressionSnapshot};

const HELP: &str = "/games  /game <name>  /levels  /level <id>  /status  /quit";

struct ConsoleNotifier;

impl NotificationPort for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => println!("* {}", notification.message),
            NotificationKind::Error => println!("! {}", notification.message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "levelup_player=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PlayerConfig::from_env();
    tracing::info!(proxy = %config.proxy_base_url, "Starting LevelUp Player");

    let controller = ProgressionController::from_config(
        &config,
        Arc::new(ProxyHttpClient::from_config(&config)),
        Arc::new(ConsoleNotifier),
        Arc::new(SystemClock),
    );

    if let Err(e) = controller.mount().await {
        println!("! {e}");
    }
    print_status(&controller.snapshot());
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        match command {
            "" => continue,
            "/quit" => break,
            "/status" => print_status(&controller.snapshot()),
            "/games" => {
                for game in controller.snapshot().games {
                    println!("  {} - {}", game.name(), game.description());
                }
            }
            "/game" => {
                let game = controller
                    .snapshot()
                    .games
                    .into_iter()
                    .find(|game| game.name() == argument);
                match game {
                    Some(game) => match controller.select_game(game).await {
                        Ok(()) => print_status(&controller.snapshot()),
                        Err(e) => println!("! {e}"),
                    },
                    None => println!("! Unknown game: {argument}"),
                }
            }
            "/levels" => {
                for level in controller.snapshot().levels {
                    println!("  {} - {}", level.id(), level.name());
                }
            }
            "/level" => match controller.select_level(&LevelId::new(argument)) {
                Ok(_) => print_status(&controller.snapshot()),
                Err(e) => println!("! {e}"),
            },
            _ if command.starts_with('/') => println!("{HELP}"),
            _ => {
                let before = controller.snapshot().turns.len();
                match controller.submit(line).await {
                    Ok(_) => {
                        for turn in controller.snapshot().turns.iter().skip(before + 1) {
                            if turn.role() == Role::Assistant {
                                println!("< {}", turn.text());
                            }
                        }
                    }
                    Err(e) => println!("! {e}"),
                }
            }
        }
    }

    Ok(())
}

fn print_status(snapshot: &ProgressionSnapshot) {
    if let Some(error) = &snapshot.games_error {
        println!("! {error}");
    }
    if let Some(error) = &snapshot.levels_error {
        println!("! {error}");
    }
    match (&snapshot.selected_game, &snapshot.selected_level) {
        (Some(game), Some(level)) => {
            println!("[{} / {}]", game.name(), level.name());
            println!("Objective: {}", snapshot.objective);
        }
        (Some(game), None) => println!("[{}] no level selected", game.name()),
        _ => println!("No game selected"),
    }
}
