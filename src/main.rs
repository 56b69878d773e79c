use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use hydra_client::auth::{CommandTicketProvider, StaticTicketProvider, TicketProvider};
use hydra_client::config::{CliArgs, Command};
use hydra_client::{HydraClient, Platform};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::load();

    // Initialize logging with a configured level
    let log_level = args.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args.client_config()?;
    let provider = build_ticket_provider(&args)?;
    let client = HydraClient::new(config, args.credentials(), provider)
        .context("Failed to create Hydra client")?;

    tracing::info!("Authenticating...");
    client.login().await.context("Login failed")?;
    tracing::info!("Authenticated");

    let output = match args.command {
        Command::Profile { id } => client.get_profile(&id).await?,
        Command::Match { id } => client.get_match(&id).await?,
        Command::Matches { id, page } => client.get_matches(&id, page).await?,
        Command::Leaderboard { kind } => client.get_leaderboard(&kind).await?,
        Command::Rank {
            id,
            kind,
            character,
        } => match character {
            Some(character) => {
                client
                    .get_profile_leaderboard_for_character(&id, &kind, &character)
                    .await?
            }
            None => client.get_profile_leaderboard(&id, &kind).await?,
        },
        Command::Search {
            query,
            limit,
            platform,
            exact,
        } => {
            let platform = platform
                .map(|p| p.parse::<Platform>())
                .transpose()?;
            if exact {
                let cancel = CancellationToken::new();
                tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
                match client
                    .search_exact_username_with_cancel(&query, limit, platform, cancel)
                    .await?
                {
                    Some(found) => found,
                    None => {
                        eprintln!("No account named {:?} found", query);
                        std::process::exit(1);
                    }
                }
            } else {
                let page = client
                    .search_by_username(&query, limit, None, platform)
                    .await?;
                serde_json::json!({ "results": page.results, "cursor": page.cursor })
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Pick the ticket source: a fixed ticket or a helper command
fn build_ticket_provider(args: &CliArgs) -> Result<Arc<dyn TicketProvider>> {
    if let Some(ref ticket) = args.ticket {
        return Ok(Arc::new(StaticTicketProvider::from_hex(ticket)?));
    }
    if let Some(ref command) = args.ticket_command {
        return Ok(Arc::new(CommandTicketProvider::from_command_line(command)?));
    }
    anyhow::bail!("A ticket source is required (set HYDRA_TICKET or HYDRA_TICKET_COMMAND)")
}

/// Cancel long-running searches on Ctrl+C
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Received Ctrl+C signal, cancelling search...");
        cancel.cancel();
    }
}
