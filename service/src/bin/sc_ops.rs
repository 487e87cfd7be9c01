//! Operator commands for the sound card store.
//!
//! ```text
//! sc-ops import cards.json
//! sc-ops create-deck --category Animals
//! ```
//!
//! `cards.json` holds an array of
//! `{"category", "correct_answer", "sound_id", "wrong_answers"}` objects.
//! Configuration comes from the same sources as the server.

#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use soundcards_api::{
    cards::{DeckService, DeckServiceError, NewSoundCard, PgSoundCardRepo},
    config::Config,
    db::setup_database,
    logging::init_tracing,
    sound::HttpSoundClient,
};

#[derive(Parser)]
#[command(name = "sc-ops", about = "Manage sound cards and decks")]
struct Cli {
    /// YAML config file layered under `SC_` environment variables.
    #[arg(long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import cards from a JSON file.
    Import {
        file: PathBuf,
        /// Keep going when a card is rejected.
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Create a deck and fill its pool.
    CreateDeck {
        #[arg(long)]
        category: String,
    },
}

async fn import(service: &DeckService, file: &Path, skip_invalid: bool) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let cards: Vec<NewSoundCard> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;

    let total = cards.len();
    let mut imported = 0usize;
    for (index, card) in cards.into_iter().enumerate() {
        match service.import_card(card).await {
            Ok(stored) => {
                imported += 1;
                tracing::debug!(index, card_id = stored.id, "imported");
            }
            Err(err @ (DeckServiceError::InvalidCard(_) | DeckServiceError::InvalidCategory))
                if skip_invalid =>
            {
                tracing::warn!(index, error = %err, "skipping invalid card");
            }
            Err(err) => return Err(err).with_context(|| format!("importing card #{index}")),
        }
    }

    println!("imported {imported} of {total} cards");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config).map_err(|e| anyhow::anyhow!("{e}"))?;
    init_tracing(&config.logging.level);

    let pool = setup_database(&config.database).await?;
    let service = DeckService::new(
        Arc::new(PgSoundCardRepo::new(pool)),
        Arc::new(HttpSoundClient::new(
            config.sound.base_url.clone(),
            config.sound.api_key.clone(),
        )),
        config.game,
    );

    match cli.command {
        Command::Import { file, skip_invalid } => import(&service, &file, skip_invalid).await?,
        Command::CreateDeck { category } => {
            let deck = service.create_deck(&category).await?;
            println!(
                "deck {} ({}) created with {} cards",
                deck.id, deck.category, deck.remaining
            );
        }
    }

    Ok(())
}
