//! Decks and sound cards: persistence and game rules.

pub mod models;
pub mod repo;
pub mod service;

pub use models::{DeckRecord, NewSoundCard, ServedCard, SoundCardRecord};
pub use repo::{CardRepoError, PgSoundCardRepo, SoundCardRepo};
pub use service::{DeckService, DeckServiceError};
