//! Game rules on top of the card repository and the sound library.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::models::{DeckRecord, NewSoundCard, ServedCard, SoundCardRecord};
use super::repo::{CardRepoError, SoundCardRepo};
use crate::config::GameConfig;
use crate::sound::{SoundApiError, SoundLinkClient};

/// Longest category name accepted when creating decks or cards.
pub const MAX_CATEGORY_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum DeckServiceError {
    #[error("deck not found")]
    DeckNotFound,
    #[error("deck {deck_id} has no cards left")]
    DeckExhausted { deck_id: i64 },
    #[error("invalid category")]
    InvalidCategory,
    #[error("invalid card: {0}")]
    InvalidCard(&'static str),
    #[error("link lookup failed for sound {sound_id}: {source}")]
    Link {
        sound_id: i64,
        #[source]
        source: SoundApiError,
    },
    #[error(transparent)]
    Repo(CardRepoError),
}

impl From<CardRepoError> for DeckServiceError {
    fn from(err: CardRepoError) -> Self {
        match err {
            CardRepoError::DeckNotFound => Self::DeckNotFound,
            CardRepoError::DuplicateWrongAnswer => Self::InvalidCard("wrong answers must be distinct"),
            other => Self::Repo(other),
        }
    }
}

/// Deck and card operations exposed to the GraphQL layer and `sc-ops`.
#[derive(Clone)]
pub struct DeckService {
    repo: Arc<dyn SoundCardRepo>,
    sounds: Arc<dyn SoundLinkClient>,
    game: GameConfig,
}

impl DeckService {
    #[must_use]
    pub fn new(
        repo: Arc<dyn SoundCardRepo>,
        sounds: Arc<dyn SoundLinkClient>,
        game: GameConfig,
    ) -> Self {
        Self { repo, sounds, game }
    }

    #[must_use]
    pub const fn game(&self) -> &GameConfig {
        &self.game
    }

    /// Number of cards `soundCardsByCategory` returns for a requested limit:
    /// the configured default when absent, clamped to `0..=max_limit`.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<i32>) -> i64 {
        requested
            .map_or_else(|| i64::from(self.game.default_limit), i64::from)
            .clamp(0, i64::from(self.game.max_limit))
    }

    /// Create a deck whose pool holds up to `deck_size` cards of `category`.
    ///
    /// # Errors
    /// `InvalidCategory` for blank or overlong names, `Repo` on storage failure.
    pub async fn create_deck(&self, category: &str) -> Result<DeckRecord, DeckServiceError> {
        let category = normalize_category(category)?;
        let deck = self
            .repo
            .create_deck(category, i64::from(self.game.deck_size))
            .await?;
        info!(deck_id = deck.id, category = %deck.category, pool = deck.remaining, "deck created");
        Ok(deck)
    }

    /// Serve the next card of a deck.
    ///
    /// `deck_id` is the string form used on the wire; anything that is not an
    /// existing deck id is reported as `DeckNotFound`.
    ///
    /// # Errors
    /// `DeckNotFound`, `DeckExhausted` once the pool is empty, `Link` when the
    /// sound library fails (the card goes back into the pool), `Repo` on
    /// storage failure.
    pub async fn draw_card(&self, deck_id: &str) -> Result<ServedCard, DeckServiceError> {
        let deck_id: i64 = deck_id
            .trim()
            .parse()
            .map_err(|_| DeckServiceError::DeckNotFound)?;
        let deck = self.repo.get_deck(deck_id).await?;

        let Some(card) = self.repo.draw_card(deck.id).await? else {
            debug!(deck_id, "deck pool exhausted");
            return Err(DeckServiceError::DeckExhausted { deck_id });
        };
        debug!(deck_id, card_id = card.id, "card drawn");

        match self.resolve(card).await {
            Ok(served) => Ok(served),
            Err((card_id, err)) => {
                self.repo.release_card(deck_id, card_id).await?;
                Err(err)
            }
        }
    }

    /// Cards of a category, matched case-insensitively, ordered by id.
    ///
    /// # Errors
    /// `Link` when any card's link cannot be resolved, `Repo` on storage failure.
    pub async fn cards_by_category(
        &self,
        category: &str,
        limit: Option<i32>,
    ) -> Result<Vec<ServedCard>, DeckServiceError> {
        let limit = self.effective_limit(limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let cards = self.repo.cards_by_category(category.trim(), limit).await?;
        let mut served = Vec::with_capacity(cards.len());
        for card in cards {
            served.push(self.resolve(card).await.map_err(|(_, err)| err)?);
        }
        Ok(served)
    }

    /// # Errors
    /// `Repo` wrapping `CardNotFound` when no card has this id.
    pub async fn get_card(&self, card_id: i64) -> Result<SoundCardRecord, DeckServiceError> {
        Ok(self.repo.get_card(card_id).await?)
    }

    /// Validate and store a card with its wrong answers.
    ///
    /// Text fields are trimmed; repeated or blank wrong answers are dropped.
    ///
    /// # Errors
    /// `InvalidCategory` or `InvalidCard` on bad input, `Repo` on storage failure.
    pub async fn import_card(&self, card: NewSoundCard) -> Result<SoundCardRecord, DeckServiceError> {
        let card = validate_card(card)?;
        let stored = self.repo.create_card(&card).await?;
        debug!(card_id = stored.id, category = %stored.category, "card imported");
        Ok(stored)
    }

    async fn resolve(
        &self,
        card: SoundCardRecord,
    ) -> Result<ServedCard, (i64, DeckServiceError)> {
        match self.sounds.get_link(card.sound_id).await {
            Ok(link) => Ok(ServedCard { card, link }),
            Err(source) => {
                warn!(card_id = card.id, sound_id = card.sound_id, error = %source, "sound link lookup failed");
                Err((
                    card.id,
                    DeckServiceError::Link {
                        sound_id: card.sound_id,
                        source,
                    },
                ))
            }
        }
    }
}

fn normalize_category(category: &str) -> Result<&str, DeckServiceError> {
    let category = category.trim();
    if category.is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
        return Err(DeckServiceError::InvalidCategory);
    }
    Ok(category)
}

fn validate_card(card: NewSoundCard) -> Result<NewSoundCard, DeckServiceError> {
    let category = normalize_category(&card.category)?.to_string();

    let correct_answer = card.correct_answer.trim().to_string();
    if correct_answer.is_empty() {
        return Err(DeckServiceError::InvalidCard("correct answer is required"));
    }

    let mut seen = HashSet::new();
    let wrong_answers: Vec<String> = card
        .wrong_answers
        .iter()
        .map(|answer| answer.trim())
        .filter(|answer| !answer.is_empty())
        .filter(|answer| seen.insert(answer.to_lowercase()))
        .map(str::to_string)
        .collect();

    if wrong_answers.is_empty() {
        return Err(DeckServiceError::InvalidCard("at least one wrong answer is required"));
    }
    if seen.contains(&correct_answer.to_lowercase()) {
        return Err(DeckServiceError::InvalidCard("wrong answers cannot repeat the correct answer"));
    }

    Ok(NewSoundCard {
        category,
        correct_answer,
        sound_id: card.sound_id,
        wrong_answers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::repo::mock::InMemorySoundCardRepo;
    use crate::sound::mock::MockSoundClient;

    fn service_with(repo: Arc<InMemorySoundCardRepo>, sounds: Arc<MockSoundClient>) -> DeckService {
        DeckService::new(repo, sounds, GameConfig::default())
    }

    fn new_card(category: &str, answer: &str, sound_id: i64) -> NewSoundCard {
        NewSoundCard {
            category: category.into(),
            correct_answer: answer.into(),
            sound_id,
            wrong_answers: vec!["Cat".into(), "Cow".into(), "Duck".into()],
        }
    }

    #[test]
    fn limit_defaults_and_caps() {
        let service = service_with(
            Arc::new(InMemorySoundCardRepo::new()),
            Arc::new(MockSoundClient::new()),
        );
        let cases = [
            (None, 8, "omitted"),
            (Some(3), 3, "small"),
            (Some(24), 24, "at cap"),
            (Some(25), 24, "above cap"),
            (Some(i32::MAX), 24, "huge"),
            (Some(0), 0, "zero"),
            (Some(-5), 0, "negative"),
        ];
        for (requested, expected, desc) in cases {
            assert_eq!(service.effective_limit(requested), expected, "case '{desc}'");
        }
    }

    #[test]
    fn card_validation_trims_and_dedupes() {
        let card = NewSoundCard {
            category: "  Animals ".into(),
            correct_answer: " Dog ".into(),
            sound_id: 1,
            wrong_answers: vec![" Cat".into(), "cat".into(), String::new(), "Cow".into()],
        };
        let card = validate_card(card).unwrap();
        assert_eq!(card.category, "Animals");
        assert_eq!(card.correct_answer, "Dog");
        assert_eq!(card.wrong_answers, vec!["Cat", "Cow"]);
    }

    #[test]
    fn card_validation_boundaries() {
        let long_category = "x".repeat(MAX_CATEGORY_LEN + 1);
        let cases: Vec<(NewSoundCard, bool, &str)> = vec![
            (new_card("Animals", "Dog", 1), true, "valid"),
            (new_card("   ", "Dog", 1), false, "blank category"),
            (new_card(&long_category, "Dog", 1), false, "overlong category"),
            (new_card("Animals", "  ", 1), false, "blank answer"),
            (new_card("Animals", "cat", 1), false, "answer among wrong answers"),
            (
                NewSoundCard {
                    wrong_answers: vec![" ".into()],
                    ..new_card("Animals", "Dog", 1)
                },
                false,
                "no usable wrong answers",
            ),
        ];
        for (card, should_pass, desc) in cases {
            assert_eq!(validate_card(card).is_ok(), should_pass, "case '{desc}'");
        }
    }

    #[tokio::test]
    async fn link_failure_returns_card_to_pool() {
        let repo = Arc::new(InMemorySoundCardRepo::new());
        let sounds = Arc::new(MockSoundClient::new());
        let service = service_with(repo.clone(), sounds.clone());

        service.import_card(new_card("Animals", "Dog", 77)).await.unwrap();
        let deck = service.create_deck("Animals").await.unwrap();
        sounds.fail_for(77);

        let err = service.draw_card(&deck.id.to_string()).await.unwrap_err();
        assert!(matches!(err, DeckServiceError::Link { sound_id: 77, .. }));
        assert_eq!(repo.get_deck(deck.id).await.unwrap().remaining, 1);
    }

    #[tokio::test]
    async fn unparseable_deck_id_is_not_found() {
        let service = service_with(
            Arc::new(InMemorySoundCardRepo::new()),
            Arc::new(MockSoundClient::new()),
        );
        for deck_id in ["", "abc", "1.5", "99999999999999999999"] {
            assert!(
                matches!(service.draw_card(deck_id).await, Err(DeckServiceError::DeckNotFound)),
                "deck id {deck_id:?}"
            );
        }
    }

    #[tokio::test]
    async fn zero_limit_skips_repository() {
        let repo = Arc::new(InMemorySoundCardRepo::new());
        repo.set_unavailable(true);
        let service = service_with(repo, Arc::new(MockSoundClient::new()));

        let cards = service.cards_by_category("Animals", Some(0)).await.unwrap();
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn create_deck_rejects_blank_category() {
        let service = service_with(
            Arc::new(InMemorySoundCardRepo::new()),
            Arc::new(MockSoundClient::new()),
        );
        assert!(matches!(
            service.create_deck("   ").await,
            Err(DeckServiceError::InvalidCategory)
        ));
    }
}
