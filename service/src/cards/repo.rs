//! Sound card persistence.
//!
//! Single-statement operations are free functions generic over any sqlx
//! executor (pool, connection or transaction) so callers can compose them.
//! [`SoundCardRepo`] is the seam the service layer depends on;
//! [`PgSoundCardRepo`] implements it on a pool and owns the transactions.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

use super::models::{DeckRecord, NewSoundCard, SoundCardRecord};

#[derive(Debug, thiserror::Error)]
pub enum CardRepoError {
    #[error("deck not found")]
    DeckNotFound,
    #[error("sound card {0} not found")]
    CardNotFound(i64),
    #[error("duplicate wrong answer for card")]
    DuplicateWrongAnswer,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Insert a deck row and return its id.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn insert_deck<'e, E>(executor: E, category: &str) -> Result<i64, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let id = sqlx::query_scalar::<_, i64>("INSERT INTO decks (category) VALUES ($1) RETURNING id")
        .bind(category)
        .fetch_one(executor)
        .await?;
    Ok(id)
}

/// Fill a deck's pool with up to `size` random cards of its category.
/// Returns the number of cards placed.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn fill_deck_pool<'e, E>(
    executor: E,
    deck_id: i64,
    category: &str,
    size: i64,
) -> Result<u64, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r"
        INSERT INTO deck_sound_cards (deck_id, sound_card_id)
        SELECT $1, sc.id
        FROM sound_cards sc
        WHERE LOWER(sc.category) = LOWER($2)
        ORDER BY RANDOM()
        LIMIT $3
        ",
    )
    .bind(deck_id)
    .bind(category)
    .bind(size)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Fetch a deck with its remaining pool size.
///
/// # Errors
/// Returns `CardRepoError::DeckNotFound` if no deck has this id.
pub async fn get_deck<'e, E>(executor: E, deck_id: i64) -> Result<DeckRecord, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DeckRecord>(
        r"
        SELECT d.id, d.category,
               (SELECT COUNT(*)
                FROM deck_sound_cards dsc
                WHERE dsc.deck_id = d.id AND dsc.served_at IS NULL) AS remaining
        FROM decks d
        WHERE d.id = $1
        ",
    )
    .bind(deck_id)
    .fetch_optional(executor)
    .await?
    .ok_or(CardRepoError::DeckNotFound)
}

/// Take one random unserved card out of a deck's pool.
///
/// Marking and reading happen in one statement; `SKIP LOCKED` keeps two
/// concurrent draws from receiving the same card. `None` means the pool is
/// empty.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn draw_card<'e, E>(
    executor: E,
    deck_id: i64,
) -> Result<Option<SoundCardRecord>, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let card = sqlx::query_as::<_, SoundCardRecord>(
        r"
        WITH next_card AS (
            SELECT sound_card_id
            FROM deck_sound_cards
            WHERE deck_id = $1 AND served_at IS NULL
            ORDER BY RANDOM()
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        ), drawn AS (
            UPDATE deck_sound_cards dsc
            SET served_at = NOW()
            FROM next_card
            WHERE dsc.deck_id = $1 AND dsc.sound_card_id = next_card.sound_card_id
            RETURNING dsc.sound_card_id
        )
        SELECT sc.id, sc.category, sc.correct_answer, sc.sound_id,
               ARRAY(SELECT wa.answer FROM wrong_answers wa
                     WHERE wa.sound_card_id = sc.id ORDER BY wa.id) AS wrong_answers
        FROM drawn
        JOIN sound_cards sc ON sc.id = drawn.sound_card_id
        ",
    )
    .bind(deck_id)
    .fetch_optional(executor)
    .await?;
    Ok(card)
}

/// Put a served card back into its deck's pool.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn release_card<'e, E>(executor: E, deck_id: i64, card_id: i64) -> Result<(), CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "UPDATE deck_sound_cards SET served_at = NULL WHERE deck_id = $1 AND sound_card_id = $2",
    )
    .bind(deck_id)
    .bind(card_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Cards whose category case-insensitively equals `category`, by id.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn list_cards_by_category<'e, E>(
    executor: E,
    category: &str,
    limit: i64,
) -> Result<Vec<SoundCardRecord>, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let cards = sqlx::query_as::<_, SoundCardRecord>(
        r"
        SELECT sc.id, sc.category, sc.correct_answer, sc.sound_id,
               ARRAY(SELECT wa.answer FROM wrong_answers wa
                     WHERE wa.sound_card_id = sc.id ORDER BY wa.id) AS wrong_answers
        FROM sound_cards sc
        WHERE LOWER(sc.category) = LOWER($1)
        ORDER BY sc.id
        LIMIT $2
        ",
    )
    .bind(category)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(cards)
}

/// # Errors
/// Returns `CardRepoError::CardNotFound` if no card has this id.
pub async fn get_card<'e, E>(executor: E, card_id: i64) -> Result<SoundCardRecord, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, SoundCardRecord>(
        r"
        SELECT sc.id, sc.category, sc.correct_answer, sc.sound_id,
               ARRAY(SELECT wa.answer FROM wrong_answers wa
                     WHERE wa.sound_card_id = sc.id ORDER BY wa.id) AS wrong_answers
        FROM sound_cards sc
        WHERE sc.id = $1
        ",
    )
    .bind(card_id)
    .fetch_optional(executor)
    .await?
    .ok_or(CardRepoError::CardNotFound(card_id))
}

/// Insert a card row (without wrong answers) and return its id.
///
/// # Errors
/// Returns `CardRepoError::Database` on query failure.
pub async fn insert_sound_card<'e, E>(executor: E, card: &NewSoundCard) -> Result<i64, CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let id = sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO sound_cards (category, correct_answer, sound_id)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(&card.category)
    .bind(&card.correct_answer)
    .bind(card.sound_id)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

/// Attach wrong answers to a card, keeping the given order.
///
/// # Errors
/// Returns `CardRepoError::DuplicateWrongAnswer` if an answer repeats.
pub async fn insert_wrong_answers<'e, E>(
    executor: E,
    card_id: i64,
    answers: &[String],
) -> Result<(), CardRepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r"
        INSERT INTO wrong_answers (sound_card_id, answer)
        SELECT $1, answer
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(answer, position)
        ORDER BY position
        ",
    )
    .bind(card_id)
    .bind(answers)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err))
            if db_err.constraint() == Some("wrong_answers_card_answer_key") =>
        {
            Err(CardRepoError::DuplicateWrongAnswer)
        }
        Err(e) => Err(CardRepoError::Database(e)),
    }
}

/// Persistence operations the deck service relies on.
#[async_trait]
pub trait SoundCardRepo: Send + Sync {
    /// Create a deck and fill its pool with up to `pool_size` cards.
    async fn create_deck(&self, category: &str, pool_size: i64)
        -> Result<DeckRecord, CardRepoError>;

    async fn get_deck(&self, deck_id: i64) -> Result<DeckRecord, CardRepoError>;

    /// Take a random unserved card from the pool; `None` once exhausted.
    async fn draw_card(&self, deck_id: i64) -> Result<Option<SoundCardRecord>, CardRepoError>;

    /// Undo a draw whose card could not be delivered.
    async fn release_card(&self, deck_id: i64, card_id: i64) -> Result<(), CardRepoError>;

    async fn cards_by_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<SoundCardRecord>, CardRepoError>;

    async fn get_card(&self, card_id: i64) -> Result<SoundCardRecord, CardRepoError>;

    /// Store a card and its wrong answers atomically.
    async fn create_card(&self, card: &NewSoundCard) -> Result<SoundCardRecord, CardRepoError>;
}

/// `PostgreSQL` implementation of [`SoundCardRepo`].
#[derive(Clone)]
pub struct PgSoundCardRepo {
    pool: PgPool,
}

impl PgSoundCardRepo {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SoundCardRepo for PgSoundCardRepo {
    async fn create_deck(
        &self,
        category: &str,
        pool_size: i64,
    ) -> Result<DeckRecord, CardRepoError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_deck(&mut *tx, category).await?;
        let placed = fill_deck_pool(&mut *tx, id, category, pool_size).await?;
        tx.commit().await?;

        Ok(DeckRecord {
            id,
            category: category.to_string(),
            remaining: i64::try_from(placed).unwrap_or(i64::MAX),
        })
    }

    async fn get_deck(&self, deck_id: i64) -> Result<DeckRecord, CardRepoError> {
        get_deck(&self.pool, deck_id).await
    }

    async fn draw_card(&self, deck_id: i64) -> Result<Option<SoundCardRecord>, CardRepoError> {
        draw_card(&self.pool, deck_id).await
    }

    async fn release_card(&self, deck_id: i64, card_id: i64) -> Result<(), CardRepoError> {
        release_card(&self.pool, deck_id, card_id).await
    }

    async fn cards_by_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<SoundCardRecord>, CardRepoError> {
        list_cards_by_category(&self.pool, category, limit).await
    }

    async fn get_card(&self, card_id: i64) -> Result<SoundCardRecord, CardRepoError> {
        get_card(&self.pool, card_id).await
    }

    async fn create_card(&self, card: &NewSoundCard) -> Result<SoundCardRecord, CardRepoError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_sound_card(&mut *tx, card).await?;
        insert_wrong_answers(&mut *tx, id, &card.wrong_answers).await?;
        tx.commit().await?;

        Ok(SoundCardRecord {
            id,
            category: card.category.clone(),
            correct_answer: card.correct_answer.clone(),
            sound_id: card.sound_id,
            wrong_answers: card.wrong_answers.clone(),
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
pub mod mock {
    //! In-memory [`SoundCardRepo`] with the same pool semantics as Postgres.

    use super::{async_trait, CardRepoError, DeckRecord, NewSoundCard, SoundCardRecord, SoundCardRepo};
    use rand::seq::SliceRandom;
    use rand::Rng;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct MockDeck {
        category: String,
        unserved: Vec<i64>,
    }

    #[derive(Default)]
    struct State {
        cards: BTreeMap<i64, SoundCardRecord>,
        decks: BTreeMap<i64, MockDeck>,
        next_card_id: i64,
        next_deck_id: i64,
        unavailable: bool,
    }

    impl State {
        fn check_available(&self) -> Result<(), CardRepoError> {
            if self.unavailable {
                Err(CardRepoError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }

        fn deck_record(&self, id: i64) -> Result<DeckRecord, CardRepoError> {
            let deck = self.decks.get(&id).ok_or(CardRepoError::DeckNotFound)?;
            Ok(DeckRecord {
                id,
                category: deck.category.clone(),
                remaining: i64::try_from(deck.unserved.len()).unwrap_or(i64::MAX),
            })
        }
    }

    /// In-memory repository for tests.
    #[derive(Default)]
    pub struct InMemorySoundCardRepo {
        state: Mutex<State>,
    }

    impl InMemorySoundCardRepo {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every call fail with a database error until reset.
        pub fn set_unavailable(&self, unavailable: bool) {
            self.state.lock().unwrap().unavailable = unavailable;
        }

        /// Highest deck id handed out so far (0 when none).
        pub fn max_deck_id(&self) -> i64 {
            self.state.lock().unwrap().next_deck_id
        }
    }

    #[async_trait]
    impl SoundCardRepo for InMemorySoundCardRepo {
        async fn create_deck(
            &self,
            category: &str,
            pool_size: i64,
        ) -> Result<DeckRecord, CardRepoError> {
            let mut state = self.state.lock().unwrap();
            state.check_available()?;

            let wanted = category.to_lowercase();
            let mut candidates: Vec<i64> = state
                .cards
                .values()
                .filter(|card| card.category.to_lowercase() == wanted)
                .map(|card| card.id)
                .collect();
            candidates.shuffle(&mut rand::thread_rng());
            candidates.truncate(usize::try_from(pool_size.max(0)).unwrap_or(usize::MAX));

            state.next_deck_id += 1;
            let id = state.next_deck_id;
            state.decks.insert(
                id,
                MockDeck {
                    category: category.to_string(),
                    unserved: candidates,
                },
            );
            state.deck_record(id)
        }

        async fn get_deck(&self, deck_id: i64) -> Result<DeckRecord, CardRepoError> {
            let state = self.state.lock().unwrap();
            state.check_available()?;
            state.deck_record(deck_id)
        }

        async fn draw_card(
            &self,
            deck_id: i64,
        ) -> Result<Option<SoundCardRecord>, CardRepoError> {
            let mut state = self.state.lock().unwrap();
            state.check_available()?;

            let Some(deck) = state.decks.get_mut(&deck_id) else {
                return Ok(None);
            };
            if deck.unserved.is_empty() {
                return Ok(None);
            }
            let index = rand::thread_rng().gen_range(0..deck.unserved.len());
            let card_id = deck.unserved.swap_remove(index);
            Ok(state.cards.get(&card_id).cloned())
        }

        async fn release_card(&self, deck_id: i64, card_id: i64) -> Result<(), CardRepoError> {
            let mut state = self.state.lock().unwrap();
            state.check_available()?;

            if let Some(deck) = state.decks.get_mut(&deck_id) {
                if !deck.unserved.contains(&card_id) {
                    deck.unserved.push(card_id);
                }
            }
            Ok(())
        }

        async fn cards_by_category(
            &self,
            category: &str,
            limit: i64,
        ) -> Result<Vec<SoundCardRecord>, CardRepoError> {
            let state = self.state.lock().unwrap();
            state.check_available()?;

            let wanted = category.to_lowercase();
            Ok(state
                .cards
                .values()
                .filter(|card| card.category.to_lowercase() == wanted)
                .take(usize::try_from(limit.max(0)).unwrap_or(usize::MAX))
                .cloned()
                .collect())
        }

        async fn get_card(&self, card_id: i64) -> Result<SoundCardRecord, CardRepoError> {
            let state = self.state.lock().unwrap();
            state.check_available()?;
            state
                .cards
                .get(&card_id)
                .cloned()
                .ok_or(CardRepoError::CardNotFound(card_id))
        }

        async fn create_card(
            &self,
            card: &NewSoundCard,
        ) -> Result<SoundCardRecord, CardRepoError> {
            let mut state = self.state.lock().unwrap();
            state.check_available()?;

            let mut seen = std::collections::HashSet::new();
            if !card.wrong_answers.iter().all(|answer| seen.insert(answer)) {
                return Err(CardRepoError::DuplicateWrongAnswer);
            }

            state.next_card_id += 1;
            let record = SoundCardRecord {
                id: state.next_card_id,
                category: card.category.clone(),
                correct_answer: card.correct_answer.clone(),
                sound_id: card.sound_id,
                wrong_answers: card.wrong_answers.clone(),
            };
            state.cards.insert(record.id, record.clone());
            Ok(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemorySoundCardRepo;
    use super::*;

    fn card(category: &str, answer: &str) -> NewSoundCard {
        NewSoundCard {
            category: category.to_string(),
            correct_answer: answer.to_string(),
            sound_id: 100,
            wrong_answers: vec!["Cat".into(), "Cow".into(), "Duck".into()],
        }
    }

    #[tokio::test]
    async fn in_memory_pool_is_drawn_without_replacement() {
        let repo = InMemorySoundCardRepo::new();
        for answer in ["Dog", "Horse", "Owl"] {
            repo.create_card(&card("Animals", answer)).await.unwrap();
        }

        let deck = repo.create_deck("animals", 8).await.unwrap();
        assert_eq!(deck.remaining, 3);

        let mut drawn = Vec::new();
        while let Some(card) = repo.draw_card(deck.id).await.unwrap() {
            drawn.push(card.id);
        }
        drawn.sort_unstable();
        assert_eq!(drawn, vec![1, 2, 3]);
        assert_eq!(repo.get_deck(deck.id).await.unwrap().remaining, 0);
    }

    #[tokio::test]
    async fn in_memory_release_returns_card_to_pool() {
        let repo = InMemorySoundCardRepo::new();
        repo.create_card(&card("Animals", "Dog")).await.unwrap();
        let deck = repo.create_deck("Animals", 8).await.unwrap();

        let drawn = repo.draw_card(deck.id).await.unwrap().unwrap();
        assert!(repo.draw_card(deck.id).await.unwrap().is_none());

        repo.release_card(deck.id, drawn.id).await.unwrap();
        assert_eq!(repo.get_deck(deck.id).await.unwrap().remaining, 1);
    }

    #[tokio::test]
    async fn in_memory_rejects_duplicate_wrong_answers() {
        let repo = InMemorySoundCardRepo::new();
        let mut duplicate = card("Animals", "Dog");
        duplicate.wrong_answers = vec!["Cat".into(), "Cat".into()];

        let err = repo.create_card(&duplicate).await.unwrap_err();
        assert!(matches!(err, CardRepoError::DuplicateWrongAnswer));
    }

    #[tokio::test]
    async fn in_memory_unknown_deck_is_not_found() {
        let repo = InMemorySoundCardRepo::new();
        assert!(matches!(
            repo.get_deck(42).await,
            Err(CardRepoError::DeckNotFound)
        ));
    }
}
