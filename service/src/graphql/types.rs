use async_graphql::{SimpleObject, ID};

use crate::cards::{DeckRecord, ServedCard};

/// A trivia card: a playable clip, its answer and the distractors.
#[derive(Debug, Clone, SimpleObject)]
pub struct SoundCard {
    pub id: ID,
    pub category: String,
    pub correct_answer: String,
    /// Playable preview URL.
    pub link: String,
    pub wrong_answers: Vec<String>,
}

impl From<ServedCard> for SoundCard {
    fn from(served: ServedCard) -> Self {
        let ServedCard { card, link } = served;
        Self {
            id: ID::from(card.id.to_string()),
            category: card.category,
            correct_answer: card.correct_answer,
            link,
            wrong_answers: card.wrong_answers,
        }
    }
}

/// A deck and how many cards it can still serve.
#[derive(Debug, Clone, SimpleObject)]
pub struct Deck {
    pub id: ID,
    pub category: String,
    pub remaining: i32,
}

impl From<DeckRecord> for Deck {
    fn from(deck: DeckRecord) -> Self {
        Self {
            id: ID::from(deck.id.to_string()),
            category: deck.category,
            remaining: i32::try_from(deck.remaining).unwrap_or(i32::MAX),
        }
    }
}
