use serde::{Deserialize, Serialize};

/// A deck row plus the size of its remaining pool.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DeckRecord {
    pub id: i64,
    pub category: String,
    /// Pool cards not yet served.
    pub remaining: i64,
}

/// A stored card with its wrong answers, ordered by insertion.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SoundCardRecord {
    pub id: i64,
    pub category: String,
    pub correct_answer: String,
    /// Id of the clip in the external sound library.
    pub sound_id: i64,
    pub wrong_answers: Vec<String>,
}

/// A card on its way to a player, with the link resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedCard {
    pub card: SoundCardRecord,
    pub link: String,
}

/// Card import payload, also the JSON shape read by `sc-ops import`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSoundCard {
    pub category: String,
    pub correct_answer: String,
    pub sound_id: i64,
    pub wrong_answers: Vec<String>,
}
