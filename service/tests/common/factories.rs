//! Card payload builders.

use soundcards_api::cards::NewSoundCard;

/// Distinct card `n` of `category`, with three distractors.
pub fn card(category: &str, n: usize) -> NewSoundCard {
    NewSoundCard {
        category: category.to_string(),
        correct_answer: format!("{category} answer {n}"),
        sound_id: 500_000 + i64::try_from(n).expect("small index"),
        wrong_answers: vec![
            format!("{category} decoy {n}a"),
            format!("{category} decoy {n}b"),
            format!("{category} decoy {n}c"),
        ],
    }
}

/// `count` distinct cards of `category`.
pub fn cards(category: &str, count: usize) -> Vec<NewSoundCard> {
    (1..=count).map(|n| card(category, n)).collect()
}

/// Category name no other test uses, for tests sharing one database.
pub fn unique_category(base: &str) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{base}-{nanos}-{}", COUNTER.fetch_add(1, Ordering::Relaxed))
}
