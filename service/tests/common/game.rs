//! GraphQL execution against an in-process schema.

use std::sync::Arc;

use serde_json::Value;
use soundcards_api::cards::{
    repo::mock::InMemorySoundCardRepo, DeckRecord, DeckService, NewSoundCard, SoundCardRecord,
    SoundCardRepo,
};
use soundcards_api::config::GameConfig;
use soundcards_api::graphql::{build_schema, ApiSchema};
use soundcards_api::sound::mock::MockSoundClient;

/// A schema plus handles to its collaborators, for arranging and inspecting.
pub struct TestGame {
    pub repo: Arc<dyn SoundCardRepo>,
    /// Set when the game runs on the in-memory repository.
    pub memory: Option<Arc<InMemorySoundCardRepo>>,
    pub sounds: Arc<MockSoundClient>,
    pub service: DeckService,
    pub schema: ApiSchema,
}

impl TestGame {
    /// In-memory repository, default game rules.
    pub fn new() -> Self {
        let memory = Arc::new(InMemorySoundCardRepo::new());
        let mut game = Self::with_repo(memory.clone());
        game.memory = Some(memory);
        game
    }

    pub fn with_repo(repo: Arc<dyn SoundCardRepo>) -> Self {
        let sounds = Arc::new(MockSoundClient::new());
        let service = DeckService::new(repo.clone(), sounds.clone(), GameConfig::default());
        let schema = build_schema(service.clone());
        Self {
            repo,
            memory: None,
            sounds,
            service,
            schema,
        }
    }

    pub fn memory(&self) -> &InMemorySoundCardRepo {
        self.memory.as_deref().expect("in-memory game")
    }

    pub async fn seed(&self, cards: Vec<NewSoundCard>) -> Vec<SoundCardRecord> {
        let mut stored = Vec::with_capacity(cards.len());
        for card in cards {
            stored.push(self.service.import_card(card).await.expect("seed card"));
        }
        stored
    }

    pub async fn create_deck(&self, category: &str) -> DeckRecord {
        self.service.create_deck(category).await.expect("create deck")
    }

    /// Execute `query` and return the serialized response envelope.
    pub async fn execute(&self, query: &str) -> Value {
        let response = self.schema.execute(query).await;
        serde_json::to_value(response).expect("Failed to serialize GraphQL response")
    }

    pub async fn sound_card(&self, deck_id: impl std::fmt::Display) -> Value {
        self.execute(&sound_card_query(deck_id)).await
    }
}

pub fn sound_card_query(deck_id: impl std::fmt::Display) -> String {
    format!(
        r#"
        query soundCardsByDeckId {{
            soundCard(deckId: "{deck_id}") {{
                id
                category
                correctAnswer
                link
                wrongAnswers
            }}
        }}
        "#
    )
}

pub fn by_category_query(category: &str, limit: Option<i32>) -> String {
    let limit = limit.map(|l| format!(", limit: {l}")).unwrap_or_default();
    format!(
        r#"
        query soundCardsByCategory {{
            soundCardsByCategory(category: "{category}"{limit}) {{
                id
                category
                correctAnswer
                link
                wrongAnswers
            }}
        }}
        "#
    )
}

pub fn extract_errors(response: &Value) -> &[Value] {
    response
        .get("errors")
        .and_then(|e| e.as_array())
        .map_or(&[][..], Vec::as_slice)
}

pub fn assert_no_errors(response: &Value) {
    let errors = extract_errors(response);
    assert!(errors.is_empty(), "Expected no GraphQL errors, but got: {errors:?}");
}

/// Message of the only error in the response.
pub fn single_error_message(response: &Value) -> String {
    let errors = extract_errors(response);
    assert_eq!(errors.len(), 1, "expected exactly one error: {errors:?}");
    errors[0]["message"].as_str().expect("message").to_string()
}

/// Sorted ids of a `soundCardsByCategory` result.
pub fn card_ids(response: &Value) -> Vec<String> {
    let mut ids: Vec<String> = response["data"]["soundCardsByCategory"]
        .as_array()
        .expect("card array")
        .iter()
        .map(|card| card["id"].as_str().expect("id").to_string())
        .collect();
    ids.sort();
    ids
}
