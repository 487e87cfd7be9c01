use async_graphql::{Context, ErrorExtensions, Object, Result};

use super::types::Deck;
use crate::cards::DeckService;

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Start a deck for `category`; its pool is drawn from that category's cards.
    async fn create_deck(&self, ctx: &Context<'_>, category: String) -> Result<Deck> {
        let service = ctx.data::<DeckService>()?;
        let deck = service.create_deck(&category).await.map_err(|e| e.extend())?;
        Ok(deck.into())
    }
}
