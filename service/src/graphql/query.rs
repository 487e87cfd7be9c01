use async_graphql::{Context, ErrorExtensions, Object, Result};

use super::types::SoundCard;
use crate::cards::DeckService;

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Next card from the deck's pool. Each card is served once per deck.
    async fn sound_card(&self, ctx: &Context<'_>, deck_id: String) -> Result<SoundCard> {
        let service = ctx.data::<DeckService>()?;
        let served = service.draw_card(&deck_id).await.map_err(|e| e.extend())?;
        Ok(served.into())
    }

    /// Cards of a category (case-insensitive), ordered by id. `limit`
    /// defaults to 8 and is capped at 24.
    async fn sound_cards_by_category(
        &self,
        ctx: &Context<'_>,
        category: String,
        limit: Option<i32>,
    ) -> Result<Vec<SoundCard>> {
        let service = ctx.data::<DeckService>()?;
        let cards = service
            .cards_by_category(&category, limit)
            .await
            .map_err(|e| e.extend())?;
        Ok(cards.into_iter().map(SoundCard::from).collect())
    }
}
