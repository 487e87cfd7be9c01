//! GraphQL schema, resolvers and axum handlers.

mod errors;
mod mutation;
mod query;
mod types;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{EmptySubscription, Schema, SchemaBuilder};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::Extension;
use axum::response::{Html, IntoResponse};

use crate::cards::DeckService;

pub use errors::{
    RequiredArgumentMessages, DECK_EXHAUSTED_MESSAGE, INTERNAL_MESSAGE, INVALID_CATEGORY_MESSAGE,
    LINK_UNAVAILABLE_MESSAGE, NOT_FOUND_MESSAGE,
};
pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use types::{Deck, SoundCard};

pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Schema without request data; enough for SDL export.
#[must_use]
pub fn schema_builder() -> SchemaBuilder<QueryRoot, MutationRoot, EmptySubscription> {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).extension(RequiredArgumentMessages)
}

/// The executable schema, with the deck service available to resolvers.
#[must_use]
pub fn build_schema(service: DeckService) -> ApiSchema {
    schema_builder().data(service).finish()
}

pub async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

pub async fn graphql_handler(schema: Extension<ApiSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}
