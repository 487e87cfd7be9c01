//! Client-facing GraphQL errors.
//!
//! Messages are part of the API contract and stay stable; causes are logged,
//! never returned.

use std::sync::Arc;

use async_graphql::extensions::{Extension, ExtensionContext, ExtensionFactory, NextValidation};
use async_graphql::{Error, ErrorExtensions, ServerError, ValidationResult};

use crate::cards::DeckServiceError;

pub const DECK_EXHAUSTED_MESSAGE: &str = "Cannot return null for non-nullable field Query.soundCard";
pub const NOT_FOUND_MESSAGE: &str = "SoundCard not found";
pub const LINK_UNAVAILABLE_MESSAGE: &str = "Sound link unavailable";
pub const INVALID_CATEGORY_MESSAGE: &str = "Invalid category";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

impl DeckServiceError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DeckExhausted { .. } => "NON_NULL_VIOLATION",
            Self::DeckNotFound => "NOT_FOUND",
            Self::InvalidCategory | Self::InvalidCard(_) => "BAD_USER_INPUT",
            Self::Link { .. } => "UPSTREAM_ERROR",
            Self::Repo(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::DeckExhausted { .. } => DECK_EXHAUSTED_MESSAGE.to_string(),
            Self::DeckNotFound => NOT_FOUND_MESSAGE.to_string(),
            Self::InvalidCategory => INVALID_CATEGORY_MESSAGE.to_string(),
            Self::InvalidCard(reason) => format!("Invalid sound card: {reason}"),
            Self::Link { .. } => LINK_UNAVAILABLE_MESSAGE.to_string(),
            Self::Repo(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl ErrorExtensions for DeckServiceError {
    fn extend(&self) -> Error {
        if let Self::Repo(err) = self {
            tracing::error!(error = %err, "sound card storage failure");
        }
        let code = self.code();
        Error::new(self.public_message()).extend_with(|_, ext| ext.set("code", code))
    }
}

/// Rewrites "required argument not provided" validation errors into
/// `Field 'soundCardsByCategory' is missing required arguments: category`,
/// one error per field listing every missing argument.
pub struct RequiredArgumentMessages;

impl ExtensionFactory for RequiredArgumentMessages {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(RequiredArgumentMessagesExtension)
    }
}

struct RequiredArgumentMessagesExtension;

#[async_trait::async_trait]
impl Extension for RequiredArgumentMessagesExtension {
    async fn validation(
        &self,
        ctx: &ExtensionContext<'_>,
        next: NextValidation<'_>,
    ) -> Result<ValidationResult, Vec<ServerError>> {
        next.run(ctx).await.map_err(merge_missing_arguments)
    }
}

/// Field and argument names from the validator's
/// `Field "f" argument "a" of type "T" is required but not provided`.
fn parse_missing_argument(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix("Field \"")?;
    let (field, rest) = rest.split_once("\" argument \"")?;
    let (argument, rest) = rest.split_once('"')?;
    rest.contains("is required").then_some((field, argument))
}

struct MissingArguments {
    field: String,
    arguments: Vec<String>,
    error: ServerError,
}

enum Rewritten {
    Kept(ServerError),
    Missing(MissingArguments),
}

fn merge_missing_arguments(errors: Vec<ServerError>) -> Vec<ServerError> {
    let mut out: Vec<Rewritten> = Vec::with_capacity(errors.len());

    for error in errors {
        let Some((field, argument)) = parse_missing_argument(&error.message) else {
            out.push(Rewritten::Kept(error));
            continue;
        };
        let (field, argument) = (field.to_string(), argument.to_string());

        let existing = out.iter_mut().find_map(|entry| match entry {
            Rewritten::Missing(group)
                if group.field == field && group.error.locations == error.locations =>
            {
                Some(group)
            }
            _ => None,
        });

        match existing {
            Some(group) => group.arguments.push(argument),
            None => out.push(Rewritten::Missing(MissingArguments {
                field,
                arguments: vec![argument],
                error,
            })),
        }
    }

    out.into_iter()
        .map(|entry| match entry {
            Rewritten::Kept(error) => error,
            Rewritten::Missing(MissingArguments {
                field,
                arguments,
                mut error,
            }) => {
                error.message = format!(
                    "Field '{field}' is missing required arguments: {}",
                    arguments.join(", ")
                );
                error
            }
        })
        .collect()
}
