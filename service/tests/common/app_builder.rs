//! Router construction for HTTP-level tests.
//!
//! Goes through the same [`build_router`] as `main.rs`; only the options and
//! the service's collaborators differ.
//!
//! ```ignore
//! let app = TestAppBuilder::new()
//!     .with_cors(&["http://localhost:3000"])
//!     .with_security_headers(SecurityHeadersConfig::default())
//!     .build();
//! ```

use axum::Router;
use soundcards_api::config::SecurityHeadersConfig;
use soundcards_api::http::{build_router, RouterOptions};

use super::game::TestGame;

pub struct TestAppBuilder {
    game: TestGame,
    options: RouterOptions,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppBuilder {
    /// GraphQL and health routes, no CORS, no security headers.
    pub fn new() -> Self {
        Self {
            game: TestGame::new(),
            options: RouterOptions::default(),
        }
    }

    /// Use an already seeded game.
    pub fn with_game(mut self, game: TestGame) -> Self {
        self.game = game;
        self
    }

    pub fn with_playground(mut self) -> Self {
        self.options.playground_enabled = true;
        self
    }

    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.options.cors_origins = Some(origins.iter().map(|o| (*o).to_string()).collect());
        self
    }

    pub fn with_security_headers(mut self, config: SecurityHeadersConfig) -> Self {
        self.options.security_headers = Some(config);
        self
    }

    pub fn build(self) -> Router {
        build_router(self.game.schema, &self.options)
    }
}
