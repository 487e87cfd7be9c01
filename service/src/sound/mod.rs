//! Sound link resolution.
//!
//! Cards store only the sound library's numeric id; the playable link is
//! looked up when a card is served, so expiring CDN URLs never reach the
//! database.
//!
//! - [`SoundLinkClient`] - the lookup operation
//! - [`HttpSoundClient`] - Freesound API implementation over reqwest
//! - [`mock::MockSoundClient`] - canned links for tests (behind `test-utils`)
//!
//! ```ignore
//! use soundcards_api::sound::{HttpSoundClient, SoundLinkClient};
//!
//! let client = HttpSoundClient::new("https://freesound.org/apiv2", "token");
//! let link = client.get_link(510_917).await?;
//! ```

mod client;
mod types;

pub use client::{HttpSoundClient, SoundApiError, SoundLinkClient};
pub use types::{SoundPreviews, SoundResponse};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
