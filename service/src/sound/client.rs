//! Client for resolving a sound id into a playable preview link.

use async_trait::async_trait;
use thiserror::Error;

use super::types::SoundResponse;

/// Errors from the sound library API.
#[derive(Debug, Error)]
pub enum SoundApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sound not found: {0}")]
    NotFound(i64),

    #[error("Sound {0} has no playable preview")]
    MissingPreview(i64),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

/// Looks up playable links for sounds in an external library.
#[async_trait]
pub trait SoundLinkClient: Send + Sync {
    /// Playable URL for the sound with the given library id.
    async fn get_link(&self, sound_id: i64) -> Result<String, SoundApiError>;
}

/// Freesound API v2 implementation of [`SoundLinkClient`].
pub struct HttpSoundClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSoundClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Use a preconfigured `reqwest::Client` (timeouts, proxies).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl SoundLinkClient for HttpSoundClient {
    async fn get_link(&self, sound_id: i64) -> Result<String, SoundApiError> {
        let url = format!("{}/sounds/{sound_id}/", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("fields", "id,previews")])
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SoundApiError::NotFound(sound_id));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SoundApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let sound: SoundResponse = response.json().await?;
        sound
            .previews
            .best()
            .map(str::to_string)
            .ok_or(SoundApiError::MissingPreview(sound_id))
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Canned sound links for tests.

    use super::{SoundApiError, SoundLinkClient};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Preview URL returned for every sound unless overridden.
    pub const DEFAULT_LINK: &str = "https://cdn.freesound.org/previews/510/510917_11157357-hq.mp3";

    /// Mock [`SoundLinkClient`] returning [`DEFAULT_LINK`] by default.
    ///
    /// Override links per id with `set_link`, make ids fail with `fail_for`,
    /// and inspect requested ids with `calls`.
    pub struct MockSoundClient {
        links: Mutex<HashMap<i64, String>>,
        failing: Mutex<HashSet<i64>>,
        calls: Mutex<Vec<i64>>,
    }

    impl MockSoundClient {
        pub fn new() -> Self {
            Self {
                links: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn set_link(&self, sound_id: i64, link: impl Into<String>) {
            self.links.lock().unwrap().insert(sound_id, link.into());
        }

        /// Make lookups for `sound_id` fail with an upstream error.
        pub fn fail_for(&self, sound_id: i64) {
            self.failing.lock().unwrap().insert(sound_id);
        }

        pub fn calls(&self) -> Vec<i64> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Default for MockSoundClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl SoundLinkClient for MockSoundClient {
        async fn get_link(&self, sound_id: i64) -> Result<String, SoundApiError> {
            self.calls.lock().unwrap().push(sound_id);

            if self.failing.lock().unwrap().contains(&sound_id) {
                return Err(SoundApiError::ApiError {
                    status: 503,
                    message: "sound library unavailable".to_string(),
                });
            }

            Ok(self
                .links
                .lock()
                .unwrap()
                .get(&sound_id)
                .cloned()
                .unwrap_or_else(|| DEFAULT_LINK.to_string()))
        }
    }
}
