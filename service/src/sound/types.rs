//! Freesound API payloads.

use serde::{Deserialize, Serialize};

/// Subset of `GET /sounds/{id}/?fields=id,previews`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundResponse {
    pub id: i64,
    #[serde(default)]
    pub previews: SoundPreviews,
}

/// Preview URLs served from the Freesound CDN.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoundPreviews {
    #[serde(rename = "preview-hq-mp3")]
    pub hq_mp3: Option<String>,
    #[serde(rename = "preview-lq-mp3")]
    pub lq_mp3: Option<String>,
}

impl SoundPreviews {
    /// Best available playable link, preferring high quality.
    #[must_use]
    pub fn best(&self) -> Option<&str> {
        self.hq_mp3.as_deref().or(self.lq_mp3.as_deref())
    }
}
