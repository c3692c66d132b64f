//! Recording resolution against the By_Date archive
//!
//! The detection's `listenurl` points at a player page whose `filename` query
//! parameter names the recording. The archive stores recordings under
//! `/By_Date/{date}/{folder}/{filename}`, where `folder` is the filename with
//! its `-<digits>-` detection-index infix stripped. Resolution failures are
//! never fatal: a missing recording must not block the notification.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use thiserror::Error;

use crate::types::RecordingResolution;

const USER_AGENT: &str = "birdnotify/0.1.0";
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Numeric detection-index infix separating folder name from timestamp,
/// e.g. `SONG-12345-20230101.wav` → folder `SONG`
static DETECTION_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\d+-").expect("valid regex"));

/// Recording fetch errors (internal; callers only see [`RecordingResolution`])
#[derive(Debug, Error)]
enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Archive error {0}")]
    Archive(u16),
}

/// Compute the archive URL for a recording without any network access.
///
/// Returns `None` when the listen URL is absent or unparseable, when it
/// carries no `filename` query parameter, or when no detection date is
/// available to address the archive.
pub fn recording_reference(listen_url: Option<&str>, date: Option<&str>) -> Option<String> {
    let url = Url::parse(listen_url?).ok()?;

    let filename = url
        .query_pairs()
        .find(|(key, _)| key == "filename")
        .map(|(_, value)| value.into_owned())?;

    let date = date?;
    let folder = detection_folder(&filename);
    let origin = url.origin().ascii_serialization();

    Some(format!("{}/By_Date/{}/{}/{}", origin, date, folder, filename))
}

/// Folder containing the recording: the filename prefix before the first
/// `-<digits>-` infix, or the whole filename when no infix matches.
fn detection_folder(filename: &str) -> &str {
    match DETECTION_INDEX.find(filename) {
        Some(found) => &filename[..found.start()],
        None => filename,
    }
}

/// Resolver for the detection's audio recording
pub struct RecordingResolver {
    http_client: reqwest::Client,
}

impl RecordingResolver {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self { http_client })
    }

    /// Resolve the recording for a detection.
    ///
    /// With `attach` off this performs no network access and is idempotent.
    /// With `attach` on, the recording is fetched and inlined as an
    /// `audio/mpeg` data URI; any fetch failure degrades to
    /// [`RecordingResolution::Unavailable`] with a warning log.
    pub async fn resolve(
        &self,
        listen_url: Option<&str>,
        date: Option<&str>,
        attach: bool,
    ) -> RecordingResolution {
        let Some(url) = recording_reference(listen_url, date) else {
            return RecordingResolution::Unavailable;
        };

        if !attach {
            return RecordingResolution::Embed { url };
        }

        match self.fetch_as_data_uri(&url).await {
            Ok(data) => RecordingResolution::Attach { data, url },
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "Failed to get recording");
                RecordingResolution::Unavailable
            }
        }
    }

    async fn fetch_as_data_uri(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Archive(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(format!("data:audio/mpeg;base64,{}", STANDARD.encode(&body)))
    }
}
