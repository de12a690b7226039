/*!
 * ElevenLabs speech-to-text client.
 *
 * Uploads an audio file as a multipart form and decodes the word-level
 * transcript. Requests go through the public unauthenticated endpoint with
 * browser-like headers.
 */

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use rand::seq::IndexedRandom;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app_config::TranscriptionConfig;
use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::Transcriber;
use crate::subtitle_processor::Transcript;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &[
    "zh-CN,zh;q=0.9,en;q=0.8",
    "en-US,en;q=0.9,es;q=0.8",
    "en-GB,en;q=0.9",
    "ja-JP,ja;q=0.9,en;q=0.8",
    "ko-KR,ko;q=0.9,en;q=0.8",
    "de-DE,de;q=0.9,en;q=0.8",
    "fr-FR,fr;q=0.9,en;q=0.8",
    "en-US,en;q=0.5",
];

const BASE_HEADERS: &[(&str, &str)] = &[
    ("accept", "*/*"),
    ("origin", "https://elevenlabs.io"),
    ("referer", "https://elevenlabs.io/"),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-site"),
];

/// ElevenLabs speech-to-text client
#[derive(Debug, Clone)]
pub struct ElevenLabsTranscriber {
    client: Client,
    /// Endpoint with query parameters applied
    url: Url,
    model_id: String,
}

impl ElevenLabsTranscriber {
    /// Create a new client
    pub fn new(endpoint: &str, model_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut url = Url::parse(endpoint).context(format!("Invalid transcription endpoint: {}", endpoint))?;
        url.query_pairs_mut().append_pair("allow_unauthenticated", "1");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            model_id: model_id.into(),
        })
    }

    pub fn from_config(config: &TranscriptionConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Text fields of the upload form
    pub fn form_fields(&self, language_hint: &str, tag_audio_events: bool) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("model_id", self.model_id.clone()),
            ("diarize", "true".to_string()),
            ("tag_audio_events", tag_audio_events.to_string()),
        ];
        if !language_utils::is_auto_detect(language_hint) {
            fields.push(("language_code", language_hint.trim().to_string()));
        }
        fields
    }

    async fn upload(
        &self,
        path: &Path,
        language_hint: &str,
        tag_audio_events: bool,
    ) -> Result<Transcript, ProviderError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ProviderError::Io(format!("{:?}: {}", path, e)))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();

        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let file_part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_extension(&extension))
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let form = self
            .form_fields(language_hint, tag_audio_events)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("file", file_part);

        let mut request = self.client.post(self.url.clone());
        for (name, value) in random_headers() {
            request = request.header(name, value);
        }

        let response = request
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str::<Transcript>(&body).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Transcriber for ElevenLabsTranscriber {
    async fn transcribe(
        &self,
        path: &Path,
        language_hint: &str,
        tag_audio_events: bool,
        cancel: &CancellationToken,
    ) -> Result<Transcript, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.upload(path, language_hint, tag_audio_events) => result,
        }
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

/// MIME type for an audio or video file extension
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "mp3" => "audio/mp3",
        "m4a" => "audio/m4a",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        "mov" => "video/mov",
        _ => "application/octet-stream",
    }
}

/// Browser-like headers with a random User-Agent and Accept-Language
pub fn random_headers() -> Vec<(&'static str, &'static str)> {
    let mut rng = rand::rng();
    let mut headers = BASE_HEADERS.to_vec();
    headers.push(("user-agent", USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])));
    headers.push((
        "accept-language",
        ACCEPT_LANGUAGES.choose(&mut rng).copied().unwrap_or(ACCEPT_LANGUAGES[0]),
    ));
    headers
}
