use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::CorpusError;
use crate::models::{QuerySpec, TranscriptMeta, Turn};

use super::CorpusService;
use super::rows::{QueryResponse, transcripts_from_rows, turns_from_rows};

/// Configuration for the corpus query service client
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Service root; endpoint names are appended to it
    pub base_url: String,
}

impl CorpusConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TALKBANK_DB_URL")
            .context("TALKBANK_DB_URL environment variable not set")?;
        Ok(Self::new(base_url))
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

/// HTTP client for a TalkBank-style transcript database
pub struct TalkBankClient {
    client: Client,
    config: CorpusConfig,
}

impl TalkBankClient {
    pub fn new(config: CorpusConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn query<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<QueryResponse, CorpusError> {
        let url = self.config.endpoint(endpoint);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CorpusError::Status { status, body });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl CorpusService for TalkBankClient {
    async fn transcripts(&self, query: &QuerySpec) -> Result<Vec<TranscriptMeta>, CorpusError> {
        let response = self.query("getTranscripts", query).await?;
        let mut transcripts = transcripts_from_rows(&response.data)?;
        if let Some(max) = query.max_count {
            transcripts.truncate(max);
        }
        Ok(transcripts)
    }

    async fn utterances(&self, transcript: &TranscriptMeta) -> Result<Vec<Turn>, CorpusError> {
        let query = QuerySpec {
            corpora: vec![transcript.path.clone()],
            ..QuerySpec::new(transcript.corpus_name())
        };
        let response = self.query("getUtterances", &query).await?;
        turns_from_rows(&response.data)
    }
}
