pub mod client;
pub mod local;
pub mod rows;

pub use client::*;
pub use local::*;

use crate::error::CorpusError;
use crate::models::{QuerySpec, TranscriptMeta, Turn};

/// Source of transcripts and their utterances.
///
/// Retries and caching belong to the implementation; callers treat each call
/// as a single synchronous fetch.
#[allow(async_fn_in_trait)]
pub trait CorpusService {
    /// Metadata of every transcript matching `query`
    async fn transcripts(&self, query: &QuerySpec) -> Result<Vec<TranscriptMeta>, CorpusError>;

    /// Ordered turn rows of one transcript
    async fn utterances(&self, transcript: &TranscriptMeta) -> Result<Vec<Turn>, CorpusError>;
}
