use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::CorpusError;
use crate::io::read_chat_file;
use crate::models::{QuerySpec, TranscriptMeta, Turn};

use super::CorpusService;

#[derive(Debug, Clone)]
struct LocalTranscript {
    meta: TranscriptMeta,
    group: Option<String>,
    turns: Vec<Turn>,
}

/// In-memory corpus, usually loaded from a directory tree of CHAT files.
///
/// Queries filter on corpus path prefix, target-child age and group type.
/// Language and activity type are not recorded in CHAT headers in a form we
/// read, so those filters are ignored.
#[derive(Debug, Clone, Default)]
pub struct LocalCorpus {
    transcripts: Vec<LocalTranscript>,
}

impl LocalCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.cha` file under `root`; its path relative to `root` is the corpus path
    pub fn from_dir(root: &Path) -> Result<Self> {
        let mut corpus = Self::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {:?}", root))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "cha") {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let id = segments.last().cloned().unwrap_or_default();

            match read_chat_file(path) {
                Ok(chat) => {
                    let meta = TranscriptMeta {
                        path: segments,
                        id,
                        availability: None,
                        age_months: chat.age_months,
                    };
                    corpus.insert(meta, chat.group, chat.turns);
                }
                Err(err) => warn!("Skipping {:?}: {:#}", path, err),
            }
        }

        info!("Loaded {} transcripts from {:?}", corpus.len(), root);
        Ok(corpus)
    }

    pub fn insert(&mut self, meta: TranscriptMeta, group: Option<String>, turns: Vec<Turn>) {
        self.transcripts.push(LocalTranscript { meta, group, turns });
    }

    pub fn len(&self) -> usize {
        self.transcripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcripts.is_empty()
    }

    fn matches(transcript: &LocalTranscript, query: &QuerySpec) -> bool {
        let path = &transcript.meta.path;
        let in_corpora = query.corpora.is_empty()
            || query.corpora.iter().any(|prefix| path.starts_with(prefix));

        let age_ok = query.age.is_empty()
            || transcript
                .meta
                .age_months
                .is_some_and(|age| query.age.contains(&age));

        let group_ok = query.group_type.is_empty()
            || transcript
                .group
                .as_ref()
                .is_some_and(|g| query.group_type.contains(g));

        in_corpora && age_ok && group_ok
    }
}

impl CorpusService for LocalCorpus {
    async fn transcripts(&self, query: &QuerySpec) -> Result<Vec<TranscriptMeta>, CorpusError> {
        let mut found: Vec<TranscriptMeta> = self
            .transcripts
            .iter()
            .filter(|t| Self::matches(t, query))
            .map(|t| t.meta.clone())
            .collect();
        if let Some(max) = query.max_count {
            found.truncate(max);
        }
        Ok(found)
    }

    async fn utterances(&self, transcript: &TranscriptMeta) -> Result<Vec<Turn>, CorpusError> {
        self.transcripts
            .iter()
            .find(|t| t.meta.path == transcript.path)
            .map(|t| t.turns.clone())
            .ok_or_else(|| CorpusError::UnknownTranscript(transcript.path_string()))
    }
}
