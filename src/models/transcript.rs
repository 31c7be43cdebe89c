use serde::{Deserialize, Serialize};

/// Availability markers meaning the transcript has no usable text
const NO_TEXT_MARKERS: [&str; 3] = ["notrans", "no transcription", "unlinked"];

/// Metadata for one transcript returned by a corpus query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TranscriptMeta {
    /// Corpus path segments, e.g. `["asd", "English", "Flusberg", "Brett", "020100"]`
    pub path: Vec<String>,
    /// Display name / identifier used as the row key in longitudinal tables
    pub id: String,
    /// Media/text availability marker reported by the corpus
    #[serde(default)]
    pub availability: Option<String>,
    /// Target child's age in whole months, when known
    #[serde(default)]
    pub age_months: Option<u32>,
}

impl TranscriptMeta {
    pub fn new(path: Vec<String>, id: impl Into<String>) -> Self {
        Self {
            path,
            id: id.into(),
            availability: None,
            age_months: None,
        }
    }

    /// Build from a slash-separated corpus path such as `asd/English/Flusberg/Brett`
    pub fn from_path_str(path: &str, id: impl Into<String>) -> Self {
        Self::new(split_path(path), id)
    }

    pub fn with_availability(mut self, marker: impl Into<String>) -> Self {
        self.availability = Some(marker.into());
        self
    }

    /// The corpus name is the first path segment
    pub fn corpus_name(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or("")
    }

    pub fn path_string(&self) -> String {
        self.path.join("/")
    }

    /// False when the corpus flags the transcript as untranscribed or unlinked
    pub fn has_usable_text(&self) -> bool {
        match &self.availability {
            Some(marker) => {
                let marker = marker.to_lowercase();
                !NO_TEXT_MARKERS.iter().any(|m| marker.contains(m))
            }
            None => true,
        }
    }
}

pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_text_markers() {
        let base = TranscriptMeta::from_path_str("childes/Eng-NA/Brown/Adam/020304", "adam01");
        assert!(base.has_usable_text());
        assert!(base.clone().with_availability("audio").has_usable_text());
        assert!(!base.clone().with_availability("audio, notrans").has_usable_text());
        assert!(!base.clone().with_availability("Unlinked").has_usable_text());
        assert!(!base.with_availability("no transcription").has_usable_text());
    }

    #[test]
    fn test_path_parsing() {
        let meta = TranscriptMeta::from_path_str("asd/English/Flusberg/Brett/", "b1");
        assert_eq!(meta.path, vec!["asd", "English", "Flusberg", "Brett"]);
        assert_eq!(meta.corpus_name(), "asd");
        assert_eq!(meta.path_string(), "asd/English/Flusberg/Brett");
    }
}
