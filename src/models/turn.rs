use serde::{Deserialize, Serialize};

/// Speaker code the corpus uses for the target child
pub const CHILD_CODE: &str = "CHI";

/// Role string the corpus uses for the target child
pub const CHILD_ROLE: &str = "Target_Child";

/// Boundary marker used inside morpheme annotations (e.g. `pro:sub|I~v|want`)
pub const MORPHEME_BOUNDARY: char = '~';

/// Which side of the conversation a line belongs to.
///
/// Every non-child participant (mother, father, investigator, ...) collapses
/// into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerRole {
    TargetChild,
    Other,
}

impl SpeakerRole {
    /// Parse a corpus role string such as `Target_Child` or `Mother`
    pub fn from_role(role: &str) -> Self {
        if role.trim() == CHILD_ROLE {
            SpeakerRole::TargetChild
        } else {
            SpeakerRole::Other
        }
    }

    pub fn is_child(self) -> bool {
        self == SpeakerRole::TargetChild
    }

    /// Column prefix used in mean-length bundles
    pub fn label(self) -> &'static str {
        match self {
            SpeakerRole::TargetChild => "CHI",
            SpeakerRole::Other => "MOT",
        }
    }
}

/// One dialogue line as fetched from the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Child or other
    pub speaker_role: SpeakerRole,
    /// Three-letter participant code (`CHI`, `MOT`, `INV`, ...)
    pub speaker_code: String,
    /// Raw utterance text
    pub text: String,
    /// Ordering within the source transcript
    pub sequence_index: usize,
    /// Morpheme tier for this line, if the source has one
    #[serde(default)]
    pub morphemes: Option<String>,
}

impl Turn {
    pub fn new(
        speaker_role: SpeakerRole,
        speaker_code: impl Into<String>,
        text: impl Into<String>,
        sequence_index: usize,
    ) -> Self {
        Self {
            speaker_role,
            speaker_code: speaker_code.into(),
            text: text.into(),
            sequence_index,
            morphemes: None,
        }
    }

    pub fn with_morphemes(mut self, morphemes: impl Into<String>) -> Self {
        self.morphemes = Some(morphemes.into());
        self
    }
}

/// A turn after underscore stripping, with its analysis text precomputed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTurn {
    pub speaker_role: SpeakerRole,
    pub speaker_code: String,
    /// Text with morpheme-boundary underscores removed
    pub text: String,
    pub sequence_index: usize,
    pub morphemes: Option<String>,
    /// Lower-cased text with punctuation and surrounding whitespace stripped
    pub clean: String,
}

impl NormalizedTurn {
    pub fn is_child(&self) -> bool {
        self.speaker_role.is_child()
    }

    /// Whitespace-separated words of the clean text
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.clean.split_whitespace()
    }
}

impl From<NormalizedTurn> for Turn {
    fn from(turn: NormalizedTurn) -> Self {
        Turn {
            speaker_role: turn.speaker_role,
            speaker_code: turn.speaker_code,
            text: turn.text,
            sequence_index: turn.sequence_index,
            morphemes: turn.morphemes,
        }
    }
}
