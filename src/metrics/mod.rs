pub mod echo;
pub mod lexical;
pub mod mean_length;

pub use echo::*;
pub use lexical::*;
pub use mean_length::*;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MetricError;
use crate::models::{MetricBundle, NormalizedTurn};

/// The per-transcript analyses a run can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    MeanLength,
    Ttr,
    EchoedUtterances,
    RepeatedVocab,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::MeanLength,
        AnalysisKind::Ttr,
        AnalysisKind::EchoedUtterances,
        AnalysisKind::RepeatedVocab,
    ];

    /// Name used in sheet names and logs
    pub fn name(self) -> &'static str {
        match self {
            AnalysisKind::MeanLength => "meanlength",
            AnalysisKind::Ttr => "ttr",
            AnalysisKind::EchoedUtterances => "echoed_utterances",
            AnalysisKind::RepeatedVocab => "repeated_vocab",
        }
    }

    /// Run this analysis over one normalized transcript
    pub fn extract(
        self,
        turns: &[NormalizedTurn],
        config: &ExtractConfig,
    ) -> Result<MetricBundle, MetricError> {
        if turns.is_empty() {
            return Err(MetricError::NoTurns);
        }
        match self {
            AnalysisKind::MeanLength => mean_length(turns, &config.mean_length),
            AnalysisKind::Ttr => type_token_ratio(turns),
            AnalysisKind::EchoedUtterances => echoed_utterances(turns),
            AnalysisKind::RepeatedVocab => {
                repeated_vocab(turns, config.split_morphemes).to_bundle()
            }
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown analysis: {}", s))
    }
}

/// Options shared by the extractors
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractConfig {
    pub mean_length: MeanLengthConfig,
    /// Split words on the morpheme boundary in the repeated-vocabulary analysis
    pub split_morphemes: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in AnalysisKind::ALL {
            assert_eq!(kind.name().parse::<AnalysisKind>(), Ok(kind));
        }
        assert!("mlu".parse::<AnalysisKind>().is_err());
    }

    #[test]
    fn test_extract_empty_is_no_data() {
        for kind in AnalysisKind::ALL {
            assert_eq!(
                kind.extract(&[], &ExtractConfig::default()),
                Err(MetricError::NoTurns)
            );
        }
    }
}
