use std::collections::BTreeMap;

use crate::error::MetricError;
use crate::models::{MORPHEME_BOUNDARY, MetricBundle, NormalizedTurn, SpeakerRole};

/// Options for mean length of utterance / turn
#[derive(Debug, Clone, Copy)]
pub struct MeanLengthConfig {
    /// Also compute mean length of turn
    pub mlt: bool,
    /// Count morphemes (split on the boundary marker) instead of words
    pub morpheme: bool,
}

impl Default for MeanLengthConfig {
    fn default() -> Self {
        Self {
            mlt: true,
            morpheme: false,
        }
    }
}

/// Running totals for one speaker category
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LengthTotals {
    pub morphemes: u32,
    pub utterances: u32,
    pub turns: u32,
}

/// Accumulated per-category totals over a transcript
pub fn length_totals(
    turns: &[NormalizedTurn],
    morpheme: bool,
) -> BTreeMap<&'static str, LengthTotals> {
    let mut totals: BTreeMap<&'static str, LengthTotals> = BTreeMap::new();
    let mut last_speaker: Option<SpeakerRole> = None;

    for turn in turns {
        let speaker = turn.speaker_role;
        let entry = totals.entry(speaker.label()).or_default();

        if last_speaker != Some(speaker) {
            entry.turns += 1;
        }
        entry.utterances += 1;
        entry.morphemes += count_units(turn, morpheme);

        last_speaker = Some(speaker);
    }

    totals
}

/// Words or morphemes in one utterance; terminators and other bare
/// punctuation tokens are not counted
fn count_units(turn: &NormalizedTurn, morpheme: bool) -> u32 {
    if morpheme {
        let source = turn.morphemes.as_deref().unwrap_or(&turn.text);
        source
            .split(|c: char| c == MORPHEME_BOUNDARY || c.is_whitespace())
            .filter(|unit| unit.chars().any(char::is_alphanumeric))
            .count() as u32
    } else {
        turn.clean.split_whitespace().count() as u32
    }
}

/// MLU (and optionally MLT) for the child and for everyone else.
///
/// Keys are only present for categories that spoke, so a transcript with no
/// child lines has no `CHI_*` keys.
pub fn mean_length(
    turns: &[NormalizedTurn],
    config: &MeanLengthConfig,
) -> Result<MetricBundle, MetricError> {
    if turns.is_empty() {
        return Err(MetricError::NoTurns);
    }

    let mut bundle = MetricBundle::new();
    for (label, totals) in length_totals(turns, config.morpheme) {
        bundle.insert(
            format!("{}_mlu", label),
            ratio(totals.morphemes, totals.utterances, "utterances")?,
        );
        if config.mlt {
            bundle.insert(
                format!("{}_mlt", label),
                ratio(totals.morphemes, totals.turns, "turns")?,
            );
        }
    }

    Ok(bundle)
}

fn ratio(numerator: u32, denominator: u32, what: &'static str) -> Result<f64, MetricError> {
    if denominator == 0 {
        return Err(MetricError::ZeroDenominator(what));
    }
    Ok(numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeakerRole::{Other, TargetChild};
    use crate::io::parse_chat;
    use crate::models::Turn;
    use crate::normalize::normalize_turns;

    fn transcript(lines: Vec<Turn>) -> Vec<NormalizedTurn> {
        normalize_turns(lines)
    }

    #[test]
    fn test_turns_count_speaker_changes() {
        let turns = transcript(vec![
            Turn::new(Other, "MOT", "what is that", 0),
            Turn::new(Other, "MOT", "is it a dog", 1),
            Turn::new(TargetChild, "CHI", "doggy", 2),
            Turn::new(Other, "FAT", "yes a dog", 3),
        ]);
        let totals = length_totals(&turns, false);

        assert_eq!(
            totals["MOT"],
            LengthTotals {
                morphemes: 10,
                utterances: 3,
                turns: 2
            }
        );
        assert_eq!(
            totals["CHI"],
            LengthTotals {
                morphemes: 1,
                utterances: 1,
                turns: 1
            }
        );
    }

    #[test]
    fn test_mlu_and_mlt() {
        let turns = transcript(vec![
            Turn::new(TargetChild, "CHI", "want ball", 0),
            Turn::new(TargetChild, "CHI", "big ball now", 1),
            Turn::new(Other, "MOT", "here", 2),
        ]);
        let bundle = mean_length(&turns, &MeanLengthConfig::default()).unwrap();

        assert_eq!(bundle.get("CHI_mlu"), Some(2.5));
        assert_eq!(bundle.get("CHI_mlt"), Some(5.0));
        assert_eq!(bundle.get("MOT_mlu"), Some(1.0));
        assert_eq!(bundle.get("MOT_mlt"), Some(1.0));
    }

    #[test]
    fn test_mlt_optional() {
        let turns = transcript(vec![Turn::new(TargetChild, "CHI", "hi", 0)]);
        let config = MeanLengthConfig {
            mlt: false,
            morpheme: false,
        };
        let bundle = mean_length(&turns, &config).unwrap();

        assert_eq!(bundle.keys().collect::<Vec<_>>(), vec!["CHI_mlu"]);
    }

    #[test]
    fn test_morpheme_mode_uses_annotation() {
        let turns = transcript(vec![
            Turn::new(TargetChild, "CHI", "that's mine", 0)
                .with_morphemes("pro:dem|that~cop|be&3S pro:poss|mine"),
            Turn::new(TargetChild, "CHI", "doggie~s", 1),
        ]);
        let config = MeanLengthConfig {
            mlt: false,
            morpheme: true,
        };
        let bundle = mean_length(&turns, &config).unwrap();

        // 3 morphemes + 2 morphemes over 2 utterances
        assert_eq!(bundle.get("CHI_mlu"), Some(2.5));
    }

    #[test]
    fn test_chat_terminators_not_counted() {
        let chat = parse_chat("*CHI:\tball .\n%mor:\tn|ball .\n*MOT:\tis it a ball ?\n");
        let turns = normalize_turns(chat.turns);

        for morpheme in [false, true] {
            let config = MeanLengthConfig {
                mlt: false,
                morpheme,
            };
            let bundle = mean_length(&turns, &config).unwrap();
            assert_eq!(bundle.get("CHI_mlu"), Some(1.0), "morpheme: {morpheme}");
            assert_eq!(bundle.get("MOT_mlu"), Some(4.0), "morpheme: {morpheme}");
        }
    }

    #[test]
    fn test_absent_category_has_no_keys() {
        let turns = transcript(vec![Turn::new(Other, "MOT", "anyone there", 0)]);
        let bundle = mean_length(&turns, &MeanLengthConfig::default()).unwrap();

        assert!(!bundle.contains_key("CHI_mlu"));
        assert_eq!(bundle.get("MOT_mlu"), Some(2.0));
    }

    #[test]
    fn test_empty_is_no_data() {
        assert_eq!(
            mean_length(&[], &MeanLengthConfig::default()),
            Err(MetricError::NoTurns)
        );
    }
}
