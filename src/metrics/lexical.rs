use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::MetricError;
use crate::models::{MORPHEME_BOUNDARY, MetricBundle, NormalizedTurn};
use crate::normalize::clean_text;

/// Types, tokens and type-token ratio of the target child's words
pub fn type_token_ratio(turns: &[NormalizedTurn]) -> Result<MetricBundle, MetricError> {
    let mut types: HashMap<&str, u32> = HashMap::new();
    for turn in turns.iter().filter(|t| t.is_child()) {
        for word in turn.words() {
            *types.entry(word).or_insert(0) += 1;
        }
    }

    let tokens: u32 = types.values().sum();
    if tokens == 0 {
        return Err(MetricError::ZeroDenominator("child tokens"));
    }

    Ok(MetricBundle::new()
        .with("types", types.len() as f64)
        .with("tokens", tokens as f64)
        .with("ttr", types.len() as f64 / tokens as f64))
}

/// How often the child used a word on their own vs while echoing
#[derive(Debug, Clone, PartialEq)]
pub struct WordIndependence {
    pub word: String,
    pub own: u32,
    pub echoed: u32,
    /// `own / (own + echoed)`
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedVocab {
    /// Highest independence first; equal ratios in alphabetical order
    pub ranking: Vec<WordIndependence>,
    /// Distinct words the child produced at all
    pub total_vocab: usize,
    /// Distinct words the child produced at least once without echoing
    pub independent_vocab: usize,
}

impl RepeatedVocab {
    /// Summary suitable for aggregation across transcripts
    pub fn to_bundle(&self) -> Result<MetricBundle, MetricError> {
        if self.ranking.is_empty() {
            return Err(MetricError::ZeroDenominator("child words"));
        }
        let mean = self.ranking.iter().map(|w| w.ratio).sum::<f64>() / self.ranking.len() as f64;
        Ok(MetricBundle::new()
            .with("vocab_total", self.total_vocab as f64)
            .with("vocab_independent", self.independent_vocab as f64)
            .with("independence_mean", mean))
    }

    pub fn words(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.ranking.iter().map(|w| w.word.as_str())
    }
}

/// Rank the child's words by how often they were produced independently.
///
/// A child line counts as echoing when it is a non-empty substring of the
/// other speaker's most recent line. With `split_morphemes`, lines are read
/// from the morpheme annotation where a turn has one, so clitics count as
/// words of their own.
pub fn repeated_vocab(turns: &[NormalizedTurn], split_morphemes: bool) -> RepeatedVocab {
    // word -> (own, echoed)
    let mut counts: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    let mut others_last_line = String::new();

    for turn in turns {
        let line = if split_morphemes {
            morpheme_line(turn)
        } else {
            turn.clean.clone()
        };

        if !turn.is_child() {
            others_last_line = line;
            continue;
        }

        let echoing = !line.is_empty() && others_last_line.contains(line.as_str());
        for word in line.split_whitespace() {
            let entry = counts.entry(word.to_string()).or_insert((0, 0));
            if echoing {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }
    }

    let independent_vocab = counts.values().filter(|(own, _)| *own > 0).count();
    let mut ranking: Vec<WordIndependence> = counts
        .into_iter()
        .map(|(word, (own, echoed))| WordIndependence {
            ratio: own as f64 / (own + echoed) as f64,
            word,
            own,
            echoed,
        })
        .collect();

    // Stable sort over alphabetical input keeps ties alphabetical
    ranking.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));

    debug!(
        "total vocab: {}; independent vocab: {}",
        ranking.len(),
        independent_vocab
    );

    RepeatedVocab {
        total_vocab: ranking.len(),
        ranking,
        independent_vocab,
    }
}

/// Clean line of morpheme stems, one per boundary-separated morpheme.
///
/// `pro:dem|that~cop|be&3S pro:poss|mine .` → `that be mine`. Without an
/// annotation the surface text is split on the boundary marker instead.
fn morpheme_line(turn: &NormalizedTurn) -> String {
    let Some(annotation) = turn.morphemes.as_deref() else {
        return clean_text(&turn.text.replace(MORPHEME_BOUNDARY, " "));
    };

    let stems: Vec<String> = annotation
        .split(|c: char| c == MORPHEME_BOUNDARY || c.is_whitespace())
        .map(morpheme_stem)
        .filter(|stem| !stem.is_empty())
        .collect();
    stems.join(" ")
}

/// `cop|be&3S` → `be`; compounds join their parts (`n|+adj|big+n|ball` → `bigball`)
fn morpheme_stem(morpheme: &str) -> String {
    let stem: String = morpheme
        .split('+')
        .map(|part| {
            let word = part.rsplit('|').next().unwrap_or(part);
            word.split(['&', '-']).next().unwrap_or(word)
        })
        .collect();
    clean_text(&stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeakerRole::{self, Other, TargetChild};
    use crate::models::Turn;
    use crate::normalize::normalize_turns;

    fn transcript(lines: &[(SpeakerRole, &str)]) -> Vec<NormalizedTurn> {
        normalize_turns(
            lines
                .iter()
                .enumerate()
                .map(|(i, (role, text))| Turn::new(*role, "X", *text, i))
                .collect(),
        )
    }

    #[test]
    fn test_ttr_child_only() {
        let turns = transcript(&[
            (Other, "the ball the ball the ball"),
            (TargetChild, "ball ball car"),
        ]);
        let bundle = type_token_ratio(&turns).unwrap();

        assert_eq!(bundle.get("types"), Some(2.0));
        assert_eq!(bundle.get("tokens"), Some(3.0));
        assert!((bundle.get("ttr").unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ttr_bounds() {
        let distinct = transcript(&[(TargetChild, "one two three")]);
        assert_eq!(type_token_ratio(&distinct).unwrap().get("ttr"), Some(1.0));

        let repeated = transcript(&[(TargetChild, "go go"), (Other, "yes"), (TargetChild, "go")]);
        let ttr = type_token_ratio(&repeated).unwrap().get("ttr").unwrap();
        assert!(ttr > 0.0 && ttr < 1.0);
    }

    #[test]
    fn test_ttr_no_child_tokens() {
        let turns = transcript(&[(Other, "hello"), (TargetChild, "!")]);
        assert_eq!(
            type_token_ratio(&turns),
            Err(MetricError::ZeroDenominator("child tokens"))
        );
    }

    #[test]
    fn test_repeated_vocab_ratios() {
        let turns = transcript(&[
            (Other, "want the red car"),
            (TargetChild, "red car"),
            (TargetChild, "car go"),
            (Other, "where"),
            (TargetChild, "bus"),
        ]);
        let vocab = repeated_vocab(&turns, false);

        let ratio = |w: &str| vocab.ranking.iter().find(|x| x.word == w).unwrap().ratio;
        assert_eq!(ratio("bus"), 1.0);
        assert_eq!(ratio("go"), 1.0);
        assert_eq!(ratio("car"), 0.5);
        assert_eq!(ratio("red"), 0.0);
        assert_eq!(vocab.total_vocab, 4);
        assert_eq!(vocab.independent_vocab, 3);
    }

    #[test]
    fn test_repeated_vocab_ties_alphabetical() {
        let turns = transcript(&[(TargetChild, "zebra apple mango")]);
        let vocab = repeated_vocab(&turns, false);
        assert_eq!(vocab.words().collect::<Vec<_>>(), vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_repeated_vocab_bundle() {
        let turns = transcript(&[(Other, "ball"), (TargetChild, "ball"), (TargetChild, "dog")]);
        let bundle = repeated_vocab(&turns, false).to_bundle().unwrap();

        assert_eq!(bundle.get("vocab_total"), Some(2.0));
        assert_eq!(bundle.get("vocab_independent"), Some(1.0));
        assert_eq!(bundle.get("independence_mean"), Some(0.5));
    }

    #[test]
    fn test_repeated_vocab_splits_morpheme_boundary() {
        let turns = transcript(&[(TargetChild, "that~is mine")]);

        let joined = repeated_vocab(&turns, false);
        assert_eq!(joined.words().collect::<Vec<_>>(), vec!["mine", "thatis"]);

        let split = repeated_vocab(&turns, true);
        assert_eq!(split.words().collect::<Vec<_>>(), vec!["is", "mine", "that"]);
    }

    #[test]
    fn test_repeated_vocab_reads_morpheme_annotation() {
        let turns = normalize_turns(vec![
            Turn::new(TargetChild, "CHI", "that's mine .", 0)
                .with_morphemes("pro:dem|that~cop|be&3S pro:poss|mine ."),
        ]);

        let joined = repeated_vocab(&turns, false);
        assert_eq!(joined.words().collect::<Vec<_>>(), vec!["mine", "that's"]);

        let split = repeated_vocab(&turns, true);
        assert_eq!(split.words().collect::<Vec<_>>(), vec!["be", "mine", "that"]);
    }

    #[test]
    fn test_morpheme_echo_compares_annotations() {
        let turns = normalize_turns(vec![
            Turn::new(Other, "MOT", "it's the big_ball !", 0)
                .with_morphemes("pro:per|it~cop|be&3S det:art|the n|+adj|big+n|ball !"),
            Turn::new(TargetChild, "CHI", "big_ball .", 1).with_morphemes("n|+adj|big+n|ball ."),
        ]);
        let vocab = repeated_vocab(&turns, true);

        assert_eq!(vocab.ranking.len(), 1);
        assert_eq!(vocab.ranking[0].word, "bigball");
        assert_eq!(vocab.ranking[0].echoed, 1);
        assert_eq!(vocab.independent_vocab, 0);
    }

    #[test]
    fn test_repeated_vocab_empty() {
        let vocab = repeated_vocab(&[], false);
        assert!(vocab.ranking.is_empty());
        assert!(vocab.to_bundle().is_err());
    }
}
