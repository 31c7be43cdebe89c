use crate::error::MetricError;
use crate::models::{MetricBundle, NormalizedTurn};

/// Child repeats part of the other speaker's last line
pub const CHILD_PARTIAL: &str = "c<m";
/// Child repeats the other speaker's whole last line
pub const CHILD_FULL: &str = "c=m";
/// Other speaker repeats part of the child's last line
pub const OTHER_PARTIAL: &str = "m<c";
pub const OTHER_FULL: &str = "m=c";
/// Line identical to the immediately preceding line, any speaker
pub const SAME_AS_LAST: &str = "=last";

/// Counts cross-speaker echoing over one transcript.
///
/// Holds the last clean line of each side. Create one per transcript and
/// feed it turns in source order.
#[derive(Debug, Default, Clone)]
pub struct EchoAnalyzer {
    childs_last_line: String,
    others_last_line: String,
    last_line: Option<String>,
    counts: EchoCounts,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EchoCounts {
    pub child_partial: u32,
    pub child_full: u32,
    pub other_partial: u32,
    pub other_full: u32,
    pub same_as_last: u32,
    pub child_lines: u32,
    pub other_lines: u32,
    pub total_lines: u32,
}

impl EchoAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, turn: &NormalizedTurn) {
        let line = turn.clean.as_str();
        self.counts.total_lines += 1;

        if turn.is_child() {
            self.counts.child_lines += 1;
            if let Some(full) = echo_of(line, &self.others_last_line) {
                self.counts.child_partial += 1;
                if full {
                    self.counts.child_full += 1;
                }
            }
            self.childs_last_line = line.to_string();
        } else {
            self.counts.other_lines += 1;
            if let Some(full) = echo_of(line, &self.childs_last_line) {
                self.counts.other_partial += 1;
                if full {
                    self.counts.other_full += 1;
                }
            }
            self.others_last_line = line.to_string();
        }

        if !line.is_empty() && self.last_line.as_deref() == Some(line) {
            self.counts.same_as_last += 1;
        }
        self.last_line = Some(line.to_string());
    }

    pub fn counts(&self) -> EchoCounts {
        self.counts
    }

    pub fn finish(self) -> MetricBundle {
        let c = self.counts;
        MetricBundle::new()
            .with(CHILD_PARTIAL, c.child_partial as f64)
            .with(CHILD_FULL, c.child_full as f64)
            .with(OTHER_PARTIAL, c.other_partial as f64)
            .with(OTHER_FULL, c.other_full as f64)
            .with(SAME_AS_LAST, c.same_as_last as f64)
            .with("child_lines", c.child_lines as f64)
            .with("mother_lines", c.other_lines as f64)
            .with("total_lines", c.total_lines as f64)
    }
}

/// `Some(full)` when `line` is a non-empty substring of `previous`
fn echo_of(line: &str, previous: &str) -> Option<bool> {
    if line.is_empty() || !previous.contains(line) {
        return None;
    }
    Some(line == previous)
}

/// Echo/repetition counts for one normalized transcript
pub fn echoed_utterances(turns: &[NormalizedTurn]) -> Result<MetricBundle, MetricError> {
    if turns.is_empty() {
        return Err(MetricError::NoTurns);
    }

    let mut analyzer = EchoAnalyzer::new();
    for turn in turns {
        analyzer.observe(turn);
    }
    Ok(analyzer.finish())
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
    fn test_full_echo_counts_partial_too() {
        let turns = transcript(&[(Other, "hi there"), (TargetChild, "hi there")]);
        let bundle = echoed_utterances(&turns).unwrap();

        assert_eq!(bundle.get(CHILD_FULL), Some(1.0));
        assert_eq!(bundle.get(CHILD_PARTIAL), Some(1.0));
        assert_eq!(bundle.get(OTHER_PARTIAL), Some(0.0));
        assert_eq!(bundle.get(SAME_AS_LAST), Some(1.0));
    }

    #[test]
    fn test_partial_echo_only() {
        let turns = transcript(&[(Other, "do you want the ball"), (TargetChild, "the ball!")]);
        let bundle = echoed_utterances(&turns).unwrap();

        assert_eq!(bundle.get(CHILD_PARTIAL), Some(1.0));
        assert_eq!(bundle.get(CHILD_FULL), Some(0.0));
        assert_eq!(bundle.get(SAME_AS_LAST), Some(0.0));
    }

    #[test]
    fn test_other_repeating_child() {
        let turns = transcript(&[(TargetChild, "doggy"), (Other, "Doggy.")]);
        let bundle = echoed_utterances(&turns).unwrap();

        assert_eq!(bundle.get(OTHER_PARTIAL), Some(1.0));
        assert_eq!(bundle.get(OTHER_FULL), Some(1.0));
        assert_eq!(bundle.get(CHILD_PARTIAL), Some(0.0));
    }

    #[test]
    fn test_empty_line_never_counts() {
        let turns = transcript(&[
            (Other, "look"),
            (TargetChild, "?"),
            (Other, "!"),
            (TargetChild, "..."),
        ]);
        let bundle = echoed_utterances(&turns).unwrap();

        for key in [CHILD_PARTIAL, CHILD_FULL, OTHER_PARTIAL, OTHER_FULL, SAME_AS_LAST] {
            assert_eq!(bundle.get(key), Some(0.0), "{key}");
        }
        assert_eq!(bundle.get("total_lines"), Some(4.0));
    }

    #[test]
    fn test_line_counts() {
        let turns = transcript(&[(Other, "a"), (Other, "b"), (TargetChild, "c")]);
        let bundle = echoed_utterances(&turns).unwrap();

        assert_eq!(bundle.get("child_lines"), Some(1.0));
        assert_eq!(bundle.get("mother_lines"), Some(2.0));
        assert_eq!(bundle.get("total_lines"), Some(3.0));
    }

    #[test]
    fn test_state_is_per_analyzer() {
        let first = transcript(&[(Other, "ball")]);
        let second = transcript(&[(TargetChild, "ball")]);

        echoed_utterances(&first).unwrap();
        let bundle = echoed_utterances(&second).unwrap();
        assert_eq!(bundle.get(CHILD_PARTIAL), Some(0.0));
    }

    #[test]
    fn test_empty_transcript_is_no_data() {
        assert_eq!(echoed_utterances(&[]), Err(MetricError::NoTurns));
    }
}
