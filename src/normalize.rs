use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NormalizedTurn, Turn};

/// Everything that is not a word character, whitespace, apostrophe, underscore or hyphen
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s'_\-]").expect("static regex"));

/// Underscore marks compounds in the source annotation (`milk_ball`)
const COMPOUND_MARKER: char = '_';

/// Normalize the raw turn sequence of one transcript.
///
/// Removes compound underscores and collapses runs of fully identical
/// adjacent turns, which the corpus service returns as duplicated rows.
/// Turns carry their sequence index, so genuine repetitions by a speaker
/// differ in index and survive. An empty input yields an empty output.
pub fn normalize_turns(raw: Vec<Turn>) -> Vec<NormalizedTurn> {
    let mut out: Vec<NormalizedTurn> = Vec::with_capacity(raw.len());

    for turn in raw {
        let text = strip_compound_marker(&turn.text);
        let normalized = NormalizedTurn {
            clean: clean_text(&text),
            speaker_role: turn.speaker_role,
            speaker_code: turn.speaker_code,
            text,
            sequence_index: turn.sequence_index,
            morphemes: turn.morphemes,
        };

        if out.last() != Some(&normalized) {
            out.push(normalized);
        }
    }

    out
}

/// `i want milk_ball` → `i want milkball`
pub fn strip_compound_marker(text: &str) -> String {
    text.replace(COMPOUND_MARKER, "")
}

/// Lower-case, drop punctuation (keeping `'`, `_`, `-`) and trim
pub fn clean_text(text: &str) -> String {
    PUNCTUATION
        .replace_all(&text.to_lowercase(), "")
        .trim()
        .to_string()
}
