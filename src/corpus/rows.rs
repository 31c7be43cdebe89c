//! Validation of the corpus service's positional rows into named structs

use serde::Deserialize;
use serde_json::Value;

use crate::error::CorpusError;
use crate::models::{SpeakerRole, TranscriptMeta, Turn, split_path};
use crate::normalize::strip_compound_marker;

/// Column layout of `getUtterances` rows
const UTT_SPEAKER_CODE: usize = 3;
const UTT_SPEAKER_ROLE: usize = 4;
const UTT_TEXT: usize = 7;

/// Column layout of `getTranscripts` rows
const TR_PATH: usize = 0;
const TR_NAME: usize = 1;
const TR_AVAILABILITY: usize = 3;

/// Envelope every query endpoint responds with
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

fn string_at(
    row: &[Value],
    column: usize,
    kind: &'static str,
    index: usize,
) -> Result<String, CorpusError> {
    match row.get(column) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(CorpusError::MalformedRow {
            kind,
            index,
            reason: format!("missing column {}", column),
        }),
        Some(other) => Err(CorpusError::MalformedRow {
            kind,
            index,
            reason: format!("column {} is not a string: {}", column, other),
        }),
    }
}

/// Rows equal once compound underscores are stripped from the text column
fn same_utterance(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).enumerate().all(|(column, pair)| match pair {
            (Value::String(x), Value::String(y)) if column == UTT_TEXT => {
                strip_compound_marker(x) == strip_compound_marker(y)
            }
            (x, y) => x == y,
        })
}

/// Convert utterance rows into turns.
///
/// The service repeats some rows verbatim; a row identical to the one before
/// it keeps that row's sequence index so the normalizer collapses it.
pub fn turns_from_rows(rows: &[Vec<Value>]) -> Result<Vec<Turn>, CorpusError> {
    let mut turns = Vec::with_capacity(rows.len());
    let mut sequence_index = 0usize;

    for (index, row) in rows.iter().enumerate() {
        if index > 0 && !same_utterance(&rows[index - 1], row) {
            sequence_index += 1;
        }

        let role = string_at(row, UTT_SPEAKER_ROLE, "utterance", index)?;
        turns.push(Turn {
            speaker_role: SpeakerRole::from_role(&role),
            speaker_code: string_at(row, UTT_SPEAKER_CODE, "utterance", index)?,
            text: string_at(row, UTT_TEXT, "utterance", index)?,
            sequence_index,
            morphemes: None,
        });
    }

    Ok(turns)
}

pub fn transcripts_from_rows(rows: &[Vec<Value>]) -> Result<Vec<TranscriptMeta>, CorpusError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let path = string_at(row, TR_PATH, "transcript", index)?;
            let id = string_at(row, TR_NAME, "transcript", index)?;
            let availability = row
                .get(TR_AVAILABILITY)
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(TranscriptMeta {
                path: split_path(&path),
                id,
                availability,
                age_months: None,
            })
        })
        .collect()
}
