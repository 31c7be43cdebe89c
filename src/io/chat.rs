use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::models::{CHILD_CODE, CHILD_ROLE, NormalizedTurn, SpeakerRole, Turn};

/// Media time bullets wrap `start_end` in this control character
const BULLET: char = '\u{15}';

/// A CHAT (`.cha`) transcript read from disk
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    /// Participant code → role, from `@Participants`
    pub participants: HashMap<String, String>,
    /// Target child's age in months, from `@ID`
    pub age_months: Option<u32>,
    /// Target child's group (`TD`, `ASD`, ...), from `@ID`
    pub group: Option<String>,
    pub turns: Vec<Turn>,
}

impl ChatTranscript {
    fn role_of(&self, code: &str) -> SpeakerRole {
        match self.participants.get(code) {
            Some(role) => SpeakerRole::from_role(role),
            None if code == CHILD_CODE => SpeakerRole::TargetChild,
            None => SpeakerRole::Other,
        }
    }

    /// `*CODE:\t<%mor tier>` for every turn that has a morpheme tier
    pub fn mor_lines(&self) -> Vec<String> {
        self.turns
            .iter()
            .filter_map(|turn| {
                let morphemes = turn.morphemes.as_deref()?;
                Some(tier_line(&turn.speaker_code, morphemes))
            })
            .collect()
    }
}

/// `*CODE:\ttext`
pub fn tier_line(code: &str, text: &str) -> String {
    format!("*{}:\t{}", code, text)
}

/// Rebuild main-tier lines from normalized turns
pub fn utterance_lines(turns: &[NormalizedTurn]) -> Vec<String> {
    turns
        .iter()
        .map(|turn| tier_line(&turn.speaker_code, &turn.text))
        .collect()
}

/// Write the morpheme tiers of a `.cha` file to a sibling `.mor` file
pub fn write_mor_file(path: &Path) -> Result<PathBuf> {
    let chat = read_chat_file(path)?;
    let out = path.with_extension("mor");

    let mut content = chat.mor_lines().join("\n");
    content.push('\n');
    std::fs::write(&out, content).with_context(|| format!("Failed to write file: {:?}", out))?;
    Ok(out)
}

pub fn read_chat_file(path: &Path) -> Result<ChatTranscript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(parse_chat(&content))
}

/// Parse CHAT text into turns with their `%mor` tiers attached
pub fn parse_chat(content: &str) -> ChatTranscript {
    let mut transcript = ChatTranscript::default();

    for line in logical_lines(content) {
        if let Some(rest) = line.strip_prefix("@Participants:") {
            transcript.participants = parse_participants(rest);
        } else if let Some(rest) = line.strip_prefix("@ID:") {
            parse_id(rest, &mut transcript);
        } else if let Some(rest) = line.strip_prefix("%mor:") {
            if let Some(turn) = transcript.turns.last_mut() {
                turn.morphemes = Some(rest.trim().to_string());
            }
        } else if let Some(rest) = line.strip_prefix('*') {
            let Some((code, text)) = rest.split_once(':') else {
                continue;
            };
            let turn = Turn::new(
                transcript.role_of(code),
                code,
                strip_bullets(text).trim(),
                transcript.turns.len(),
            );
            transcript.turns.push(turn);
        }
    }

    transcript
}

/// Long tiers wrap onto tab-indented continuation lines; join them back
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in content.lines() {
        if raw.starts_with('\t') {
            if let Some(last) = lines.last_mut() {
                last.push(' ');
                last.push_str(raw.trim());
                continue;
            }
        }
        lines.push(raw.trim_end().to_string());
    }
    lines
}

/// `CHI Mark Target_Child, MOT Mother` → {CHI: Target_Child, MOT: Mother}
fn parse_participants(rest: &str) -> HashMap<String, String> {
    rest.split(',')
        .filter_map(|entry| {
            let mut fields = entry.split_whitespace();
            let code = fields.next()?;
            let role = fields.last().unwrap_or(code);
            Some((code.to_string(), role.to_string()))
        })
        .collect()
}

/// `eng|Flusberg|CHI|3;04.|male|TD||Target_Child|||`
fn parse_id(rest: &str, transcript: &mut ChatTranscript) {
    let fields: Vec<&str> = rest.trim().split('|').collect();
    if fields.get(7).map(|r| r.trim()) != Some(CHILD_ROLE) {
        return;
    }
    transcript.age_months = fields.get(3).and_then(|age| parse_age_months(age));
    transcript.group = fields
        .get(5)
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string);
}

/// CHAT ages are `years;months.days`; days are dropped
pub fn parse_age_months(age: &str) -> Option<u32> {
    let (years, rest) = age.trim().split_once(';')?;
    let years: u32 = years.parse().ok()?;
    let months = rest.split('.').next().unwrap_or("");
    let months: u32 = if months.is_empty() { 0 } else { months.parse().ok()? };
    Some(years * 12 + months)
}

fn strip_bullets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut inside = false;
    for c in text.chars() {
        if c == BULLET {
            inside = !inside;
        } else if !inside {
            out.push(c);
        }
    }
    out
}
