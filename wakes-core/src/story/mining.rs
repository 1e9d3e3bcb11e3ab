//! Best-effort extraction from free-form narration.
//!
//! Narration is untrusted text. Every function here returns `None` (or an
//! empty list) rather than failing, and nothing downstream depends on the
//! result being present.

use crate::narrative::{BeatId, StoryBeat};

const SUMMARY_SENTENCE_CHARS: usize = 120;
const SUMMARY_FALLBACK_CHARS: usize = 80;
const CLUE_CHARS: usize = 60;

/// Verbs that introduce a directional hint.
const SEEK_VERBS: [&str; 3] = ["seek", "find", "look for"];

/// The first sentence of `text`, or its first 80 characters when it has no
/// sentence terminator.
pub fn extract_summary(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    let summary = match text.find(['.', '!', '?']) {
        Some(end) if end > 0 => truncate(&text[..=end], SUMMARY_SENTENCE_CHARS),
        _ => truncate(text, SUMMARY_FALLBACK_CHARS),
    };
    Some(summary)
}

/// A location hint: a "Gallery N" reference, or failing that a
/// seek/find/look-for phrase up to the end of its clause.
pub fn extract_clue(text: &str) -> Option<String> {
    gallery_reference(text).or_else(|| seek_phrase(text))
}

/// Ids of earlier beats whose artifact the narration mentions by name.
///
/// A title matches on its part before the first comma, so
/// "Statue of Sekhmet, seated" matches "statue of sekhmet".
pub fn find_referenced_beats(text: &str, beats: &[StoryBeat]) -> Vec<BeatId> {
    let text = text.to_lowercase();
    beats
        .iter()
        .filter(|beat| {
            let title = beat.artifact_title.to_lowercase();
            let key = title.split(',').next().unwrap_or_default().trim();
            !key.is_empty() && text.contains(key)
        })
        .map(|beat| beat.id)
        .collect()
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// First letter of `word` in either case, the rest as written.
fn starts_with_word(rest: &str, word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let tail = chars.as_str();
    let upper: String = first.to_uppercase().chain(tail.chars()).collect();
    rest.starts_with(word) || rest.starts_with(&upper)
}

fn at_word_start(text: &str, index: usize) -> bool {
    text[..index]
        .chars()
        .next_back()
        .map(|c| !c.is_alphanumeric())
        .unwrap_or(true)
}

fn gallery_reference(text: &str) -> Option<String> {
    for (i, _) in text.char_indices() {
        let rest = &text[i..];
        if !starts_with_word(rest, "gallery") {
            continue;
        }
        let after = &rest["gallery".len()..];
        let spaced = after.trim_start();
        let digits = spaced.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            let end = "gallery".len() + (after.len() - spaced.len()) + digits;
            return Some(rest[..end].to_string());
        }
    }
    None
}

fn seek_phrase(text: &str) -> Option<String> {
    for (i, _) in text.char_indices() {
        let rest = &text[i..];
        if !at_word_start(text, i) || !SEEK_VERBS.iter().any(|v| starts_with_word(rest, v)) {
            continue;
        }
        let clause = rest
            .split(['.', '!', '?', '\n'])
            .next()
            .unwrap_or_default()
            .trim_end();
        return Some(truncate(clause, CLUE_CHARS));
    }
    None
}
