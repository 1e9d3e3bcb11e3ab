//! Narration context derived from the session state.

use super::{evaluate_convergence, guide_state, Act, ClueLink, StoryBeat};
use crate::story::SessionState;
use serde::Serialize;

/// Number of most recent beats carried in the context.
const RECENT_BEATS: usize = 3;

/// Everything the narrator needs to know about where the story stands.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub act: Act,
    pub act_name: &'static str,
    pub act_directive: &'static str,
    pub guide_state: &'static str,
    pub tension_level: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    /// The next beat will be the crisis.
    pub crisis_ready: bool,
    /// Path revelation for the crisis beat, empty without a path.
    pub crisis_revelation: &'static str,
    pub beat_history: String,
    pub beat_count: usize,
    pub recent_beats: Vec<StoryBeat>,
    pub current_clue: Option<ClueLink>,
    pub next_clue: Option<ClueLink>,
    pub clues_remaining: usize,
    pub convergence_ready: bool,
}

/// Project the session state into narration context.
pub fn build_prompt_context(state: &SessionState) -> PromptContext {
    let act = &state.act;
    let skip = state.beats.len().saturating_sub(RECENT_BEATS);
    PromptContext {
        act: act.current,
        act_name: act.current.name(),
        act_directive: act.current.directive(),
        guide_state: guide_state(state.path_id, act.current),
        tension_level: act.tension_level,
        temperature: act.current.temperature(),
        max_tokens: act.current.max_tokens(),
        crisis_ready: act.current == Act::Crisis && !act.crisis_delivered,
        crisis_revelation: state
            .path_id
            .map(|p| p.strategy().crisis_revelation())
            .unwrap_or_default(),
        beat_history: format_beat_history(&state.beats),
        beat_count: state.beats.len(),
        recent_beats: state.beats[skip..].to_vec(),
        current_clue: state.clue_chain.current().cloned(),
        next_clue: state.clue_chain.next().cloned(),
        clues_remaining: state.clue_chain.remaining(),
        convergence_ready: evaluate_convergence(state),
    }
}

/// One line per beat, oldest first.
pub fn format_beat_history(beats: &[StoryBeat]) -> String {
    if beats.is_empty() {
        return "No discoveries yet. This is the beginning of the journey.".to_string();
    }
    beats
        .iter()
        .enumerate()
        .map(|(i, beat)| {
            let mut line = format!(
                "Beat {} [Act {}, {}]: \"{}\"",
                i + 1,
                beat.act.number(),
                beat.beat_type,
                beat.artifact_title
            );
            if !beat.summary.is_empty() {
                line.push_str(": ");
                line.push_str(&beat.summary);
            }
            if !beat.clue_given.is_empty() {
                line.push_str(&format!(" [Clue planted: {}]", beat.clue_given));
            }
            if beat.turning_point {
                line.push_str(" *TURNING POINT*");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ArtifactRecord;
    use crate::narrative::BeatType;
    use crate::paths::PathId;

    #[test]
    fn test_empty_history() {
        assert!(format_beat_history(&[]).starts_with("No discoveries yet"));
    }

    #[test]
    fn test_history_lines() {
        let artifact = ArtifactRecord::new(1, "Heart Scarab");
        let mut beat = StoryBeat::new(&artifact, Act::Descent, true, BeatType::Revelation);
        beat.summary = "It glows.".to_string();
        beat.clue_given = "Gallery 121".to_string();
        let plain = StoryBeat::new(&artifact, Act::Call, false, BeatType::Discovery);

        let history = format_beat_history(&[plain, beat]);
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines[0], "Beat 1 [Act 1, discovery]: \"Heart Scarab\"");
        assert_eq!(
            lines[1],
            "Beat 2 [Act 2, revelation]: \"Heart Scarab\": It glows. [Clue planted: Gallery 121] *TURNING POINT*"
        );
    }

    #[test]
    fn test_context_for_fresh_path() {
        let state = SessionState {
            path_id: Some(PathId::Trial),
            ..SessionState::default()
        };
        let ctx = build_prompt_context(&state);
        assert_eq!(ctx.act, Act::Call);
        assert_eq!(ctx.guide_state, "scholarly");
        assert_eq!(ctx.max_tokens, 350);
        assert!(!ctx.crisis_ready);
        assert!(ctx.crisis_revelation.contains("Thoth"));
        assert!(ctx.recent_beats.is_empty());
        assert!(ctx.current_clue.is_none());
        assert!(!ctx.convergence_ready);
    }
}
