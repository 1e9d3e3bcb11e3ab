//! The story store: recording scans and moving through acts.

use super::mining::{extract_clue, extract_summary, find_referenced_beats, truncate};
use super::state::{CharacterMeeting, Letter, Moment, Phase, ScannedArtifact, SessionState};
use crate::catalog::{ArtifactRecord, ObjectId};
use crate::narrative::{
    calculate_tension, classify_beat, evaluate_act_transition, evaluate_convergence, guide_state,
    Act, BeatType, ClueChain, ClueLink, StoryBeat,
};
use crate::paths::{PathId, Register, ScanContext, TargetRole};
use crate::sampler::{SessionTarget, TargetSampler};
use serde::Serialize;
use thiserror::Error;

/// Chat recaps kept in the state.
const CHAT_HISTORY_LIMIT: usize = 20;

/// Characters of narration kept as a letter's content.
const LETTER_EXCERPT: usize = 200;

/// Characters of narration kept as a character's introduction.
const INTRO_EXCERPT: usize = 100;

/// Errors from story operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoryError {
    #[error("cannot move from {from} to {to}: acts advance one at a time")]
    InvalidActTransition { from: Act, to: Act },
}

/// Result of recording a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The artifact was already in the scan log; nothing changed.
    Duplicate { object_id: ObjectId },
    Recorded {
        beat: StoryBeat,
        /// A transition the rules fired. It is not applied until
        /// [`StoryStore::advance_act`] is called.
        act_transition: Option<Act>,
        convergence_ready: bool,
    },
}

impl RecordOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RecordOutcome::Duplicate { .. })
    }

    pub fn beat(&self) -> Option<&StoryBeat> {
        match self {
            RecordOutcome::Recorded { beat, .. } => Some(beat),
            RecordOutcome::Duplicate { .. } => None,
        }
    }

    pub fn act_transition(&self) -> Option<Act> {
        match self {
            RecordOutcome::Recorded { act_transition, .. } => *act_transition,
            RecordOutcome::Duplicate { .. } => None,
        }
    }
}

/// Structured progress for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    pub path_id: Option<PathId>,
    pub path_name: &'static str,
    pub scanned: usize,
    pub target: usize,
    pub min: usize,
    pub percentage: u32,
    pub convergence_ready: bool,
    pub phase: Phase,
    pub act: Act,
    pub act_name: &'static str,
    pub guide_state: String,
    pub tension_level: u32,
    pub beat_count: usize,
}

/// Owner of the session state. All mutation goes through here.
#[derive(Debug, Clone, Default)]
pub struct StoryStore {
    state: SessionState,
}

impl StoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: SessionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn set_register(&mut self, register: Register) {
        self.state.register = register;
    }

    pub fn begin_path_select(&mut self) {
        self.state.phase = Phase::PathSelect;
    }

    /// Start a fresh playthrough on `path` with the sampler's targets.
    ///
    /// Act, beats, scans, clues and counters start over. Register and chat
    /// history carry across.
    pub fn select_path(&mut self, path: PathId, targets: &[SessionTarget]) {
        let register = self.state.register;
        let chat_history = std::mem::take(&mut self.state.chat_history);
        self.state = SessionState {
            phase: Phase::Playing,
            register,
            path_id: Some(path),
            chat_history,
            clue_chain: ClueChain::generate(path, targets),
            ..SessionState::default()
        };
        let guide = guide_state(Some(path), Act::Call);
        self.state.act.guide_emotional_state = guide.to_string();
        path.strategy()
            .on_act_entered(&mut self.state.counters, Act::Call, guide);

        tracing::info!(
            path = %path,
            clue_links = self.state.clue_chain.links().len(),
            "path selected"
        );
    }

    /// Record a scan as a story beat.
    ///
    /// A duplicate changes nothing. Otherwise every step lands: scan log,
    /// target mark, path counters, beat, tension, clue chain, progress,
    /// pending transition and convergence. `narration` is only mined for
    /// recaps; `None` leaves the beat's summary and clue empty.
    pub fn record_beat(
        &mut self,
        sampler: &mut TargetSampler,
        artifact: &ArtifactRecord,
        narration: Option<&str>,
        is_target: bool,
        role: Option<&TargetRole>,
    ) -> RecordOutcome {
        if self.state.has_scanned(artifact.object_id) {
            tracing::debug!(object_id = artifact.object_id, "duplicate scan ignored");
            return RecordOutcome::Duplicate {
                object_id: artifact.object_id,
            };
        }

        self.state
            .artifacts_scanned
            .push(ScannedArtifact::from_record(artifact));
        if is_target {
            sampler.mark_scanned(artifact.object_id);
        }

        let path = self.state.path_id;
        if let Some(path) = path {
            let scan = ScanContext {
                artifact,
                role,
                is_target,
                scan_number: self.state.artifacts_scanned.len(),
                targets_scanned: sampler.scanned_count(),
            };
            path.strategy().update_counters(&mut self.state.counters, &scan);
        }

        let act = self.state.act.current;
        let beat_type = classify_beat(act, is_target, self.state.act.crisis_delivered);
        let mut beat = StoryBeat::new(artifact, act, is_target, beat_type);
        if let Some(text) = narration {
            beat.summary = extract_summary(text).unwrap_or_default();
            beat.clue_given = extract_clue(text).unwrap_or_default();
            beat.referenced_beats = find_referenced_beats(text, &self.state.beats);
        }

        self.state.beats.push(beat.clone());
        self.state.act.beats_in_act += 1;
        if beat.beat_type == BeatType::Crisis {
            self.state.act.crisis_delivered = true;
            tracing::info!(object_id = artifact.object_id, "crisis delivered");
        }
        self.state.act.tension_level = calculate_tension(&self.state);

        if is_target {
            self.state.clue_chain.advance(artifact.object_id);
        }

        self.update_progress();

        let act_transition = evaluate_act_transition(&self.state);
        if act_transition.is_some() {
            self.state.act.transition_pending = true;
        }

        self.state.convergence_ready =
            self.state.convergence_ready || evaluate_convergence(&self.state);

        RecordOutcome::Recorded {
            beat,
            act_transition,
            convergence_ready: self.state.convergence_ready,
        }
    }

    fn update_progress(&mut self) {
        let Some(path) = self.state.path_id else {
            return;
        };
        let target = path.definition().target_artifacts;
        if target == 0 {
            self.state.path_progress = 100;
            return;
        }
        let scanned = self.state.artifacts_scanned.len();
        let percent = ((scanned as f64 / target as f64) * 100.0).round() as u32;
        self.state.path_progress = percent.min(100);
    }

    /// Enter the next act.
    ///
    /// Only `current + 1` is accepted. The in-act counter and pending flag
    /// reset and the guide takes the new act's emotional state.
    pub fn advance_act(&mut self, next: Act) -> Result<(), StoryError> {
        let current = self.state.act.current;
        if current.next() != Some(next) {
            return Err(StoryError::InvalidActTransition {
                from: current,
                to: next,
            });
        }

        let path = self.state.path_id;
        let guide = guide_state(path, next);
        let act = &mut self.state.act;
        act.current = next;
        act.beats_in_act = 0;
        act.transition_pending = false;
        act.guide_emotional_state = guide.to_string();
        if let Some(path) = path {
            path.strategy()
                .on_act_entered(&mut self.state.counters, next, guide);
        }

        tracing::info!(act = next.number(), name = next.name(), guide, "act transition");
        Ok(())
    }

    /// Apply the pending transition, if there is one.
    pub fn apply_pending_transition(&mut self) -> Result<Option<Act>, StoryError> {
        match self.state.act.pending_act() {
            Some(next) => self.advance_act(next).map(|()| Some(next)),
            None => Ok(None),
        }
    }

    pub fn start_convergence(&mut self) {
        self.state.phase = Phase::Convergence;
    }

    pub fn start_epilogue(&mut self) {
        self.state.phase = Phase::Epilogue;
        self.state.epilogue_done = true;
    }

    pub fn add_clue(&mut self, clue: impl Into<String>) {
        self.state.clues_collected.push(Moment::now(clue));
    }

    /// Append a chat recap, keeping only the most recent ones.
    pub fn add_chat_moment(&mut self, summary: impl Into<String>) {
        let history = &mut self.state.chat_history;
        history.push(Moment::now(summary));
        if history.len() > CHAT_HISTORY_LIMIT {
            let excess = history.len() - CHAT_HISTORY_LIMIT;
            history.drain(..excess);
        }
    }

    pub fn set_verdict(&mut self, verdict: impl Into<String>) {
        self.state.counters.trial.verdict = Some(verdict.into());
    }

    pub fn add_letter(&mut self, letter: Letter) {
        self.state.counters.letters.letters_received.push(letter);
    }

    pub fn add_character(&mut self, meeting: CharacterMeeting) {
        self.state.counters.awakening.characters_met.push(meeting);
    }

    /// Keep an excerpt of a scan's narration where the path collects them:
    /// letters from Kha, or the introduction of a woken character.
    pub fn keep_narration(&mut self, artifact: &ArtifactRecord, narration: &str) {
        match self.state.path_id {
            Some(PathId::Letters) => self.add_letter(Letter {
                artifact: artifact.title.clone(),
                content: truncate(narration, LETTER_EXCERPT),
            }),
            Some(PathId::Awakening) => self.add_character(CharacterMeeting {
                artifact: artifact.title.clone(),
                intro: truncate(narration, INTRO_EXCERPT),
            }),
            _ => {}
        }
    }

    pub fn add_quest(&mut self, quest: impl Into<String>) {
        self.state.counters.awakening.quests_given.push(quest.into());
    }

    pub fn current_clue_link(&self) -> Option<&ClueLink> {
        self.state.clue_chain.current()
    }

    pub fn progress(&self) -> Progress {
        let path = self.state.path_id;
        let definition = path.map(|p| p.definition());
        let act = &self.state.act;
        Progress {
            path_id: path,
            path_name: definition.map(|d| d.name).unwrap_or_default(),
            scanned: self.state.artifacts_scanned.len(),
            target: definition.map(|d| d.target_artifacts).unwrap_or(0),
            min: definition.map(|d| d.min_artifacts).unwrap_or(0),
            percentage: self.state.path_progress,
            convergence_ready: self.state.convergence_ready,
            phase: self.state.phase,
            act: act.current,
            act_name: act.current.name(),
            guide_state: act.guide_emotional_state.clone(),
            tension_level: act.tension_level,
            beat_count: self.state.beats.len(),
        }
    }

    /// Compact recap of the journey for narration context.
    pub fn journey_summary(&self) -> String {
        let path = self.state.path_id;
        let act = &self.state.act;
        let path_summary = path
            .map(|p| p.strategy().summary(&self.state.counters))
            .unwrap_or_default();
        format!(
            "Path: {}. Act {} ({}). Guide state: {}. Tension: {}/100. Artifacts discovered: {}. {}",
            path.map(|p| p.definition().name).unwrap_or("Unknown"),
            act.current.number(),
            act.current.name(),
            act.guide_emotional_state,
            act.tension_level,
            self.state.scanned_titles().join(", "),
            path_summary
        )
    }

    /// Discard the whole session.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }
}
