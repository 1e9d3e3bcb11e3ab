//! Narrative rules: acts, beats, tension and convergence.
//!
//! Everything here is a pure decision over a [`SessionState`] snapshot plus
//! fixed tables. The story store applies the results.

mod clue;
mod context;

pub use clue::{ClueChain, ClueLink, ClueTemplate};
pub use context::{build_prompt_context, format_beat_history, PromptContext};

use crate::catalog::{ArtifactRecord, ObjectId};
use crate::paths::PathId;
use crate::story::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tension added once the crisis has been delivered.
const CRISIS_TENSION_BONUS: u32 = 20;

/// The four acts of a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Act {
    Call = 1,
    Descent = 2,
    Crisis = 3,
    Return = 4,
}

/// A number outside 1..=4 was used as an act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid act number: {0}")]
pub struct InvalidAct(pub u8);

impl Act {
    pub const ALL: [Act; 4] = [Act::Call, Act::Descent, Act::Crisis, Act::Return];

    pub fn number(self) -> u8 {
        self as u8
    }

    /// The act that follows this one, if any.
    pub fn next(self) -> Option<Act> {
        match self {
            Act::Call => Some(Act::Descent),
            Act::Descent => Some(Act::Crisis),
            Act::Crisis => Some(Act::Return),
            Act::Return => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Act::Call => "THE CALL",
            Act::Descent => "THE DESCENT",
            Act::Crisis => "THE CRISIS",
            Act::Return => "THE RETURN",
        }
    }

    /// Tension floor while in this act.
    pub fn tension_base(self) -> u32 {
        match self {
            Act::Call => 15,
            Act::Descent => 40,
            Act::Crisis => 75,
            Act::Return => 90,
        }
    }

    /// Narration sampling temperature for this act.
    pub fn temperature(self) -> f32 {
        match self {
            Act::Call => 0.85,
            Act::Descent => 0.90,
            Act::Crisis => 0.95,
            Act::Return => 0.92,
        }
    }

    /// Narration length budget for this act.
    pub fn max_tokens(self) -> u32 {
        match self {
            Act::Call => 350,
            Act::Descent => 400,
            Act::Crisis => 500,
            Act::Return => 450,
        }
    }

    fn index(self) -> usize {
        self as usize - 1
    }

    /// Directive given to the narrator for this act.
    pub fn directive(self) -> &'static str {
        ACT_DIRECTIVES[self.index()]
    }
}

impl TryFrom<u8> for Act {
    type Error = InvalidAct;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Act::ALL
            .into_iter()
            .find(|act| act.number() == n)
            .ok_or(InvalidAct(n))
    }
}

impl From<Act> for u8 {
    fn from(act: Act) -> u8 {
        act.number()
    }
}

impl Default for Act {
    fn default() -> Self {
        Act::Call
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Act {} ({})", self.number(), self.name())
    }
}

const ACT_DIRECTIVES: [&str; 4] = [
    "ACT I, THE CALL: This is the beginning. Establish the mystery. Introduce yourself with warmth \
     and intrigue and plant the first seeds of the story. The player is new: draw them in gently but \
     irresistibly. Each response should feel like an invitation deeper.",
    "ACT II, THE DESCENT: The story deepens and tension rises. Reference what came before and call \
     back to earlier discoveries by name. Your emotional state is shifting and the stakes are becoming \
     personal. Each artifact complicates the simple story the player thought they knew.",
    "ACT III, THE CRISIS: This is the turning point. Something hidden must be revealed. Your \
     composure breaks; a confession or a terrible truth emerges. The player should feel the weight of \
     what they have uncovered. Reference the full arc of discoveries. This changes everything.",
    "ACT IV, THE RETURN: Resolution approaches. The raw emotion of the crisis gives way to hard-won \
     wisdom. Reference the entire journey, every discovery and every revelation. The convergence \
     awaits: guide the player toward the Hall of Two Truths with reverence.",
];

/// Narrative function of a recorded scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatType {
    Discovery,
    Complication,
    Revelation,
    Crisis,
    Resolution,
}

impl BeatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeatType::Discovery => "discovery",
            BeatType::Complication => "complication",
            BeatType::Revelation => "revelation",
            BeatType::Crisis => "crisis",
            BeatType::Resolution => "resolution",
        }
    }

    pub fn is_turning_point(&self) -> bool {
        matches!(self, BeatType::Crisis | BeatType::Revelation)
    }
}

impl fmt::Display for BeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for story beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeatId(pub Uuid);

impl BeatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BeatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One recorded scan in the story log. Beats are never modified once
/// appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBeat {
    pub id: BeatId,
    pub act: Act,
    pub artifact_id: ObjectId,
    pub artifact_title: String,
    pub is_target: bool,
    pub beat_type: BeatType,
    /// Dramatic weight in `[0, 1]`.
    pub narrative_weight: f32,
    /// First sentence of the narration, empty when none was produced.
    #[serde(default)]
    pub summary: String,
    /// Location hint mined from the narration, empty when none.
    #[serde(default)]
    pub clue_given: String,
    /// Earlier beats the narration called back to.
    #[serde(default)]
    pub referenced_beats: Vec<BeatId>,
    pub turning_point: bool,
    pub timestamp: DateTime<Utc>,
}

impl StoryBeat {
    /// A new beat for `artifact` with weight and turning point derived from
    /// its type.
    pub fn new(artifact: &ArtifactRecord, act: Act, is_target: bool, beat_type: BeatType) -> Self {
        let title = if artifact.title.is_empty() {
            "Unknown artifact".to_string()
        } else {
            artifact.title.clone()
        };
        Self {
            id: BeatId::new(),
            act,
            artifact_id: artifact.object_id,
            artifact_title: title,
            is_target,
            beat_type,
            narrative_weight: narrative_weight(act, is_target, beat_type),
            summary: String::new(),
            clue_given: String::new(),
            referenced_beats: Vec::new(),
            turning_point: beat_type.is_turning_point(),
            timestamp: Utc::now(),
        }
    }
}

/// The live act of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActState {
    pub current: Act,
    /// Beats recorded since entering `current`.
    pub beats_in_act: u32,
    /// Tension in `[0, 100]`.
    pub tension_level: u32,
    pub guide_emotional_state: String,
    /// The rules fired a transition the caller has not applied yet.
    pub transition_pending: bool,
    pub crisis_delivered: bool,
}

impl Default for ActState {
    fn default() -> Self {
        Self {
            current: Act::Call,
            beats_in_act: 0,
            tension_level: 0,
            guide_emotional_state: "composed".to_string(),
            transition_pending: false,
            crisis_delivered: false,
        }
    }
}

impl ActState {
    /// The act a pending transition leads to.
    pub fn pending_act(&self) -> Option<Act> {
        if self.transition_pending {
            self.current.next()
        } else {
            None
        }
    }
}

/// Decide the type of a new beat.
///
/// The crisis lands on the first beat of act 3 no matter how quickly the
/// player got there.
pub fn classify_beat(act: Act, is_target: bool, crisis_delivered: bool) -> BeatType {
    match act {
        Act::Crisis if !crisis_delivered => BeatType::Crisis,
        Act::Return => BeatType::Resolution,
        Act::Call => BeatType::Discovery,
        _ if is_target => BeatType::Revelation,
        _ => BeatType::Complication,
    }
}

/// Dramatic weight of a beat, clamped to `[0, 1]`.
pub fn narrative_weight(act: Act, is_target: bool, beat_type: BeatType) -> f32 {
    if beat_type == BeatType::Crisis {
        return 1.0;
    }
    let mut weight: f32 = match act {
        Act::Call => 0.2,
        Act::Descent => 0.4,
        Act::Crisis => 0.8,
        Act::Return => 0.6,
    };
    if is_target {
        weight += 0.15;
    }
    if beat_type == BeatType::Revelation {
        weight += 0.1;
    }
    weight.min(1.0)
}

/// The act the story is ready to move into, if any.
///
/// Each gate combines the total scan count with beats recorded in the
/// current act, so a freshly entered act cannot transition immediately.
pub fn evaluate_act_transition(state: &SessionState) -> Option<Act> {
    let scans = state.artifacts_scanned.len();
    let act = &state.act;
    let ready = match act.current {
        Act::Call => scans >= 2 && act.beats_in_act >= 2,
        Act::Descent => scans >= 5 && act.beats_in_act >= 2,
        Act::Crisis => scans >= 7 && act.crisis_delivered && act.beats_in_act >= 1,
        Act::Return => false,
    };
    if ready {
        act.current.next()
    } else {
        None
    }
}

/// Whether enough of the story has unfolded to end it.
pub fn evaluate_convergence(state: &SessionState) -> bool {
    let Some(path) = state.path_id else {
        return false;
    };
    let act = &state.act;
    if act.current < Act::Crisis {
        return false;
    }
    if act.current == Act::Crisis && !act.crisis_delivered {
        return false;
    }
    if state.artifacts_scanned.len() < path.definition().min_artifacts {
        return false;
    }
    path.strategy().is_converged(&state.counters)
}

/// Tension for the current state, in `[0, 100]`.
pub fn calculate_tension(state: &SessionState) -> u32 {
    let act = &state.act;
    let target_beats = state.beats.iter().filter(|b| b.is_target).count() as u32;
    let crisis = if act.crisis_delivered { CRISIS_TENSION_BONUS } else { 0 };
    (act.current.tension_base() + act.beats_in_act * 5 + target_beats * 3 + crisis).min(100)
}

/// Guide emotional state for a path in an act.
pub fn guide_state(path: Option<PathId>, act: Act) -> &'static str {
    match path {
        Some(path) => path.strategy().guide_states()[act.index()],
        None => "composed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_act_numbers() {
        assert_eq!(Act::try_from(3), Ok(Act::Crisis));
        assert_eq!(Act::try_from(0), Err(InvalidAct(0)));
        assert_eq!(Act::try_from(5), Err(InvalidAct(5)));
        assert_eq!(serde_json::to_string(&Act::Return).unwrap(), "4");
        assert_eq!(serde_json::from_str::<Act>("2").unwrap(), Act::Descent);
        assert!(serde_json::from_str::<Act>("9").is_err());
    }

    #[test]
    fn test_acts_advance_one_at_a_time() {
        assert_eq!(Act::Call.next(), Some(Act::Descent));
        assert_eq!(Act::Crisis.next(), Some(Act::Return));
        assert_eq!(Act::Return.next(), None);
    }

    #[test]
    fn test_classify_beat_table() {
        assert_eq!(classify_beat(Act::Call, true, false), BeatType::Discovery);
        assert_eq!(classify_beat(Act::Call, false, false), BeatType::Discovery);
        assert_eq!(classify_beat(Act::Descent, true, false), BeatType::Revelation);
        assert_eq!(classify_beat(Act::Descent, false, false), BeatType::Complication);
        assert_eq!(classify_beat(Act::Crisis, true, false), BeatType::Crisis);
        assert_eq!(classify_beat(Act::Crisis, false, false), BeatType::Crisis);
        assert_eq!(classify_beat(Act::Crisis, true, true), BeatType::Revelation);
        assert_eq!(classify_beat(Act::Crisis, false, true), BeatType::Complication);
        assert_eq!(classify_beat(Act::Return, true, true), BeatType::Resolution);
    }

    #[test]
    fn test_narrative_weight() {
        assert_eq!(narrative_weight(Act::Call, false, BeatType::Discovery), 0.2);
        assert!((narrative_weight(Act::Descent, true, BeatType::Revelation) - 0.65).abs() < 1e-6);
        assert_eq!(narrative_weight(Act::Crisis, false, BeatType::Crisis), 1.0);
        assert_eq!(narrative_weight(Act::Crisis, true, BeatType::Revelation), 1.0);
        for act in Act::ALL {
            for beat in [BeatType::Discovery, BeatType::Revelation, BeatType::Resolution] {
                let w = narrative_weight(act, true, beat);
                assert!((0.0..=1.0).contains(&w));
            }
        }
    }

    #[test]
    fn test_turning_points() {
        assert!(BeatType::Crisis.is_turning_point());
        assert!(BeatType::Revelation.is_turning_point());
        assert!(!BeatType::Discovery.is_turning_point());
    }

    #[test]
    fn test_guide_state_table() {
        assert_eq!(guide_state(Some(PathId::Search), Act::Crisis), "desperate");
        assert_eq!(guide_state(Some(PathId::Trial), Act::Return), "transcendent");
        assert_eq!(guide_state(None, Act::Descent), "composed");
    }

    #[test]
    fn test_tension_is_clamped() {
        let mut state = SessionState::default();
        assert_eq!(calculate_tension(&state), 15);
        state.act.current = Act::Return;
        state.act.beats_in_act = 5;
        state.act.crisis_delivered = true;
        assert_eq!(calculate_tension(&state), 100);
    }
}
