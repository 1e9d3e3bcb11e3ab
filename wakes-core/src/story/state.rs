//! Serializable state of one playthrough.

use crate::catalog::{ArtifactRecord, ObjectId};
use crate::narrative::{ActState, ClueChain, StoryBeat};
use crate::paths::{PathId, Register};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle marker for the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Prologue,
    PathSelect,
    Playing,
    Convergence,
    Epilogue,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Prologue => "prologue",
            Phase::PathSelect => "path-select",
            Phase::Playing => "playing",
            Phase::Convergence => "convergence",
            Phase::Epilogue => "epilogue",
        }
    }
}

/// Entry in the scan log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedArtifact {
    pub object_id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub gallery_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub dynasty: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ScannedArtifact {
    pub fn from_record(artifact: &ArtifactRecord) -> Self {
        Self {
            object_id: artifact.object_id,
            title: artifact.title.clone(),
            gallery_number: artifact.gallery_number.clone(),
            date: artifact.date.clone(),
            medium: artifact.medium.clone(),
            period: artifact.period.clone(),
            dynasty: artifact.dynasty.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// A timestamped note (collected clue or chat recap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Moment {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One-way flag for a secret the guide keeps until the crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disclosure {
    #[default]
    Hidden,
    Revealed,
}

impl Disclosure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disclosure::Hidden => "hidden",
            Disclosure::Revealed => "revealed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchProgress {
    pub pieces_found: usize,
    /// Isis's emotional state, mirrored from the act's guide state.
    pub isis_state: String,
}

impl Default for SearchProgress {
    fn default() -> Self {
        Self {
            pieces_found: 0,
            isis_state: "composed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialProgress {
    pub horus_evidence: Vec<String>,
    pub set_evidence: Vec<String>,
    pub witnesses_heard: Vec<String>,
    pub verdict: Option<String>,
    pub thoth_bias: Disclosure,
}

/// A letter from Kha, tied to the artifact that prompted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Letter {
    pub artifact: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LettersProgress {
    pub letters_received: Vec<Letter>,
    pub possessions_found: Vec<String>,
    pub rites_performed: u32,
    pub secret_revealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vision {
    pub title: String,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub dynasty: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryProgress {
    pub visions_unlocked: Vec<Vision>,
    pub connections_found: Vec<String>,
}

/// A character the player has spoken with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterMeeting {
    pub artifact: String,
    pub intro: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwakeningProgress {
    /// Distinct artifacts whose characters have woken.
    pub characters_met_ids: Vec<ObjectId>,
    pub characters_met: Vec<CharacterMeeting>,
    pub quests_given: Vec<String>,
    pub quests_completed: Vec<String>,
    pub conflicts: Vec<String>,
    pub reconciled: bool,
}

/// Per-path counters. Only the selected path's section moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathCounters {
    pub search: SearchProgress,
    pub trial: TrialProgress,
    pub letters: LettersProgress,
    pub memory: MemoryProgress,
    pub awakening: AwakeningProgress,
}

/// The complete mutable record of one playthrough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub phase: Phase,
    pub register: Register,
    pub path_id: Option<PathId>,
    /// Scan log, at most one entry per object id.
    pub artifacts_scanned: Vec<ScannedArtifact>,
    pub clues_collected: Vec<Moment>,
    /// Most recent chat recaps, oldest first.
    pub chat_history: Vec<Moment>,
    /// Scanned share of the path's target count, `0..=100`.
    pub path_progress: u32,
    pub convergence_ready: bool,
    pub epilogue_done: bool,
    pub act: ActState,
    pub beats: Vec<StoryBeat>,
    pub clue_chain: ClueChain,
    pub counters: PathCounters,
}

impl SessionState {
    pub fn has_scanned(&self, id: ObjectId) -> bool {
        self.artifacts_scanned.iter().any(|a| a.object_id == id)
    }

    /// Titles of scanned artifacts in scan order.
    pub fn scanned_titles(&self) -> Vec<&str> {
        self.artifacts_scanned.iter().map(|a| a.title.as_str()).collect()
    }
}
