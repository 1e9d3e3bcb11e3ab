//! Narrative paths and their per-path rules.
//!
//! A session follows exactly one path. Everything that differs between paths
//! (which artifacts qualify, what role a target plays, how counters move, when
//! the story may converge) lives behind the [`PathStrategy`] trait, with one
//! implementation per path.

mod awakening;
mod definition;
mod letters;
mod memory;
mod search;
mod trial;

pub use awakening::{AwakeningPath, CharacterType};
pub use definition::{definition, FallbackText, PathDefinition, Register, RegisterCopy};
pub use letters::{LetterCategory, LettersPath};
pub use memory::{MemoryPath, ERAS};
pub use search::{SearchPath, BODY_PARTS};
pub use trial::{Side, TrialPath};

use crate::catalog::ArtifactRecord;
use crate::narrative::{Act, ClueTemplate};
use crate::story::PathCounters;
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of narrative paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathId {
    /// Isis gathers the scattered pieces of Osiris.
    Search,
    /// Thoth presides over the trial of Horus and Set.
    Trial,
    /// The scribe Kha writes from the underworld.
    Letters,
    /// Thoth grants sight through time.
    Memory,
    /// The artifacts themselves speak.
    Awakening,
}

impl PathId {
    pub const ALL: [PathId; 5] = [
        PathId::Search,
        PathId::Trial,
        PathId::Letters,
        PathId::Memory,
        PathId::Awakening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PathId::Search => "search",
            PathId::Trial => "trial",
            PathId::Letters => "letters",
            PathId::Memory => "memory",
            PathId::Awakening => "awakening",
        }
    }

    /// The rules for this path.
    pub fn strategy(&self) -> &'static dyn PathStrategy {
        strategy(*self)
    }

    /// The static definition for this path.
    pub fn definition(&self) -> &'static PathDefinition {
        definition(*self)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized path name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown path: {0}")]
pub struct UnknownPath(pub String);

impl FromStr for PathId {
    type Err = UnknownPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPath(s.to_string()))
    }
}

/// The role a sampled target plays in its path's story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TargetRole {
    /// Which piece of Osiris this artifact stands for.
    BodyPart(String),
    /// Whose case the artifact supports.
    Side(Side),
    /// What kind of possession of Kha's this is.
    Category(LetterCategory),
    /// The era the vision shows.
    Period(String),
    /// The archetype voiced by the artifact.
    Character(CharacterType),
}

impl TargetRole {
    /// Short label used in target summaries.
    pub fn label(&self) -> &str {
        match self {
            TargetRole::BodyPart(part) => part,
            TargetRole::Side(side) => side.as_str(),
            TargetRole::Category(category) => category.as_str(),
            TargetRole::Period(period) => period,
            TargetRole::Character(character) => character.as_str(),
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            TargetRole::Side(side) => Some(*side),
            _ => None,
        }
    }
}

/// What a path's counter update sees about a recorded scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub artifact: &'a ArtifactRecord,
    pub role: Option<&'a TargetRole>,
    pub is_target: bool,
    /// Number of artifacts scanned so far, this one included.
    pub scan_number: usize,
    /// Number of distinct targets scanned so far, this one included.
    pub targets_scanned: usize,
}

/// Per-path rules and tables.
pub trait PathStrategy: Send + Sync {
    fn id(&self) -> PathId;

    /// Path-specific pool predicate. The image requirement is checked by the
    /// pool builder before this is called.
    fn admits(&self, artifact: &ArtifactRecord) -> bool;

    /// Pick the session's targets from the pool.
    ///
    /// The default shuffles the whole pool and takes the first `count`.
    fn sample<'a>(
        &self,
        pool: &[&'a ArtifactRecord],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<&'a ArtifactRecord> {
        let mut shuffled = pool.to_vec();
        shuffled.shuffle(rng);
        shuffled.truncate(count);
        shuffled
    }

    /// Assign the role of the artifact at `index` in the sample.
    fn classify_role(&self, artifact: &ArtifactRecord, index: usize) -> TargetRole;

    /// Apply a recorded scan to this path's counters.
    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>);

    /// Path-specific completion predicate.
    fn is_converged(&self, counters: &PathCounters) -> bool;

    /// Hook run when the story enters a new act.
    fn on_act_entered(&self, _counters: &mut PathCounters, _act: Act, _guide_state: &str) {}

    /// One-line status of this path's counters.
    fn summary(&self, counters: &PathCounters) -> String;

    /// Guide emotional state for each act, in act order.
    fn guide_states(&self) -> [&'static str; 4];

    /// The revelation the guide must deliver in the crisis beat.
    fn crisis_revelation(&self) -> &'static str;

    /// Clue styles, cycled round-robin over the clue chain.
    fn clue_templates(&self) -> &'static [ClueTemplate];
}

static SEARCH: SearchPath = SearchPath;
static TRIAL: TrialPath = TrialPath;
static LETTERS: LettersPath = LettersPath;
static MEMORY: MemoryPath = MemoryPath;
static AWAKENING: AwakeningPath = AwakeningPath;

/// Look up the strategy for a path.
pub fn strategy(id: PathId) -> &'static dyn PathStrategy {
    match id {
        PathId::Search => &SEARCH,
        PathId::Trial => &TRIAL,
        PathId::Letters => &LETTERS,
        PathId::Memory => &MEMORY,
        PathId::Awakening => &AWAKENING,
    }
}

/// Does the artifact match the path's tags or keywords?
pub(crate) fn matches_tags_or_keywords(
    artifact: &ArtifactRecord,
    tags: &[&str],
    keywords: &[&str],
) -> bool {
    let tag_match = artifact.tags.iter().any(|t| {
        let t = t.to_lowercase();
        tags.iter().any(|ft| t.contains(&ft.to_lowercase()))
    });
    if tag_match {
        return true;
    }
    let text = artifact.search_text();
    keywords.iter().any(|kw| text.contains(kw))
}

/// Score competing keyword sets against `text` and pick a category.
///
/// The highest score wins. Exact ties, including the case where nothing
/// matches, alternate over the tied categories by sample index so that a
/// signal-free sample still spreads evenly.
pub(crate) fn classify_by_keywords<C: Copy>(
    text: &str,
    categories: &[(C, &[&str])],
    index: usize,
) -> C {
    let scores: Vec<usize> = categories
        .iter()
        .map(|(_, keywords)| keywords.iter().filter(|kw| text.contains(*kw)).count())
        .collect();
    let best = scores.iter().copied().max().unwrap_or(0);
    let tied: Vec<C> = categories
        .iter()
        .zip(&scores)
        .filter(|&(_, &score)| score == best)
        .map(|((category, _), _)| *category)
        .collect();
    tied[index % tied.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_id_round_trip_names() {
        for path in PathId::ALL {
            assert_eq!(path.as_str().parse::<PathId>(), Ok(path));
            assert_eq!(path.strategy().id(), path);
        }
        assert_eq!(" Trial ".parse::<PathId>(), Ok(PathId::Trial));
        assert!("labyrinth".parse::<PathId>().is_err());
    }

    #[test]
    fn test_classify_by_keywords_highest_wins() {
        let categories: [(u8, &[&str]); 2] = [(0, &["sun", "gold"]), (1, &["moon"])];
        assert_eq!(classify_by_keywords("gold sun disk", &categories, 1), 0);
        assert_eq!(classify_by_keywords("moon", &categories, 0), 1);
    }

    #[test]
    fn test_classify_by_keywords_ties_alternate() {
        let categories: [(u8, &[&str]); 3] = [(0, &["a"]), (1, &["b"]), (2, &["c"])];
        let picks: Vec<u8> = (0..6)
            .map(|i| classify_by_keywords("nothing", &categories, i))
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
        // Tie between two of three.
        assert_eq!(classify_by_keywords("a b", &categories, 0), 0);
        assert_eq!(classify_by_keywords("a b", &categories, 1), 1);
    }

    #[test]
    fn test_target_role_serde_shape() {
        let role = TargetRole::Side(Side::Horus);
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["kind"], "side");
        assert_eq!(json["value"], "horus");
        let back: TargetRole = serde_json::from_value(json).unwrap();
        assert_eq!(back, role);
    }
}
