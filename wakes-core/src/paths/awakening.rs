//! The Awakening: the artifacts' inhabitants speak for themselves.

use super::{classify_by_keywords, matches_tags_or_keywords, PathId, PathStrategy, ScanContext, TargetRole};
use crate::catalog::ArtifactRecord;
use crate::narrative::ClueTemplate;
use crate::story::PathCounters;
use serde::{Deserialize, Serialize};

/// Archetype voiced by an awakened artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterType {
    Pharaoh,
    Priest,
    Scribe,
    Soldier,
    Craftsman,
    Child,
    Musician,
}

impl CharacterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterType::Pharaoh => "pharaoh",
            CharacterType::Priest => "priest",
            CharacterType::Scribe => "scribe",
            CharacterType::Soldier => "soldier",
            CharacterType::Craftsman => "craftsman",
            CharacterType::Child => "child",
            CharacterType::Musician => "musician",
        }
    }
}

const TAGS: &[&str] = &["Kings", "Cartouches"];

const KEYWORDS: &[&str] = &[
    "pharaoh", "king", "queen", "official", "priest", "priestess", "scribe", "soldier",
    "craftsman", "child", "woman", "man", "servant", "musician", "dancer",
];

/// Characters need something to say: short or missing descriptions are excluded.
const MIN_DESCRIPTION_CHARS: usize = 20;

const CHARACTERS: [(CharacterType, &[&str]); 7] = [
    (CharacterType::Pharaoh, &["pharaoh", "king", "queen", "royal", "ruler"]),
    (CharacterType::Priest, &["priest", "priestess", "temple", "ritual"]),
    (CharacterType::Scribe, &["scribe", "writing", "papyrus", "record"]),
    (CharacterType::Soldier, &["soldier", "warrior", "battle", "military", "weapon"]),
    (CharacterType::Craftsman, &["craftsman", "artisan", "maker", "carved", "painted"]),
    (CharacterType::Child, &["child", "young", "boy", "girl", "infant"]),
    (CharacterType::Musician, &["musician", "singer", "dancer", "harp", "lute"]),
];

const CHARACTERS_TO_CONVERGE: usize = 3;

static CLUES: [ClueTemplate; 5] = [
    ClueTemplate::new("greeting", "A new voice calls out; someone has been waiting to be heard"),
    ClueTemplate::new("gossip", "A character whispers about another artifact's inhabitant and intrigue builds"),
    ClueTemplate::new("quest", "A favor is asked: find something that connects two stories"),
    ClueTemplate::new("conflict", "Two characters disagree, and the player must seek the truth elsewhere"),
    ClueTemplate::new("reunion", "Someone recognizes the player, or claims to. Trust is complicated"),
];

pub struct AwakeningPath;

impl PathStrategy for AwakeningPath {
    fn id(&self) -> PathId {
        PathId::Awakening
    }

    fn admits(&self, artifact: &ArtifactRecord) -> bool {
        let described = artifact
            .description
            .as_deref()
            .map(|d| d.chars().count() >= MIN_DESCRIPTION_CHARS)
            .unwrap_or(false);
        described && matches_tags_or_keywords(artifact, TAGS, KEYWORDS)
    }

    fn classify_role(&self, artifact: &ArtifactRecord, index: usize) -> TargetRole {
        TargetRole::Character(classify_by_keywords(&artifact.role_text(), &CHARACTERS, index))
    }

    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>) {
        let met = &mut counters.awakening.characters_met_ids;
        if !met.contains(&scan.artifact.object_id) {
            met.push(scan.artifact.object_id);
        }
    }

    fn is_converged(&self, counters: &PathCounters) -> bool {
        counters.awakening.characters_met_ids.len() >= CHARACTERS_TO_CONVERGE
    }

    fn summary(&self, counters: &PathCounters) -> String {
        let awakening = &counters.awakening;
        format!(
            "Characters met: {}. Conflicts: {}. Reconciled: {}.",
            awakening.characters_met.len(),
            awakening.conflicts.len(),
            awakening.reconciled
        )
    }

    fn guide_states(&self) -> [&'static str; 4] {
        ["friendly", "curious", "conflicted", "unified"]
    }

    fn crisis_revelation(&self) -> &'static str {
        "CRISIS REVELATION: The characters the player has met begin to contradict each other. The \
         pharaoh claims the craftsman was a slave; the craftsman says he was free and proud. The priest \
         says the ceremony was sacred; the musician says it was political theater. Someone is lying, or \
         memory itself is unreliable. The player must decide which version of history to believe."
    }

    fn clue_templates(&self) -> &'static [ClueTemplate] {
        &CLUES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_description() {
        let short = ArtifactRecord::new(1, "Statue of a king").with_description("Seated king");
        let long = ArtifactRecord::new(2, "Statue of a king")
            .with_description("Seated king wearing the nemes headdress");
        let untagged = ArtifactRecord::new(3, "Vessel")
            .with_description("A wide-mouthed vessel for grain storage");
        assert!(!AwakeningPath.admits(&short));
        assert!(AwakeningPath.admits(&long));
        assert!(!AwakeningPath.admits(&untagged));
    }

    #[test]
    fn test_character_scoring() {
        let harpist = ArtifactRecord::new(1, "Harpist")
            .with_description("A blind musician playing the harp");
        assert_eq!(
            AwakeningPath.classify_role(&harpist, 0),
            TargetRole::Character(CharacterType::Musician)
        );
    }

    #[test]
    fn test_characters_counted_once() {
        let mut counters = PathCounters::default();
        let statue = ArtifactRecord::new(7, "Statue");
        let other = ArtifactRecord::new(8, "Figure");
        for (artifact, n) in [(&statue, 1), (&statue, 2), (&other, 3)] {
            let scan = ScanContext {
                artifact,
                role: None,
                is_target: false,
                scan_number: n,
                targets_scanned: 0,
            };
            AwakeningPath.update_counters(&mut counters, &scan);
        }
        assert_eq!(counters.awakening.characters_met_ids, vec![7, 8]);
        assert!(!AwakeningPath.is_converged(&counters));
    }
}
