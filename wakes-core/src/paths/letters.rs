//! The Letters: the scribe Kha writes from the underworld.

use super::{classify_by_keywords, matches_tags_or_keywords, PathId, PathStrategy, ScanContext, TargetRole};
use crate::catalog::ArtifactRecord;
use crate::narrative::{Act, ClueTemplate};
use crate::story::PathCounters;
use serde::{Deserialize, Serialize};

/// Kind of possession a target represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterCategory {
    Profession,
    Funerary,
    Personal,
    Household,
}

impl LetterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterCategory::Profession => "profession",
            LetterCategory::Funerary => "funerary",
            LetterCategory::Personal => "personal",
            LetterCategory::Household => "household",
        }
    }
}

const TAGS: &[&str] = &["Cosmetics", "Games", "Hieroglyphs"];

const KEYWORDS: &[&str] = &[
    "shabti", "scribe", "papyrus", "palette", "reed pen", "mirror", "cosmetic", "household",
    "daily life", "linen", "offering", "stele", "letter", "writing",
];

const CATEGORIES: [(LetterCategory, &[&str]); 4] = [
    (LetterCategory::Profession, &["scribe", "palette", "papyrus", "reed pen", "writing", "ink"]),
    (LetterCategory::Funerary, &["shabti", "coffin", "canopic", "mummy", "offering", "stele"]),
    (LetterCategory::Personal, &["mirror", "cosmetic", "jewelry", "ring", "bracelet", "necklace"]),
    (LetterCategory::Household, &["bowl", "jar", "linen", "furniture", "tool", "game", "daily life"]),
];

const POSSESSIONS_TO_CONVERGE: usize = 3;

static CLUES: [ClueTemplate; 5] = [
    ClueTemplate::new("nostalgia", "Kha writes: \"I used to hold this every morning before dawn prayers\""),
    ClueTemplate::new("confession", "Kha writes: \"Merit gave this to me on our wedding day. I don't deserve it\""),
    ClueTemplate::new("fear", "Kha writes: \"The assessors are asking about this object. They know\""),
    ClueTemplate::new("tenderness", "Kha writes: \"My daughter played with something like this. She had my eyes\""),
    ClueTemplate::new("desperation", "Kha writes: \"Please hurry, the gates are closing. Find what remains of me\""),
];

pub struct LettersPath;

impl PathStrategy for LettersPath {
    fn id(&self) -> PathId {
        PathId::Letters
    }

    fn admits(&self, artifact: &ArtifactRecord) -> bool {
        matches_tags_or_keywords(artifact, TAGS, KEYWORDS)
    }

    fn classify_role(&self, artifact: &ArtifactRecord, index: usize) -> TargetRole {
        TargetRole::Category(classify_by_keywords(&artifact.role_text(), &CATEGORIES, index))
    }

    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>) {
        counters.letters.possessions_found.push(scan.artifact.title.clone());
    }

    fn is_converged(&self, counters: &PathCounters) -> bool {
        counters.letters.possessions_found.len() >= POSSESSIONS_TO_CONVERGE
    }

    fn on_act_entered(&self, counters: &mut PathCounters, act: Act, _guide_state: &str) {
        if act == Act::Crisis {
            counters.letters.secret_revealed = true;
        }
    }

    fn summary(&self, counters: &PathCounters) -> String {
        let letters = &counters.letters;
        format!(
            "Letters from Kha: {}. Possessions found: {}. Secret: {}.",
            letters.letters_received.len(),
            letters.possessions_found.len(),
            if letters.secret_revealed { "revealed" } else { "hidden" }
        )
    }

    fn guide_states(&self) -> [&'static str; 4] {
        ["formal", "warm", "guarded", "released"]
    }

    fn crisis_revelation(&self) -> &'static str {
        "CRISIS REVELATION: Kha must confess. He was unfaithful to Merit with a priestess at the temple \
         of Hathor, and the guilt consumed him. His heart is heavy not from the missing possessions but \
         from the betrayal. The possessions the player found belonged to both lives. Ask: can a flawed \
         heart still be weighed fairly?"
    }

    fn clue_templates(&self) -> &'static [ClueTemplate] {
        &CLUES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_scoring() {
        let palette = ArtifactRecord::new(1, "Scribe's palette with reed pen");
        let mirror = ArtifactRecord::new(2, "Mirror with papyrus handle")
            .with_description("A cosmetic mirror of polished bronze");
        assert_eq!(
            LettersPath.classify_role(&palette, 3),
            TargetRole::Category(LetterCategory::Profession)
        );
        assert_eq!(
            LettersPath.classify_role(&mirror, 0),
            TargetRole::Category(LetterCategory::Personal)
        );
    }

    #[test]
    fn test_no_signal_spreads_categories() {
        let plain = ArtifactRecord::new(1, "Fragment");
        let roles: Vec<TargetRole> = (0..4).map(|i| LettersPath.classify_role(&plain, i)).collect();
        assert_eq!(
            roles,
            vec![
                TargetRole::Category(LetterCategory::Profession),
                TargetRole::Category(LetterCategory::Funerary),
                TargetRole::Category(LetterCategory::Personal),
                TargetRole::Category(LetterCategory::Household),
            ]
        );
    }

    #[test]
    fn test_every_scan_is_a_possession() {
        let mut counters = PathCounters::default();
        let artifact = ArtifactRecord::new(1, "Linen");
        for n in 1..=3 {
            let scan = ScanContext {
                artifact: &artifact,
                role: None,
                is_target: n == 2,
                scan_number: n,
                targets_scanned: 0,
            };
            LettersPath.update_counters(&mut counters, &scan);
        }
        assert!(LettersPath.is_converged(&counters));
    }

    #[test]
    fn test_secret_revealed_in_crisis() {
        let mut counters = PathCounters::default();
        LettersPath.on_act_entered(&mut counters, Act::Crisis, "guarded");
        assert!(counters.letters.secret_revealed);
    }
}
