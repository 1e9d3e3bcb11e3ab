//! The Search: Isis gathers the fourteen pieces of Osiris.

use super::{matches_tags_or_keywords, PathId, PathStrategy, ScanContext, TargetRole};
use crate::catalog::ArtifactRecord;
use crate::narrative::{Act, ClueTemplate};
use crate::story::PathCounters;

/// Pieces of Osiris, assigned to targets in sample order.
pub const BODY_PARTS: [&str; 14] = [
    "heart", "spine", "eye", "head", "lungs", "liver", "stomach", "intestines", "skin", "soul",
    "tears", "grain", "limbs", "phallus",
];

const TAGS: &[&str] = &["Scarabs", "Coffins", "Mummies", "Amulets"];

const KEYWORDS: &[&str] = &[
    "funerary", "mummy", "coffin", "afterlife", "canopic", "amulet", "djed", "osiris", "isis",
    "anubis", "ba bird", "heart scarab", "shabti", "book of the dead", "weighing",
];

/// Pieces that must be found before the search can converge.
const PIECES_TO_CONVERGE: usize = 3;

static CLUES: [ClueTemplate; 6] = [
    ClueTemplate::new("memory", "Isis remembers touching this part of Osiris, the warmth that lingered"),
    ClueTemplate::new("sensory", "She can still feel where it was severed; the phantom pain guides her"),
    ClueTemplate::new("grief", "She wept when she found this piece, and the tears became the Nile flood"),
    ClueTemplate::new("magic", "Her magic pulls toward it; the fragments call to each other"),
    ClueTemplate::new("urgency", "Set's agents are near and she can feel their darkness closing in"),
    ClueTemplate::new("hope", "With each piece found, his voice grows clearer in her dreams"),
];

pub struct SearchPath;

impl PathStrategy for SearchPath {
    fn id(&self) -> PathId {
        PathId::Search
    }

    fn admits(&self, artifact: &ArtifactRecord) -> bool {
        matches_tags_or_keywords(artifact, TAGS, KEYWORDS)
    }

    fn classify_role(&self, _artifact: &ArtifactRecord, index: usize) -> TargetRole {
        TargetRole::BodyPart(BODY_PARTS[index % BODY_PARTS.len()].to_string())
    }

    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>) {
        if scan.is_target {
            counters.search.pieces_found = scan.targets_scanned;
        }
    }

    fn is_converged(&self, counters: &PathCounters) -> bool {
        counters.search.pieces_found >= PIECES_TO_CONVERGE
    }

    fn on_act_entered(&self, counters: &mut PathCounters, _act: Act, guide_state: &str) {
        counters.search.isis_state = guide_state.to_string();
    }

    fn summary(&self, counters: &PathCounters) -> String {
        format!(
            "Pieces of Osiris found: {} of {}. Isis is {}.",
            counters.search.pieces_found,
            BODY_PARTS.len(),
            counters.search.isis_state
        )
    }

    fn guide_states(&self) -> [&'static str; 4] {
        ["composed", "fractured", "desperate", "at peace"]
    }

    fn crisis_revelation(&self) -> &'static str {
        "CRISIS REVELATION: Isis must confess the terrible truth. The fourteenth piece was never found; \
         the oxyrhynchus fish swallowed it in the Nile and she had to craft a replacement from gold. \
         The reassembly was imperfect. Osiris rules the dead because he could never fully return to \
         the living. Let the grief pour out."
    }

    fn clue_templates(&self) -> &'static [ClueTemplate] {
        &CLUES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_by_tag_or_keyword() {
        let tagged = ArtifactRecord::new(1, "Scarab").with_tags(["Scarabs"]);
        let keyword = ArtifactRecord::new(2, "Canopic Jar Lid");
        let neither = ArtifactRecord::new(3, "Bowl").with_medium("Faience");
        assert!(SearchPath.admits(&tagged));
        assert!(SearchPath.admits(&keyword));
        assert!(!SearchPath.admits(&neither));
    }

    #[test]
    fn test_body_parts_cycle() {
        let a = ArtifactRecord::new(1, "x");
        assert_eq!(SearchPath.classify_role(&a, 0), TargetRole::BodyPart("heart".into()));
        assert_eq!(SearchPath.classify_role(&a, 13), TargetRole::BodyPart("phallus".into()));
        assert_eq!(SearchPath.classify_role(&a, 14), TargetRole::BodyPart("heart".into()));
    }

    #[test]
    fn test_pieces_follow_target_count() {
        let mut counters = PathCounters::default();
        let artifact = ArtifactRecord::new(1, "Heart scarab");
        let scan = ScanContext {
            artifact: &artifact,
            role: None,
            is_target: true,
            scan_number: 4,
            targets_scanned: 3,
        };
        SearchPath.update_counters(&mut counters, &scan);
        assert_eq!(counters.search.pieces_found, 3);
        assert!(SearchPath.is_converged(&counters));

        let mut other = counters.clone();
        let stray = ScanContext { is_target: false, targets_scanned: 0, ..scan };
        SearchPath.update_counters(&mut other, &stray);
        assert_eq!(other.search.pieces_found, 3);
    }
}
