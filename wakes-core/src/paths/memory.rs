//! The Memory: Thoth lends the player sight through time.

use super::{PathId, PathStrategy, ScanContext, TargetRole};
use crate::catalog::{ArtifactRecord, ObjectId};
use crate::narrative::ClueTemplate;
use crate::story::{PathCounters, Vision};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

/// Historical eras in chronological sampling order.
pub const ERAS: [&str; 7] = [
    "Old Kingdom",
    "Middle Kingdom",
    "New Kingdom",
    "Late Period",
    "Third Intermediate Period",
    "Ptolemaic Period",
    "Roman Period",
];

/// Targets drawn from each era.
const PER_ERA: usize = 2;

const VISIONS_TO_CONVERGE: usize = 3;

static CLUES: [ClueTemplate; 5] = [
    ClueTemplate::new("glory", "The vision shows this artifact in its prime: gleaming, revered, alive"),
    ClueTemplate::new("ceremony", "A great ritual surrounds it, priests chanting, incense thick in torchlight"),
    ClueTemplate::new("intimacy", "A private moment: someone touching this artifact with trembling hands"),
    ClueTemplate::new("decay", "Time accelerates as centuries strip away the paint, the gold, the meaning"),
    ClueTemplate::new("forgetting", "The last person who knew its name is dying, and no one asks"),
];

pub struct MemoryPath;

impl PathStrategy for MemoryPath {
    fn id(&self) -> PathId {
        PathId::Memory
    }

    fn admits(&self, artifact: &ArtifactRecord) -> bool {
        ERAS.iter().any(|era| artifact.period_matches(era))
    }

    /// Draws a fixed number per era, in era order, for temporal spread.
    ///
    /// `count` is ignored. A record whose period names two eras is only
    /// taken once.
    fn sample<'a>(
        &self,
        pool: &[&'a ArtifactRecord],
        _count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<&'a ArtifactRecord> {
        let mut picked: Vec<&'a ArtifactRecord> = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        for era in ERAS {
            let mut bucket: Vec<&'a ArtifactRecord> = pool
                .iter()
                .copied()
                .filter(|a| a.period_matches(era) && !seen.contains(&a.object_id))
                .collect();
            bucket.shuffle(rng);
            for artifact in bucket.into_iter().take(PER_ERA) {
                seen.insert(artifact.object_id);
                picked.push(artifact);
            }
        }

        picked
    }

    fn classify_role(&self, artifact: &ArtifactRecord, _index: usize) -> TargetRole {
        TargetRole::Period(
            artifact
                .period
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        )
    }

    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>) {
        counters.memory.visions_unlocked.push(Vision {
            title: scan.artifact.title.clone(),
            period: scan.artifact.period.clone(),
            dynasty: scan.artifact.dynasty.clone(),
        });
    }

    fn is_converged(&self, counters: &PathCounters) -> bool {
        counters.memory.visions_unlocked.len() >= VISIONS_TO_CONVERGE
    }

    fn summary(&self, counters: &PathCounters) -> String {
        format!(
            "Time visions unlocked: {}. Connections found: {}.",
            counters.memory.visions_unlocked.len(),
            counters.memory.connections_found.len()
        )
    }

    fn guide_states(&self) -> [&'static str; 4] {
        ["delighted", "melancholic", "grieving", "hopeful"]
    }

    fn crisis_revelation(&self) -> &'static str {
        "CRISIS REVELATION: Thoth must show the worst vision, the moment an artifact was forgotten. Not \
         broken, not stolen, simply forgotten. The last person who knew what it meant died and no one \
         asked. This is the death that matters most: the death of memory. The player is the first \
         person to see it in centuries."
    }

    fn clue_templates(&self) -> &'static [ClueTemplate] {
        &CLUES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_admits_by_era() {
        let dated = ArtifactRecord::new(1, "Stela").with_period("late period");
        let undated = ArtifactRecord::new(2, "Stela");
        let other = ArtifactRecord::new(3, "Vase").with_period("Predynastic");
        assert!(MemoryPath.admits(&dated));
        assert!(!MemoryPath.admits(&undated));
        assert!(!MemoryPath.admits(&other));
    }

    #[test]
    fn test_samples_per_era_in_order() {
        let records: Vec<ArtifactRecord> = (0..3)
            .flat_map(|i| {
                [
                    ArtifactRecord::new(100 + i, "r").with_period("Roman Period"),
                    ArtifactRecord::new(200 + i, "o").with_period("Old Kingdom"),
                    ArtifactRecord::new(300 + i, "n").with_period("New Kingdom"),
                ]
            })
            .collect();
        let pool: Vec<&ArtifactRecord> = records.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = MemoryPath.sample(&pool, 99, &mut rng);
        let periods: Vec<&str> = picked.iter().map(|a| a.period.as_deref().unwrap()).collect();
        assert_eq!(
            periods,
            vec!["Old Kingdom", "Old Kingdom", "New Kingdom", "New Kingdom", "Roman Period", "Roman Period"]
        );
    }

    #[test]
    fn test_overlapping_periods_not_duplicated() {
        let records = vec![
            ArtifactRecord::new(1, "a").with_period("Late Period to Ptolemaic Period"),
            ArtifactRecord::new(2, "b").with_period("Late Period to Ptolemaic Period"),
        ];
        let pool: Vec<&ArtifactRecord> = records.iter().collect();
        let mut rng = StdRng::seed_from_u64(1);
        let picked = MemoryPath.sample(&pool, 10, &mut rng);
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0].object_id, picked[1].object_id);
    }

    #[test]
    fn test_period_role() {
        let dated = ArtifactRecord::new(1, "x").with_period("New Kingdom");
        let undated = ArtifactRecord::new(2, "y");
        assert_eq!(MemoryPath.classify_role(&dated, 0), TargetRole::Period("New Kingdom".into()));
        assert_eq!(MemoryPath.classify_role(&undated, 0), TargetRole::Period("Unknown".into()));
    }
}
