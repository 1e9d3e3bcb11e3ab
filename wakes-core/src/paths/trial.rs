//! The Trial: Thoth records the contendings of Horus and Set.

use super::{classify_by_keywords, matches_tags_or_keywords, PathId, PathStrategy, ScanContext, TargetRole};
use crate::catalog::ArtifactRecord;
use crate::narrative::{Act, ClueTemplate};
use crate::story::{Disclosure, PathCounters};
use serde::{Deserialize, Serialize};

/// The two parties of the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The protagonist, heir of Osiris.
    Horus,
    /// The antagonist, lord of the desert and storm.
    Set,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Horus => "horus",
            Side::Set => "set",
        }
    }
}

const TAGS: &[&str] = &["Horus", "Falcons", "Kings", "Goddess", "Sphinxes"];

const KEYWORDS: &[&str] = &[
    "falcon", "horus", "set", "sekhmet", "wedjat", "eye", "throne", "crown", "scepter", "uraeus",
    "cobra", "kingship", "divine", "judgment", "ma'at",
];

const HORUS_KEYWORDS: &[&str] = &["horus", "falcon", "wedjat", "eye", "heir", "justice", "son"];

const SET_KEYWORDS: &[&str] = &["set", "seth", "chaos", "storm", "desert", "strength", "hippo", "donkey"];

/// Evidence needed on each side before the trial can converge.
const EVIDENCE_PER_SIDE: usize = 2;

static CLUES: [ClueTemplate; 5] = [
    ClueTemplate::new("testimony", "A witness steps forward with new evidence. Examine it carefully"),
    ClueTemplate::new("argument", "Horus presents his case, but Set objects and points to another artifact"),
    ClueTemplate::new("precedent", "Thoth recalls a similar case from the archives; the evidence awaits"),
    ClueTemplate::new("doubt", "The Ennead murmurs. Something doesn't add up and more evidence is needed"),
    ClueTemplate::new("revelation", "A sealed chamber is opened; crucial evidence has been hidden"),
];

pub struct TrialPath;

impl PathStrategy for TrialPath {
    fn id(&self) -> PathId {
        PathId::Trial
    }

    fn admits(&self, artifact: &ArtifactRecord) -> bool {
        matches_tags_or_keywords(artifact, TAGS, KEYWORDS)
    }

    fn classify_role(&self, artifact: &ArtifactRecord, index: usize) -> TargetRole {
        let side = classify_by_keywords(
            &artifact.role_text(),
            &[(Side::Horus, HORUS_KEYWORDS), (Side::Set, SET_KEYWORDS)],
            index,
        );
        TargetRole::Side(side)
    }

    fn update_counters(&self, counters: &mut PathCounters, scan: &ScanContext<'_>) {
        // Targets testify for their assigned side. Anything else alternates by
        // scan parity so both sides fill up even without explicit targets.
        let side = match scan.role.and_then(TargetRole::side) {
            Some(side) if scan.is_target => side,
            _ if scan.scan_number % 2 == 1 => Side::Horus,
            _ => Side::Set,
        };
        let title = scan.artifact.title.clone();
        match side {
            Side::Horus => counters.trial.horus_evidence.push(title),
            Side::Set => counters.trial.set_evidence.push(title),
        }
    }

    fn is_converged(&self, counters: &PathCounters) -> bool {
        counters.trial.horus_evidence.len() >= EVIDENCE_PER_SIDE
            && counters.trial.set_evidence.len() >= EVIDENCE_PER_SIDE
    }

    fn on_act_entered(&self, counters: &mut PathCounters, act: Act, _guide_state: &str) {
        if act == Act::Crisis {
            counters.trial.thoth_bias = Disclosure::Revealed;
        }
    }

    fn summary(&self, counters: &PathCounters) -> String {
        let trial = &counters.trial;
        format!(
            "Evidence for Horus: {}. Evidence for Set: {}. Thoth's bias: {}. Verdict: {}.",
            trial.horus_evidence.len(),
            trial.set_evidence.len(),
            trial.thoth_bias.as_str(),
            trial.verdict.as_deref().unwrap_or("pending")
        )
    }

    fn guide_states(&self) -> [&'static str; 4] {
        ["scholarly", "troubled", "confessional", "transcendent"]
    }

    fn crisis_revelation(&self) -> &'static str {
        "CRISIS REVELATION: Thoth must confess his bias. He is not the neutral recorder he pretended \
         to be; he healed the Eye of Horus after Set gouged it out. The impartial judge is compromised \
         and every piece of evidence he presented was subtly weighted. Ask the player: knowing this, \
         does the verdict change?"
    }

    fn clue_templates(&self) -> &'static [ClueTemplate] {
        &CLUES
    }
}
