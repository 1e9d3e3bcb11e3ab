//! Clue chains linking a session's targets in sample order.

use crate::catalog::ObjectId;
use crate::paths::PathId;
use crate::sampler::SessionTarget;
use serde::{Deserialize, Serialize};

/// A clue style and the framing sentence the narrator builds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClueTemplate {
    pub style: &'static str,
    pub frame: &'static str,
}

impl ClueTemplate {
    pub const fn new(style: &'static str, frame: &'static str) -> Self {
        Self { style, frame }
    }
}

/// One target in the chain, with a lookahead to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClueLink {
    pub target_id: ObjectId,
    pub target_title: String,
    pub target_gallery: Option<String>,
    pub target_medium: Option<String>,
    pub clue_style: String,
    pub clue_frame: String,
    pub next_target_id: Option<ObjectId>,
    pub next_target_title: Option<String>,
    /// Set once the target is scanned; never cleared.
    pub found: bool,
}

/// Ordered clue links plus a cursor at the first unfound link.
///
/// The cursor is recomputed on load, so a stored chain can never point
/// past an unfound link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredChain")]
pub struct ClueChain {
    links: Vec<ClueLink>,
    current_link: usize,
}

#[derive(Deserialize)]
struct StoredChain {
    #[serde(default)]
    links: Vec<ClueLink>,
}

impl From<StoredChain> for ClueChain {
    fn from(stored: StoredChain) -> Self {
        let mut chain = ClueChain {
            links: stored.links,
            current_link: 0,
        };
        chain.resync();
        chain
    }
}

impl ClueChain {
    /// Build one link per target, cycling the path's clue styles.
    pub fn generate(path: PathId, targets: &[SessionTarget]) -> Self {
        let templates = path.strategy().clue_templates();
        let links = targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let template = templates[i % templates.len()];
                let next = targets.get(i + 1);
                ClueLink {
                    target_id: target.artifact.object_id,
                    target_title: target.artifact.title.clone(),
                    target_gallery: target.artifact.gallery_number.clone(),
                    target_medium: target.artifact.medium.clone(),
                    clue_style: template.style.to_string(),
                    clue_frame: template.frame.to_string(),
                    next_target_id: next.map(|t| t.artifact.object_id),
                    next_target_title: next.map(|t| t.artifact.title.clone()),
                    found: false,
                }
            })
            .collect();
        ClueChain {
            links,
            current_link: 0,
        }
    }

    /// Mark the link for `found_id` as found and move the cursor to the
    /// first unfound link. Targets may be found in any order.
    pub fn advance(&mut self, found_id: ObjectId) {
        if let Some(link) = self.links.iter_mut().find(|l| l.target_id == found_id) {
            link.found = true;
        }
        self.resync();
    }

    fn resync(&mut self) {
        self.current_link = self
            .links
            .iter()
            .position(|l| !l.found)
            .unwrap_or(self.links.len());
    }

    pub fn links(&self) -> &[ClueLink] {
        &self.links
    }

    /// Index of the first unfound link, or `links().len()` when complete.
    pub fn current_link(&self) -> usize {
        self.current_link
    }

    pub fn current(&self) -> Option<&ClueLink> {
        self.links.get(self.current_link)
    }

    /// The link after the cursor.
    pub fn next(&self) -> Option<&ClueLink> {
        self.links.get(self.current_link + 1)
    }

    /// Links from the cursor to the end of the chain.
    pub fn remaining(&self) -> usize {
        self.links.len() - self.current_link
    }

    pub fn is_complete(&self) -> bool {
        self.current_link == self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
