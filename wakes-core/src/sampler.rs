//! Per-session target sampling.
//!
//! The sampler turns a path's candidate pool into the short, ordered list of
//! artifacts the player is meant to find, each carrying its story role. It
//! owns that list and the set of targets already scanned.

use crate::catalog::{ArtifactRecord, Catalog, ObjectId};
use crate::paths::{PathId, TargetRole};
use crate::pool::build_pool;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A sampled artifact and the role it plays in this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTarget {
    pub artifact: ArtifactRecord,
    pub role: TargetRole,
}

/// Serializable form of a sampler, for resuming a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSnapshot {
    pub path_id: Option<PathId>,
    pub targets: Vec<SessionTarget>,
    pub scanned: Vec<ObjectId>,
    pub pool_size: usize,
}

/// Live target list for one session.
#[derive(Debug, Clone, Default)]
pub struct TargetSampler {
    path_id: Option<PathId>,
    targets: Vec<SessionTarget>,
    scanned: HashSet<ObjectId>,
    pool_size: usize,
}

impl TargetSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw this session's targets for `path` and assign their roles.
    ///
    /// Replaces any previous targets and clears the scanned set. Most paths
    /// take `count` records from a uniform shuffle of the pool; memory draws
    /// a fixed number per era instead.
    pub fn sample_targets(
        &mut self,
        path: PathId,
        catalog: &Catalog,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> &[SessionTarget] {
        let pool = build_pool(path, catalog);
        self.path_id = Some(path);
        self.pool_size = pool.len();
        self.scanned.clear();

        if pool.is_empty() {
            tracing::warn!(path = %path, "empty candidate pool, session has no targets");
            self.targets.clear();
            return &self.targets;
        }

        let strategy = path.strategy();
        let mut seen = HashSet::new();
        self.targets = strategy
            .sample(&pool, count, rng)
            .into_iter()
            .filter(|a| seen.insert(a.object_id))
            .enumerate()
            .map(|(i, artifact)| SessionTarget {
                role: strategy.classify_role(artifact, i),
                artifact: artifact.clone(),
            })
            .collect();

        tracing::info!(
            path = %path,
            pool = self.pool_size,
            targets = self.targets.len(),
            "sampled session targets"
        );
        &self.targets
    }

    pub fn path_id(&self) -> Option<PathId> {
        self.path_id
    }

    /// Targets in sampled order.
    pub fn targets(&self) -> &[SessionTarget] {
        &self.targets
    }

    /// Size of the pool the current targets were drawn from.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn is_target(&self, id: ObjectId) -> bool {
        self.targets.iter().any(|t| t.artifact.object_id == id)
    }

    pub fn target_data(&self, id: ObjectId) -> Option<&SessionTarget> {
        self.targets.iter().find(|t| t.artifact.object_id == id)
    }

    pub fn is_scanned(&self, id: ObjectId) -> bool {
        self.scanned.contains(&id)
    }

    /// The first unscanned target in sampled order.
    ///
    /// `None` means every target has been found (or there were none), and
    /// the story should head for convergence or free exploration.
    pub fn next_target(&self) -> Option<&SessionTarget> {
        self.targets
            .iter()
            .find(|t| !self.scanned.contains(&t.artifact.object_id))
    }

    pub fn remaining_targets(&self) -> Vec<&SessionTarget> {
        self.targets
            .iter()
            .filter(|t| !self.scanned.contains(&t.artifact.object_id))
            .collect()
    }

    /// Number of distinct targets scanned.
    pub fn scanned_count(&self) -> usize {
        self.scanned.len()
    }

    pub fn target_titles(&self) -> Vec<&str> {
        self.targets
            .iter()
            .map(|t| t.artifact.title.as_str())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// One line per target with its gallery and role, for narration context.
    pub fn target_summary(&self) -> String {
        self.targets
            .iter()
            .map(|t| {
                format!(
                    "\"{}\" (Gallery {}) [{}]",
                    t.artifact.title,
                    t.artifact.gallery_label(),
                    t.role.label()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Record a target as found. Returns whether it was newly marked;
    /// repeated calls and non-target ids are no-ops.
    pub fn mark_scanned(&mut self, id: ObjectId) -> bool {
        self.is_target(id) && self.scanned.insert(id)
    }

    /// Drop all targets.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> SamplerSnapshot {
        // Keep scanned ids in target order so snapshots are stable.
        let scanned = self
            .targets
            .iter()
            .map(|t| t.artifact.object_id)
            .filter(|id| self.scanned.contains(id))
            .collect();
        SamplerSnapshot {
            path_id: self.path_id,
            targets: self.targets.clone(),
            scanned,
            pool_size: self.pool_size,
        }
    }

    /// Rebuild a sampler from a snapshot. Duplicate targets and scanned ids
    /// that are not targets are dropped.
    pub fn restore(snapshot: SamplerSnapshot) -> Self {
        let mut seen = HashSet::new();
        let targets: Vec<SessionTarget> = snapshot
            .targets
            .into_iter()
            .filter(|t| seen.insert(t.artifact.object_id))
            .collect();
        let scanned = snapshot
            .scanned
            .into_iter()
            .filter(|id| seen.contains(id))
            .collect();
        Self {
            path_id: snapshot.path_id,
            targets,
            scanned,
            pool_size: snapshot.pool_size,
        }
    }
}
