//! TourSession - the primary public API for a museum tour.
//!
//! A session binds one catalog, one target sampler, one story store, one
//! storage backend and one narration gate. Every mutation is persisted;
//! a storage failure is logged and play continues in memory.

use crate::catalog::{ArtifactRecord, Catalog, CatalogError, ObjectId};
use crate::narration::prompt::{
    convergence_prompt, intro_prompt, scan_prompt, system_prompt, PromptFrame,
};
use crate::narration::{NarrationGate, NarrationOptions, NarrationTicket, Narrator};
use crate::narrative::{build_prompt_context, Act, StoryBeat};
use crate::paths::{PathDefinition, PathId, Register, TargetRole};
use crate::persist::{
    load_snapshot, save_snapshot, PersistError, Snapshot, SnapshotStorage, STORAGE_KEY,
};
use crate::sampler::{SessionTarget, TargetSampler};
use crate::story::{Progress, RecordOutcome, SessionState, StoryError, StoryStore};
use crate::vision::VisionMatcher;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors from TourSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Artifact {0} is not in the catalog")]
    UnknownArtifact(ObjectId),

    #[error("No path selected")]
    NoPathSelected,

    #[error("Story error: {0}")]
    Story(#[from] StoryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// Configuration for a tour session.
#[derive(Debug, Clone)]
pub struct TourConfig {
    /// Key the snapshot is stored under.
    pub storage_key: String,

    /// Number of targets to sample. Defaults to the path's own count.
    pub target_count: Option<usize>,

    /// Seed for target sampling; unseeded sessions use entropy.
    pub seed: Option<u64>,

    /// Confidence a photo match needs to count as a capture.
    pub min_vision_confidence: f32,

    /// Narration model override.
    pub model: Option<String>,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            target_count: None,
            seed: None,
            min_vision_confidence: 0.7,
            model: None,
        }
    }
}

impl TourConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Sample this many targets regardless of path.
    pub fn with_target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_min_vision_confidence(mut self, confidence: f32) -> Self {
        self.min_vision_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// A scan waiting for its narration.
///
/// Issued by [`TourSession::prepare_scan`]; hand it back with the generated
/// text to [`TourSession::complete_scan`].
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub ticket: NarrationTicket,
    pub artifact: ArtifactRecord,
    pub is_target: bool,
    pub role: Option<TargetRole>,
    pub system: String,
    pub prompt: String,
    pub options: NarrationOptions,
}

/// What happened to a scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Recorded {
        beat: StoryBeat,
        /// Generated narration, or the path's fallback text.
        narration: String,
        used_fallback: bool,
        /// A newer narration request was issued meanwhile; the beat is kept
        /// but its narration should not be shown.
        superseded: bool,
        act_transition: Option<Act>,
        convergence_ready: bool,
    },
    /// Already scanned this session.
    Duplicate { object_id: ObjectId },
    /// The session was reset or changed path since the request; nothing
    /// was recorded.
    Stale { ticket: NarrationTicket },
}

impl ScanOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, ScanOutcome::Recorded { .. })
    }

    pub fn narration(&self) -> Option<&str> {
        match self {
            ScanOutcome::Recorded { narration, .. } => Some(narration),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, ScanOutcome::Recorded { superseded: true, .. })
    }

    pub fn act_transition(&self) -> Option<Act> {
        match self {
            ScanOutcome::Recorded { act_transition, .. } => *act_transition,
            _ => None,
        }
    }
}

/// One visitor's tour.
#[derive(Debug)]
pub struct TourSession {
    config: TourConfig,
    catalog: Arc<Catalog>,
    sampler: TargetSampler,
    store: StoryStore,
    storage: Box<dyn SnapshotStorage>,
    gate: NarrationGate,
    rng: StdRng,
}

impl TourSession {
    /// Start a fresh session, ignoring anything stored.
    pub fn new(
        catalog: Arc<Catalog>,
        storage: Box<dyn SnapshotStorage>,
        config: TourConfig,
    ) -> Self {
        Self {
            rng: config.rng(),
            config,
            catalog,
            sampler: TargetSampler::new(),
            store: StoryStore::new(),
            storage,
            gate: NarrationGate::new(),
        }
    }

    /// Resume the stored session, or start fresh if there is none.
    pub fn resume(
        catalog: Arc<Catalog>,
        storage: Box<dyn SnapshotStorage>,
        config: TourConfig,
    ) -> Self {
        let mut session = Self::new(catalog, storage, config);
        if let Some(snapshot) = load_snapshot(&*session.storage, &session.config.storage_key)
        {
            tracing::info!(
                path = ?snapshot.state.path_id,
                beats = snapshot.state.beats.len(),
                "resumed stored session"
            );
            session.restore(snapshot);
        }
        session
    }

    /// Load the catalog from disk and resume the stored session.
    pub async fn open(
        catalog_path: impl AsRef<Path>,
        storage: Box<dyn SnapshotStorage>,
        config: TourConfig,
    ) -> Result<Self, SessionError> {
        let catalog = Catalog::load(catalog_path).await?;
        Ok(Self::resume(Arc::new(catalog), storage, config))
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.store = StoryStore::from_state(snapshot.state);
        self.sampler = TargetSampler::restore(snapshot.sampler);
    }

    // Queries

    pub fn config(&self) -> &TourConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    pub fn sampler(&self) -> &TargetSampler {
        &self.sampler
    }

    pub fn path(&self) -> Option<PathId> {
        self.store.state().path_id
    }

    pub fn targets(&self) -> &[SessionTarget] {
        self.sampler.targets()
    }

    pub fn next_target(&self) -> Option<&SessionTarget> {
        self.sampler.next_target()
    }

    pub fn progress(&self) -> Progress {
        self.store.progress()
    }

    pub fn journey_summary(&self) -> String {
        self.store.journey_summary()
    }

    pub fn is_current(&self, ticket: NarrationTicket) -> bool {
        self.gate.is_current(ticket)
    }

    fn definition(&self) -> Result<&'static PathDefinition, SessionError> {
        self.path()
            .map(|p| p.definition())
            .ok_or(SessionError::NoPathSelected)
    }

    // Lifecycle

    pub fn set_register(&mut self, register: Register) {
        self.store.set_register(register);
        self.persist();
    }

    pub fn begin_path_select(&mut self) {
        self.store.begin_path_select();
        self.persist();
    }

    /// Choose a path: sample its targets and start the story over.
    ///
    /// Outstanding narration requests become stale.
    pub fn select_path(&mut self, path: PathId) -> &[SessionTarget] {
        let count = self
            .config
            .target_count
            .unwrap_or(path.definition().target_artifacts);
        let targets = self
            .sampler
            .sample_targets(path, &self.catalog, count, &mut self.rng);
        self.store.select_path(path, targets);
        self.gate.invalidate();
        self.persist();
        self.sampler.targets()
    }

    /// Resolve a scan and build its narration request.
    pub fn prepare_scan(&mut self, object_id: ObjectId) -> Result<ScanRequest, SessionError> {
        let artifact = self
            .catalog
            .get_by_id(object_id)
            .cloned()
            .ok_or(SessionError::UnknownArtifact(object_id))?;
        let definition = self.definition()?;

        let target = self.sampler.target_data(object_id);
        let is_target = target.is_some();
        let role = target.map(|t| t.role.clone());

        let context = build_prompt_context(self.store.state());
        let summary = self.sampler.target_summary();
        let frame = PromptFrame {
            definition,
            register: self.store.state().register,
            context: &context,
            target_summary: &summary,
        };
        let system = system_prompt(&frame);
        let prompt = scan_prompt(&frame, &artifact, is_target, role.as_ref());

        Ok(ScanRequest {
            ticket: self.gate.issue(),
            options: NarrationOptions::for_act(context.act),
            artifact,
            is_target,
            role,
            system,
            prompt,
        })
    }

    /// Record a prepared scan with its narration.
    ///
    /// A ticket from before a reset or path change records nothing. A
    /// ticket superseded by a newer request still records its beat, flagged
    /// so the narration is not shown. `None` narration records the beat and
    /// answers with the path's fallback text.
    pub fn complete_scan(&mut self, request: ScanRequest, narration: Option<String>) -> ScanOutcome {
        if !self.gate.is_live(request.ticket) {
            tracing::debug!(ticket = request.ticket.value(), "discarding stale narration");
            return ScanOutcome::Stale {
                ticket: request.ticket,
            };
        }
        let superseded = !self.gate.is_current(request.ticket);
        if superseded {
            tracing::debug!(
                ticket = request.ticket.value(),
                "narration superseded, keeping the beat"
            );
        }

        let outcome = self.store.record_beat(
            &mut self.sampler,
            &request.artifact,
            narration.as_deref(),
            request.is_target,
            request.role.as_ref(),
        );

        match outcome {
            RecordOutcome::Duplicate { object_id } => ScanOutcome::Duplicate { object_id },
            RecordOutcome::Recorded {
                beat,
                act_transition,
                convergence_ready,
            } => {
                if let Some(text) = &narration {
                    self.store.keep_narration(&request.artifact, text);
                }
                self.persist();
                let used_fallback = narration.is_none();
                let narration = narration.unwrap_or_else(|| {
                    self.path()
                        .map(|p| p.definition().fallback.scan.to_string())
                        .unwrap_or_default()
                });
                ScanOutcome::Recorded {
                    beat,
                    narration,
                    used_fallback,
                    superseded,
                    act_transition,
                    convergence_ready,
                }
            }
        }
    }

    /// Scan an artifact and narrate it.
    pub async fn scan(
        &mut self,
        object_id: ObjectId,
        narrator: &dyn Narrator,
    ) -> Result<ScanOutcome, SessionError> {
        if self.store.state().has_scanned(object_id) {
            return Ok(ScanOutcome::Duplicate { object_id });
        }
        let request = self.prepare_scan(object_id)?;
        let text = narrator
            .generate(&request.system, &request.prompt, &request.options)
            .await;
        Ok(self.complete_scan(request, text))
    }

    /// Enter the pending act, if the rules fired a transition.
    pub fn advance_act(&mut self) -> Result<Option<Act>, SessionError> {
        let next = self.store.apply_pending_transition()?;
        if next.is_some() {
            self.persist();
        }
        Ok(next)
    }

    /// Enter a specific act. Only the next act is accepted.
    pub fn advance_to(&mut self, act: Act) -> Result<(), SessionError> {
        self.store.advance_act(act)?;
        self.persist();
        Ok(())
    }

    /// Opening narration for the chosen path.
    pub async fn narrate_intro(&mut self, narrator: &dyn Narrator) -> Result<String, SessionError> {
        let definition = self.definition()?;
        self.gate.issue();
        let context = build_prompt_context(self.store.state());
        let summary = self.sampler.target_summary();
        let frame = PromptFrame {
            definition,
            register: self.store.state().register,
            context: &context,
            target_summary: &summary,
        };
        let text = narrator
            .generate(
                &system_prompt(&frame),
                &intro_prompt(&frame),
                &NarrationOptions::for_act(context.act),
            )
            .await;
        Ok(text.unwrap_or_else(|| definition.fallback.intro.to_string()))
    }

    /// Move to the convergence phase and narrate the ending.
    pub async fn narrate_convergence(
        &mut self,
        narrator: &dyn Narrator,
    ) -> Result<String, SessionError> {
        let definition = self.definition()?;
        self.gate.issue();
        self.store.start_convergence();
        self.persist();

        let context = build_prompt_context(self.store.state());
        let frame = PromptFrame {
            definition,
            register: self.store.state().register,
            context: &context,
            target_summary: "",
        };
        let system = system_prompt(&frame);
        let state = self.store.state();
        let prompt = convergence_prompt(
            &frame,
            &state.scanned_titles(),
            &state.counters.awakening.characters_met,
        );
        let options = NarrationOptions::for_act(context.act).with_max_tokens(600);
        let text = narrator.generate(&system, &prompt, &options).await;
        Ok(text.unwrap_or_else(|| definition.fallback.convergence.to_string()))
    }

    pub fn finish_epilogue(&mut self) {
        self.store.start_epilogue();
        self.persist();
    }

    /// Check a photo against the next unfound target.
    ///
    /// Returns the target's id when the matcher is confident enough.
    pub async fn verify_capture(
        &self,
        photo: &[u8],
        matcher: &dyn VisionMatcher,
    ) -> Option<ObjectId> {
        let target_id = self.sampler.next_target()?.artifact.object_id;
        let result = matcher.compare(photo, target_id).await?;
        tracing::debug!(
            target_id,
            matched = result.matched,
            confidence = result.confidence,
            "vision comparison"
        );
        result
            .is_confident(self.config.min_vision_confidence)
            .then_some(target_id)
    }

    pub fn add_clue(&mut self, clue: impl Into<String>) {
        self.store.add_clue(clue);
        self.persist();
    }

    pub fn add_chat_moment(&mut self, summary: impl Into<String>) {
        self.store.add_chat_moment(summary);
        self.persist();
    }

    pub fn set_verdict(&mut self, verdict: impl Into<String>) {
        self.store.set_verdict(verdict);
        self.persist();
    }

    /// Discard the session and its stored snapshot. The catalog is kept.
    pub fn reset(&mut self) {
        self.gate.invalidate();
        self.store.reset();
        self.sampler.clear();
        if let Err(e) = self.storage.remove(&self.config.storage_key) {
            tracing::warn!(error = %e, "failed to clear stored session");
        }
        tracing::info!("session reset");
    }

    // Persistence

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.store.state().clone(), self.sampler.snapshot())
    }

    /// Write the snapshot, reporting failure.
    pub fn save(&self) -> Result<(), SessionError> {
        save_snapshot(
            &*self.storage,
            &self.config.storage_key,
            &self.snapshot(),
        )?;
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "failed to persist session, continuing in memory");
        }
    }

    /// Export the session to a save file.
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        self.snapshot().export_json(path).await?;
        Ok(())
    }

    /// Replace the session with one from a save file.
    pub async fn import(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let snapshot = Snapshot::import_json(path).await?;
        self.gate.invalidate();
        self.restore(snapshot);
        self.persist();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::SilentNarrator;
    use crate::persist::MemoryStorage;
    use crate::testing::fixture_catalog;

    fn session(storage: MemoryStorage) -> TourSession {
        TourSession::new(
            Arc::new(fixture_catalog()),
            Box::new(storage),
            TourConfig::new().with_seed(7).with_target_count(3),
        )
    }

    #[test]
    fn test_config_builder() {
        let config = TourConfig::new()
            .with_storage_key("k")
            .with_seed(1)
            .with_min_vision_confidence(1.5);
        assert_eq!(config.storage_key, "k");
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.min_vision_confidence, 1.0);
        assert_eq!(TourConfig::default().storage_key, STORAGE_KEY);
    }

    #[test]
    fn test_scan_requires_path() {
        let mut s = session(MemoryStorage::new());
        let id = s.catalog().objects()[0].object_id;
        assert!(matches!(s.prepare_scan(id), Err(SessionError::NoPathSelected)));
        s.select_path(PathId::Search);
        assert!(matches!(
            s.prepare_scan(999_999_999),
            Err(SessionError::UnknownArtifact(999_999_999))
        ));
    }

    #[test]
    fn test_select_path_persists() {
        let storage = MemoryStorage::new();
        let mut s = session(storage.clone());
        let count = s.select_path(PathId::Search).len();
        assert_eq!(count, 3);
        let stored = storage.get(STORAGE_KEY).unwrap();
        let snapshot = Snapshot::decode(&stored);
        assert_eq!(snapshot.state.path_id, Some(PathId::Search));
        assert_eq!(snapshot.sampler.targets.len(), 3);
    }

    #[tokio::test]
    async fn test_silent_narration_uses_fallback() {
        let mut s = session(MemoryStorage::new());
        s.select_path(PathId::Search);
        let id = s.targets()[0].artifact.object_id;
        let outcome = s.scan(id, &SilentNarrator).await.unwrap();
        match outcome {
            ScanOutcome::Recorded {
                narration,
                used_fallback,
                beat,
                ..
            } => {
                assert!(used_fallback);
                assert_eq!(narration, PathId::Search.definition().fallback.scan);
                assert!(beat.is_target);
                assert!(beat.summary.is_empty());
            }
            other => panic!("expected a recorded scan, got {other:?}"),
        }
        let intro = s.narrate_intro(&SilentNarrator).await.unwrap();
        assert_eq!(intro, PathId::Search.definition().fallback.intro);
    }
}
