//! Testing utilities for the tour engine.
//!
//! This module provides tools for integration testing:
//! - `MockNarrator` and `MockVision` for deterministic tests without API calls
//! - `FailingStorage` for exercising persistence failures
//! - `fixture_catalog` with a small, known artifact set
//! - `TestHarness` for scripted tour scenarios
//! - Assertion helpers for verifying session state

use crate::catalog::{ArtifactRecord, Catalog, ObjectId};
use crate::narration::{NarrationOptions, Narrator};
use crate::narrative::Act;
use crate::paths::{PathId, ERAS};
use crate::persist::{MemoryStorage, PersistError, SnapshotStorage};
use crate::session::{ScanOutcome, SessionError, TourConfig, TourSession};
use crate::vision::{VisionMatch, VisionMatcher};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A narrator that returns scripted responses.
///
/// Each call pops the next response; `None` entries simulate provider
/// failures. Once the script runs out every call returns `None`.
#[derive(Debug, Default)]
pub struct MockNarrator {
    responses: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockNarrator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Some(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn queue(&self, text: impl Into<String>) {
        self.lock_responses().push_back(Some(text.into()));
    }

    /// Queue a provider failure.
    pub fn queue_failure(&self) {
        self.lock_responses().push_back(None);
    }

    /// User prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Option<String>>> {
        self.responses.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn generate(&self, _system: &str, prompt: &str, _: &NarrationOptions) -> Option<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(prompt.to_string());
        self.lock_responses().pop_front().flatten()
    }
}

/// A vision matcher with fixed answers per target.
#[derive(Debug, Default)]
pub struct MockVision {
    results: HashMap<ObjectId, VisionMatch>,
}

impl MockVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_match(mut self, target_id: ObjectId, matched: bool, confidence: f32) -> Self {
        self.results.insert(
            target_id,
            VisionMatch {
                matched,
                confidence,
            },
        );
        self
    }
}

#[async_trait]
impl VisionMatcher for MockVision {
    async fn compare(&self, _photo: &[u8], target_id: ObjectId) -> Option<VisionMatch> {
        self.results.get(&target_id).copied()
    }
}

/// Storage where every operation fails, like a full or missing disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStorage;

impl FailingStorage {
    fn error() -> PersistError {
        PersistError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "storage unavailable",
        ))
    }
}

impl SnapshotStorage for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, PersistError> {
        Err(Self::error())
    }

    fn write(&self, _key: &str, _data: &str) -> Result<(), PersistError> {
        Err(Self::error())
    }

    fn remove(&self, _key: &str) -> Result<(), PersistError> {
        Err(Self::error())
    }
}

/// Ids of the twenty funerary records in [`fixture_catalog`].
pub const FUNERARY_IDS: std::ops::RangeInclusive<ObjectId> = 1..=20;

/// Ids of the Horus records in [`fixture_catalog`].
pub const HORUS_IDS: [ObjectId; 3] = [101, 102, 103];

/// Ids of the Set records in [`fixture_catalog`].
pub const SET_IDS: [ObjectId; 3] = [104, 105, 106];

/// A small catalog with known pools for every path.
///
/// - 20 funerary amulets (search), spread across the memory eras
/// - 6 divine figures (trial), three for Horus and three for Set
/// - 4 scribal and household objects (letters)
/// - 4 described figures of people (awakening)
/// - 1 coffin with no image, which no pool may admit
pub fn fixture_catalog() -> Catalog {
    let mut records = Vec::new();

    for id in FUNERARY_IDS {
        let era = ERAS[(id as usize - 1) % ERAS.len()];
        records.push(
            ArtifactRecord::new(id, format!("Amulet {id}"))
                .with_object_name("Amulet")
                .with_gallery(format!("{}", 100 + id % 5))
                .with_period(era)
                .with_medium("Faience")
                .with_description("Funerary amulet placed with the mummy for protection")
                .with_tags(["Amulets"])
                .with_image(format!("https://images.example/{id}.jpg")),
        );
    }

    let divine = [
        (101, "Falcon of Horus", "Horus as a falcon wearing the double crown"),
        (102, "Wedjat Eye", "The healed eye of Horus, heir to the throne"),
        (103, "Horus the Child", "Horus as the son and rightful heir"),
        (104, "Figure of Seth", "Seth, lord of the desert and storm"),
        (105, "Hippopotamus of Seth", "A hippo, creature of chaos"),
        (106, "Seth Animal", "The strange donkey-like beast of Seth"),
    ];
    for (id, title, description) in divine {
        records.push(
            ArtifactRecord::new(id, title)
                .with_gallery("134")
                .with_period("Late Period")
                .with_medium("Bronze")
                .with_description(description)
                .with_tags(["Goddess"])
                .with_image(format!("https://images.example/{id}.jpg")),
        );
    }

    let everyday = [
        (201, "Scribe's Palette", "Palette with reed pen slots and ink wells"),
        (202, "Bronze Mirror", "Polished cosmetic mirror with a papyrus handle"),
        (203, "Linen Chest", "Chest for household linen"),
        (204, "Game Board", "Senet board for a popular game of daily life"),
    ];
    for (id, title, description) in everyday {
        records.push(
            ArtifactRecord::new(id, title)
                .with_gallery("105")
                .with_period("New Kingdom")
                .with_medium("Wood")
                .with_description(description)
                .with_image(format!("https://images.example/{id}.jpg")),
        );
    }

    let people = [
        (301, "Statue of a Priest", "A temple priest holding a ritual vessel before the gods"),
        (302, "Seated Royal Figure", "A king seated on a block throne, wearing the nemes"),
        (303, "Harpist Relief", "A blind musician playing the harp at a banquet"),
        (304, "Girl with a Duck", "A young child carrying a duck, carved in wood"),
    ];
    for (id, title, description) in people {
        records.push(
            ArtifactRecord::new(id, title)
                .with_gallery("111")
                .with_period("Middle Kingdom")
                .with_medium("Limestone")
                .with_description(description)
                .with_image(format!("https://images.example/{id}.jpg")),
        );
    }

    records.push(
        ArtifactRecord::new(900, "Unphotographed Coffin")
            .with_gallery("107")
            .with_description("Coffin of a funerary priest")
            .with_tags(["Coffins"]),
    );

    Catalog::from_records(records)
}

/// Test harness for scripted tours.
pub struct TestHarness {
    pub session: TourSession,
    pub narrator: MockNarrator,
    pub storage: MemoryStorage,
}

impl TestHarness {
    /// A seeded session over the fixture catalog with in-memory storage.
    pub fn new() -> Self {
        Self::with_config(TourConfig::new().with_seed(42))
    }

    pub fn with_config(config: TourConfig) -> Self {
        let storage = MemoryStorage::new();
        let session = TourSession::new(
            Arc::new(fixture_catalog()),
            Box::new(storage.clone()),
            config,
        );
        Self {
            session,
            narrator: MockNarrator::default(),
            storage,
        }
    }

    /// Select a path and return the sampled target ids in order.
    pub fn select(&mut self, path: PathId) -> Vec<ObjectId> {
        self.session
            .select_path(path)
            .iter()
            .map(|t| t.artifact.object_id)
            .collect()
    }

    /// Queue a narration response.
    pub fn expect_narration(&mut self, text: impl Into<String>) -> &mut Self {
        self.narrator.queue(text);
        self
    }

    pub async fn scan(&mut self, id: ObjectId) -> Result<ScanOutcome, SessionError> {
        self.session.scan(id, &self.narrator).await
    }

    /// Scan an artifact and apply any act transition it fires.
    pub async fn scan_and_advance(&mut self, id: ObjectId) -> Result<ScanOutcome, SessionError> {
        let outcome = self.scan(id).await?;
        if outcome.act_transition().is_some() {
            self.session.advance_act()?;
        }
        Ok(outcome)
    }

    /// Ids in the catalog that are not targets this session.
    pub fn non_targets(&self) -> Vec<ObjectId> {
        self.session
            .catalog()
            .objects()
            .iter()
            .map(|a| a.object_id)
            .filter(|id| !self.session.sampler().is_target(*id))
            .collect()
    }

    /// Resume a second session from this harness's storage.
    pub fn resume(&self) -> TourSession {
        TourSession::resume(
            Arc::new(fixture_catalog()),
            Box::new(self.storage.clone()),
            self.session.config().clone(),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert the session is in `act`.
#[track_caller]
pub fn assert_act(session: &TourSession, act: Act) {
    assert_eq!(
        session.state().act.current,
        act,
        "expected {act}, found {}",
        session.state().act.current
    );
}

/// Assert the number of recorded beats.
#[track_caller]
pub fn assert_beat_count(session: &TourSession, expected: usize) {
    assert_eq!(
        session.state().beats.len(),
        expected,
        "expected {expected} beats"
    );
}

/// Assert exactly one crisis beat has been recorded.
#[track_caller]
pub fn assert_single_crisis(session: &TourSession) {
    let crises = session
        .state()
        .beats
        .iter()
        .filter(|b| b.beat_type == crate::narrative::BeatType::Crisis)
        .count();
    assert_eq!(crises, 1, "expected exactly one crisis beat, found {crises}");
    assert!(session.state().act.crisis_delivered);
}

/// Assert the clue cursor sits at the first unfound link.
#[track_caller]
pub fn assert_clue_cursor(session: &TourSession) {
    let chain = &session.state().clue_chain;
    let expected = chain
        .links()
        .iter()
        .position(|l| !l.found)
        .unwrap_or(chain.links().len());
    assert_eq!(chain.current_link(), expected, "clue cursor out of place");
}

/// Assert every sampled target has a distinct artifact id.
#[track_caller]
pub fn assert_unique_targets(session: &TourSession) {
    let mut ids: Vec<ObjectId> = session
        .targets()
        .iter()
        .map(|t| t.artifact.object_id)
        .collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total, "duplicate targets sampled");
}
