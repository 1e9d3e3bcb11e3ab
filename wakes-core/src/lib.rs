//! Narrative progression engine for the Museum Wakes artifact tour.
//!
//! This crate provides:
//! - An indexed artifact catalog and per-path candidate pools
//! - Per-session target sampling with story roles
//! - A four-act narrative state machine with beats, tension and clue chains
//! - Session persistence with schema migration
//! - A Claude-backed narrator with static fallbacks
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use wakes_core::{Catalog, ClaudeNarrator, FileStorage, PathId, TourConfig, TourSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(Catalog::load("egyptian-art.json").await?);
//!     let storage = Box::new(FileStorage::new(".wakes"));
//!     let mut session = TourSession::resume(catalog, storage, TourConfig::new());
//!
//!     session.select_path(PathId::Search);
//!     let narrator = ClaudeNarrator::from_env()?;
//!     println!("{}", session.narrate_intro(&narrator).await?);
//!
//!     if let Some(target) = session.next_target() {
//!         let id = target.artifact.object_id;
//!         let outcome = session.scan(id, &narrator).await?;
//!         println!("{}", outcome.narration().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod narration;
pub mod narrative;
pub mod paths;
pub mod persist;
pub mod pool;
pub mod sampler;
pub mod session;
pub mod story;
pub mod testing;
pub mod vision;

// Primary public API
pub use catalog::{ArtifactRecord, Catalog, CatalogError, ObjectId};
pub use narration::{ClaudeNarrator, NarrationError, Narrator, SilentNarrator};
pub use narrative::{Act, BeatType, StoryBeat};
pub use paths::{PathId, Register, TargetRole};
pub use persist::{FileStorage, MemoryStorage, Snapshot, SnapshotStorage, STORAGE_KEY};
pub use sampler::{SessionTarget, TargetSampler};
pub use session::{ScanOutcome, ScanRequest, SessionError, TourConfig, TourSession};
pub use story::{Progress, SessionState, StoryStore};
pub use testing::{MockNarrator, TestHarness};
pub use vision::{VisionMatch, VisionMatcher};
