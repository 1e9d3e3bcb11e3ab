//! Session state and the store that mutates it.

pub mod mining;
mod state;
mod store;

pub use state::{
    AwakeningProgress, CharacterMeeting, Disclosure, Letter, LettersProgress, MemoryProgress,
    Moment, PathCounters, Phase, ScannedArtifact, SearchProgress, SessionState, TrialProgress,
    Vision,
};
pub use store::{Progress, RecordOutcome, StoryError, StoryStore};
