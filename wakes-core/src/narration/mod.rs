//! Narration seam.
//!
//! Narration is produced by an untrusted, fallible text generator behind the
//! [`Narrator`] trait. A generator that fails returns `None` and the caller
//! falls back to the path's static text. Requests are guarded by a
//! [`NarrationGate`]: a late response is never shown over a newer one, and
//! nothing issued before a reset can touch the new session.

mod claude;
pub mod prompt;

pub use claude::{ClaudeNarrator, NarrationError};

use crate::narrative::Act;
use async_trait::async_trait;

/// Sampling options for one narration request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl NarrationOptions {
    /// The length and temperature tuned for an act.
    pub fn for_act(act: Act) -> Self {
        Self {
            max_tokens: act.max_tokens(),
            temperature: act.temperature(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for NarrationOptions {
    fn default() -> Self {
        Self::for_act(Act::Call)
    }
}

/// A source of in-character narration.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Generate text, or `None` when the provider is unavailable or fails.
    async fn generate(&self, system: &str, prompt: &str, options: &NarrationOptions)
        -> Option<String>;
}

/// A narrator that never produces text, so every call site uses its
/// static fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNarrator;

#[async_trait]
impl Narrator for SilentNarrator {
    async fn generate(&self, _: &str, _: &str, _: &NarrationOptions) -> Option<String> {
        None
    }
}

/// Token identifying one narration request.
///
/// Carries the gate's epoch at issue time, so a reset can be told apart
/// from a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NarrationTicket {
    epoch: u64,
    seq: u64,
}

impl NarrationTicket {
    pub fn value(&self) -> u64 {
        self.seq
    }
}

/// Monotonic request counter.
///
/// Only the most recently issued ticket is current. A newer ticket
/// supersedes older ones for display, but they stay live until
/// [`invalidate`](NarrationGate::invalidate) starts a new epoch.
#[derive(Debug, Default)]
pub struct NarrationGate {
    epoch: u64,
    latest: u64,
}

impl NarrationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> NarrationTicket {
        self.latest += 1;
        NarrationTicket {
            epoch: self.epoch,
            seq: self.latest,
        }
    }

    /// True for the most recently issued ticket of the current epoch.
    pub fn is_current(&self, ticket: NarrationTicket) -> bool {
        self.is_live(ticket) && ticket.seq == self.latest
    }

    /// True if no reset happened since the ticket was issued.
    pub fn is_live(&self, ticket: NarrationTicket) -> bool {
        ticket.epoch == self.epoch
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.latest += 1;
    }
}
