//! Photo verification seam.

use crate::catalog::ObjectId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of comparing a visitor's photo to a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionMatch {
    pub matched: bool,
    /// Model confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl VisionMatch {
    /// A match that clears the confidence floor.
    pub fn is_confident(&self, min_confidence: f32) -> bool {
        self.matched && self.confidence >= min_confidence
    }
}

/// Compares a captured photo against a catalog image.
#[async_trait]
pub trait VisionMatcher: Send + Sync {
    /// `None` when the comparison could not be made.
    async fn compare(&self, photo: &[u8], target_id: ObjectId) -> Option<VisionMatch>;
}
