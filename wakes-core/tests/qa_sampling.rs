//! QA tests for candidate pools and target sampling.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use wakes_core::paths::{PathId, TargetRole, BODY_PARTS, ERAS};
use wakes_core::pool::build_pool;
use wakes_core::testing::{assert_unique_targets, fixture_catalog, MockVision, TestHarness};
use wakes_core::{Catalog, TargetSampler, TourConfig};

#[test]
fn test_fourteen_of_twenty_search_targets() {
    let catalog = fixture_catalog();
    assert_eq!(build_pool(PathId::Search, &catalog).len(), 20);

    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(3);
    let targets = sampler.sample_targets(PathId::Search, &catalog, 14, &mut rng);

    assert_eq!(targets.len(), 14);
    let ids: HashSet<_> = targets.iter().map(|t| t.artifact.object_id).collect();
    assert_eq!(ids.len(), 14);
    for (i, target) in targets.iter().enumerate() {
        assert_eq!(target.role, TargetRole::BodyPart(BODY_PARTS[i].to_string()));
    }
    assert_eq!(sampler.pool_size(), 20);
}

#[test]
fn test_body_parts_cycle_past_fourteen() {
    let catalog = fixture_catalog();
    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(5);
    let targets = sampler.sample_targets(PathId::Search, &catalog, 16, &mut rng);

    assert_eq!(targets.len(), 16);
    assert_eq!(targets[14].role, TargetRole::BodyPart(BODY_PARTS[0].to_string()));
    assert_eq!(targets[15].role, TargetRole::BodyPart(BODY_PARTS[1].to_string()));
}

#[test]
fn test_sampling_never_repeats_an_artifact() {
    let catalog = fixture_catalog();
    for seed in 0..50 {
        for path in PathId::ALL {
            let mut sampler = TargetSampler::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let targets = sampler.sample_targets(path, &catalog, 30, &mut rng);
            let ids: HashSet<_> = targets.iter().map(|t| t.artifact.object_id).collect();
            assert_eq!(ids.len(), targets.len(), "{path} with seed {seed}");
            assert!(targets.iter().all(|t| t.artifact.has_image()));
        }
    }
}

#[test]
fn test_count_larger_than_pool_takes_everything() {
    let catalog = fixture_catalog();
    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(9);
    let targets = sampler.sample_targets(PathId::Search, &catalog, 40, &mut rng);
    assert_eq!(targets.len(), 20);
}

#[test]
fn test_memory_samples_in_era_order() {
    let catalog = fixture_catalog();
    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(1);
    let targets = sampler.sample_targets(PathId::Memory, &catalog, 0, &mut rng);

    let era_index = |period: &str| ERAS.iter().position(|era| period.contains(era));
    let order: Vec<usize> = targets
        .iter()
        .filter_map(|t| match &t.role {
            TargetRole::Period(period) => era_index(period),
            _ => None,
        })
        .collect();
    assert_eq!(order.len(), targets.len());
    assert!(order.windows(2).all(|w| w[0] <= w[1]), "eras out of order: {order:?}");
}

#[test]
fn test_next_target_walks_sample_order() {
    let catalog = fixture_catalog();
    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(21);
    let ids: Vec<_> = sampler
        .sample_targets(PathId::Search, &catalog, 5, &mut rng)
        .iter()
        .map(|t| t.artifact.object_id)
        .collect();

    assert_eq!(sampler.next_target().map(|t| t.artifact.object_id), Some(ids[0]));
    assert!(sampler.mark_scanned(ids[0]));
    assert_eq!(sampler.next_target().map(|t| t.artifact.object_id), Some(ids[1]));
    assert_eq!(sampler.remaining_targets().len(), 4);

    // Marking again, or marking a stranger, changes nothing.
    assert!(!sampler.mark_scanned(ids[0]));
    assert!(!sampler.mark_scanned(999));
    assert_eq!(sampler.scanned_count(), 1);
}

#[test]
fn test_unloaded_catalog_gives_no_targets() {
    let catalog = Catalog::empty();
    let mut sampler = TargetSampler::new();
    let mut rng = StdRng::seed_from_u64(0);
    assert!(sampler
        .sample_targets(PathId::Trial, &catalog, 10, &mut rng)
        .is_empty());
    assert!(sampler.next_target().is_none());
    assert_eq!(sampler.pool_size(), 0);
}

#[test]
fn test_same_seed_same_targets() {
    let mut a = TestHarness::with_config(TourConfig::new().with_seed(99));
    let mut b = TestHarness::with_config(TourConfig::new().with_seed(99));
    assert_eq!(a.select(PathId::Letters), b.select(PathId::Letters));
    assert_unique_targets(&a.session);
}

#[tokio::test]
async fn test_verify_capture_against_next_target() {
    let mut h = TestHarness::with_config(
        TourConfig::new()
            .with_seed(4)
            .with_target_count(3)
            .with_min_vision_confidence(0.8),
    );
    let targets = h.select(PathId::Search);

    let confident = MockVision::new().with_match(targets[0], true, 0.9);
    assert_eq!(
        h.session.verify_capture(b"jpeg", &confident).await,
        Some(targets[0])
    );

    let unsure = MockVision::new().with_match(targets[0], true, 0.5);
    assert_eq!(h.session.verify_capture(b"jpeg", &unsure).await, None);

    let unknown = MockVision::new();
    assert_eq!(h.session.verify_capture(b"jpeg", &unknown).await, None);
}
