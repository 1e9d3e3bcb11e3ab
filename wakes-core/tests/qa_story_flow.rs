//! QA tests for the story state machine driven through a full session.
//!
//! These run against the fixture catalog with scripted narration, so they
//! need no API key.

use wakes_core::narrative::{evaluate_act_transition, evaluate_convergence, Act, BeatType};
use wakes_core::paths::{PathId, Side, TargetRole};
use wakes_core::sampler::{SamplerSnapshot, SessionTarget, TargetSampler};
use wakes_core::story::StoryStore;
use wakes_core::testing::{
    assert_act, assert_beat_count, assert_clue_cursor, assert_single_crisis, fixture_catalog,
    TestHarness, HORUS_IDS, SET_IDS,
};
use wakes_core::{ScanOutcome, SessionError, TourConfig};

fn harness(count: usize) -> TestHarness {
    TestHarness::with_config(TourConfig::new().with_seed(11).with_target_count(count))
}

// =============================================================================
// Idempotent scanning
// =============================================================================

#[tokio::test]
async fn test_duplicate_scan_changes_nothing() {
    let mut h = harness(5);
    let targets = h.select(PathId::Search);
    let id = targets[0];

    h.expect_narration("I feel his heart beating beneath the faience.");
    let first = h.scan(id).await.unwrap();
    assert!(first.is_recorded());

    let before = h.session.state().clone();
    let second = h.scan(id).await.unwrap();
    assert_eq!(second, ScanOutcome::Duplicate { object_id: id });
    assert_eq!(h.session.state(), &before);
    assert_beat_count(&h.session, 1);
}

#[tokio::test]
async fn test_duplicate_through_prepared_request() {
    let mut h = harness(5);
    let targets = h.select(PathId::Search);

    let request = h.session.prepare_scan(targets[0]).unwrap();
    assert!(h.session.complete_scan(request, None).is_recorded());

    // A second request for the same artifact is current but still a duplicate.
    let again = h.session.prepare_scan(targets[0]).unwrap();
    let outcome = h.session.complete_scan(again, Some("Again".into()));
    assert_eq!(outcome, ScanOutcome::Duplicate { object_id: targets[0] });
    assert_beat_count(&h.session, 1);
}

// =============================================================================
// Seven scans across three acts
// =============================================================================

#[tokio::test]
async fn test_seven_scan_act_progression() {
    let mut h = harness(14);
    h.select(PathId::Search);

    let expected = [
        None,
        Some(Act::Descent),
        None,
        None,
        Some(Act::Crisis),
        None,
        Some(Act::Return),
    ];
    for (i, id) in (1..=7).enumerate() {
        let outcome = h.scan(id).await.unwrap();
        assert_eq!(outcome.act_transition(), expected[i], "scan {}", i + 1);

        if i == 5 {
            let beat = outcome_beat_type(&outcome);
            assert_eq!(beat, BeatType::Crisis, "the first beat of act 3 is the crisis");
        }

        // Apply every transition except the last so the final check can see it.
        if i < 6 && outcome.act_transition().is_some() {
            h.session.advance_act().unwrap();
        }
    }

    assert_act(&h.session, Act::Crisis);
    assert_eq!(evaluate_act_transition(h.session.state()), Some(Act::Return));
    assert!(h.session.state().act.transition_pending);
    assert_eq!(h.session.advance_act().unwrap(), Some(Act::Return));
    assert_act(&h.session, Act::Return);
    assert_single_crisis(&h.session);
}

fn outcome_beat_type(outcome: &ScanOutcome) -> BeatType {
    match outcome {
        ScanOutcome::Recorded { beat, .. } => beat.beat_type,
        other => panic!("expected a recorded scan, got {other:?}"),
    }
}

// =============================================================================
// Monotonic act and crisis exactly once
// =============================================================================

#[tokio::test]
async fn test_acts_never_decrease_or_skip() {
    let mut h = harness(14);
    h.select(PathId::Search);

    assert!(matches!(
        h.session.advance_to(Act::Crisis),
        Err(SessionError::Story(_))
    ));
    assert!(matches!(
        h.session.advance_to(Act::Call),
        Err(SessionError::Story(_))
    ));

    let mut last = Act::Call;
    for id in 1..=20 {
        h.scan_and_advance(id).await.unwrap();
        let current = h.session.state().act.current;
        assert!(current >= last, "act went from {last} to {current}");
        assert!(
            current.number() <= last.number() + 1,
            "act skipped from {last} to {current}"
        );
        last = current;
    }

    assert_act(&h.session, Act::Return);
    assert_single_crisis(&h.session);
    assert_eq!(h.session.advance_act().unwrap(), None);
}

#[tokio::test]
async fn test_crisis_delivered_once_without_advancing() {
    let mut h = harness(14);
    h.select(PathId::Search);
    for id in 1..=5 {
        h.scan_and_advance(id).await.unwrap();
    }
    assert_act(&h.session, Act::Crisis);

    // Stay in act 3 for a while; only the first beat is the crisis.
    for id in 6..=12 {
        h.scan(id).await.unwrap();
    }
    assert_single_crisis(&h.session);
}

// =============================================================================
// Clue chain
// =============================================================================

#[tokio::test]
async fn test_clue_cursor_follows_first_unfound() {
    let mut h = harness(5);
    let targets = h.select(PathId::Search);
    assert_eq!(h.session.state().clue_chain.links().len(), 5);
    assert_clue_cursor(&h.session);

    // Find them out of order: last, second, first, fourth, third.
    for index in [4, 1, 0, 3, 2] {
        h.scan(targets[index]).await.unwrap();
        assert_clue_cursor(&h.session);
    }
    let chain = &h.session.state().clue_chain;
    assert!(chain.is_complete());
    assert_eq!(chain.current_link(), chain.links().len());
}

#[tokio::test]
async fn test_non_targets_leave_clues_alone() {
    let mut h = harness(3);
    let targets = h.select(PathId::Search);
    let stray = h
        .non_targets()
        .into_iter()
        .find(|id| !targets.contains(id) && *id != 900)
        .unwrap();

    h.scan(stray).await.unwrap();
    assert_eq!(h.session.state().clue_chain.current_link(), 0);
    assert_eq!(h.session.sampler().scanned_count(), 0);
    assert_eq!(
        h.session.next_target().map(|t| t.artifact.object_id),
        Some(targets[0])
    );
}

// =============================================================================
// Trial
// =============================================================================

#[test]
fn test_two_horus_targets_fill_horus_evidence() {
    let catalog = fixture_catalog();
    let targets: Vec<SessionTarget> = HORUS_IDS[..2]
        .iter()
        .map(|id| SessionTarget {
            artifact: catalog.get_by_id(*id).unwrap().clone(),
            role: TargetRole::Side(Side::Horus),
        })
        .collect();
    let mut sampler = TargetSampler::restore(SamplerSnapshot {
        path_id: Some(PathId::Trial),
        targets: targets.clone(),
        scanned: Vec::new(),
        pool_size: 7,
    });
    let mut store = StoryStore::new();
    store.select_path(PathId::Trial, &targets);

    for target in &targets {
        store.record_beat(
            &mut sampler,
            &target.artifact,
            None,
            true,
            Some(&target.role),
        );
    }

    let trial = &store.state().counters.trial;
    assert_eq!(trial.horus_evidence.len(), 2);
    assert_eq!(trial.set_evidence.len(), 0);
}

#[tokio::test]
async fn test_trial_roles_follow_keywords() {
    let mut h = harness(6);
    h.select(PathId::Trial);
    for target in h.session.targets() {
        let id = target.artifact.object_id;
        if HORUS_IDS.contains(&id) {
            assert_eq!(target.role, TargetRole::Side(Side::Horus));
        } else if SET_IDS.contains(&id) {
            assert_eq!(target.role, TargetRole::Side(Side::Set));
        }
    }
}

// =============================================================================
// Convergence
// =============================================================================

#[tokio::test]
async fn test_convergence_stays_ready() {
    let mut h = harness(6);
    h.select(PathId::Trial);

    // Alternate sides so targets and non-targets both balance the case.
    let order = [101, 104, 102, 105, 103, 106];
    for id in order {
        h.scan_and_advance(id).await.unwrap();
    }
    assert!(h.session.state().convergence_ready);
    assert!(evaluate_convergence(h.session.state()));

    for id in 1..=8 {
        h.scan_and_advance(id).await.unwrap();
        assert!(h.session.state().convergence_ready);
        assert!(h.session.progress().convergence_ready);
    }

    let ending = h.session.narrate_convergence(&h.narrator).await.unwrap();
    assert_eq!(ending, PathId::Trial.definition().fallback.convergence);
    assert_eq!(h.session.state().phase.as_str(), "convergence");
}

#[tokio::test]
async fn test_not_ready_before_crisis() {
    let mut h = harness(6);
    h.select(PathId::Trial);
    for id in [101, 104, 102, 105] {
        h.scan_and_advance(id).await.unwrap();
    }
    assert!(h.session.state().act.current < Act::Crisis);
    assert!(!h.session.state().convergence_ready);
}

// =============================================================================
// Narration
// =============================================================================

#[tokio::test]
async fn test_narration_is_mined_into_beats() {
    let mut h = harness(5);
    let targets = h.select(PathId::Search);

    h.expect_narration(
        "This amulet held his heart. Seek the gilded falcon in Gallery 134 before dusk.",
    );
    let outcome = h.scan(targets[0]).await.unwrap();
    let ScanOutcome::Recorded {
        beat,
        used_fallback,
        ..
    } = outcome
    else {
        panic!("expected a recorded scan");
    };
    assert!(!used_fallback);
    assert_eq!(beat.summary, "This amulet held his heart.");
    assert!(beat.clue_given.contains("Gallery 134"));
}

#[tokio::test]
async fn test_narration_failure_advances_identically() {
    let mut scripted = harness(5);
    let mut silent = harness(5);
    let targets = scripted.select(PathId::Search);
    assert_eq!(silent.select(PathId::Search), targets);

    for id in &targets {
        scripted.expect_narration("The pieces call to one another.");
        scripted.scan_and_advance(*id).await.unwrap();
        silent.scan_and_advance(*id).await.unwrap();
    }

    let a = scripted.session.state();
    let b = silent.session.state();
    assert_eq!(a.act, b.act);
    assert_eq!(a.counters, b.counters);
    assert_eq!(a.path_progress, b.path_progress);
    assert_eq!(a.beats.len(), b.beats.len());
    assert!(b.beats.iter().all(|beat| beat.summary.is_empty()));
}

#[tokio::test]
async fn test_scan_prompts_reach_the_narrator() {
    let mut h = harness(5);
    let targets = h.select(PathId::Search);
    h.scan(targets[0]).await.unwrap();
    let prompts = h.narrator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("CURRENT ARTIFACT"));
    assert!(prompts[0].contains("session targets"));
}

#[tokio::test]
async fn test_letters_are_kept_from_narration() {
    let mut h = harness(3);
    let targets = h.select(PathId::Letters);
    assert_eq!(targets.len(), 3);

    let long = "My dearest Merit, the lamps are lit again. ".repeat(8);
    h.expect_narration(long.as_str());
    h.scan(targets[0]).await.unwrap();
    h.expect_narration("Another letter, sealed with lotus.");
    h.scan(targets[1]).await.unwrap();
    // No narration, no letter.
    h.narrator.queue_failure();
    h.scan(targets[2]).await.unwrap();

    let letters = &h.session.state().counters.letters.letters_received;
    assert_eq!(letters.len(), 2);
    assert_eq!(letters[0].artifact, h.session.targets()[0].artifact.title);
    assert_eq!(letters[0].content.chars().count(), 200);
    assert_eq!(letters[1].content, "Another letter, sealed with lotus.");
    assert!(h.session.journey_summary().contains("Letters from Kha: 2."));
}

#[tokio::test]
async fn test_characters_met_reach_the_finale() {
    let mut h = harness(3);
    let targets = h.select(PathId::Awakening);
    assert_eq!(targets.len(), 3);

    for id in &targets {
        h.expect_narration(format!("I am the keeper of object {id}. I have waited so long."));
        h.scan_and_advance(*id).await.unwrap();
    }

    let met = h.session.state().counters.awakening.characters_met.clone();
    assert_eq!(met.len(), 3);
    assert!(met[0].intro.starts_with("I am the keeper"));
    assert!(h.session.journey_summary().contains("Characters met: 3."));

    h.session.narrate_convergence(&h.narrator).await.unwrap();
    let prompts = h.narrator.prompts();
    let finale = prompts.last().unwrap();
    assert!(finale.contains("Characters met:"));
    assert!(finale.contains(&met[0].artifact));
}
