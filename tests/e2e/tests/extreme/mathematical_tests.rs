//! Mathematical properties of the scheduler
//!
//! Exercised over every lifecycle state and every rating, across a range
//! of review times, rather than on single hand-picked cards.

use cadence_core::fsrs::{MAX_DIFFICULTY, MAX_STABILITY, MIN_DIFFICULTY, MIN_STABILITY};
use cadence_core::{
    format_delta, retrievability, CardState, Parameters, Rating, Scheduler, SchedulingState,
    FSRS6_WEIGHTS,
};
use cadence_e2e_tests::TestDataFactory;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
}

/// Every fixture state reviewed at a spread of times after its last review
fn grid() -> Vec<(SchedulingState, DateTime<Utc>)> {
    let offsets = [
        Duration::zero(),
        Duration::minutes(5),
        Duration::hours(13),
        Duration::days(1),
        Duration::days(9),
        Duration::days(45),
        Duration::days(900),
    ];

    let mut cases = Vec::new();
    for card in TestDataFactory::one_of_each(base()) {
        let anchor = card.last_review.unwrap_or(card.due);
        for offset in offsets {
            cases.push((card.clone(), anchor + offset));
        }
    }
    cases
}

// ============================================================================
// TOTALITY AND BOUNDS
// ============================================================================

#[test]
fn test_every_state_and_rating_is_schedulable() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        for rating in Rating::ALL {
            let result = scheduler.schedule(&card, rating, now);
            assert!(result.is_ok(), "{:?} {:?} at {}", card.state, rating, now);
        }
    }
}

#[test]
fn test_results_stay_in_domain() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        for rating in Rating::ALL {
            let next = scheduler.schedule(&card, rating, now).unwrap().state;

            assert!(next.due > now, "due not after now for {:?}", rating);
            assert_ne!(next.state, CardState::New);
            assert!((MIN_STABILITY..=MAX_STABILITY).contains(&next.stability));
            assert!((MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&next.difficulty));
            assert_eq!(next.last_review, Some(now));
            assert!(next.validate().is_ok());
        }
    }
}

#[test]
fn test_counters_move_one_step_at_most() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        for rating in Rating::ALL {
            let next = scheduler.schedule(&card, rating, now).unwrap().state;

            let expected_reps = if rating == Rating::Again { card.reps } else { card.reps + 1 };
            assert_eq!(next.reps, expected_reps);

            let lapsed = rating == Rating::Again
                && matches!(card.state, CardState::Review | CardState::Relearning);
            assert_eq!(next.lapses, card.lapses + u32::from(lapsed));
        }
    }
}

#[test]
fn test_minute_steps_have_no_day_interval() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        for rating in Rating::ALL {
            let next = scheduler.schedule(&card, rating, now).unwrap().state;
            match next.state {
                CardState::Learning | CardState::Relearning => {
                    assert_eq!(next.scheduled_days, 0);
                    assert!(next.due - now < Duration::days(1));
                }
                CardState::Review => {
                    assert!(next.scheduled_days >= 1);
                    assert_eq!(next.due, now + Duration::days(i64::from(next.scheduled_days)));
                }
                CardState::New => unreachable!(),
            }
        }
    }
}

// ============================================================================
// STEP SEQUENCES
// ============================================================================

fn step_lists() -> Vec<Parameters> {
    let learning: [&[u32]; 4] = [&[1, 10], &[1, 10, 60], &[5], &[]];
    let relearning: [&[u32]; 3] = [&[10], &[10, 60], &[]];

    let mut params = Vec::new();
    for l in learning {
        for r in relearning {
            params.push(Parameters {
                learning_steps: l.to_vec(),
                relearning_steps: r.to_vec(),
                ..Parameters::default()
            });
        }
    }
    params
}

#[test]
fn test_step_lists_schedule_every_state_and_rating() {
    for params in step_lists() {
        let scheduler = Scheduler::new(params.clone());
        for (card, now) in grid() {
            for rating in Rating::ALL {
                let next = scheduler
                    .schedule(&card, rating, now)
                    .unwrap_or_else(|e| panic!("{:?} {:?} under {:?}: {e}", card.state, rating, params))
                    .state;
                assert!(next.due > now);
                if matches!(next.state, CardState::Learning | CardState::Relearning) {
                    assert_eq!(next.scheduled_days, 0);
                    assert!(next.due - now < Duration::days(1));
                }
            }
        }
    }
}

#[test]
fn test_good_always_reaches_review() {
    for params in step_lists() {
        let scheduler = Scheduler::new(params.clone());
        let bound = params.learning_steps.len().max(params.relearning_steps.len()) + 1;

        for (card, now) in grid() {
            for first in Rating::ALL {
                let mut current = scheduler.schedule(&card, first, now).unwrap().state;
                let mut goods = 0;
                while current.state != CardState::Review {
                    assert!(
                        goods < bound,
                        "{:?} then {:?} stuck in {:?} after {goods} Good reviews under {:?}",
                        card.state,
                        first,
                        current.state,
                        params
                    );
                    let at = current.due;
                    current = scheduler.schedule(&current, Rating::Good, at).unwrap().state;
                    goods += 1;
                }
            }
        }
    }
}

#[test]
fn test_each_good_advances_one_step() {
    for params in step_lists() {
        let steps = params.learning_steps.clone();
        let scheduler = Scheduler::new(params);
        let mut card = TestDataFactory::new_card(base());
        let mut now = base();

        for &expected in steps.iter().skip(1) {
            card = scheduler.schedule(&card, Rating::Good, now).unwrap().state;
            assert_eq!(card.state, CardState::Learning);
            assert_eq!(card.due - now, Duration::minutes(i64::from(expected)));
            now = card.due;
        }
        card = scheduler.schedule(&card, Rating::Good, now).unwrap().state;
        assert_eq!(card.state, CardState::Review, "steps {:?}", steps);
    }
}

// ============================================================================
// ORDERING
// ============================================================================

#[test]
fn test_better_ratings_never_come_due_sooner() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        let options = scheduler.preview(&card, now).unwrap();
        for pair in options.windows(2) {
            assert!(
                pair[0].state.due <= pair[1].state.due,
                "{:?}: {:?} due after {:?}",
                card.state,
                pair[0].rating,
                pair[1].rating
            );
        }
    }
}

#[test]
fn test_review_intervals_strictly_ordered() {
    let scheduler = Scheduler::default();
    for stability in [0.5, 3.0, 10.0, 80.0, 400.0] {
        for difficulty in [1.0, 5.0, 9.5] {
            let card = TestDataFactory::review_card(stability, difficulty, base());
            let now = card.due;
            let options = scheduler.preview(&card, now).unwrap();
            let days = |i: usize| options[i].state.scheduled_days;

            assert!(days(1) <= days(2), "hard > good at S={stability} D={difficulty}");
            assert!(days(2) < days(3), "good >= easy at S={stability} D={difficulty}");
        }
    }
}

#[test]
fn test_maximum_interval_respected_everywhere() {
    let scheduler = Scheduler::new(Parameters {
        maximum_interval: 30,
        ..Parameters::default()
    });
    for (card, now) in grid() {
        for rating in Rating::ALL {
            let next = scheduler.schedule(&card, rating, now).unwrap().state;
            assert!(next.scheduled_days <= 30, "{:?} {:?}", card.state, rating);
        }
    }
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_schedule_is_pure() {
    let scheduler = Scheduler::default();
    for (card, now) in grid() {
        let snapshot = card.clone();
        for rating in Rating::ALL {
            let a = scheduler.schedule(&card, rating, now).unwrap();
            let b = scheduler.schedule(&card, rating, now).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(card, snapshot);
    }
}

// ============================================================================
// FORGETTING CURVE
// ============================================================================

#[test]
fn test_retrievability_at_stability_is_ninety_percent() {
    for stability in [0.5, 1.0, 7.0, 365.0] {
        let r = retrievability(&FSRS6_WEIGHTS, stability, stability);
        assert!((r - 0.9).abs() < 1e-9, "S={stability}: {r}");
    }
}

#[test]
fn test_retrievability_decays_monotonically() {
    let mut previous = 1.0;
    for day in 0..200 {
        let r = retrievability(&FSRS6_WEIGHTS, f64::from(day), 12.0);
        assert!(r <= previous);
        assert!((0.0..=1.0).contains(&r));
        previous = r;
    }
}

#[test]
fn test_longer_gaps_give_larger_stability_gains() {
    let scheduler = Scheduler::default();
    let card = TestDataFactory::review_card(10.0, 5.0, base());

    let on_time = scheduler.schedule(&card, Rating::Good, base() + Duration::days(10)).unwrap();
    let late = scheduler.schedule(&card, Rating::Good, base() + Duration::days(30)).unwrap();
    assert!(late.state.stability > on_time.state.stability);
}

// ============================================================================
// LABELS
// ============================================================================

#[test]
fn test_labels_monotonic_units() {
    let cases = [
        (Duration::seconds(30), "<1m"),
        (Duration::minutes(1), "1m"),
        (Duration::minutes(59), "59m"),
        (Duration::minutes(60), "1h"),
        (Duration::hours(23), "23h"),
        (Duration::hours(24), "1d"),
        (Duration::days(29), "29d"),
        (Duration::days(30), "1mo"),
        (Duration::days(364), "12mo"),
        (Duration::days(365), "1.0y"),
        (Duration::days(3650), "10.0y"),
    ];
    for (delta, label) in cases {
        assert_eq!(format_delta(delta), label, "{:?}", delta);
    }
}
