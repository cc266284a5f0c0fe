//! Frame-driven race advancement
//!
//! One `tick` call advances the phase clock, runs the pacing strategy for
//! the current mode, and resolves the finish, in that strict order. The
//! host animation loop supplies the delta; nothing here keeps its own
//! timers, so a reset between frames can never be raced by a stale
//! countdown.

use rand::Rng;
use std::cmp::Ordering;
use std::f32::consts::FRAC_PI_2;

use crate::consts::*;
use crate::sim::state::{RacePhase, RaceState};

/// Pacing strategy for the current tick, chosen from the winner setting
enum PaceMode {
    /// One entrant is scripted to cross the line first
    Fixed { winner_id: u32 },
    /// The winner emerges from the pacing curves alone
    Emergent,
}

/// Advance the race by one frame of `delta_ms` milliseconds
pub fn tick(state: &mut RaceState, delta_ms: f32) {
    match state.phase {
        RacePhase::Idle | RacePhase::Finished => {}

        RacePhase::Countdown => {
            state.elapsed_ms += delta_ms;
            if state.elapsed_ms >= COUNTDOWN_MS {
                state.elapsed_ms = 0.0;
                state.phase = RacePhase::Racing;
                log::info!("race started");
            }
        }

        RacePhase::Racing => {
            state.elapsed_ms += delta_ms;
            let budget_ms = state.duration_secs as f32 * 1000.0;
            let progress = (state.elapsed_ms / budget_ms).min(1.0);

            let mode = match state.predetermined_winner {
                Some(id) if state.entrant(id).is_some() => PaceMode::Fixed { winner_id: id },
                _ => PaceMode::Emergent,
            };
            match mode {
                PaceMode::Fixed { winner_id } => advance_fixed(state, winner_id, progress),
                PaceMode::Emergent => advance_emergent(state, progress),
            }

            resolve_finish(state, progress);
        }
    }
}

// -------------------------------------------------------------------------
// Fixed-outcome pacing
// -------------------------------------------------------------------------

/// Scripted winner path: quadratic ease-in/out with a wobble that decays
/// to zero, pinned to exactly 100 over the final 10% of the race.
fn winner_curve(id: u32, t: f32) -> f32 {
    let curve = if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    };
    let wobble = (t * 10.0 + id as f32).sin() * (2.0 * (1.0 - t)).max(0.0);
    let mut pos = curve * 100.0 + wobble;
    if t > 0.9 {
        let k = (t - 0.9) * 10.0;
        pos = pos * (1.0 - k) + FINISH_LINE * k;
    }
    pos
}

/// Non-winner racing styles, picked deterministically from the id. All
/// three top out well short of the line.
fn runner_up_curve(id: u32, t: f32) -> f32 {
    match id % 3 {
        // Fast starter that fades
        0 => (t * FRAC_PI_2).sin().powf(1.5) * 90.0 + (t * 8.0).sin() * 2.0,
        // Steady pacer
        1 => t * 85.0 + (t * 10.0).sin() * 1.5,
        // Slow starter chasing the pack
        _ => t.powf(0.7) * 85.0 + (t * 12.0).sin() * 1.5,
    }
}

fn advance_fixed(state: &mut RaceState, winner_id: u32, t: f32) {
    // Winner position from the previous tick drives the throttling below
    let winner_pos = state
        .entrant(winner_id)
        .map(|e| e.position)
        .unwrap_or(0.0);

    for i in 0..state.entrants.len() {
        let (id, prev) = {
            let e = &state.entrants[i];
            (e.id, e.position)
        };

        let mut next = if id == winner_id {
            winner_curve(id, t)
        } else if winner_pos >= NEAR_FINISH {
            // Winner is closing in: runner-ups creep forward, the closer
            // they are the slower, and never past the hard ceiling
            let gap = winner_pos - prev;
            let step = (0.03 - gap * 0.005).max(0.01);
            (prev + step).min(RUNNER_UP_CEILING)
        } else {
            let pos = runner_up_curve(id, t);
            if t > 0.8 && pos > winner_pos - 5.0 {
                // Late in the race, hold challengers behind the script
                winner_pos - 5.0 - state.rng.random::<f32>() * 5.0
            } else {
                pos
            }
        };

        // Bounds first, then monotonicity: a wobble dip or hold-back can
        // never move an entrant backwards
        next = next.clamp(0.0, FINISH_LINE).max(prev);
        state.entrants[i].position = next;
    }
}

// -------------------------------------------------------------------------
// Emergent pacing
// -------------------------------------------------------------------------

fn advance_emergent(state: &mut RaceState, t: f32) {
    // Leader is the max position of the previous tick, recomputed every
    // tick rather than cached
    let leader_pos = state
        .entrants
        .iter()
        .map(|e| e.position)
        .fold(0.0f32, f32::max);
    let near_finish = state.entrants.iter().any(|e| e.position >= NEAR_FINISH);

    for e in &mut state.entrants {
        let prev = e.position;

        let personality = ((e.id as u64 * 13) % 10) as f32 / 10.0;
        let base = if personality < 0.33 {
            t.powf(0.7)
        } else if personality < 0.66 {
            t
        } else {
            t.powf(1.3)
        } * 100.0;

        let amplitude = (3.0 * (1.0 - t * t)).max(0.0);
        let wobble = (t * 8.0 + e.id as f32).sin() * amplitude;

        let mut next = if near_finish {
            // Global throttle: creep relative to the leader so exactly one
            // entrant reaches the line
            let gap = leader_pos - prev;
            let step = (0.05 - gap * 0.01).max(0.01);
            let crept = prev + step + wobble * 0.1;
            if prev < leader_pos {
                crept.min(RUNNER_UP_CEILING)
            } else {
                crept
            }
        } else {
            base + wobble
        };

        next = next.clamp(0.0, FINISH_LINE).max(prev);
        e.position = next;
    }
}

// -------------------------------------------------------------------------
// Finish resolution
// -------------------------------------------------------------------------

/// One-shot end-of-race commit: selection only, runner-up positions are
/// left exactly where the last tick put them.
fn resolve_finish(state: &mut RaceState, progress: f32) {
    let line_crossed = state.entrants.iter().any(|e| e.position >= FINISH_LINE);
    if progress < 1.0 && !line_crossed {
        return;
    }

    let winner_id = match state.predetermined_winner {
        Some(id) if state.entrant(id).is_some() => Some(id),
        _ => state
            .entrants
            .iter()
            .max_by(|a, b| {
                a.position
                    .partial_cmp(&b.position)
                    .unwrap_or(Ordering::Equal)
            })
            .map(|e| e.id),
    };

    if let Some(winner_id) = winner_id {
        for e in &mut state.entrants {
            e.is_winner = e.id == winner_id;
            if e.is_winner {
                e.position = FINISH_LINE;
            }
        }
        log::info!("race finished, winner id {winner_id}");
    }

    state.phase = RacePhase::Finished;
    state.elapsed_ms = 0.0;
    state.results_ready = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// 60 Hz frame delta used by the scenarios
    const FRAME_MS: f32 = 16.67;

    fn tick_through_countdown(state: &mut RaceState) {
        state.start_race();
        while state.phase() == RacePhase::Countdown {
            tick(state, FRAME_MS);
        }
        assert_eq!(state.phase(), RacePhase::Racing);
    }

    /// Run until finished, asserting bounds and monotonicity on the way
    fn run_to_finish(state: &mut RaceState) {
        let mut prev: Vec<f32> = state.entrants().iter().map(|e| e.position).collect();
        let mut guard = 0u32;
        while state.phase() == RacePhase::Racing {
            tick(state, FRAME_MS);
            for (e, p) in state.entrants().iter().zip(&prev) {
                assert!(e.position >= *p, "position regressed for id {}", e.id);
                assert!((0.0..=100.0).contains(&e.position));
            }
            prev = state.entrants().iter().map(|e| e.position).collect();
            guard += 1;
            assert!(guard < 500_000, "race never finished");
        }
        assert_eq!(state.phase(), RacePhase::Finished);
    }

    #[test]
    fn countdown_runs_three_seconds() {
        let mut state = RaceState::new(20);
        state.start_race();
        tick(&mut state, 2999.0);
        assert_eq!(state.phase(), RacePhase::Countdown);
        tick(&mut state, 2.0);
        assert_eq!(state.phase(), RacePhase::Racing);
        assert_eq!(state.elapsed_ms(), 0.0);
    }

    #[test]
    fn reset_mid_countdown_stays_idle() {
        let mut state = RaceState::new(21);
        state.start_race();
        tick(&mut state, 1000.0);
        state.reset_race();

        // Let far more than the original countdown pass with no commands
        for _ in 0..600 {
            tick(&mut state, FRAME_MS);
        }
        assert_eq!(state.phase(), RacePhase::Idle);
    }

    #[test]
    fn tick_is_inert_while_idle() {
        let mut state = RaceState::new(22);
        tick(&mut state, 5000.0);
        assert_eq!(state.phase(), RacePhase::Idle);
        assert_eq!(state.elapsed_ms(), 0.0);
        assert!(state.entrants().iter().all(|e| e.position == 0.0));
    }

    #[test]
    fn scripted_race_scenario() {
        // 4 entrants, 10 second race, second duck scripted to win
        let mut state = RaceState::new(23);
        let winner = state.entrants()[1].id;
        state.set_duration(10).unwrap();
        state.set_predetermined_winner(Some(winner)).unwrap();

        tick_through_countdown(&mut state);
        run_to_finish(&mut state);

        let w = state.entrant(winner).unwrap();
        assert!(w.is_winner);
        assert_eq!(w.position, 100.0);
        for e in state.entrants().iter().filter(|e| e.id != winner) {
            assert!(!e.is_winner);
            assert!(e.position < 100.0);
        }
        assert!(state.results_ready());
    }

    #[test]
    fn emergent_race_single_finisher() {
        let mut state = RaceState::new(24);
        state.add_entrant().unwrap(); // 5 entrants
        state.set_duration(6).unwrap();

        tick_through_countdown(&mut state);
        run_to_finish(&mut state);

        let winners: Vec<_> = state.entrants().iter().filter(|e| e.is_winner).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].position, 100.0);
        for e in state.entrants().iter().filter(|e| !e.is_winner) {
            assert!(e.position <= RUNNER_UP_CEILING);
        }
    }

    #[test]
    fn restored_large_ids_race_cleanly() {
        use crate::sim::state::Entrant;
        use crate::snapshot::RaceSnapshot;

        // Rosters restored from storage can carry ids anywhere in u32
        // (the original app hashed UUIDs into them); pacing math must not
        // overflow on them
        let restored = |id: u32, lane: usize| Entrant {
            id,
            name: format!("Duck {lane}"),
            color: "#FFD700".to_string(),
            position: 0.0,
            lane,
            is_winner: false,
        };
        let snapshot = RaceSnapshot {
            entrants: vec![
                restored(4_000_000_000, 0),
                restored(u32::MAX, 1),
                restored(7, 2),
            ],
            duration_secs: 2,
            predetermined_winner: None,
        };

        let mut state = RaceState::from_snapshot(snapshot, 30);
        tick_through_countdown(&mut state);
        run_to_finish(&mut state);
        assert_eq!(state.entrants().iter().filter(|e| e.is_winner).count(), 1);
    }

    #[test]
    fn finish_is_one_shot() {
        let mut state = RaceState::new(25);
        state.set_duration(2).unwrap();
        tick_through_countdown(&mut state);
        run_to_finish(&mut state);

        let positions: Vec<f32> = state.entrants().iter().map(|e| e.position).collect();
        for _ in 0..100 {
            tick(&mut state, FRAME_MS);
        }
        assert_eq!(state.phase(), RacePhase::Finished);
        let after: Vec<f32> = state.entrants().iter().map(|e| e.position).collect();
        assert_eq!(positions, after);
        assert!(state.results_ready());
    }

    #[test]
    fn results_flag_clearable() {
        let mut state = RaceState::new(26);
        state.set_duration(1).unwrap();
        tick_through_countdown(&mut state);
        run_to_finish(&mut state);
        assert!(state.results_ready());
        state.clear_results();
        assert!(!state.results_ready());
        // Still finished; clearing the flag is not a reset
        assert_eq!(state.phase(), RacePhase::Finished);
    }

    #[test]
    fn time_budget_finishes_the_race() {
        let mut state = RaceState::new(27);
        state.set_duration(3).unwrap();
        tick_through_countdown(&mut state);

        // Drive with a coarse delta; cumulative time past the budget must end it
        let mut elapsed = 0.0;
        while state.phase() == RacePhase::Racing {
            tick(&mut state, 100.0);
            elapsed += 100.0;
            assert!(elapsed <= 4000.0, "ran past the time budget");
        }
        assert_eq!(state.phase(), RacePhase::Finished);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// The scripted entrant wins for any seed, duration, and lane pick
        #[test]
        fn scripted_winner_always_wins(
            seed in any::<u64>(),
            winner_lane in 0usize..4,
            duration in 1u32..=15,
        ) {
            let mut state = RaceState::new(seed);
            let winner = state.entrants()[winner_lane].id;
            state.set_duration(duration).unwrap();
            state.set_predetermined_winner(Some(winner)).unwrap();

            tick_through_countdown(&mut state);
            run_to_finish(&mut state);

            prop_assert!(state.entrant(winner).unwrap().is_winner);
            prop_assert_eq!(state.entrant(winner).unwrap().position, 100.0);
            prop_assert_eq!(
                state.entrants().iter().filter(|e| e.is_winner).count(),
                1
            );
        }

        /// Emergent races produce exactly one winner at the line
        #[test]
        fn emergent_single_winner(seed in any::<u64>(), duration in 1u32..=10) {
            let mut state = RaceState::new(seed);
            state.set_duration(duration).unwrap();

            tick_through_countdown(&mut state);
            run_to_finish(&mut state);

            prop_assert_eq!(
                state.entrants().iter().filter(|e| e.is_winner).count(),
                1
            );
            for e in state.entrants().iter().filter(|e| !e.is_winner) {
                prop_assert!(e.position < 100.0);
            }
        }
    }
}
