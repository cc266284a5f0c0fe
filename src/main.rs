//! Duck Derby entry point
//!
//! Headless demo: runs a scripted race and then an emergent one in the
//! terminal, driving the simulation with a fixed 60 Hz frame delta the way
//! a rendering host would.

use duck_derby::sim::{AnimationTracker, RacePhase, RaceState, tick};

const FRAME_MS: f32 = 1000.0 / 60.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = 0xD0C5;
    let mut state = RaceState::new(seed);
    let mut tracker = AnimationTracker::new(seed);

    // First heat: script the third duck to win a 6 second race
    let scripted = state.entrants()[2].id;
    if let Err(e) = state.set_duration(6) {
        log::warn!("set_duration rejected: {e}");
    }
    if let Err(e) = state.set_predetermined_winner(Some(scripted)) {
        log::warn!("set_predetermined_winner rejected: {e}");
    }
    run_race(&mut state, &mut tracker, "scripted");

    // Second heat: same roster, open outcome
    state.reset_race();
    if let Err(e) = state.set_predetermined_winner(None) {
        log::warn!("set_predetermined_winner rejected: {e}");
    }
    run_race(&mut state, &mut tracker, "emergent");
}

fn run_race(state: &mut RaceState, tracker: &mut AnimationTracker, label: &str) {
    println!("--- {label} race ---");
    state.start_race();

    let mut wall_ms = 0.0f64;
    while state.phase() != RacePhase::Finished {
        tick(state, FRAME_MS);
        wall_ms += FRAME_MS as f64;
        tracker.update(state.entrants(), wall_ms);
    }

    let mut standings: Vec<_> = state.entrants().iter().collect();
    standings.sort_by(|a, b| {
        b.position
            .partial_cmp(&a.position)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (place, e) in standings.iter().enumerate() {
        let marker = if e.is_winner { "  <- winner" } else { "" };
        println!(
            "{}. {:<12} lane {}  {:6.2}{}",
            place + 1,
            e.name,
            e.lane,
            e.position,
            marker
        );
    }
    state.clear_results();
}
