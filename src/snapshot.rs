//! Entrant configuration save/load
//!
//! JSON envelope for the storage collaborator: the roster, the race
//! duration, and the scripted winner. Restoring re-imposes only the
//! standard invariants; everything else is taken at face value.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::state::{Entrant, RacePhase, RaceState};

/// Everything that survives between sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub entrants: Vec<Entrant>,
    pub duration_secs: u32,
    pub predetermined_winner: Option<u32>,
}

impl RaceSnapshot {
    pub fn to_json(&self) -> Option<String> {
        match serde_json::to_string(self) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("failed to encode snapshot: {e}");
                None
            }
        }
    }

    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("discarding corrupt snapshot: {e}");
                None
            }
        }
    }
}

impl RaceState {
    /// Capture the persistent slice of the current state
    pub fn snapshot(&self) -> RaceSnapshot {
        RaceSnapshot {
            entrants: self.entrants.clone(),
            duration_secs: self.duration_secs,
            predetermined_winner: self.predetermined_winner,
        }
    }

    /// Rebuild an idle state from a stored roster.
    ///
    /// Standard invariants only: the duration is clamped into 1..=60, a
    /// winner reference to a missing entrant is dropped, lanes are
    /// compacted, positions clamped, and the id counter continues above
    /// every restored id. An empty roster falls back to the starter ducks.
    pub fn from_snapshot(snapshot: RaceSnapshot, seed: u64) -> RaceState {
        let mut entrants = snapshot.entrants;
        if entrants.is_empty() {
            log::warn!("snapshot held no entrants, using starter roster");
            return RaceState::new(seed);
        }
        entrants.truncate(MAX_ENTRANTS);

        for (lane, e) in entrants.iter_mut().enumerate() {
            e.lane = lane;
            e.position = e.position.clamp(0.0, FINISH_LINE);
        }

        let predetermined_winner = snapshot
            .predetermined_winner
            .filter(|id| entrants.iter().any(|e| e.id == *id));
        if predetermined_winner.is_none() && snapshot.predetermined_winner.is_some() {
            log::warn!("dropped scripted winner pointing at a missing entrant");
        }

        let next_id = entrants
            .iter()
            .map(|e| e.id)
            .max()
            .map_or(1, |m| m.saturating_add(1));

        RaceState {
            entrants,
            duration_secs: snapshot
                .duration_secs
                .clamp(MIN_DURATION_SECS, MAX_DURATION_SECS),
            predetermined_winner,
            phase: RacePhase::Idle,
            elapsed_ms: 0.0,
            results_ready: false,
            next_id,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}
