//! Authoritative race state and the commands that mutate it
//!
//! Everything the renderer reads lives here. Roster and parameter edits are
//! only accepted while the race is idle; once a run is underway the
//! simulation owns the list and rejects outside mutation.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the race lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Roster editable, nothing moving
    Idle,
    /// 3-2-1 before the start signal
    Countdown,
    /// Positions advancing every tick
    Racing,
    /// Standings committed, waiting for reset
    Finished,
}

/// A race participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entrant {
    pub id: u32,
    pub name: String,
    /// Hex or hsl() string, consumed by the renderer
    pub color: String,
    /// Progress toward the finish line, 0-100
    pub position: f32,
    /// Dense display row, 0..N-1
    pub lane: usize,
    pub is_winner: bool,
}

/// Reason code attached to a rejected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Duration outside 1..=60 seconds
    InvalidDuration,
    /// Roster/parameter edits are only accepted while idle
    RaceInProgress,
    /// Would leave fewer than 1 or more than 100 entrants
    EntrantLimit,
    /// No entrant with the referenced id
    UnknownEntrant,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            CommandError::InvalidDuration => "duration must be 1-60 seconds",
            CommandError::RaceInProgress => "edits are locked while a race is running",
            CommandError::EntrantLimit => "roster must hold 1-100 entrants",
            CommandError::UnknownEntrant => "no entrant with that id",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for CommandError {}

/// Partial entrant edit; `None` fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct EntrantUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Starter roster colors (gold, green, water blue, red)
const DEFAULT_COLORS: [&str; 4] = ["#FFD700", "#4CAF50", "#3498DB", "#FF6B6B"];
const DEFAULT_NAMES: [&str; 4] = ["Goldie", "Clover", "Puddles", "Rusty"];

/// First id handed to a dynamically added entrant (starter ducks sit below)
const FIRST_DYNAMIC_ID: u32 = 1005;

/// Complete authoritative race state
#[derive(Debug, Clone)]
pub struct RaceState {
    pub(crate) entrants: Vec<Entrant>,
    pub(crate) duration_secs: u32,
    pub(crate) predetermined_winner: Option<u32>,
    pub(crate) phase: RacePhase,
    /// Time since the current phase began
    pub(crate) elapsed_ms: f32,
    pub(crate) results_ready: bool,
    pub(crate) next_id: u32,
    pub(crate) rng: Pcg32,
}

impl RaceState {
    /// Create an idle state with the starter roster of four ducks
    pub fn new(seed: u64) -> Self {
        let entrants = DEFAULT_NAMES
            .iter()
            .zip(DEFAULT_COLORS.iter())
            .enumerate()
            .map(|(lane, (name, color))| Entrant {
                id: 1001 + lane as u32,
                name: (*name).to_string(),
                color: (*color).to_string(),
                position: 0.0,
                lane,
                is_winner: false,
            })
            .collect();

        Self {
            entrants,
            duration_secs: DEFAULT_DURATION_SECS,
            predetermined_winner: None,
            phase: RacePhase::Idle,
            elapsed_ms: 0.0,
            results_ready: false,
            next_id: FIRST_DYNAMIC_ID,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    // --- read side ---------------------------------------------------------

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    /// Milliseconds since the current phase began
    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    /// Entrants in lane order
    pub fn entrants(&self) -> &[Entrant] {
        &self.entrants
    }

    pub fn entrant(&self, id: u32) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.id == id)
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn predetermined_winner(&self) -> Option<u32> {
        self.predetermined_winner
    }

    /// True once a race has finished, until the collaborator clears it
    pub fn results_ready(&self) -> bool {
        self.results_ready
    }

    pub fn clear_results(&mut self) {
        self.results_ready = false;
    }

    // --- roster & parameter commands (idle only) ---------------------------

    fn require_idle(&self) -> Result<(), CommandError> {
        if self.phase == RacePhase::Idle {
            Ok(())
        } else {
            Err(CommandError::RaceInProgress)
        }
    }

    /// Add a new entrant with a generated name and color, returning its id
    pub fn add_entrant(&mut self) -> Result<u32, CommandError> {
        self.require_idle()?;
        if self.entrants.len() >= MAX_ENTRANTS {
            return Err(CommandError::EntrantLimit);
        }

        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);

        let hue: u32 = self.rng.random_range(0..360);
        let lane = self.entrants.len();
        self.entrants.push(Entrant {
            id,
            name: format!("Duck {}", lane + 1),
            color: format!("hsl({hue}, 70%, 60%)"),
            position: 0.0,
            lane,
            is_winner: false,
        });
        Ok(id)
    }

    /// Remove an entrant and compact the remaining lanes
    pub fn remove_entrant(&mut self, id: u32) -> Result<(), CommandError> {
        self.require_idle()?;
        let idx = self
            .entrants
            .iter()
            .position(|e| e.id == id)
            .ok_or(CommandError::UnknownEntrant)?;
        if self.entrants.len() <= MIN_ENTRANTS {
            return Err(CommandError::EntrantLimit);
        }

        self.entrants.remove(idx);
        for (lane, e) in self.entrants.iter_mut().enumerate() {
            e.lane = lane;
        }
        // A scripted winner that left the roster is no winner at all
        if self.predetermined_winner == Some(id) {
            self.predetermined_winner = None;
        }
        Ok(())
    }

    /// Apply a partial edit. Names are normalized: trimmed, capped at 20
    /// characters, and an empty name keeps the current one.
    pub fn update_entrant(&mut self, id: u32, update: EntrantUpdate) -> Result<(), CommandError> {
        self.require_idle()?;
        let entrant = self
            .entrants
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CommandError::UnknownEntrant)?;

        if let Some(name) = update.name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                entrant.name = trimmed.chars().take(MAX_NAME_LEN).collect();
            }
        }
        if let Some(color) = update.color {
            entrant.color = color;
        }
        Ok(())
    }

    pub fn set_color(&mut self, id: u32, color: &str) -> Result<(), CommandError> {
        self.update_entrant(
            id,
            EntrantUpdate {
                color: Some(color.to_string()),
                ..Default::default()
            },
        )
    }

    /// Set the race duration in seconds. Out-of-range values are rejected
    /// and the previous duration is retained.
    pub fn set_duration(&mut self, secs: u32) -> Result<(), CommandError> {
        self.require_idle()?;
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&secs) {
            return Err(CommandError::InvalidDuration);
        }
        self.duration_secs = secs;
        Ok(())
    }

    /// Script the race outcome, or pass `None` to let the winner emerge
    pub fn set_predetermined_winner(&mut self, id: Option<u32>) -> Result<(), CommandError> {
        self.require_idle()?;
        if let Some(id) = id {
            if self.entrant(id).is_none() {
                return Err(CommandError::UnknownEntrant);
            }
        }
        self.predetermined_winner = id;
        Ok(())
    }

    // --- race control ------------------------------------------------------

    /// Begin the countdown. No-op unless idle.
    pub fn start_race(&mut self) {
        if self.phase != RacePhase::Idle {
            return;
        }
        self.rewind_entrants();
        self.results_ready = false;
        self.elapsed_ms = 0.0;
        self.phase = RacePhase::Countdown;
        log::info!(
            "countdown started ({} entrants, {}s race)",
            self.entrants.len(),
            self.duration_secs
        );
    }

    /// Return to idle from any phase. Tolerated as a no-op from idle.
    pub fn reset_race(&mut self) {
        if self.phase == RacePhase::Idle {
            return;
        }
        self.rewind_entrants();
        self.results_ready = false;
        self.elapsed_ms = 0.0;
        self.phase = RacePhase::Idle;
        log::info!("race reset");
    }

    fn rewind_entrants(&mut self) {
        for e in &mut self.entrants {
            e.position = 0.0;
            e.is_winner = false;
        }
    }
}
