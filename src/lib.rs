//! Duck Derby - a rigged-or-fair duck race simulation engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (race state machine, pacing, animation)
//! - `snapshot`: Save/load of the entrant configuration
//!
//! The renderer, form UI, and audio are external collaborators: they feed
//! commands and frame deltas in and read entrant positions back out. A race
//! can be scripted to a predetermined winner or left to play out on its own;
//! either way every run is reproducible from its seed.

pub mod sim;
pub mod snapshot;

pub use sim::{AnimationTracker, CommandError, Entrant, EntrantUpdate, RacePhase, RaceState, tick};
pub use snapshot::RaceSnapshot;

/// Race tuning constants
pub mod consts {
    /// Progress value of the finish line
    pub const FINISH_LINE: f32 = 100.0;

    /// Countdown before every race (not user-configurable)
    pub const COUNTDOWN_MS: f32 = 3000.0;

    /// Allowed race duration range in seconds
    pub const MIN_DURATION_SECS: u32 = 1;
    pub const MAX_DURATION_SECS: u32 = 60;
    pub const DEFAULT_DURATION_SECS: u32 = 10;

    /// Roster size bounds
    pub const MIN_ENTRANTS: usize = 1;
    pub const MAX_ENTRANTS: usize = 100;

    /// Display name length cap in characters
    pub const MAX_NAME_LEN: usize = 20;

    /// Position at which the near-finish throttle engages
    pub const NEAR_FINISH: f32 = 90.0;
    /// Hard ceiling for entrants that must not beat the leader to the line
    pub const RUNNER_UP_CEILING: f32 = 99.5;
}
