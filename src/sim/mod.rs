//! Deterministic race simulation
//!
//! All race logic lives here. This module must be pure and deterministic:
//! - Host-driven ticks only (no timers, no threads)
//! - Seeded RNG only
//! - Stable iteration order (lane order)
//! - No rendering or platform dependencies

pub mod animation;
pub mod state;
pub mod tick;

pub use animation::{AnimationTracker, EntrantAnim};
pub use state::{CommandError, Entrant, EntrantUpdate, RacePhase, RaceState};
pub use tick::tick;
