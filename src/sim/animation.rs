//! Decorative per-entrant animation state
//!
//! Derived from position deltas between ticks, never from race logic, and
//! never fed back into it. The renderer owns a tracker and reads smoothed
//! speed plus a handful of bounded oscillators (paddling feet, bobbing,
//! forward lean) off it each frame.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::state::Entrant;

/// How fast `speed` chases `target_speed` per tick
const SPEED_SMOOTHING: f32 = 0.1;
/// Paddle swing limit in degrees; direction flips at the limit
const PADDLE_LIMIT: f32 = 30.0;
/// Forward lean limit in degrees
const LEAN_LIMIT: f32 = 15.0;
/// Bob oscillator period driver (wall-clock milliseconds)
const BOB_PERIOD_MS: f64 = 500.0;

/// Ephemeral visual state for one entrant
#[derive(Debug, Clone)]
pub struct EntrantAnim {
    /// Smoothed scalar derived from the position delta
    pub speed: f32,
    pub target_speed: f32,
    /// Paddling feet swing, degrees
    pub paddle_angle: f32,
    pub paddle_direction: f32,
    /// Vertical bob offset factor
    pub bob_amount: f32,
    /// Forward lean, degrees
    pub rotation: f32,
    /// Wake ripple intensity, 0-1
    pub ripple: f32,
    last_position: f32,
}

/// Tracks decorative state for every entrant currently in the race.
///
/// State is created lazily the first time an entrant is observed and
/// dropped once it disappears from the authoritative list.
#[derive(Debug)]
pub struct AnimationTracker {
    states: HashMap<u32, EntrantAnim>,
    rng: Pcg32,
}

impl AnimationTracker {
    pub fn new(seed: u64) -> Self {
        Self {
            states: HashMap::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn get(&self, id: u32) -> Option<&EntrantAnim> {
        self.states.get(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Advance every entrant's decorative state by one frame.
    ///
    /// `wall_time_ms` drives the bob oscillator; everything else follows
    /// the position delta since the previous call.
    pub fn update(&mut self, entrants: &[Entrant], wall_time_ms: f64) {
        let rng = &mut self.rng;
        for e in entrants {
            let anim = self.states.entry(e.id).or_insert_with(|| EntrantAnim {
                speed: 0.0,
                target_speed: 0.0,
                paddle_angle: 0.0,
                paddle_direction: if rng.random::<bool>() { 1.0 } else { -1.0 },
                bob_amount: 0.5,
                rotation: 0.0,
                ripple: 0.0,
                last_position: e.position,
            });

            let delta = e.position - anim.last_position;
            anim.target_speed = delta * 0.2;
            anim.speed += (anim.target_speed - anim.speed) * SPEED_SMOOTHING;

            anim.paddle_angle += anim.speed * 0.5 * anim.paddle_direction;
            if anim.paddle_angle.abs() > PADDLE_LIMIT {
                anim.paddle_direction *= -1.0;
            }

            anim.bob_amount = 0.5 + ((wall_time_ms / BOB_PERIOD_MS).sin() as f32) * 0.2;

            // Lean forward while accelerating, settle upright when coasting
            let target_rotation = if delta > 0.0 {
                (delta * 20.0).min(LEAN_LIMIT)
            } else {
                0.0
            };
            anim.rotation += (target_rotation - anim.rotation) * 0.1;

            anim.ripple = (anim.speed * 0.5).min(1.0);
            anim.last_position = e.position;
        }

        // Drop state for entrants that left the roster
        self.states
            .retain(|id, _| entrants.iter().any(|e| e.id == *id));
    }
}
