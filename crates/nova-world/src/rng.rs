//! Deterministic randomness.
//!
//! Every random draw in the game comes from a [`SmallRng`] seeded by mixing
//! a tuple of `u64` parts (world seed, player or coordinate, timestamp,
//! stream tag) through `SplitMix64`. Re-running the same catch-up interval
//! therefore replays the same draws.

use nova_types::Coordinates;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Stream tags separating independent draws made at the same timestamp.
pub mod tag {
    /// NPC generation from a coordinate.
    pub const NPC_GENESIS: u64 = 0x4e50_4347;
    /// Occupancy roll for a coordinate.
    pub const OCCUPANCY: u64 = 0x4f43_4355;
    /// Home slot scan start.
    pub const HOME_SCAN: u64 = 0x484f_4d45;
    /// World-event transition.
    pub const WORLD_EVENT: u64 = 0x5745_5654;
    /// Mission arrival resolution.
    pub const ARRIVAL: u64 = 0x4152_5256;
    /// Exploration hold resolution.
    pub const EXPLORATION: u64 = 0x4558_504c;
    /// NPC evolution cycle.
    pub const NPC_CYCLE: u64 = 0x4359_434c;
    /// Player action.
    pub const ACTION: u64 = 0x4143_544e;
    /// Identifier minting.
    pub const IDS: u64 = 0x4944_5321;
}

/// One `SplitMix64` step.
pub const fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fold several parts into one well-mixed 64-bit value.
pub fn mix(parts: &[u64]) -> u64 {
    parts
        .iter()
        .fold(0x6a09_e667_f3bc_c908, |acc, part| splitmix64(acc ^ splitmix64(*part)))
}

/// Pack a coordinate into a single `u64` for hashing.
pub fn coord_key(coords: &Coordinates) -> u64 {
    (u64::from(coords.galaxy) << 40) ^ (u64::from(coords.system) << 20) ^ u64::from(coords.position)
}

/// A generator seeded from `parts`.
pub fn seeded(parts: &[u64]) -> SmallRng {
    SmallRng::seed_from_u64(mix(parts))
}

/// Uniform float in `[0, 1)` derived from a hash, without building a generator.
#[allow(clippy::cast_precision_loss)]
pub fn unit_interval(hash: u64) -> f64 {
    // 53 significant bits map exactly onto an f64 mantissa.
    (hash >> 11) as f64 / (1_u64 << 53) as f64
}

/// Pick an entry from a weighted table. Returns `None` when every weight is zero.
pub fn weighted_pick<T: Copy, R: Rng>(rng: &mut R, table: &[(T, u32)]) -> Option<T> {
    let total = table
        .iter()
        .fold(0_u32, |acc, (_, weight)| acc.saturating_add(*weight));
    if total == 0 {
        return None;
    }
    let roll = rng.random_range(0..total);
    let mut cumulative: u32 = 0;
    for (value, weight) in table {
        cumulative = cumulative.saturating_add(*weight);
        if roll < cumulative {
            return Some(*value);
        }
    }
    None
}

/// Upper bound on the number of failed checks drawn by [`geometric_failures`].
pub const MAX_FAILED_CHECKS: u64 = 1_000_000;

/// Number of failed Bernoulli(`p`) checks before the first success.
///
/// Draws the whole run in one step so that long idle periods cost a single
/// draw instead of one draw per check.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn geometric_failures<R: Rng>(rng: &mut R, probability: f64) -> u64 {
    if probability >= 1.0 {
        return 0;
    }
    if probability <= 0.0 || probability.is_nan() {
        return MAX_FAILED_CHECKS;
    }
    let uniform: f64 = rng.random_range(f64::EPSILON..1.0);
    let failures = (uniform.ln() / (1.0 - probability).ln()).floor();
    if failures.is_finite() && failures >= 0.0 {
        (failures as u64).min(MAX_FAILED_CHECKS)
    } else {
        MAX_FAILED_CHECKS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_is_order_sensitive_and_stable() {
        assert_eq!(mix(&[1, 2, 3]), mix(&[1, 2, 3]));
        assert_ne!(mix(&[1, 2, 3]), mix(&[3, 2, 1]));
    }

    #[test]
    fn weighted_pick_respects_zero_weights() {
        let mut rng = seeded(&[7]);
        for _ in 0..200 {
            assert_eq!(weighted_pick(&mut rng, &[('a', 0), ('b', 5)]), Some('b'));
        }
        assert_eq!(weighted_pick::<char, _>(&mut rng, &[('a', 0)]), None);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn geometric_mean_tracks_probability() {
        let mut rng = seeded(&[11]);
        let draws = 20_000_u64;
        let total: u64 = (0..draws).map(|_| geometric_failures(&mut rng, 0.25)).sum();
        let mean = total as f64 / draws as f64;
        // Expected (1 - p) / p = 3.
        assert!((mean - 3.0).abs() < 0.2, "mean was {mean}");
        assert_eq!(geometric_failures(&mut rng, 1.0), 0);
        assert_eq!(geometric_failures(&mut rng, 0.0), MAX_FAILED_CHECKS);
    }

    #[test]
    fn unit_interval_is_bounded() {
        assert!(unit_interval(u64::MAX) < 1.0);
        assert!(unit_interval(0) >= 0.0);
    }
}
