//! Deterministic random number generation.
//!
//! Every random decision in a game flows through a seeded stream so that a
//! seed string plus a sequence of actions reproduces a game exactly. Seeds
//! are hashed with an xmur3-style string hash and drive a mulberry32
//! generator; both are reproduced bit-for-bit so saved games and recorded
//! matches stay valid across builds.
//!
//! Two streams exist per game: the map stream (stable across restarts of the
//! same map) and the gameplay stream (dice rolls, reinforcement placement).

// Float-to-int conversions are the documented sampling rule
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Hash a seed string into a 32-bit generator state.
///
/// Order-sensitive rolling hash over UTF-16 code units followed by a
/// three-step avalanche finalizer.
#[must_use]
pub fn seed_hash(seed: &str) -> u32 {
    let units: Vec<u16> = seed.encode_utf16().collect();
    let mut h = 1_779_033_703u32 ^ units.len() as u32;
    for unit in units {
        h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// The mulberry32 generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a generator from a raw 32-bit state.
    #[must_use]
    pub const fn new(state: u32) -> Self {
        Self { state }
    }

    /// Advance the stream and return the next 32-bit output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

/// Source of uniform floats in `[0, 1)` plus the sampling helpers built on it.
///
/// All helpers consume exactly the draws listed in their docs so that
/// replays stay aligned with recorded streams.
pub trait RandomSource {
    /// Next uniform float in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `min..=max`. One draw.
    fn rand_int(&mut self, min: i64, max: i64) -> i64 {
        let span = (max - min + 1) as f64;
        (self.next_f64() * span).floor() as i64 + min
    }

    /// Uniform index in `0..len`. One draw. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        let idx = (self.next_f64() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }

    /// Uniform element of `items`, `None` (and no draw) when empty.
    fn choice<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.index(items.len());
        items.get(idx)
    }

    /// Fisher-Yates shuffle walking from the end. `len - 1` draws.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.index(i + 1);
            items.swap(i, j);
        }
    }

    /// Roll `count` six-sided dice. `count` draws.
    fn roll_dice(&mut self, count: u8) -> DiceRoll {
        let faces: Vec<u8> = (0..count).map(|_| self.rand_int(1, 6) as u8).collect();
        DiceRoll::new(faces)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// The faces of one dice roll and their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Individual die faces, each `1..=6`.
    pub faces: Vec<u8>,
    /// Sum of all faces.
    pub total: u32,
}

impl DiceRoll {
    /// Build a roll from its faces.
    #[must_use]
    pub fn new(faces: Vec<u8>) -> Self {
        let total = faces.iter().map(|&f| u32::from(f)).sum();
        Self { faces, total }
    }

    /// Number of dice rolled.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.faces.len() as u32
    }
}

/// Seeded gameplay stream that remembers how far it has advanced.
///
/// The internal generator state is never persisted. A stream is rebuilt from
/// its seed string and fast-forwarded by the stored draw count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRng {
    seed: String,
    inner: Mulberry32,
    draws: u64,
}

impl GameRng {
    /// Create a fresh stream from a seed string.
    #[must_use]
    pub fn new(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            inner: Mulberry32::new(seed_hash(seed)),
            draws: 0,
        }
    }

    /// Rebuild a stream and skip the first `draws` outputs.
    #[must_use]
    pub fn resume(seed: &str, draws: u64) -> Self {
        let mut rng = Self::new(seed);
        for _ in 0..draws {
            rng.inner.next_u32();
        }
        rng.draws = draws;
        rng
    }

    /// The seed this stream was derived from.
    #[must_use]
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Number of values drawn so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new("")
    }
}

impl RandomSource for GameRng {
    fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        f64::from(self.inner.next_u32()) / 4_294_967_296.0
    }
}

// Only the draw count is persisted. The generator itself is rebuilt from the
// seed with `GameRng::resume` after loading.
impl Serialize for GameRng {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.draws)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let draws = u64::deserialize(deserializer)?;
        Ok(Self {
            seed: String::new(),
            inner: Mulberry32::default(),
            draws,
        })
    }
}

/// The pair of seeds that fully determines a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSeeds {
    /// Seed for map layout, ownership and personalities.
    pub map: String,
    /// Seed for dice rolls, reinforcement and AI tie-breaks.
    pub gameplay: String,
}

impl GameSeeds {
    /// Seeds from explicit strings.
    #[must_use]
    pub fn new(map: impl Into<String>, gameplay: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            gameplay: gameplay.into(),
        }
    }

    /// Time-derived seeds, distinct for map and gameplay.
    #[must_use]
    pub fn fresh() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(42, |d| d.as_millis());
        Self {
            map: now.to_string(),
            gameplay: format!("{now}-play"),
        }
    }

    /// Seeds derived from a numeric base, used by batch runs.
    #[must_use]
    pub fn from_number(seed: u64) -> Self {
        Self {
            map: format!("map-{seed}"),
            gameplay: format!("play-{seed}"),
        }
    }
}

/// Replays a fixed list of floats, then repeats the last one.
///
/// Lets tests force exact dice outcomes.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedRng {
    values: Vec<f64>,
    pos: usize,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self { values, pos: 0 }
    }

    /// Float that makes `rand_int(1, 6)` return `face`.
    pub(crate) fn face(face: u8) -> f64 {
        (f64::from(face) - 1.0) / 6.0 + 0.01
    }

    /// Script for a sequence of die faces.
    pub(crate) fn faces(faces: &[u8]) -> Self {
        Self::new(faces.iter().map(|&f| Self::face(f)).collect())
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        let v = self
            .values
            .get(self.pos)
            .or_else(|| self.values.last())
            .copied()
            .unwrap_or(0.0);
        self.pos += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_hash_is_deterministic() {
        assert_eq!(seed_hash("abc"), seed_hash("abc"));
        assert_ne!(seed_hash("abc"), seed_hash("acb"));
        assert_ne!(seed_hash(""), seed_hash("a"));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = GameRng::new("hello");
        let mut b = GameRng::new("hello");
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn test_floats_in_unit_interval() {
        let mut rng = GameRng::new("range");
        for _ in 0..10_000 {
            let f = rng.next_f64();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_resume_continues_stream() {
        let mut original = GameRng::new("resume");
        for _ in 0..37 {
            original.next_f64();
        }
        let mut resumed = GameRng::resume("resume", original.draws());
        assert_eq!(resumed.draws(), 37);
        for _ in 0..20 {
            assert_eq!(original.next_f64().to_bits(), resumed.next_f64().to_bits());
        }
    }

    #[test]
    fn test_rand_int_bounds() {
        let mut rng = GameRng::new("ints");
        for _ in 0..5_000 {
            let v = rng.rand_int(1, 6);
            assert!((1..=6).contains(&v));
        }
    }

    #[test]
    fn test_roll_dice_counts_and_sums() {
        let mut rng = GameRng::new("dice");
        let roll = rng.roll_dice(8);
        assert_eq!(roll.count(), 8);
        assert_eq!(roll.total, roll.faces.iter().map(|&f| u32::from(f)).sum::<u32>());
        assert_eq!(rng.draws(), 8);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = GameRng::new("shuffle");
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_eq!(rng.draws(), 49);
    }

    #[test]
    fn test_choice_empty_draws_nothing() {
        let mut rng = GameRng::new("empty");
        let empty: [u8; 0] = [];
        assert!(rng.choice(&empty).is_none());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_scripted_faces() {
        let mut rng = ScriptedRng::faces(&[6, 1, 3]);
        let roll = rng.roll_dice(3);
        assert_eq!(roll.faces, vec![6, 1, 3]);
        assert_eq!(roll.total, 10);
    }

    #[test]
    fn test_seeds_from_number_distinct() {
        let seeds = GameSeeds::from_number(7);
        assert_ne!(seeds.map, seeds.gameplay);
        assert_eq!(seeds, GameSeeds::from_number(7));
    }
}
