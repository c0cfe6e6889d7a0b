// PixelSplash
// copyright zipxing@hotmail.com 2022～2025

use rand::seq::SliceRandom;
use rand_xoshiro::{
    rand_core::{RngCore, SeedableRng},
    Xoshiro256StarStar,
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Xoshiro256** wrapper. Seeded with 0 by default so fields are
/// reproducible; hosts call srand_now for a visually fresh run.
pub struct Rand {
    rng: Xoshiro256StarStar,
}

impl Default for Rand {
    fn default() -> Self {
        Rand::new()
    }
}

impl Rand {
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(0),
        }
    }

    pub fn srand(&mut self, seed: u64) {
        self.rng = Xoshiro256StarStar::seed_from_u64(seed);
    }

    pub fn srand_now(&mut self) {
        let start = SystemTime::now();
        let since_the_epoch = start
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards");
        let seed = since_the_epoch.as_millis();
        self.srand(seed as u64);
    }

    pub fn rand64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    pub fn rand(&mut self) -> u32 {
        self.rng.next_u64() as u32
    }

    /// Uniform in [min, max] with 1/1000 resolution. Works for
    /// negative bounds, velocity ranges need them.
    pub fn gen_range(&mut self, min: f64, max: f64) -> f64 {
        if min > max {
            return 0.0;
        }
        let span = ((max - min) * 1000.0) as u64;
        min + (self.rng.next_u64() % (span + 1)) as f64 / 1000.0
    }

    pub fn gen_range_f32(&mut self, min: f32, max: f32) -> f32 {
        self.gen_range(min as f64, max as f64) as f32
    }

    /// True with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.gen_range(0.0, 1.0) < p
    }

    pub fn pick<'a, T>(&mut self, v: &'a [T]) -> Option<&'a T> {
        if v.is_empty() {
            return None;
        }
        let i = self.rand64() as usize % v.len();
        Some(&v[i])
    }

    pub fn shuffle<T: Copy>(&mut self, v: &mut [T]) {
        v.shuffle(&mut self.rng);
    }
}
