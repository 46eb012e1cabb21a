//! RNG module - seeded generator shared by both sides of a match
//!
//! Both players seed with the negotiated value, so shape choice and junk gap
//! columns are reproducible. Uses a simple LCG (Numerical Recipes constants).

use crate::types::ShapeId;

#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce a short cycle
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Value in `[lo, hi)`. Returns `lo` for an empty range.
    pub fn range(&mut self, lo: i16, hi: i16) -> i16 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u32;
        // High bits of an LCG are the better-distributed ones.
        lo + ((self.next_u32() >> 16) % span) as i16
    }

    /// Uniform choice among the seven shapes.
    pub fn choose_shape(&mut self) -> ShapeId {
        let i = self.range(0, ShapeId::ALL.len() as i16) as usize;
        ShapeId::ALL[i]
    }

    pub fn state(&self) -> u32 {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimpleRng::new(12345);
        let mut b = SimpleRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.choose_shape(), b.choose_shape());
        }
    }

    #[test]
    fn range_stays_in_bounds() {
        let mut rng = SimpleRng::new(7);
        for _ in 0..1000 {
            let v = rng.range(0, 10);
            assert!((0..10).contains(&v));
        }
        assert_eq!(rng.range(3, 3), 3);
    }

    #[test]
    fn every_shape_eventually_chosen() {
        let mut rng = SimpleRng::new(1);
        let mut seen = [false; 7];
        for _ in 0..500 {
            seen[rng.choose_shape() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
