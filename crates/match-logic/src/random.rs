//! Seeded pseudo-random number generator
//!
//! Deterministic PRNG for reproducible tournaments. Every random draw in the
//! crate (policy initialization, probabilistic moves) goes through this type,
//! so a tournament seed fully determines its outcome.

/// Seeded random number generator
///
/// Deterministic: same seed + stream = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 64-bit seed and a stream index
    pub fn new(seed: u64, stream: u32) -> Self {
        let mut state = seed ^ 0x243f6a8885a308d3;

        // Mix in stream index
        state ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);

        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        // Warm up the generator
        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Create RNG for a specific round within a match
    pub fn for_round(&self, round: u32) -> Self {
        let mut new_state = self.state;
        new_state ^= (round as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15);
        if new_state == 0 {
            new_state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state: new_state };
        rng.next_u64(); // Mix
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Uniform float in [0, 1), 53 bits of precision
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Fair coin
    pub fn next_bool(&mut self) -> bool {
        self.next_u64() >> 63 == 1
    }
}
