use crate::LIFETIME_TABLE_SIZE;
use crate::Rate;
use crate::Time;
use rand::RngCore;
use rand::rngs::SmallRng;

/// exponential waiting times by table lookup.
///
/// the table holds -ln((i + 0.5) / SIZE) for every bucket i; a draw
/// maps one 32-bit generator word onto a bucket and divides by the
/// current event rate. this is a deterministic lookup, not a rounded
/// logarithm, so a seeded run reproduces bit-identical lifetimes.
/// the midpoint rule keeps the table mean at 1 up to O(1/SIZE^2).
pub struct Exponential(Vec<f64>);

impl Default for Exponential {
    fn default() -> Self {
        let size = LIFETIME_TABLE_SIZE as f64;
        Self(
            (0..LIFETIME_TABLE_SIZE)
                .map(|i| -((i as f64 + 0.5) / size).ln())
                .collect(),
        )
    }
}

impl Exponential {
    /// one waiting time at the given rate. rate zero yields an
    /// infinite lifetime, which outer loops treat as "never".
    pub fn draw(&self, rng: &mut SmallRng, rate: Rate) -> Time {
        self.0[Self::bucket(rng.next_u32())] / rate
    }
    fn bucket(word: u32) -> usize {
        ((word as u64 * LIFETIME_TABLE_SIZE as u64) >> 32) as usize
    }
}
