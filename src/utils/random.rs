//! # Random Draws
//!
//! Small helpers over an injected [`Rng`]. Nothing here owns a random source;
//! callers pass the attempt's generator explicitly.

use rand::Rng;

/// Picks an index with probability proportional to its weight.
///
/// Draws a uniform integer in `[0, total)` and subtracts weights in order
/// until the remainder would go negative. Returns `None` when the weights are
/// empty or sum to zero.
///
/// # Examples
///
/// ```
/// use rand::rngs::mock::StepRng;
/// use undercroft::utils::weighted_pick;
///
/// let mut rng = StepRng::new(0, 0);
/// assert_eq!(weighted_pick(&[0, 5, 1], &mut rng), Some(1));
/// assert_eq!(weighted_pick(&[0, 0], &mut rng), None);
/// ```
pub fn weighted_pick<R: Rng>(weights: &[u32], rng: &mut R) -> Option<usize> {
    let total: u64 = weights.iter().map(|weight| *weight as u64).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.gen_range(0..total);
    for (index, weight) in weights.iter().enumerate() {
        let weight = *weight as u64;
        if roll < weight {
            return Some(index);
        }
        roll -= weight;
    }

    weights.iter().rposition(|weight| *weight > 0)
}

/// Rolls a percentage chance.
pub fn percent<R: Rng>(chance: u32, rng: &mut R) -> bool {
    rng.gen_range(0..100) < chance
}

/// Uniform roll in `0..100`.
pub fn roll_percentile<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(0..100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_pick_skips_zero_weights() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let index = weighted_pick(&[0, 4, 0, 2], &mut rng).unwrap();
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_weighted_pick_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(weighted_pick(&[], &mut rng), None);
    }

    #[test]
    fn test_percent_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            assert!(!percent(0, &mut rng));
            assert!(percent(100, &mut rng));
            assert!(roll_percentile(&mut rng) < 100);
        }
    }
}
