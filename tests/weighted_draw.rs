//! Statistical and property checks of weighted draws and the catalog.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use undercroft::generation::catalog;
use undercroft::utils::weighted_pick;
use undercroft::Coords;

#[test]
fn test_weighted_pick_matches_weights() {
    let weights = [100, 20, 20, 1];
    let total: u32 = weights.iter().sum();
    let draws = 100_000;
    let mut counts = [0u32; 4];
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..draws {
        let index = weighted_pick(&weights, &mut rng).unwrap();
        counts[index] += 1;
    }

    for (index, weight) in weights.iter().enumerate() {
        let expected = *weight as f64 / total as f64;
        let observed = counts[index] as f64 / draws as f64;
        assert!(
            (expected - observed).abs() < 0.01,
            "index {}: expected {:.4}, observed {:.4}",
            index,
            expected,
            observed
        );
    }
}

#[test]
fn test_draw_weighted_empties_pool() {
    let mut pool = catalog::growth_types(&Coords::new(3, 3, 7, 7));
    let size = pool.len();
    let mut rng = StdRng::seed_from_u64(5);
    let mut drawn = Vec::new();
    while let Some(tile) = catalog::draw_weighted(&mut pool, &mut rng) {
        assert!(!drawn.contains(&tile));
        drawn.push(tile);
    }
    assert_eq!(drawn.len(), size);
}

proptest! {
    #[test]
    fn prop_weighted_pick_lands_on_positive_weight(
        weights in prop::collection::vec(0u32..50, 0..12),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        match weighted_pick(&weights, &mut rng) {
            Some(index) => {
                prop_assert!(index < weights.len());
                prop_assert!(weights[index] > 0);
            }
            None => prop_assert!(weights.iter().all(|weight| *weight == 0)),
        }
    }

    #[test]
    fn prop_types_for_is_idempotent(
        width in 5u32..40,
        height in 5u32..40,
        x in 0i32..40,
        y in 0i32..40,
    ) {
        let x = x % width as i32;
        let y = y % height as i32;
        let coords = Coords::new(x, y, width, height);

        let first = catalog::types_for(&coords);
        let second = catalog::types_for(&coords);
        prop_assert_eq!(&first, &second);
        prop_assert!(!first.is_empty());
        for tile in first {
            prop_assert!((tile.info().connects & coords.edges()).is_empty());
            prop_assert!(!tile.info().is_empty());
        }
    }
}
