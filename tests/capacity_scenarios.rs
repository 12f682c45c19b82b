//! End-to-end capacity scenarios, property tests and a monotonicity audit.

use boxweaver::{
    max_capacity, pair_capacity, probe, Bin, BoxSpec, CapacityBatch, ItemSpec, Orientation,
    PackingConfig, ProgressInfo,
};

fn exact(dimension_tolerance: f64, weight_tolerance: f64) -> PackingConfig {
    PackingConfig::new()
        .with_dimension_tolerance(dimension_tolerance)
        .with_weight_tolerance(weight_tolerance)
}

fn assert_trial_consistent(bin: &Bin) {
    let bounds = bin.spec().dims();
    let placed = bin.placed();
    for (i, a) in placed.iter().enumerate() {
        assert!(a.aabb().within(bounds), "item {} leaves the box", i);
        for b in &placed[i + 1..] {
            assert!(!a.aabb().intersects(&b.aabb()), "items overlap: {:?} {:?}", a, b);
        }
    }
    let weight: f64 = placed.iter().map(|p| p.item.weight).sum();
    assert!((weight - bin.current_weight()).abs() < 1e-9);
    assert!(bin.current_weight() <= bin.spec().max_weight);
}

mod scenarios {
    use super::*;

    #[test]
    fn test_item_taller_than_small_box() {
        // H10 W8 L12 against Small H9 W12 L9
        let item = ItemSpec::new("ITEM001", 8.0, 10.0, 12.0, 2.5);
        let small = BoxSpec::new("Small", 12.0, 9.0, 9.0, 50.0);
        assert_eq!(pair_capacity(&item, &small, &exact(0.0, 0.0)).unwrap(), 0);
    }

    #[test]
    fn test_oversized_item() {
        let item = ItemSpec::new("Crate", 1000.0, 1000.0, 1000.0, 1.0);
        for spec in [
            BoxSpec::new("A", 999.0, 999.0, 999.0, 10000.0),
            BoxSpec::new("B", 10.0, 500.0, 999.9, 100.0),
        ] {
            assert_eq!(pair_capacity(&item, &spec, &exact(0.0, 0.0)).unwrap(), 0);
        }
    }

    #[test]
    fn test_weight_tolerance_below_item_weight() {
        // plenty of room, but 9 - 5 < 5
        let item = ItemSpec::new("Brick", 1.0, 1.0, 1.0, 5.0);
        let spec = BoxSpec::new("Cube", 10.0, 10.0, 10.0, 9.0);
        assert_eq!(pair_capacity(&item, &spec, &exact(0.0, 5.0)).unwrap(), 0);
    }

    #[test]
    fn test_dimension_tolerance_collapses_box() {
        // reported as 0 through the batch, not as a failure
        let items = vec![ItemSpec::new("Pin", 0.1, 0.1, 0.1, 0.01)];
        let boxes = vec![
            BoxSpec::new("Flat", 20.0, 0.4, 20.0, 100.0),
            BoxSpec::new("Exact", 20.0, 0.5, 20.0, 100.0),
        ];
        let table = CapacityBatch::new(exact(0.5, 0.0))
            .run(Some(&items), Some(&boxes), None)
            .unwrap();
        assert_eq!(table.rows[0].units_in("Flat"), Some(0));
        assert_eq!(table.rows[0].units_in("Exact"), Some(0));
        assert_eq!(table.summary.substituted_pairs, 2);
    }

    #[test]
    fn test_empty_item_list() {
        let boxes = vec![BoxSpec::new("Small", 12.0, 9.0, 9.0, 50.0)];
        let mut percents = Vec::new();
        let mut sink = |p: ProgressInfo| percents.push(p.percent);
        let table = CapacityBatch::default_config()
            .run(Some(&[]), Some(&boxes), Some(&mut sink))
            .unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(percents, vec![100.0]);
    }

    #[test]
    fn test_reference_row_order() {
        let items = vec![
            ItemSpec::new("Z", 5.0, 5.0, 5.0, 0.5),
            ItemSpec::new("A", 8.0, 10.0, 12.0, 2.5),
        ];
        let boxes = vec![
            BoxSpec::new("Large", 24.0, 18.0, 18.0, 50.0),
            BoxSpec::new("Small", 12.0, 9.0, 9.0, 50.0),
        ];
        let table = CapacityBatch::new(exact(0.0, 0.0))
            .run(Some(&items), Some(&boxes), None)
            .unwrap();
        let names: Vec<&str> = table.rows.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A"]);
        let labels: Vec<&str> = table.rows[1]
            .capacities
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Large", "Small"]);
        assert_eq!(table.rows[0].units_in("Large"), Some(36));
        assert_eq!(table.rows[1].units_in("Large"), Some(5));
    }

    #[test]
    fn test_capacity_boundary_is_reproducible() {
        let template = ItemSpec::new("ITEM001", 8.0, 10.0, 12.0, 2.5);
        let mut bin = Bin::new(BoxSpec::new("Large", 24.0, 18.0, 18.0, 50.0));
        let n = max_capacity(&mut bin, &template, 1000);
        assert_eq!(n, 5);
        assert!(probe(&mut bin, &template, n));
        assert_trial_consistent(&bin);
        assert!(!probe(&mut bin, &template, n + 1));
    }

    #[test]
    fn test_no_orientation_fits() {
        let item = ItemSpec::new("Rod", 1.0, 1.0, 30.0, 1.0);
        let spec = BoxSpec::new("Cube", 20.0, 20.0, 20.0, 100.0);
        let dims = spec.dims();
        assert!(Orientation::ALL.iter().all(|o| {
            let d = item.dims_for(*o);
            (0..3).any(|axis| d[axis] > dims[axis])
        }));
        assert_eq!(pair_capacity(&item, &spec, &exact(0.0, 0.0)).unwrap(), 0);
    }
}

fn upper_bound(item: &ItemSpec, spec: &BoxSpec, cap: usize) -> usize {
    ((spec.max_weight / item.weight).floor() as usize).min(cap)
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    const HARD_CAP: usize = 60;

    /// Integer-sized items and boxes, so shrinking lands on readable cases.
    fn pair() -> impl Strategy<Value = (ItemSpec, BoxSpec)> {
        (
            (1u32..=6, 1u32..=6, 1u32..=6, 1u32..=5),
            (4u32..=16, 4u32..=16, 4u32..=16, 10u32..=150),
        )
            .prop_map(|((w, h, d, weight), (bw, bh, bd, max_weight))| {
                (
                    ItemSpec::new("I", w as f64, h as f64, d as f64, weight as f64),
                    BoxSpec::new("B", bw as f64, bh as f64, bd as f64, max_weight as f64),
                )
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn test_capacity_within_weight_bound_and_reproducible((item, spec) in pair()) {
            let upper = upper_bound(&item, &spec, HARD_CAP);
            let mut bin = Bin::new(spec.clone());
            let n = max_capacity(&mut bin, &item, HARD_CAP);

            prop_assert!(n <= upper, "{} > {}", n, upper);
            prop_assert!(probe(&mut bin, &item, n));
            assert_trial_consistent(&bin);
            if n < upper {
                prop_assert!(!probe(&mut bin, &item, n + 1));
            }
        }

        #[test]
        fn test_failed_add_leaves_trial_untouched((item, spec) in pair()) {
            let mut bin = Bin::new(spec);
            let mut i = 0;
            while bin.add_item(item.instance(i)) {
                i += 1;
                assert_trial_consistent(&bin);
            }
            let before = bin.clone();
            prop_assert!(!bin.add_item(item.instance(i)));
            prop_assert_eq!(bin, before);
        }

        #[test]
        fn test_reset_restores_fresh_bin((item, spec) in pair(), count in 0usize..=8) {
            let mut bin = Bin::new(spec.clone());
            probe(&mut bin, &item, count);
            bin.reset();
            prop_assert_eq!(bin, Bin::new(spec));
        }
    }
}

mod audit {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const CASES: usize = 40;
    const AUDIT_CAP: usize = 24;

    fn random_pair(rng: &mut StdRng) -> (ItemSpec, BoxSpec) {
        let item = ItemSpec::new(
            "I",
            rng.gen_range(1..=6) as f64,
            rng.gen_range(1..=6) as f64,
            rng.gen_range(1..=6) as f64,
            rng.gen_range(1..=5) as f64,
        );
        let spec = BoxSpec::new(
            "B",
            rng.gen_range(4..=16) as f64,
            rng.gen_range(4..=16) as f64,
            rng.gen_range(4..=16) as f64,
            rng.gen_range(10..=150) as f64,
        );
        (item, spec)
    }

    /// The binary search presumes that a feasible count stays feasible when
    /// lowered. This walks every count and reports where the greedy placer
    /// breaks that, without changing what the search returns.
    #[test]
    fn test_monotonicity_audit() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut divergent = 0;
        for _ in 0..CASES {
            let (item, spec) = random_pair(&mut rng);
            let upper = upper_bound(&item, &spec, AUDIT_CAP);
            let mut bin = Bin::new(spec.clone());
            let searched = max_capacity(&mut bin, &item, AUDIT_CAP);

            let feasible: Vec<bool> = (0..=upper).map(|k| probe(&mut bin, &item, k)).collect();
            assert!(feasible[0]);
            assert!(feasible[searched]);

            let linear = feasible.iter().position(|ok| !ok).map_or(upper, |k| k - 1);
            if linear != searched {
                divergent += 1;
                eprintln!(
                    "non-monotonic feasibility: {:?} in {:?}, search {} vs scan {}",
                    item, spec, searched, linear
                );
            }
        }
        eprintln!("{} of {} cases diverged", divergent, CASES);
    }
}
