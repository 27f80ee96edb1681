//! End-to-end properties: build, reorder, emit, simulate.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use test_log::test;

use ttbdd::bdd::{Bdd, BddConfig};
use ttbdd::merge::MergePolicy;
use ttbdd::trace::SimTrace;
use ttbdd::types::{Level, Var};

const POLICIES: [MergePolicy; 6] = [
    MergePolicy::Exact,
    MergePolicy::SkipDontCare,
    MergePolicy::OneSided { complement: false },
    MergePolicy::OneSided { complement: true },
    MergePolicy::TwoSided,
    MergePolicy::LevelTwoSided,
];

fn random_onsets(rng: &mut impl Rng, inputs: usize, outputs: usize) -> Vec<Vec<usize>> {
    (0..outputs)
        .map(|_| (0..1 << inputs).filter(|_| rng.gen_bool(0.5)).collect())
        .collect()
}

fn random_trace(rng: &mut impl Rng, inputs: usize, bytes: usize) -> SimTrace {
    let lanes = (0..inputs).map(|_| (0..bytes).map(|_| rng.gen::<u8>()).collect()).collect();
    SimTrace::from_lanes(lanes).unwrap()
}

fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect()
}

#[test]
fn test_netlist_matches_function_on_care_rows() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..2 {
        let (n, m) = (8, 3);
        let onsets = random_onsets(&mut rng, n, m);
        let trace = random_trace(&mut rng, n, 16);
        let care_rows = trace.care_rows(1);
        for policy in POLICIES {
            let config = BddConfig::default().with_policy(policy).with_sift_rounds(2).with_seed(3);
            let mut bdd = Bdd::from_onsets_and_trace(n, &onsets, &trace, config).unwrap();
            let stats = bdd.reorder();
            assert!(stats.final_size <= stats.initial_size, "{:?}", policy);

            let inputs = names("i", n);
            let outputs = names("o", m);
            let netlist = bdd.to_netlist(&inputs, &outputs).unwrap();
            for row in 0..1 << n {
                if policy.uses_care() && !care_rows.contains(&row) {
                    continue;
                }
                let values = netlist.simulate_row(&inputs, &outputs, row).unwrap();
                for (output, onset) in onsets.iter().enumerate() {
                    assert_eq!(
                        values[output],
                        onset.contains(&row),
                        "{:?}: output {} row {}",
                        policy,
                        output,
                        row
                    );
                }
            }
        }
    }
}

#[test]
fn test_build_is_idempotent() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let onsets = random_onsets(&mut rng, 7, 3);
    let trace = random_trace(&mut rng, 7, 8);
    for policy in POLICIES {
        let config = BddConfig::default().with_policy(policy);
        let mut bdd = Bdd::from_onsets_and_trace(7, &onsets, &trace, config).unwrap();
        let structure = bdd.structure().clone();
        let count = bdd.node_count();
        assert_eq!(bdd.build(), count, "{:?}", policy);
        assert_eq!(bdd.structure(), &structure, "{:?}", policy);
        assert_eq!(bdd.build(), count, "{:?}", policy);
    }
}

#[test]
fn test_double_swap_restores_care_and_pending_merges() {
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let onsets = random_onsets(&mut rng, 8, 2);
    let trace = random_trace(&mut rng, 8, 12);
    let config = BddConfig::default().with_policy(MergePolicy::TwoSided);
    let mut bdd = Bdd::from_onsets_and_trace(8, &onsets, &trace, config).unwrap();
    assert!((0..=8).any(|level| !bdd.pending_merges(level).is_empty()));
    let table = bdd.table().clone();
    let care = bdd.care().cloned();
    for level in 0..7 {
        bdd.swap(Level::new(level));
        bdd.swap(Level::new(level));
        assert_eq!(bdd.table(), &table);
        assert_eq!(bdd.care(), care.as_ref());
    }
    // The merges carried through every swap still apply soundly.
    bdd.build();
    let care_rows = trace.care_rows(1);
    for (output, onset) in onsets.iter().enumerate() {
        for &row in &care_rows {
            assert_eq!(bdd.evaluate(output, row), onset.contains(&row), "output {} row {}", output, row);
        }
    }
}

#[test]
fn test_double_swap_restores_everything() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let onsets = random_onsets(&mut rng, 8, 2);
    let mut bdd = Bdd::from_onsets(8, &onsets, BddConfig::default()).unwrap();
    let table = bdd.table().clone();
    let order = bdd.order().clone();
    let count = bdd.node_count();
    for level in 0..7 {
        bdd.bdd_swap(Level::new(level));
        assert_eq!(bdd.bdd_swap(Level::new(level)), count);
        assert_eq!(bdd.table(), &table);
        assert_eq!(bdd.order(), &order);
    }
}

#[test]
fn test_sifting_never_grows() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..4 {
        let onsets = random_onsets(&mut rng, 6, 2);
        let mut bdd = Bdd::from_onsets(6, &onsets, BddConfig::default()).unwrap();
        let before = bdd.node_count();
        let after = bdd.sift_reo();
        assert!(after <= before);
        assert_eq!(bdd.node_count(), after);
        assert!(bdd.order().is_bijection());
    }
}

#[test]
fn test_checkpoint_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let onsets = random_onsets(&mut rng, 5, 2);
    let mut bdd = Bdd::from_onsets(5, &onsets, BddConfig::default()).unwrap();
    let checkpoint = bdd.checkpoint();
    bdd.reo(&[Var::new(4), Var::new(2), Var::new(0), Var::new(3), Var::new(1)]);
    bdd.restore(&checkpoint);
    assert_eq!(bdd.table(), checkpoint.table());
    assert_eq!(bdd.order(), checkpoint.order());
    assert_eq!(bdd.node_count(), checkpoint.node_count());
}

#[test]
fn test_negated_first_input_under_every_order() {
    let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for order in orders {
        let mut bdd = Bdd::from_onsets(3, &[vec![0, 1, 2, 3]], BddConfig::default()).unwrap();
        let target: Vec<Var> = order.iter().map(|&v| Var::new(v)).collect();
        assert_eq!(bdd.reo(&target), 2, "order {:?}", order);

        let netlist = bdd.to_netlist(&["a", "b", "c"], &["f"]).unwrap();
        assert_eq!(netlist.node_records(), 1);
        for row in 0..8 {
            let values = netlist.simulate_row(&["a", "b", "c"], &["f"], row).unwrap();
            assert_eq!(values, vec![row < 4], "order {:?} row {}", order, row);
        }
    }
}

#[test]
fn test_tautology_is_a_single_terminal() {
    let mut bdd = Bdd::from_onsets(4, &[(0..16).collect::<Vec<_>>()], BddConfig::default()).unwrap();
    assert_eq!(bdd.node_count(), 1);
    assert_eq!(bdd.reorder().final_size, 1);
}

#[test]
fn test_zero_rarity_ignores_policy() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let onsets = random_onsets(&mut rng, 5, 2);
    let trace = random_trace(&mut rng, 5, 1);
    let inputs = names("x", 5);
    let outputs = names("y", 2);

    let emit = |policy| {
        let config = BddConfig::default().with_policy(policy).with_rarity(0).with_sift_rounds(1);
        let mut bdd = Bdd::from_onsets_and_trace(5, &onsets, &trace, config).unwrap();
        bdd.reorder();
        bdd.to_netlist(&inputs, &outputs).unwrap().to_string()
    };
    let reference = emit(MergePolicy::Exact);
    for policy in POLICIES {
        assert_eq!(emit(policy), reference, "{:?}", policy);
    }
}
