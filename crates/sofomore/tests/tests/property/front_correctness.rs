//! Property tests: the front equals the brute-force non-dominated subset of
//! the kernels' objective vectors strictly inside the reference box.

use proptest::prelude::*;
use sofomore_archive::{NondominatedList, ObjectiveVector, ParetoArchive};
use sofomore_engine::{Kernel, KernelId, Sofomore, SofomoreOptions};
use sofomore_kernel::SimulatedKernel;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

const REFERENCE: [f64; 2] = [1.1, 1.1];

/// Objective vectors on a coarse grid so that ties and duplicates occur,
/// including points on the reference box boundary.
fn arb_values(max: usize) -> impl Strategy<Value = Vec<ObjectiveVector>> {
    prop::collection::vec(
        (0u8..13, 0u8..13).prop_map(|(a, b)| vec![a as f64 / 10.0, b as f64 / 10.0]),
        1..max,
    )
}

fn brute_force_front(values: &[ObjectiveVector], reference: &[f64]) -> Vec<ObjectiveVector> {
    let inside: Vec<&ObjectiveVector> = values
        .iter()
        .filter(|v| v.iter().zip(reference).all(|(x, r)| x < r))
        .collect();
    let mut front: Vec<ObjectiveVector> = Vec::new();
    for &v in &inside {
        let dominated = inside.iter().any(|w| {
            w.iter().zip(v.iter()).all(|(a, b)| a <= b) && w.iter().zip(v.iter()).any(|(a, b)| a < b)
        });
        if !dominated && !front.contains(v) {
            front.push(v.clone());
        }
    }
    front.sort_by(|a, b| a.partial_cmp(b).unwrap());
    front
}

/// One told round where every kernel's incumbent gets `values[i]` and every
/// offspring lands outside the reference box.
fn told_population(values: &[ObjectiveVector]) -> Sofomore {
    let kernels: Vec<Box<dyn Kernel>> = (0..values.len())
        .map(|i| Box::new(SimulatedKernel::new(vec![i as f64])) as Box<dyn Kernel>)
        .collect();
    let mut moes = Sofomore::new(
        kernels,
        SofomoreOptions::default().with_seed(0),
        REFERENCE.to_vec(),
    )
    .unwrap();
    let xs = moes.ask(1).unwrap();
    let mut fs = values.to_vec();
    fs.resize(xs.len(), vec![2.0, 2.0]);
    moes.tell(&xs, &fs, &[]).unwrap();
    moes
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// The coordinator's front is exactly the non-dominated incumbent values.
    #[test]
    fn pareto_front_matches_brute_force(values in arb_values(10)) {
        let moes = told_population(&values);
        let front = moes.pareto_front().unwrap();
        prop_assert_eq!(front.points().to_vec(), brute_force_front(&values, &REFERENCE));
        // duplicated values put several incumbents on one front point
        prop_assert!(moes.pareto_set().unwrap().len() >= front.len());
    }

    /// The list does not depend on insertion order.
    #[test]
    fn list_is_insertion_order_independent(
        values in arb_values(12).prop_shuffle(),
    ) {
        let mut list = NondominatedList::empty(&REFERENCE).unwrap();
        for v in &values {
            list.add(v.clone()).unwrap();
        }
        prop_assert_eq!(list.points().to_vec(), brute_force_front(&values, &REFERENCE));
    }

    /// Removing a kernel purges its value from the front.
    #[test]
    fn removal_purges_front(values in arb_values(8), pick in any::<prop::sample::Index>()) {
        let mut moes = told_population(&values);
        let id = KernelId(pick.index(values.len()));
        moes.remove(&[id]).unwrap();

        let mut rest = values.clone();
        rest.remove(id.0);
        let front = moes.pareto_front().unwrap();
        prop_assert_eq!(front.points().to_vec(), brute_force_front(&rest, &REFERENCE));
        prop_assert_eq!(moes.num_kernels(), values.len() - 1);
    }
}
