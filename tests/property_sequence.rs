mod support;

use asprov::{analyze, format_source};
use proptest::prelude::*;
use support::chain_program;

fn chain_order() -> impl Strategy<Value = Vec<usize>> {
    (1usize..25).prop_flat_map(|k| Just((1..=k).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn chain_of_k_rules_gives_k_singletons(order in chain_order()) {
        let analysis = analyze(&chain_program(&order)).expect("analysis");
        prop_assert_eq!(analysis.transformations.len(), order.len());
        for (i, t) in analysis.transformations.iter().enumerate() {
            prop_assert_eq!(t.id, i + 1);
            prop_assert_eq!(t.rules.len(), 1);
            prop_assert!(!t.recursive);
            prop_assert_eq!(t.rules[0].to_string(), format!("p{} :- p{}.", i + 1, i));
        }
    }

    #[test]
    fn sequence_hash_survives_reformatting(order in chain_order()) {
        let src = chain_program(&order);
        let formatted = format_source(&src).expect("format");
        let a = analyze(&src).expect("analysis");
        let b = analyze(&formatted).expect("analysis of formatted");
        prop_assert_eq!(a.sequence_hash, b.sequence_hash);
    }

    #[test]
    fn closing_the_chain_makes_a_recursive_group(k in 2usize..20) {
        let order: Vec<usize> = (1..=k).collect();
        let mut src = chain_program(&order);
        src.push_str(&format!("p1 :- p{k}.\n"));
        let analysis = analyze(&src).expect("analysis");
        // `p1 :- p0.` only feeds the cycle.
        prop_assert_eq!(analysis.transformations.len(), 2);
        prop_assert!(!analysis.transformations[0].recursive);
        prop_assert_eq!(analysis.transformations[1].rules.len(), k);
        prop_assert!(analysis.transformations[1].recursive);
    }
}
