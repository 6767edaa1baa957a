#![allow(dead_code)]

use std::collections::BTreeSet;

use asprov::{Rule, parse_program};

pub fn rules(src: &str) -> Vec<Rule> {
    parse_program(src)
        .expect("source should parse")
        .rules()
        .cloned()
        .collect()
}

pub fn rule(src: &str) -> Rule {
    let mut parsed = rules(src);
    assert_eq!(parsed.len(), 1, "expected exactly one rule in {src:?}");
    parsed.remove(0)
}

pub fn printed(rules: &[Rule]) -> BTreeSet<String> {
    rules.iter().map(ToString::to_string).collect()
}

/// Compares rule sets after parsing `expected`, so spacing in the expected
/// text does not matter.
pub fn assert_rules_eq(actual: &[Rule], expected: &str) {
    let expected = rules(expected);
    assert_eq!(
        printed(actual),
        printed(&expected),
        "rule sets differ\nactual:\n{}",
        actual
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
    assert_eq!(actual.len(), expected.len());
}

/// `p0.` followed by `p{i} :- p{i-1}.` for each index in `order`.
pub fn chain_program(order: &[usize]) -> String {
    let mut src = String::from("p0.\n");
    for i in order {
        src.push_str(&format!("p{i} :- p{}.\n", i - 1));
    }
    src
}
